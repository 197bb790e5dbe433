//! Fixtures shared by the scenario tests. Sources are PNGs so they can be
//! generated in-process and read by the image-crate decoder.

#![allow(dead_code)]

use heic_convert::{ImageRsDecoder, RunConfig, Scheduler};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config for PNG sources, two workers.
pub fn png_config() -> RunConfig {
    RunConfig {
        workers: 2,
        source_extension: "png".to_string(),
        ..RunConfig::default()
    }
}

pub fn scheduler(config: RunConfig) -> Scheduler {
    Scheduler::new(config, Arc::new(ImageRsDecoder))
}

pub fn write_png(path: &Path) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_fn(12, 8, |x, y| Rgb([(x * 20) as u8, (y * 30) as u8, 90]))
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
    path.to_path_buf()
}

pub fn write_corrupt(path: &Path) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"\x89PNG\r\n\x1a\nthis is not really a png").unwrap();
    path.to_path_buf()
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
    path.to_path_buf()
}

/// Regular files under `root` with the given extension, sorted.
pub fn files_with_extension(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
        .collect();
    found.sort();
    found
}
