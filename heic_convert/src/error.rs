//! Conversion error types

use shared_utils::image_formats::webp::MuxError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("unrecognized image format: {0}")]
    UnrecognizedFormat(String),

    #[error("source file not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("invalid ICC profile: {0}")]
    ColorProfile(String),

    #[error("unsupported ICC profile color space: {0}")]
    UnsupportedColorSpace(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("WebP container error: {0}")]
    WebpMux(#[from] MuxError),

    #[error("directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("worker panicked: {0}")]
    WorkerPanic(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

impl ConvertError {
    /// Root-level problems abort the run for that root; everything else is
    /// confined to a single file.
    pub fn is_discovery_error(&self) -> bool {
        matches!(
            self,
            ConvertError::RootNotFound(_) | ConvertError::NotADirectory(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
