//! Directory walker: finds sources and decides skip vs. convert.
//!
//! Subdirectories are descended into before the files of the current
//! directory are examined. The sidecar cache directory is never entered and
//! directory symlinks are not followed.

use crate::config::{RunConfig, SkipPolicy};
use crate::encode::TargetFormat;
use crate::error::{ConvertError, Result};
use crate::task::ConversionTask;
use shared_utils::has_extension_ci;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Everything discovery found under one root.
#[derive(Debug, Default)]
pub struct Discovery {
    pub tasks: Vec<ConversionTask>,
    /// Sources whose destination already exists.
    pub skipped: Vec<PathBuf>,
}

impl Discovery {
    fn merge(&mut self, other: Discovery) {
        self.tasks.extend(other.tasks);
        self.skipped.extend(other.skipped);
    }

    pub fn candidates(&self) -> usize {
        self.tasks.len() + self.skipped.len()
    }
}

#[derive(Debug, Clone)]
pub struct Walker {
    source_extension: String,
    target: TargetFormat,
    sidecar_dir: String,
    skip_policy: SkipPolicy,
    quality: u8,
    dry_run: bool,
}

impl Walker {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            source_extension: shared_utils::normalize_extension(&config.source_extension),
            target: config.target,
            sidecar_dir: config.sidecar_dir.clone(),
            skip_policy: config.skip_policy,
            quality: config.quality,
            dry_run: config.dry_run,
        }
    }

    pub fn discover(&self, root: &Path) -> Result<Discovery> {
        let meta = std::fs::metadata(root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConvertError::RootNotFound(root.to_path_buf())
            } else {
                ConvertError::Io(e)
            }
        })?;
        if !meta.is_dir() {
            return Err(ConvertError::NotADirectory(root.to_path_buf()));
        }
        Ok(self.discover_dir(root))
    }

    fn discover_dir(&self, dir: &Path) -> Discovery {
        let mut subdirs = Vec::new();
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "Cannot read directory entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                if entry.file_name() != self.sidecar_dir.as_str() {
                    subdirs.push(entry.into_path());
                }
            } else {
                files.push(entry.into_path());
            }
        }

        let mut found = Discovery::default();
        for subdir in subdirs {
            found.merge(self.discover_dir(&subdir));
        }

        for source in files {
            if !self.is_candidate(&source) {
                continue;
            }
            let destination = self.destination_for(&source);
            if self.skip_policy.should_skip(&destination) {
                info!(
                    path = %source.display(),
                    destination = %destination.display(),
                    "Skipping, already converted"
                );
                found.skipped.push(source);
                continue;
            }
            found.tasks.push(ConversionTask {
                source,
                destination,
                quality: self.quality,
                dry_run: self.dry_run,
            });
        }
        found
    }

    fn is_candidate(&self, path: &Path) -> bool {
        has_extension_ci(path, &self.source_extension) && !path.is_dir()
    }

    pub fn destination_for(&self, source: &Path) -> PathBuf {
        source.with_extension(self.target.extension())
    }
}
