//! Run configuration

use crate::encode::TargetFormat;
use std::path::Path;

/// Synology's per-directory thumbnail/metadata cache.
pub const DEFAULT_SIDECAR_DIR: &str = "@eaDir";
pub const DEFAULT_SOURCE_EXTENSION: &str = "heic";
pub const DEFAULT_QUALITY: u8 = 90;
pub const DEFAULT_WORKERS: usize = 4;

/// When an existing destination makes a source "already converted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipPolicy {
    /// Any existing entry at the destination path, valid or not.
    #[default]
    Presence,
    /// Zero-byte destinations count as missing and get replaced.
    NonEmpty,
}

impl SkipPolicy {
    pub fn should_skip(self, destination: &Path) -> bool {
        match self {
            // symlink_metadata so a dangling link still counts as present
            SkipPolicy::Presence => std::fs::symlink_metadata(destination).is_ok(),
            SkipPolicy::NonEmpty => std::fs::metadata(destination)
                .map(|m| m.len() > 0)
                .unwrap_or(false),
        }
    }

    /// Whether a conversion may replace an entry that appeared at the
    /// destination after discovery.
    pub fn allows_overwrite(self) -> bool {
        matches!(self, SkipPolicy::NonEmpty)
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Encoder quality, 1..=100
    pub quality: u8,
    pub workers: usize,
    pub dry_run: bool,
    pub remove_originals: bool,
    pub target: TargetFormat,
    /// Source extension without the dot, matched case-insensitively
    pub source_extension: String,
    /// Name of the hidden per-directory sidecar cache
    pub sidecar_dir: String,
    pub skip_policy: SkipPolicy,
    pub show_progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            workers: DEFAULT_WORKERS,
            dry_run: false,
            remove_originals: false,
            target: TargetFormat::Jpeg,
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            sidecar_dir: DEFAULT_SIDECAR_DIR.to_string(),
            skip_policy: SkipPolicy::Presence,
            show_progress: false,
        }
    }
}

impl RunConfig {
    /// Originals are only ever removed on a real run.
    pub fn deletes_originals(&self) -> bool {
        self.remove_originals && !self.dry_run
    }

    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}
