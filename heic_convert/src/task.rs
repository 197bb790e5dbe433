//! Units of work handed to the worker pool and the values they produce.

use crate::error::ConvertError;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// One source file to convert. Built by discovery, consumed once by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub quality: u8,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct ConversionOutcome {
    pub source: PathBuf,
    pub result: Result<(), ConvertError>,
}

impl ConversionOutcome {
    pub fn succeeded(source: PathBuf) -> Self {
        Self {
            source,
            result: Ok(()),
        }
    }

    pub fn failed(source: PathBuf, error: ConvertError) -> Self {
        Self {
            source,
            result: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&ConvertError> {
        self.result.as_ref().err()
    }
}

/// Removal of a converted original plus its sidecar cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionTask {
    pub source: PathBuf,
    pub sidecar: PathBuf,
}

impl DeletionTask {
    /// `<dir>/<sidecar_dir>/<file name>` next to the source.
    pub fn new(source: PathBuf, sidecar_dir: &str) -> Self {
        let parent = source.parent().unwrap_or_else(|| Path::new(""));
        let sidecar = match source.file_name() {
            Some(name) => parent.join(sidecar_dir).join(name),
            None => parent.join(sidecar_dir),
        };
        Self { source, sidecar }
    }

    pub fn execute(&self) -> io::Result<()> {
        info!(path = %self.source.display(), "Deleting original");
        std::fs::remove_file(&self.source)?;

        match std::fs::symlink_metadata(&self.sidecar) {
            Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(&self.sidecar),
            Ok(_) => std::fs::remove_file(&self.sidecar),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug)]
pub struct DeletionOutcome {
    pub source: PathBuf,
    pub result: Result<(), ConvertError>,
}
