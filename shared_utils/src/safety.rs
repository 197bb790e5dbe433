//! Safety Module
//!
//! Refuses destructive runs (removing originals) rooted at system
//! directories or directly at a home directory.

use std::path::{Path, PathBuf};
use thiserror::Error;

const PROTECTED_DIRS: &[&str] = &[
    "/",
    "/System",
    "/usr",
    "/bin",
    "/sbin",
    "/etc",
    "/var",
    "/private",
    "/Library",
    "/Applications",
    "/Users",
    "/home",
    "/root",
    "/boot",
    "/dev",
    "/proc",
    "/sys",
    "/tmp",
    "/opt",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtectedPathError {
    #[error("'{}' is a protected system directory; pick a subdirectory", .0.display())]
    SystemDirectory(PathBuf),

    #[error("'{}' is too close to a home directory root; pick a subdirectory", .0.display())]
    HomeRoot(PathBuf),
}

pub fn check_safe_for_removal(path: &Path) -> Result<(), ProtectedPathError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

    for candidate in [path, canonical.as_path()] {
        if PROTECTED_DIRS.iter().any(|p| candidate == Path::new(p)) {
            return Err(ProtectedPathError::SystemDirectory(path.to_path_buf()));
        }
    }

    // "/home/<user>" or "/Users/<user>" itself
    let depth = canonical.components().count();
    if depth <= 3 && (canonical.starts_with("/home") || canonical.starts_with("/Users")) {
        return Err(ProtectedPathError::HomeRoot(path.to_path_buf()));
    }

    Ok(())
}
