//! Metadata Preservation Module
//!
//! System layer: mirror access/modification timestamps from a source file
//! onto its converted counterpart. Internal layer (`exif`): normalize the
//! EXIF block carried over into the converted file.
//!
//! Timestamps must be applied after the last write to the destination,
//! otherwise the write bumps mtime back to "now".

use std::fs::Metadata;
use std::io;
use std::path::Path;

pub mod exif;

/// Access and modification times captured from a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimes {
    pub accessed: filetime::FileTime,
    pub modified: filetime::FileTime,
}

impl FileTimes {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            accessed: filetime::FileTime::from_last_access_time(metadata),
            modified: filetime::FileTime::from_last_modification_time(metadata),
        }
    }

    pub fn apply_to(&self, dst: &Path) -> io::Result<()> {
        filetime::set_file_times(dst, self.accessed, self.modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use tempfile::TempDir;

    #[test]
    fn test_times_carry_over() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.heic");
        let dst = dir.path().join("dst.jpg");
        std::fs::write(&src, b"source").unwrap();
        std::fs::write(&dst, b"dest").unwrap();

        let atime = FileTime::from_unix_time(1_600_000_000, 0);
        let mtime = FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_times(&src, atime, mtime).unwrap();

        let times = FileTimes::from_metadata(&std::fs::metadata(&src).unwrap());
        times.apply_to(&dst).unwrap();

        let meta = std::fs::metadata(&dst).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), mtime);
        assert_eq!(FileTime::from_last_access_time(&meta), atime);
    }

    #[test]
    fn test_missing_destination_is_error() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.heic");
        std::fs::write(&src, b"source").unwrap();

        let times = FileTimes::from_metadata(&std::fs::metadata(&src).unwrap());
        let err = times.apply_to(&dir.path().join("gone.jpg")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
