//! Shared Utilities for the heic-convert tools
//!
//! - Run counters and the final summary report
//! - Logging setup (stderr + rolling file)
//! - Metadata preservation (timestamps, EXIF normalization)
//! - WebP container muxing for metadata embedding
//! - Safety checks before removing originals

pub mod batch;
pub mod common_utils;
pub mod image_formats;
pub mod logging;
pub mod metadata;
pub mod report;
pub mod safety;

pub use batch::RunCounters;
pub use common_utils::{has_extension_ci, normalize_extension};
pub use metadata::FileTimes;
pub use report::{log_summary, summary_line};
pub use safety::{check_safe_for_removal, ProtectedPathError};
