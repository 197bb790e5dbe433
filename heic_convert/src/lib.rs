//! heic-convert: batch HEIC → JPEG/WEBP conversion
//!
//! Walks a directory tree, converts every source file that has no
//! converted sibling yet, and optionally removes originals once their
//! conversion succeeded.
//!
//! ## Modules
//! - `color`: ICC profile → sRGB transform (lcms2, perceptual intent)
//! - `decode`: libheif and image-crate decode services
//! - `encode`: JPEG and WebP encoders with ICC + EXIF embedding
//! - `converter`: single-file conversion with atomic output
//! - `walker`: discovery and skip decisions
//! - `scheduler`: worker pool and completion draining
//!
//! ```no_run
//! use heic_convert::{decoder_for_extension, RunConfig, Scheduler};
//! use std::path::Path;
//!
//! let config = RunConfig { workers: 8, ..RunConfig::default() };
//! let decoder = decoder_for_extension(&config.source_extension);
//! let counters = Scheduler::new(config, decoder).run(Path::new("/photos"))?;
//! assert!(counters.is_settled());
//! # Ok::<(), heic_convert::ConvertError>(())
//! ```

pub mod color;
pub mod config;
pub mod converter;
pub mod decode;
pub mod encode;
pub mod error;
pub mod scheduler;
pub mod task;
pub mod walker;

pub use color::{canonical_srgb_profile, to_srgb, SrgbImage};
pub use config::{RunConfig, SkipPolicy};
pub use converter::Converter;
pub use decode::{decoder_for_extension, DecodedImage, HeifDecoder, ImageRsDecoder, SourceDecoder};
pub use encode::TargetFormat;
pub use error::{ConvertError, Result};
pub use scheduler::Scheduler;
pub use task::{ConversionOutcome, ConversionTask, DeletionOutcome, DeletionTask};
pub use walker::{Discovery, Walker};

pub use shared_utils::RunCounters;
