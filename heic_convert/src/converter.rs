//! Single-file conversion: decode → sRGB → encode → timestamps.
//!
//! The encoded output is written to a temporary file next to the
//! destination and renamed into place only once it is complete and its
//! timestamps are set, so a failed conversion never leaves a partial file.

use crate::color::to_srgb;
use crate::config::SkipPolicy;
use crate::decode::SourceDecoder;
use crate::encode::TargetFormat;
use crate::error::{ConvertError, Result};
use crate::task::{ConversionOutcome, ConversionTask};
use shared_utils::metadata::exif::prepare_for_embedding;
use shared_utils::FileTimes;
use std::io::{self, BufWriter};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const TEMP_PREFIX: &str = ".heic-convert-";

/// Stateless apart from its configuration; shared by all workers.
#[derive(Clone)]
pub struct Converter {
    decoder: Arc<dyn SourceDecoder>,
    target: TargetFormat,
    skip_policy: SkipPolicy,
}

impl Converter {
    pub fn new(decoder: Arc<dyn SourceDecoder>, target: TargetFormat) -> Self {
        Self {
            decoder,
            target,
            skip_policy: SkipPolicy::default(),
        }
    }

    pub fn with_skip_policy(mut self, skip_policy: SkipPolicy) -> Self {
        self.skip_policy = skip_policy;
        self
    }

    /// Never fails outright; errors land in the outcome.
    pub fn convert(&self, task: &ConversionTask) -> ConversionOutcome {
        if task.dry_run {
            debug!(path = %task.source.display(), "Dry run, not converting");
            return ConversionOutcome::succeeded(task.source.clone());
        }

        match self.convert_file(task) {
            Ok(()) => {
                debug!(
                    path = %task.source.display(),
                    destination = %task.destination.display(),
                    format = %self.target,
                    "Converted"
                );
                ConversionOutcome::succeeded(task.source.clone())
            }
            Err(e) => ConversionOutcome::failed(task.source.clone(), e),
        }
    }

    fn convert_file(&self, task: &ConversionTask) -> Result<()> {
        // Stat first: the times mirrored are the ones the source had when
        // conversion started.
        let source_meta = std::fs::metadata(&task.source).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ConvertError::SourceMissing(task.source.clone())
            } else {
                ConvertError::Io(e)
            }
        })?;
        let times = FileTimes::from_metadata(&source_meta);

        let decoded = self.decoder.decode(&task.source)?;
        let srgb = to_srgb(decoded.pixels, decoded.icc_profile.as_deref())?;
        let exif = decoded.exif.as_deref().and_then(prepare_for_embedding);

        let dir = match task.destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(dir)?;

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            self.target.encode(
                &mut writer,
                &srgb.pixels,
                task.quality,
                exif.as_deref(),
                &srgb.icc_profile,
            )?;
        }

        std::fs::set_permissions(temp.path(), source_meta.permissions())?;
        times.apply_to(temp.path())?;

        let persisted = if self.skip_policy.allows_overwrite() {
            temp.persist(&task.destination)
        } else {
            temp.persist_noclobber(&task.destination)
        };
        persisted.map_err(|e| ConvertError::Io(e.error))?;
        Ok(())
    }
}
