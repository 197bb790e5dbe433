//! Work scheduler: discovery → worker pool → completion draining.
//!
//! Every discovered task is spawned onto a rayon pool up front. Workers only
//! convert and send their outcome back over a channel; the calling thread
//! drains outcomes in completion order and is the sole owner of the run
//! counters. A successful outcome (on a real run with removal requested)
//! queues the matching deletion onto the same pool. Deletion outcomes are
//! drained only after every conversion outcome has been observed.

use crate::config::RunConfig;
use crate::converter::Converter;
use crate::decode::SourceDecoder;
use crate::error::{ConvertError, Result};
use crate::task::{ConversionOutcome, DeletionOutcome, DeletionTask};
use crate::walker::Walker;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::{ThreadPool, ThreadPoolBuilder};
use shared_utils::{log_summary, RunCounters};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}";

pub struct Scheduler {
    config: RunConfig,
    walker: Walker,
    converter: Arc<Converter>,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl Scheduler {
    pub fn new(config: RunConfig, decoder: Arc<dyn SourceDecoder>) -> Self {
        let converter =
            Converter::new(decoder, config.target).with_skip_policy(config.skip_policy);
        Self {
            walker: Walker::new(&config),
            converter: Arc::new(converter),
            config,
        }
    }

    /// Convert everything under `root`. Only a missing or non-directory root
    /// is an error; per-file failures are counted and logged.
    pub fn run(&self, root: &Path) -> Result<RunCounters> {
        let started = Instant::now();
        let discovery = self.walker.discover(root)?;

        let mut counters = RunCounters::new();
        for _ in &discovery.skipped {
            counters.record_skipped();
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count())
            .thread_name(|i| format!("heic-convert-{}", i))
            .build()?;
        debug!(
            root = %root.display(),
            workers = self.config.worker_count(),
            tasks = discovery.tasks.len(),
            skipped = discovery.skipped.len(),
            "Discovery finished"
        );

        let (conversion_tx, conversion_rx) = mpsc::channel::<ConversionOutcome>();
        for task in discovery.tasks {
            info!(path = %task.source.display(), "Adding to the conversion queue");
            counters.record_submitted();

            let tx = conversion_tx.clone();
            let converter = Arc::clone(&self.converter);
            pool.spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| converter.convert(&task)))
                    .unwrap_or_else(|payload| {
                        ConversionOutcome::failed(
                            task.source.clone(),
                            ConvertError::WorkerPanic(panic_message(payload)),
                        )
                    });
                // Receiver only goes away if the coordinator itself is gone.
                let _ = tx.send(outcome);
            });
        }
        drop(conversion_tx);

        let progress = self.progress_bar(counters.submitted as u64);
        let (deletion_tx, deletion_rx) = mpsc::channel::<DeletionOutcome>();

        for outcome in conversion_rx {
            counters.record_outcome(outcome.is_success());
            match &outcome.result {
                Ok(()) => {
                    if self.config.deletes_originals() {
                        self.schedule_deletion(&pool, &deletion_tx, outcome.source.clone());
                    }
                }
                Err(e) => {
                    error!(path = %outcome.source.display(), error = %e, "Conversion failed");
                }
            }
            if let Some(bar) = &progress {
                bar.set_message(
                    outcome
                        .source
                        .file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .to_string(),
                );
                bar.inc(1);
            }
        }
        drop(deletion_tx);

        if let Some(bar) = &progress {
            bar.finish_with_message("Complete");
        }

        for outcome in deletion_rx {
            match outcome.result {
                Ok(()) => counters.record_deleted(),
                Err(e) => {
                    error!(path = %outcome.source.display(), error = %e, "Deletion failed");
                }
            }
        }

        log_summary(&counters, started.elapsed());
        Ok(counters)
    }

    fn schedule_deletion(
        &self,
        pool: &ThreadPool,
        tx: &Sender<DeletionOutcome>,
        source: PathBuf,
    ) {
        info!(path = %source.display(), "Adding to the deletion queue");
        let task = DeletionTask::new(source, &self.config.sidecar_dir);
        let tx = tx.clone();
        pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| task.execute()))
                .map_err(|payload| ConvertError::WorkerPanic(panic_message(payload)))
                .and_then(|r| r.map_err(ConvertError::from));
            let _ = tx.send(DeletionOutcome {
                source: task.source,
                result,
            });
        });
    }

    fn progress_bar(&self, total: u64) -> Option<ProgressBar> {
        if !self.config.show_progress || total == 0 {
            return None;
        }
        let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
            .map(|s| s.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let bar = ProgressBar::new(total).with_style(style);
        Some(bar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodedImage;
    use tempfile::TempDir;

    struct PanickingDecoder;

    impl SourceDecoder for PanickingDecoder {
        fn decode(&self, _path: &Path) -> Result<DecodedImage> {
            panic!("decoder exploded");
        }
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(42u8)), "unknown panic payload");
    }

    #[test]
    fn test_worker_panic_becomes_error_outcome() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.heic"), b"x").unwrap();
        std::fs::write(dir.path().join("b.heic"), b"x").unwrap();
        let config = RunConfig {
            workers: 2,
            remove_originals: true,
            ..RunConfig::default()
        };

        let counters = Scheduler::new(config, Arc::new(PanickingDecoder))
            .run(dir.path())
            .unwrap();

        assert_eq!(counters.submitted, 2);
        assert_eq!(counters.errored, 2);
        assert_eq!(counters.deleted, 0);
        assert!(dir.path().join("a.heic").exists());
    }

    #[test]
    fn test_empty_root() {
        let dir = TempDir::new().unwrap();
        let counters = Scheduler::new(RunConfig::default(), Arc::new(PanickingDecoder))
            .run(dir.path())
            .unwrap();
        assert_eq!(counters, RunCounters::default());
    }

    #[test]
    fn test_missing_root_is_error() {
        let err = Scheduler::new(RunConfig::default(), Arc::new(PanickingDecoder))
            .run(&PathBuf::from("/definitely/not/here"))
            .unwrap_err();
        assert!(err.is_discovery_error());
    }
}
