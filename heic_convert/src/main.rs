use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use heic_convert::config::{
    DEFAULT_QUALITY, DEFAULT_SIDECAR_DIR, DEFAULT_SOURCE_EXTENSION, DEFAULT_WORKERS,
};
use heic_convert::{decoder_for_extension, RunConfig, Scheduler, SkipPolicy, TargetFormat};
use shared_utils::logging::{init_logging, LogConfig};
use shared_utils::{check_safe_for_removal, log_summary, RunCounters};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "heic-convert")]
#[command(
    version,
    about = "Batch-convert HEIC photos to JPEG or WebP, in place",
    long_about = "Recursively converts every HEIC file under each ROOT into a sibling \
                  JPEG/WebP file. Colors are transformed to sRGB through the embedded ICC \
                  profile, EXIF and file timestamps are carried over, and files that \
                  already have a converted sibling are skipped."
)]
struct Cli {
    /// Directories to convert
    #[arg(value_name = "ROOT", required = true)]
    roots: Vec<PathBuf>,

    /// Output quality (1-100)
    #[arg(short, long, default_value_t = DEFAULT_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Number of parallel workers
    #[arg(short, long, default_value_t = DEFAULT_WORKERS as u16,
          value_parser = clap::value_parser!(u16).range(1..))]
    workers: u16,

    /// Dry run: report what would be converted, touch nothing
    #[arg(short, long)]
    dry: bool,

    /// Remove originals after a successful conversion (ignored with --dry)
    #[arg(short, long)]
    remove_originals: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Jpeg)]
    format: FormatArg,

    /// Source file extension, matched case-insensitively
    #[arg(long, value_name = "EXT", default_value = DEFAULT_SOURCE_EXTENSION)]
    source_ext: String,

    /// Per-directory sidecar cache cleaned up alongside removed originals
    #[arg(long, value_name = "NAME", default_value = DEFAULT_SIDECAR_DIR)]
    sidecar_dir: String,

    /// Treat zero-byte outputs as missing and convert again
    #[arg(long)]
    reconvert_empty: bool,

    /// Show a progress bar
    #[arg(long)]
    progress: bool,

    /// Print the final counters as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory for the rolling log file
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Log to stderr only
    #[arg(long)]
    no_log_file: bool,

    /// Number of rolling log files kept in the log directory
    #[arg(long, value_name = "N", default_value_t = 5,
          value_parser = clap::value_parser!(u16).range(1..))]
    keep_logs: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Jpeg,
    Webp,
}

impl From<FormatArg> for TargetFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Jpeg => TargetFormat::Jpeg,
            FormatArg::Webp => TargetFormat::Webp,
        }
    }
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            quality: self.quality,
            workers: usize::from(self.workers),
            dry_run: self.dry,
            remove_originals: self.remove_originals,
            target: self.format.into(),
            source_extension: self.source_ext.clone(),
            sidecar_dir: self.sidecar_dir.clone(),
            skip_policy: if self.reconvert_empty {
                SkipPolicy::NonEmpty
            } else {
                SkipPolicy::Presence
            },
            show_progress: self.progress,
        }
    }

    fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::default()
            .with_file_output(!self.no_log_file)
            .with_max_files(usize::from(self.keep_logs))
            .with_level(if self.verbose { Level::DEBUG } else { Level::INFO });
        if let Some(dir) = &self.log_dir {
            config = config.with_log_dir(dir);
        }
        config
    }
}

fn main() -> Result<()> {
    if std::env::args_os().len() <= 1 {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    let cli = Cli::parse();
    if let Err(e) = init_logging("heic_convert", cli.log_config()) {
        eprintln!("warning: logging setup failed: {e:#}");
    }

    let config = cli.run_config();
    if config.remove_originals && config.dry_run {
        info!("Dry run: --remove-originals has no effect");
    }
    if config.deletes_originals() {
        for root in &cli.roots {
            check_safe_for_removal(root).with_context(|| {
                format!("refusing to remove originals under {}", root.display())
            })?;
        }
    }

    info!(
        format = %config.target,
        quality = config.quality,
        workers = config.worker_count(),
        dry_run = config.dry_run,
        remove_originals = config.deletes_originals(),
        "Starting conversion"
    );

    let started = Instant::now();
    let decoder = decoder_for_extension(&config.source_extension);
    let scheduler = Scheduler::new(config, decoder);

    let mut totals = RunCounters::new();
    let mut failed_roots = 0usize;
    for root in &cli.roots {
        match scheduler.run(root) {
            Ok(counters) => totals += counters,
            Err(e) if e.is_discovery_error() => {
                error!(root = %root.display(), error = %e, "Cannot process root");
                failed_roots += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("run aborted under {}", root.display()));
            }
        }
    }

    if cli.roots.len() > 1 {
        log_summary(&totals, started.elapsed());
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
    }

    if failed_roots > 0 {
        bail!("{} of {} roots could not be processed", failed_roots, cli.roots.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_map_to_run_config() {
        let cli = Cli::try_parse_from(["heic-convert", "/photos"]).unwrap();
        let config = cli.run_config();
        assert_eq!(config.quality, 90);
        assert_eq!(config.workers, 4);
        assert_eq!(config.target, TargetFormat::Jpeg);
        assert_eq!(config.source_extension, "heic");
        assert_eq!(config.sidecar_dir, "@eaDir");
        assert_eq!(config.skip_policy, SkipPolicy::Presence);
        assert!(!config.deletes_originals());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "heic-convert",
            "-q",
            "75",
            "-w",
            "2",
            "-r",
            "-f",
            "webp",
            "--reconvert-empty",
            "a",
            "b",
        ])
        .unwrap();
        let config = cli.run_config();
        assert_eq!(cli.roots.len(), 2);
        assert_eq!(config.quality, 75);
        assert_eq!(config.workers, 2);
        assert_eq!(config.target, TargetFormat::Webp);
        assert_eq!(config.skip_policy, SkipPolicy::NonEmpty);
        assert!(config.deletes_originals());
    }

    #[test]
    fn test_remove_inert_with_dry() {
        let cli = Cli::try_parse_from(["heic-convert", "-d", "-r", "/photos"]).unwrap();
        assert!(!cli.run_config().deletes_originals());
    }

    #[test]
    fn test_log_flags_map_to_log_config() {
        let cli = Cli::try_parse_from(["heic-convert", "/p"]).unwrap();
        assert_eq!(cli.log_config().max_files, 5);

        let cli = Cli::try_parse_from([
            "heic-convert",
            "--keep-logs",
            "2",
            "--no-log-file",
            "-v",
            "/p",
        ])
        .unwrap();
        let config = cli.log_config();
        assert_eq!(config.max_files, 2);
        assert!(!config.file_output);
        assert_eq!(config.level, Level::DEBUG);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Cli::try_parse_from(["heic-convert", "-q", "0", "/p"]).is_err());
        assert!(Cli::try_parse_from(["heic-convert", "-q", "101", "/p"]).is_err());
        assert!(Cli::try_parse_from(["heic-convert", "-w", "0", "/p"]).is_err());
        assert!(Cli::try_parse_from(["heic-convert", "-f", "png", "/p"]).is_err());
        assert!(Cli::try_parse_from(["heic-convert", "-q", "90"]).is_err());
        assert!(Cli::try_parse_from(["heic-convert", "--keep-logs", "0", "/p"]).is_err());
    }
}
