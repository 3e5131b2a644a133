//! Logging and tracing configuration
//!
//! Console output goes to stderr so the run report on stdout stays readable.
//! During a run a second layer writes everything at debug level to
//! `run.log` inside the run's output folder.

use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Name of the per-run log file
pub const RUN_LOG: &str = "run.log";

/// Keeps the file writer alive; drop it to flush the run log
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

impl std::fmt::Debug for LogGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogGuard")
            .field("file", &self._file.is_some())
            .finish()
    }
}

/// Background writer for `run.log` in `output_dir`
pub fn run_log_writer(output_dir: &Path) -> (NonBlocking, LogGuard) {
    let appender = tracing_appender::rolling::never(output_dir, RUN_LOG);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    (writer, LogGuard { _file: Some(guard) })
}

fn console_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("florae_e2e=debug,warn")
        } else {
            EnvFilter::new("florae_e2e=info,warn")
        }
    })
}

/// Initialize tracing for commands that do not drive a device
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_cli(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact()
                .with_filter(console_filter(verbose)),
        )
        .try_init();
}

/// Initialize tracing for a test run (stderr + `run.log` in `output_dir`)
pub fn init_run(output_dir: &Path, verbose: bool) -> LogGuard {
    let (writer, guard) = run_log_writer(output_dir);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(EnvFilter::new("florae_e2e=debug,info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(console_filter(verbose));

    if tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: logging already initialized, run log disabled");
        return LogGuard { _file: None };
    }

    guard
}
