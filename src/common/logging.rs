//! Logging and tracing configuration
//!
//! Harness runs log to stderr by default. A log file can be requested for
//! long runs, in which case the file gets the full detail and stderr stays
//! compact.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use super::paths;

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_cli() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lldb_harness=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing with a log file in addition to stderr
///
/// The file receives every command and its captured output (TRACE for this
/// crate unless `RUST_LOG` says otherwise). Falls back to [`init_cli`] if the
/// file cannot be opened.
pub fn init_file(log_file: &Path) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lldb_harness=trace,info"));

    match open_log_file(log_file) {
        Ok(file) => {
            let file_layer = fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true);

            let stderr_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact()
                .with_filter(LevelFilter::INFO);

            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(stderr_layer)
                .init();

            Some(log_file.to_path_buf())
        }
        Err(e) => {
            eprintln!("Warning: Could not open log file {}: {}", log_file.display(), e);
            init_cli();
            None
        }
    }
}

/// Open `log_file` for appending, creating its directory first
///
/// A failure to create the directory is reported together with the open
/// error it causes.
fn open_log_file(log_file: &Path) -> io::Result<File> {
    let dir_error = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .err()
            .map(|e| format!("creating {}: {}", parent.display(), e)),
        _ => None,
    };

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| match dir_error {
            Some(dir_error) => io::Error::new(e.kind(), format!("{} ({})", e, dir_error)),
            None => e,
        })
}

/// Default location for harness run logs
pub fn default_log_path() -> Option<PathBuf> {
    paths::log_dir().map(|d| d.join("harness.log"))
}
