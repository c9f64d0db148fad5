//! provides logging helpers

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// Prefix of the daily rotated log files written into the log directory.
pub const LOG_FILE_PREFIX: &str = "fast5-exporter.log";

const MAX_LOG_FILES: usize = 7;

fn env_filter() -> filter::EnvFilter {
    filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy()
}

/// initiate the global tracing subscriber
///
/// Always logs to stderr. When `log_dir` is given, events are additionally
/// written to a daily rotated file in that directory; the returned guard must
/// be kept alive for the file writer to flush.
pub fn init(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let fmt_layer = layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter());

    let Some(dir) = log_dir else {
        registry().with(fmt_layer).init();
        return None;
    };

    let appender = match file_appender(dir) {
        Ok(appender) => appender,
        Err(e) => {
            registry().with(fmt_layer).init();
            tracing::warn!(
                log_dir = %dir.display(),
                error = %e,
                "failed to create log file appender, logging to stderr only"
            );
            return None;
        }
    };

    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
    let file_layer = layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(env_filter());

    registry().with(fmt_layer).with(file_layer).init();
    Some(file_guard)
}

fn file_appender(
    dir: &Path,
) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
}
