use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "adapt.log";

/// Flushes buffered file logs when dropped; hold it until the process exits.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn init_tracing(config: &LoggingConfig) -> Option<FileLogGuard> {
    let env_filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    let (file_layer, guard) = match config.file_dir.as_deref() {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true);
                (Some(layer), Some(FileLogGuard { _guard: guard }))
            }
            Err(err) => {
                eprintln!("failed to create log directory {}: {err}", dir.display());
                (None, None)
            }
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}
