//! Tracing setup.
//!
//! Terminal filter: `--debug` > `--verbose` > `RUST_LOG` > `logging.level` >
//! `warn`. When `logging.directory` is configured a daily rolling file layer
//! is added with ANSI disabled.

use promptwright_infrastructure::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "promptwright.log";

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be kept
/// alive for the life of the process.
pub fn init(debug: bool, verbose: bool, config: &LoggingConfig) -> Option<WorkerGuard> {
    let terminal_filter = terminal_filter(debug, verbose, config.level.as_deref());
    let terminal_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_filter = EnvFilter::new(config.level.as_deref().unwrap_or("debug"));
            let file_layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);

            tracing_subscriber::registry()
                .with(terminal_layer.with_filter(terminal_filter))
                .with(file_layer.with_filter(file_filter))
                .init();
            tracing::debug!(path = %directory.display(), "File logging enabled");
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(terminal_layer.with_filter(terminal_filter))
                .init();
            None
        }
    }
}

fn terminal_filter(debug: bool, verbose: bool, configured: Option<&str>) -> EnvFilter {
    if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(configured.unwrap_or("warn")))
    }
}
