use tracing::Level;

use crate::config::{LogFormat, LoggingConfig};

/// Installs the process-wide fmt subscriber. A subscriber already installed by the host
/// application is left in place.
pub fn init_logging(config: &LoggingConfig) {
    let log_level = config.level.parse::<Level>().unwrap_or(Level::INFO);

    let installed = match config.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .compact()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .pretty()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .json()
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(
            event_name = "system.logging.initialized",
            level = %log_level,
            format = ?config.format,
            "logging initialized"
        );
    }
}
