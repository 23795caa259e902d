use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LogSettings};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `settings.level`. Safe to call more than once: later
/// calls are ignored, which keeps tests that each build a service from
/// fighting over the global subscriber.
pub fn init_tracing(settings: &LogSettings) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=debug", settings.level)));

    let result = match settings.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
}
