//! Tracing subscriber setup

use tracing::Subscriber;
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;

/// Build the subscriber for a logging configuration without installing it.
///
/// `RUST_LOG` wins over the configured level.
pub fn subscriber(config: &LoggingConfig) -> impl Subscriber + Send + Sync + 'static {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("local_library={},sqlx=warn", config.level).into());

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().boxed(),
        _ => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry().with(fmt_layer).with(filter)
}

/// Install the global tracing subscriber.
///
/// Fails when a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
    subscriber(config).try_init()
}
