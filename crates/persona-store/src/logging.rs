//! Tracing subscriber setup for hosts embedding the ledger.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install a global fmt subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns an error if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    install(config, false)
}

/// Like [`init`], but writes through the libtest capture so output only shows
/// for failing tests.
pub fn init_for_tests(config: &LoggingConfig) -> anyhow::Result<()> {
    install(config, true)
}

fn install(config: &LoggingConfig, test_writer: bool) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match (config.format, test_writer) {
        (LogFormat::Json, false) => builder.json().try_init(),
        (LogFormat::Json, true) => builder.json().with_test_writer().try_init(),
        (LogFormat::Text, false) => builder.try_init(),
        (LogFormat::Text, true) => builder.with_test_writer().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to install subscriber: {}", e))
}
