use tracing_subscriber::EnvFilter;

use crate::config::{Config, DEFAULT_LOG_FILTER};

/// Installs the stderr subscriber. Stdout is left to the child command.
pub fn init(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
