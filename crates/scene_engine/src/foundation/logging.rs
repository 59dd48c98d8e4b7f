//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

use crate::core::config::LoggingConfig;

/// Initialize the logging system
///
/// The configured level is the default filter; `RUST_LOG` still overrides it.
/// Calling this more than once is harmless, later calls are ignored.
pub fn init(config: &LoggingConfig) {
    let env = env_logger::Env::default().default_filter_or(config.level.as_str());
    if env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
        .is_err()
    {
        log::debug!("Logger already initialised, keeping existing configuration");
    }
}
