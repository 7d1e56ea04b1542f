use product_audit_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Overrides the configured level with a full filter directive, e.g.
/// `product_audit_core=debug`.
pub const LOG_FILTER_ENV: &str = "PRODUCT_AUDIT_LOG_FILTER";

/// Installs the global subscriber on stderr so stdout stays machine-readable.
///
/// A config that fails to load falls back to the default logging settings;
/// the command itself reports the config failure.
pub fn init_logging(options: &LoadOptions) {
    let logging = AppConfig::load(options.clone())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);

    let filter = filter_for(&logging);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter);

    // try_init: a subscriber may already be installed when embedded in tests
    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

fn filter_for(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(logging.level.trim().to_ascii_lowercase()))
}
