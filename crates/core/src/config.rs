use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{AuditDimension, ProductAuditEngineConfig, ScoreThresholds};
use crate::batch::BatchConfig;
use crate::errors::ConfigurationError;

pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["product-audit.toml", "config/product-audit.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub engine: ProductAuditEngineConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub target_margin: Option<f64>,
    pub max_priority_actions: Option<usize>,
    pub batch_concurrency: Option<usize>,
    pub batch_item_timeout_ms: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("engine configuration is invalid: {0}")]
    Engine(#[from] ConfigurationError),
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: ProductAuditEngineConfig::default(),
            batch: BatchConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATHS[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(engine) = patch.engine {
            if let Some(weights) = engine.weights {
                for (dimension, weight) in [
                    (AuditDimension::Profitability, weights.profitability),
                    (AuditDimension::Supplier, weights.supplier),
                    (AuditDimension::Feed, weights.feed),
                    (AuditDimension::Market, weights.market),
                ] {
                    if let Some(weight) = weight {
                        self.engine.weights.set(dimension, weight);
                    }
                }
            }
            if let Some(target_margin) = engine.target_margin {
                self.engine.target_margin = target_margin;
            }
            if let Some(thresholds) = engine.dimension_thresholds {
                self.engine.dimension_thresholds = thresholds;
            }
            if let Some(check_thresholds) = engine.check_thresholds {
                self.engine.check_thresholds.extend(check_thresholds);
            }
            if let Some(max_priority_actions) = engine.max_priority_actions {
                self.engine.max_priority_actions = max_priority_actions.into_limit();
            }
        }

        if let Some(batch) = patch.batch {
            if let Some(concurrency) = batch.concurrency {
                self.batch.concurrency = concurrency;
            }
            if let Some(item_timeout_ms) = batch.item_timeout_ms {
                self.batch.item_timeout_ms = item_timeout_ms;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        for (dimension, key) in [
            (AuditDimension::Profitability, "PRODUCT_AUDIT_WEIGHT_PROFITABILITY"),
            (AuditDimension::Supplier, "PRODUCT_AUDIT_WEIGHT_SUPPLIER"),
            (AuditDimension::Feed, "PRODUCT_AUDIT_WEIGHT_FEED"),
            (AuditDimension::Market, "PRODUCT_AUDIT_WEIGHT_MARKET"),
        ] {
            if let Some(value) = read_env(key) {
                self.engine.weights.set(dimension, parse_f64(key, &value)?);
            }
        }
        if let Some(value) = read_env("PRODUCT_AUDIT_TARGET_MARGIN") {
            self.engine.target_margin = parse_f64("PRODUCT_AUDIT_TARGET_MARGIN", &value)?;
        }
        if let Some(value) = read_env("PRODUCT_AUDIT_MAX_PRIORITY_ACTIONS") {
            self.engine.max_priority_actions = if value.trim().eq_ignore_ascii_case("all") {
                None
            } else {
                Some(parse_usize("PRODUCT_AUDIT_MAX_PRIORITY_ACTIONS", &value)?)
            };
        }

        if let Some(value) = read_env("PRODUCT_AUDIT_BATCH_CONCURRENCY") {
            self.batch.concurrency = parse_usize("PRODUCT_AUDIT_BATCH_CONCURRENCY", &value)?;
        }
        if let Some(value) = read_env("PRODUCT_AUDIT_BATCH_ITEM_TIMEOUT_MS") {
            self.batch.item_timeout_ms = parse_u64("PRODUCT_AUDIT_BATCH_ITEM_TIMEOUT_MS", &value)?;
        }

        let log_level =
            read_env("PRODUCT_AUDIT_LOGGING_LEVEL").or_else(|| read_env("PRODUCT_AUDIT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("PRODUCT_AUDIT_LOGGING_FORMAT")
            .or_else(|| read_env("PRODUCT_AUDIT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(target_margin) = overrides.target_margin {
            self.engine.target_margin = target_margin;
        }
        if let Some(max_priority_actions) = overrides.max_priority_actions {
            self.engine.max_priority_actions = Some(max_priority_actions);
        }
        if let Some(concurrency) = overrides.batch_concurrency {
            self.batch.concurrency = concurrency;
        }
        if let Some(item_timeout_ms) = overrides.batch_item_timeout_ms {
            self.batch.item_timeout_ms = item_timeout_ms;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        validate_batch(&self.batch)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// First existing config file: the explicit path, else the default locations.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_batch(batch: &BatchConfig) -> Result<(), ConfigError> {
    if batch.concurrency == 0 || batch.concurrency > 256 {
        return Err(ConfigError::Validation(
            "batch.concurrency must be in range 1..=256".to_string(),
        ));
    }

    if batch.item_timeout_ms == 0 || batch.item_timeout_ms > 300_000 {
        return Err(ConfigError::Validation(
            "batch.item_timeout_ms must be in range 1..=300000".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    engine: Option<EnginePatch>,
    batch: Option<BatchPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    weights: Option<WeightsPatch>,
    target_margin: Option<f64>,
    dimension_thresholds: Option<ScoreThresholds>,
    check_thresholds: Option<BTreeMap<String, ScoreThresholds>>,
    max_priority_actions: Option<ActionLimitPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct WeightsPatch {
    profitability: Option<f64>,
    supplier: Option<f64>,
    feed: Option<f64>,
    market: Option<f64>,
}

/// `max_priority_actions = 5` or `max_priority_actions = "all"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ActionLimitPatch {
    Limit(usize),
    Keyword(String),
}

impl ActionLimitPatch {
    fn into_limit(self) -> Option<usize> {
        match self {
            Self::Limit(limit) => Some(limit),
            // anything but a number lifts the cap
            Self::Keyword(_) => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct BatchPatch {
    concurrency: Option<usize>,
    item_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::audit::ScoreThresholds;
    use crate::errors::ConfigurationError;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_load_without_file_or_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.engine.target_margin == 30.0, "default target margin should be 30")?;
        ensure(config.engine.max_priority_actions == Some(10), "default action cap should be 10")?;
        ensure(config.batch.concurrency == 4, "default batch concurrency should be 4")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_AUDIT_TARGET_MARGIN", "22.5");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("product-audit.toml");
            fs::write(
                &path,
                r#"
[engine]
target_margin = ${TEST_AUDIT_TARGET_MARGIN}
max_priority_actions = "all"

[engine.weights]
profitability = 0.4
supplier = 0.2
feed = 0.2
market = 0.2

[engine.check_thresholds.roi]
pass = 60.0
warn = 30.0
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.engine.target_margin == 22.5, "target margin should come from env")?;
            ensure(config.engine.weights.profitability == 0.4, "file weight should apply")?;
            ensure(config.engine.max_priority_actions.is_none(), "\"all\" should lift the cap")?;
            ensure(
                config.engine.check_thresholds.get("roi") == Some(&ScoreThresholds::new(60.0, 30.0)),
                "roi override should be loaded",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_AUDIT_TARGET_MARGIN"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PRODUCT_AUDIT_LOG_LEVEL", "warn");
        env::set_var("PRODUCT_AUDIT_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["PRODUCT_AUDIT_LOG_LEVEL", "PRODUCT_AUDIT_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PRODUCT_AUDIT_BATCH_CONCURRENCY", "8");
        env::set_var("PRODUCT_AUDIT_TARGET_MARGIN", "35");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("product-audit.toml");
            fs::write(
                &path,
                r#"
[engine]
target_margin = 25.0

[batch]
concurrency = 2
item_timeout_ms = 1500

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    target_margin: Some(40.0),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.engine.target_margin == 40.0, "override target margin should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.batch.concurrency == 8, "env concurrency should win over file")?;
            ensure(config.batch.item_timeout_ms == 1500, "file timeout should win over default")?;
            Ok(())
        })();

        clear_vars(&["PRODUCT_AUDIT_BATCH_CONCURRENCY", "PRODUCT_AUDIT_TARGET_MARGIN"]);
        result
    }

    #[test]
    fn engine_validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PRODUCT_AUDIT_WEIGHT_MARKET", "0.7");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::Engine(ConfigurationError::WeightSum { .. })),
                "validation failure should report the weight sum",
            )?;
            ensure(error.to_string().contains("sum to 1.0"), "message should explain the rule")
        })();

        clear_vars(&["PRODUCT_AUDIT_WEIGHT_MARKET"]);
        result
    }

    #[test]
    fn malformed_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PRODUCT_AUDIT_BATCH_ITEM_TIMEOUT_MS", "soon");

        let result = (|| -> Result<(), String> {
            let error = AppConfig::load(LoadOptions::default()).err();
            ensure(
                matches!(
                    error,
                    Some(ConfigError::InvalidEnvOverride { ref key, .. })
                        if key == "PRODUCT_AUDIT_BATCH_ITEM_TIMEOUT_MS"
                ),
                "malformed timeout should name the env key",
            )
        })();

        clear_vars(&["PRODUCT_AUDIT_BATCH_ITEM_TIMEOUT_MS"]);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");
        let error = AppConfig::load(LoadOptions {
            config_path: Some(missing.clone()),
            require_file: true,
            ..LoadOptions::default()
        })
        .err();

        ensure(
            matches!(error, Some(ConfigError::MissingConfigFile(ref path)) if *path == missing),
            "missing required file should be reported",
        )
    }

    #[test]
    fn batch_limits_are_validated() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides { batch_concurrency: Some(0), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        })
        .err();

        ensure(
            matches!(
                error,
                Some(ConfigError::Validation(ref message)) if message.contains("batch.concurrency")
            ),
            "zero concurrency should be rejected",
        )
    }
}
