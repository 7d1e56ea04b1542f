use std::env;
use std::fs;
use std::path::Path;

use product_audit_core::audit::AuditDimension;
use product_audit_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run(options: LoadOptions) -> String {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    for (dimension, env_key) in [
        (AuditDimension::Profitability, "PRODUCT_AUDIT_WEIGHT_PROFITABILITY"),
        (AuditDimension::Supplier, "PRODUCT_AUDIT_WEIGHT_SUPPLIER"),
        (AuditDimension::Feed, "PRODUCT_AUDIT_WEIGHT_FEED"),
        (AuditDimension::Market, "PRODUCT_AUDIT_WEIGHT_MARKET"),
    ] {
        let key = format!("engine.weights.{dimension}");
        lines.push(render_line(
            &key,
            &format!("{:.2}", config.engine.weights.get(dimension)),
            source(&key, &[env_key]),
        ));
    }

    lines.push(render_line(
        "engine.target_margin",
        &config.engine.target_margin.to_string(),
        source("engine.target_margin", &["PRODUCT_AUDIT_TARGET_MARGIN"]),
    ));
    lines.push(render_line(
        "engine.dimension_thresholds",
        &format!(
            "pass {} / warn {}",
            config.engine.dimension_thresholds.pass, config.engine.dimension_thresholds.warn
        ),
        source("engine.dimension_thresholds", &[]),
    ));
    lines.push(render_line(
        "engine.max_priority_actions",
        &config
            .engine
            .max_priority_actions
            .map(|limit| limit.to_string())
            .unwrap_or_else(|| "all".to_string()),
        source("engine.max_priority_actions", &["PRODUCT_AUDIT_MAX_PRIORITY_ACTIONS"]),
    ));
    for (check_id, thresholds) in &config.engine.check_thresholds {
        let key = format!("engine.check_thresholds.{check_id}");
        lines.push(render_line(
            &key,
            &format!("pass {} / warn {}", thresholds.pass, thresholds.warn),
            source(&key, &[]),
        ));
    }

    lines.push(render_line(
        "batch.concurrency",
        &config.batch.concurrency.to_string(),
        source("batch.concurrency", &["PRODUCT_AUDIT_BATCH_CONCURRENCY"]),
    ));
    lines.push(render_line(
        "batch.item_timeout_ms",
        &config.batch.item_timeout_ms.to_string(),
        source("batch.item_timeout_ms", &["PRODUCT_AUDIT_BATCH_ITEM_TIMEOUT_MS"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["PRODUCT_AUDIT_LOGGING_LEVEL", "PRODUCT_AUDIT_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["PRODUCT_AUDIT_LOGGING_FORMAT", "PRODUCT_AUDIT_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
