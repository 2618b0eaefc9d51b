use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use storefront_core::config::{AppConfig, LoadOptions};
use toml::Value;

/// One rendered config field: dotted key, env override name and display value.
struct ConfigField {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<ConfigField> {
    let recommendations = &config.recommendations;
    vec![
        ConfigField {
            key: "database.url",
            env_keys: &["STOREFRONT_DATABASE_URL"],
            value: config.database.url.clone(),
        },
        ConfigField {
            key: "database.max_connections",
            env_keys: &["STOREFRONT_DATABASE_MAX_CONNECTIONS"],
            value: config.database.max_connections.to_string(),
        },
        ConfigField {
            key: "database.timeout_secs",
            env_keys: &["STOREFRONT_DATABASE_TIMEOUT_SECS"],
            value: config.database.timeout_secs.to_string(),
        },
        ConfigField {
            key: "server.bind_address",
            env_keys: &["STOREFRONT_SERVER_BIND_ADDRESS"],
            value: config.server.bind_address.clone(),
        },
        ConfigField {
            key: "server.port",
            env_keys: &["STOREFRONT_SERVER_PORT"],
            value: config.server.port.to_string(),
        },
        ConfigField {
            key: "server.graceful_shutdown_secs",
            env_keys: &["STOREFRONT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            value: config.server.graceful_shutdown_secs.to_string(),
        },
        ConfigField {
            key: "recommendations.default_limit",
            env_keys: &["STOREFRONT_RECOMMENDATIONS_DEFAULT_LIMIT"],
            value: recommendations.default_limit.to_string(),
        },
        ConfigField {
            key: "recommendations.strategy_timeout_ms",
            env_keys: &["STOREFRONT_RECOMMENDATIONS_STRATEGY_TIMEOUT_MS"],
            value: recommendations.strategy_timeout_ms.to_string(),
        },
        ConfigField {
            key: "recommendations.cache_enabled",
            env_keys: &["STOREFRONT_RECOMMENDATIONS_CACHE_ENABLED"],
            value: recommendations.cache_enabled.to_string(),
        },
        ConfigField {
            key: "recommendations.cache_ttl_secs",
            env_keys: &["STOREFRONT_RECOMMENDATIONS_CACHE_TTL_SECS"],
            value: recommendations.cache_ttl_secs.to_string(),
        },
        ConfigField {
            key: "recommendations.trend_window_days",
            env_keys: &["STOREFRONT_RECOMMENDATIONS_TREND_WINDOW_DAYS"],
            value: recommendations.trend_window_days.to_string(),
        },
        ConfigField {
            key: "logging.level",
            env_keys: &["STOREFRONT_LOGGING_LEVEL", "STOREFRONT_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        ConfigField {
            key: "logging.format",
            env_keys: &["STOREFRONT_LOGGING_FORMAT", "STOREFRONT_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    ["storefront.toml", "config/storefront.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
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
