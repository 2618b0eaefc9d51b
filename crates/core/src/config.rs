use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub recommendations: RecommendationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct RecommendationConfig {
    pub default_limit: usize,
    pub strategy_timeout_ms: u64,
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub trend_window_days: i64,
}

impl RecommendationConfig {
    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
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
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
    pub recommendation_default_limit: Option<usize>,
    pub recommendation_cache_enabled: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("`{path}` is not valid TOML: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` does not exist")]
    MissingConfigFile(PathBuf),
    #[error("`${{{var}}}` is referenced in the config file but not set")]
    MissingEnvInterpolation { var: String },
    #[error("`${{` without a closing `}}` in the config file")]
    UnterminatedInterpolation,
    #[error("{key}=`{value}` cannot be parsed")]
    InvalidEnvOverride { key: String, value: String },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

pub const MAX_RECOMMENDATION_LIMIT: usize = 50;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://storefront.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            recommendations: RecommendationConfig {
                default_limit: 10,
                strategy_timeout_ms: 2_000,
                cache_enabled: true,
                cache_ttl_secs: 600,
                trend_window_days: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
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
                options.config_path.unwrap_or_else(|| PathBuf::from("storefront.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        let ConfigPatch { database, server, recommendations, logging } = patch;

        if let Some(patch) = database {
            assign(&mut self.database.url, patch.url);
            assign(&mut self.database.max_connections, patch.max_connections);
            assign(&mut self.database.timeout_secs, patch.timeout_secs);
        }

        if let Some(patch) = server {
            assign(&mut self.server.bind_address, patch.bind_address);
            assign(&mut self.server.port, patch.port);
            assign(&mut self.server.graceful_shutdown_secs, patch.graceful_shutdown_secs);
        }

        if let Some(patch) = recommendations {
            let target = &mut self.recommendations;
            assign(&mut target.default_limit, patch.default_limit);
            assign(&mut target.strategy_timeout_ms, patch.strategy_timeout_ms);
            assign(&mut target.cache_enabled, patch.cache_enabled);
            assign(&mut target.cache_ttl_secs, patch.cache_ttl_secs);
            assign(&mut target.trend_window_days, patch.trend_window_days);
        }

        if let Some(patch) = logging {
            assign(&mut self.logging.level, patch.level);
            assign(&mut self.logging.format, patch.format);
        }
    }

    /// `STOREFRONT_*` variables; the first set key of each alias list wins.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        override_from_env(&mut self.database.url, &["STOREFRONT_DATABASE_URL"])?;
        override_from_env(
            &mut self.database.max_connections,
            &["STOREFRONT_DATABASE_MAX_CONNECTIONS"],
        )?;
        override_from_env(&mut self.database.timeout_secs, &["STOREFRONT_DATABASE_TIMEOUT_SECS"])?;

        override_from_env(&mut self.server.bind_address, &["STOREFRONT_SERVER_BIND_ADDRESS"])?;
        override_from_env(&mut self.server.port, &["STOREFRONT_SERVER_PORT"])?;
        override_from_env(
            &mut self.server.graceful_shutdown_secs,
            &["STOREFRONT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        )?;

        let recommendations = &mut self.recommendations;
        override_from_env(
            &mut recommendations.default_limit,
            &["STOREFRONT_RECOMMENDATIONS_DEFAULT_LIMIT"],
        )?;
        override_from_env(
            &mut recommendations.strategy_timeout_ms,
            &["STOREFRONT_RECOMMENDATIONS_STRATEGY_TIMEOUT_MS"],
        )?;
        override_from_env(
            &mut recommendations.cache_enabled,
            &["STOREFRONT_RECOMMENDATIONS_CACHE_ENABLED"],
        )?;
        override_from_env(
            &mut recommendations.cache_ttl_secs,
            &["STOREFRONT_RECOMMENDATIONS_CACHE_TTL_SECS"],
        )?;
        override_from_env(
            &mut recommendations.trend_window_days,
            &["STOREFRONT_RECOMMENDATIONS_TREND_WINDOW_DAYS"],
        )?;

        override_from_env(
            &mut self.logging.level,
            &["STOREFRONT_LOGGING_LEVEL", "STOREFRONT_LOG_LEVEL"],
        )?;
        override_from_env(
            &mut self.logging.format,
            &["STOREFRONT_LOGGING_FORMAT", "STOREFRONT_LOG_FORMAT"],
        )
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(default_limit) = overrides.recommendation_default_limit {
            self.recommendations.default_limit = default_limit;
        }
        if let Some(cache_enabled) = overrides.recommendation_cache_enabled {
            self.recommendations.cache_enabled = cache_enabled;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_recommendations(&self.recommendations)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("storefront.toml"), PathBuf::from("config/storefront.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Expands `${VAR}` references from the process environment.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let reference = &rest[start + 2..];
        let end = reference.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &reference[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &reference[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_recommendations(recommendations: &RecommendationConfig) -> Result<(), ConfigError> {
    if recommendations.default_limit == 0
        || recommendations.default_limit > MAX_RECOMMENDATION_LIMIT
    {
        return Err(ConfigError::Validation(format!(
            "recommendations.default_limit must be in range 1..={MAX_RECOMMENDATION_LIMIT}"
        )));
    }

    if recommendations.strategy_timeout_ms == 0 || recommendations.strategy_timeout_ms > 60_000 {
        return Err(ConfigError::Validation(
            "recommendations.strategy_timeout_ms must be in range 1..=60000".to_string(),
        ));
    }

    if recommendations.cache_enabled && recommendations.cache_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "recommendations.cache_ttl_secs must be greater than zero when the cache is enabled"
                .to_string(),
        ));
    }

    if recommendations.trend_window_days <= 0 {
        return Err(ConfigError::Validation(
            "recommendations.trend_window_days must be greater than zero".to_string(),
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

fn assign<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn override_from_env<T: FromStr>(slot: &mut T, keys: &[&str]) -> Result<(), ConfigError> {
    let set = keys.iter().find_map(|key| {
        env::var(key).ok().filter(|value| !value.trim().is_empty()).map(|value| (*key, value))
    });
    let Some((key, value)) = set else {
        return Ok(());
    };

    *slot = value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.clone(),
    })?;
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    recommendations: Option<RecommendationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationPatch {
    default_limit: Option<usize>,
    strategy_timeout_ms: Option<u64>,
    cache_enabled: Option<bool>,
    cache_ttl_secs: Option<u64>,
    trend_window_days: Option<i64>,
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
    fn defaults_are_valid() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.recommendations.default_limit == 10, "default limit should be 10")?;
        ensure(config.recommendations.trend_window_days == 30, "trend window should be 30 days")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_STOREFRONT_DB", "sqlite://from-interpolation.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("storefront.toml");
            fs::write(
                &path,
                r#"
[database]
url = "${TEST_STOREFRONT_DB}"

[recommendations]
cache_ttl_secs = 120
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-interpolation.db",
                "database url should be interpolated from environment",
            )?;
            ensure(config.recommendations.cache_ttl_secs == 120, "cache ttl should come from file")
        })();

        clear_vars(&["TEST_STOREFRONT_DB"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STOREFRONT_LOG_LEVEL", "warn");
        env::set_var("STOREFRONT_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars(&["STOREFRONT_LOG_LEVEL", "STOREFRONT_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STOREFRONT_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("STOREFRONT_RECOMMENDATIONS_DEFAULT_LIMIT", "12");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("storefront.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[recommendations]
default_limit = 8
strategy_timeout_ms = 750

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.recommendations.default_limit == 12,
                "env default limit should win over file",
            )?;
            ensure(
                config.recommendations.strategy_timeout_ms == 750,
                "file timeout should win over default",
            )
        })();

        clear_vars(&["STOREFRONT_DATABASE_URL", "STOREFRONT_RECOMMENDATIONS_DEFAULT_LIMIT"]);
        result
    }

    #[test]
    fn invalid_env_override_is_reported_with_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STOREFRONT_RECOMMENDATIONS_CACHE_ENABLED", "sometimes");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid override failure".to_string()),
            Err(ConfigError::InvalidEnvOverride { key, .. }) => ensure(
                key == "STOREFRONT_RECOMMENDATIONS_CACHE_ENABLED",
                "error should name the offending variable",
            ),
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(&["STOREFRONT_RECOMMENDATIONS_CACHE_ENABLED"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = match AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                recommendation_default_limit: Some(500),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }) {
            Ok(_) => {
                return Err("expected validation failure but config load succeeded".to_string())
            }
            Err(error) => error,
        };

        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("recommendations.default_limit")
        );
        ensure(has_message, "validation failure should mention recommendations.default_limit")
    }

    #[test]
    fn non_sqlite_database_url_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://localhost/shop".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("database.url")),
            "non-sqlite url should fail validation",
        )
    }

    #[test]
    fn interpolation_errors_name_the_problem() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_STOREFRONT_UNSET"]);

        let missing = super::interpolate_env_vars("url = \"${TEST_STOREFRONT_UNSET}\"");
        ensure(
            matches!(missing, Err(ConfigError::MissingEnvInterpolation { ref var }) if var == "TEST_STOREFRONT_UNSET"),
            "missing variable should be named",
        )?;

        let unterminated = super::interpolate_env_vars("url = \"${OPEN");
        ensure(
            matches!(unterminated, Err(ConfigError::UnterminatedInterpolation)),
            "unterminated reference should fail",
        )?;

        ensure(
            super::interpolate_env_vars("plain $ text").map_err(|e| e.to_string())?
                == "plain $ text",
            "text without references is unchanged",
        )
    }
}
