use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use storefront_cli::commands::recommend::RecommendArgs;
use storefront_cli::commands::{config, migrate, recommend, seed};
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    let dir = TempDir::new().expect("temp dir");
    let url = database_url(&dir);

    with_env(&[("STOREFRONT_DATABASE_URL", &url)], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_invalid_env() {
    with_env(&[("STOREFRONT_RECOMMENDATIONS_CACHE_ENABLED", "sometimes")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = TempDir::new().expect("temp dir");
    let url = database_url(&dir);

    with_env(&[("STOREFRONT_DATABASE_URL", &url)], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "first seed failed: {}", first.output);
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["command"], "seed");
        let message = first_payload["message"].as_str().expect("message");
        assert!(message.contains("product: 10 rows"), "unexpected message: {message}");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "second seed failed: {}", second.output);
        assert_eq!(parse_payload(&second.output)["message"], first_payload["message"]);
    });
}

#[test]
fn recommend_reads_the_seeded_catalog() {
    let dir = TempDir::new().expect("temp dir");
    let url = database_url(&dir);

    with_env(&[("STOREFRONT_DATABASE_URL", &url)], || {
        assert_eq!(seed::run().exit_code, 0);

        let result = recommend::run(RecommendArgs {
            kind: "co-purchase".to_string(),
            product: Some(1),
            ..RecommendArgs::default()
        });
        assert_eq!(result.exit_code, 0, "recommend failed: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["kind"], "co-purchase");
        let ids = payload["data"]["products"]
            .as_array()
            .expect("products array")
            .iter()
            .map(|product| product["id"].as_i64().expect("numeric id"))
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![5, 8]);
    });
}

#[test]
fn recommend_rejects_unknown_kind_before_touching_the_database() {
    with_env(&[], || {
        let result = recommend::run(RecommendArgs {
            kind: "bestsellers".to_string(),
            product: Some(1),
            ..RecommendArgs::default()
        });
        assert_eq!(result.exit_code, 6);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "recommend");
        assert_eq!(payload["error_class"], "invalid_input");
    });
}

#[test]
fn config_reports_env_attribution() {
    with_env(&[("STOREFRONT_RECOMMENDATIONS_DEFAULT_LIMIT", "7")], || {
        let output = config::run();

        assert!(output.starts_with("effective config"));
        assert!(output.contains(
            "- recommendations.default_limit = 7 \
             (source: env (STOREFRONT_RECOMMENDATIONS_DEFAULT_LIMIT))"
        ));
    });
}

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("storefront.db").display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "STOREFRONT_DATABASE_URL",
        "STOREFRONT_DATABASE_MAX_CONNECTIONS",
        "STOREFRONT_DATABASE_TIMEOUT_SECS",
        "STOREFRONT_SERVER_BIND_ADDRESS",
        "STOREFRONT_SERVER_PORT",
        "STOREFRONT_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "STOREFRONT_RECOMMENDATIONS_DEFAULT_LIMIT",
        "STOREFRONT_RECOMMENDATIONS_STRATEGY_TIMEOUT_MS",
        "STOREFRONT_RECOMMENDATIONS_CACHE_ENABLED",
        "STOREFRONT_RECOMMENDATIONS_CACHE_TTL_SECS",
        "STOREFRONT_RECOMMENDATIONS_TREND_WINDOW_DAYS",
        "STOREFRONT_LOGGING_LEVEL",
        "STOREFRONT_LOGGING_FORMAT",
        "STOREFRONT_LOG_LEVEL",
        "STOREFRONT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
