use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("R2_ENDPOINT_URL", "https://account.r2.cloudflarestorage.com");
    m.insert("R2_ACCESS_KEY_ID", "test-access-key");
    m.insert("R2_SECRET_ACCESS_KEY", "test-secret-key");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(parse_environment("development"), Environment::Development);
    assert_eq!(parse_environment("test"), Environment::Test);
    assert_eq!(parse_environment("production"), Environment::Production);
}

#[test]
fn parse_environment_unknown_defaults_to_development() {
    assert_eq!(parse_environment("staging"), Environment::Development);
}

#[test]
fn build_app_config_fails_without_r2_endpoint() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "R2_ENDPOINT_URL"),
        "expected MissingEnvVar(R2_ENDPOINT_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_secret_as_missing() {
    let mut map = full_env();
    map.insert("R2_SECRET_ACCESS_KEY", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "R2_SECRET_ACCESS_KEY"),
        "expected MissingEnvVar(R2_SECRET_ACCESS_KEY), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).expect("config");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.r2_region, "auto");
    assert_eq!(cfg.data_bucket, "structuredb");
    assert_eq!(cfg.tasks_bucket, "tasks");
    assert_eq!(cfg.content_plan_path.to_str(), Some("content_plan.json"));
    assert_eq!(cfg.storage_max_attempts, 3);
    assert_eq!(cfg.storage_min_wait_secs, 2);
    assert_eq!(cfg.storage_max_wait_secs, 10);
    assert_eq!(cfg.request_timeout_secs, 60);
    assert_eq!(cfg.queue_poll_cron, "0 */5 * * * *");
    assert_eq!(cfg.default_results_limit, 10);
    assert!(cfg.gemini_api_key.is_none());
    assert_eq!(cfg.gemini_model, "gemini-2.0-flash");
    assert!(cfg.apify_api_token.is_none());
    assert_eq!(cfg.apify_base_url, "https://api.apify.com/v2");
}

#[test]
fn build_app_config_reads_optional_secrets() {
    let mut map = full_env();
    map.insert("GEMINI_API_KEY", "gem-key");
    map.insert("APIFY_API_TOKEN", "apify-token");
    let cfg = build_app_config(lookup_from_map(&map)).expect("config");
    assert_eq!(cfg.gemini_api_key.as_deref(), Some("gem-key"));
    assert_eq!(cfg.apify_api_token.as_deref(), Some("apify-token"));
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = full_env();
    map.insert("POSTPLAN_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSTPLAN_BIND_ADDR"),
        "expected InvalidEnvVar(POSTPLAN_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_storage_attempts() {
    let mut map = full_env();
    map.insert("POSTPLAN_STORAGE_MAX_ATTEMPTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSTPLAN_STORAGE_MAX_ATTEMPTS"),
        "expected InvalidEnvVar(POSTPLAN_STORAGE_MAX_ATTEMPTS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_inverted_wait_bounds() {
    let mut map = full_env();
    map.insert("POSTPLAN_STORAGE_MIN_WAIT_SECS", "20");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSTPLAN_STORAGE_MIN_WAIT_SECS"),
        "expected InvalidEnvVar(POSTPLAN_STORAGE_MIN_WAIT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_results_limit_invalid() {
    let mut map = full_env();
    map.insert("POSTPLAN_RESULTS_LIMIT", "ten");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSTPLAN_RESULTS_LIMIT"),
        "expected InvalidEnvVar(POSTPLAN_RESULTS_LIMIT), got: {result:?}"
    );
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = full_env();
    map.insert("GEMINI_API_KEY", "gem-key");
    let cfg = build_app_config(lookup_from_map(&map)).expect("config");
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("test-secret-key"));
    assert!(!rendered.contains("test-access-key"));
    assert!(!rendered.contains("gem-key"));
    assert!(rendered.contains("[redacted]"));
}
