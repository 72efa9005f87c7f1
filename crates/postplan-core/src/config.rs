use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let r2_endpoint_url = require("R2_ENDPOINT_URL")?;
    let r2_access_key_id = require("R2_ACCESS_KEY_ID")?;
    let r2_secret_access_key = require("R2_SECRET_ACCESS_KEY")?;

    let env = parse_environment(&or_default("POSTPLAN_ENV", "development"));
    let bind_addr = parse("POSTPLAN_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("POSTPLAN_LOG_LEVEL", "info");

    let r2_region = or_default("R2_REGION", "auto");
    let data_bucket = or_default("POSTPLAN_DATA_BUCKET", "structuredb");
    let tasks_bucket = or_default("POSTPLAN_TASKS_BUCKET", "tasks");
    let content_plan_path =
        PathBuf::from(or_default("POSTPLAN_CONTENT_PLAN_PATH", "content_plan.json"));

    let storage_max_attempts = parse_u32("POSTPLAN_STORAGE_MAX_ATTEMPTS", "3")?;
    if storage_max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "POSTPLAN_STORAGE_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let storage_min_wait_secs = parse_u64("POSTPLAN_STORAGE_MIN_WAIT_SECS", "2")?;
    let storage_max_wait_secs = parse_u64("POSTPLAN_STORAGE_MAX_WAIT_SECS", "10")?;
    if storage_min_wait_secs > storage_max_wait_secs {
        return Err(ConfigError::InvalidEnvVar {
            var: "POSTPLAN_STORAGE_MIN_WAIT_SECS".to_string(),
            reason: format!(
                "{storage_min_wait_secs} exceeds POSTPLAN_STORAGE_MAX_WAIT_SECS ({storage_max_wait_secs})"
            ),
        });
    }

    let request_timeout_secs = parse_u64("POSTPLAN_REQUEST_TIMEOUT_SECS", "60")?;
    let queue_poll_cron = or_default("POSTPLAN_QUEUE_POLL_CRON", "0 */5 * * * *");
    let default_results_limit = parse_u32("POSTPLAN_RESULTS_LIMIT", "10")?;

    let gemini_api_key = optional("GEMINI_API_KEY");
    let gemini_model = or_default("GEMINI_MODEL", "gemini-2.0-flash");
    let gemini_base_url = or_default(
        "GEMINI_BASE_URL",
        "https://generativelanguage.googleapis.com",
    );

    let apify_api_token = optional("APIFY_API_TOKEN");
    let apify_base_url = or_default("APIFY_BASE_URL", "https://api.apify.com/v2");
    let apify_actor_id = or_default("APIFY_ACTOR_ID", "apify~instagram-profile-scraper");

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        r2_endpoint_url,
        r2_access_key_id,
        r2_secret_access_key,
        r2_region,
        data_bucket,
        tasks_bucket,
        content_plan_path,
        storage_max_attempts,
        storage_min_wait_secs,
        storage_max_wait_secs,
        request_timeout_secs,
        queue_poll_cron,
        default_results_limit,
        gemini_api_key,
        gemini_model,
        gemini_base_url,
        apify_api_token,
        apify_base_url,
        apify_actor_id,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
