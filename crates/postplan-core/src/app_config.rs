use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub r2_endpoint_url: String,
    pub r2_access_key_id: String,
    pub r2_secret_access_key: String,
    pub r2_region: String,
    pub data_bucket: String,
    pub tasks_bucket: String,
    pub content_plan_path: PathBuf,
    pub storage_max_attempts: u32,
    pub storage_min_wait_secs: u64,
    pub storage_max_wait_secs: u64,
    pub request_timeout_secs: u64,
    pub queue_poll_cron: String,
    pub default_results_limit: u32,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub apify_api_token: Option<String>,
    pub apify_base_url: String,
    pub apify_actor_id: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("r2_endpoint_url", &self.r2_endpoint_url)
            .field("r2_access_key_id", &"[redacted]")
            .field("r2_secret_access_key", &"[redacted]")
            .field("r2_region", &self.r2_region)
            .field("data_bucket", &self.data_bucket)
            .field("tasks_bucket", &self.tasks_bucket)
            .field("content_plan_path", &self.content_plan_path)
            .field("storage_max_attempts", &self.storage_max_attempts)
            .field("storage_min_wait_secs", &self.storage_min_wait_secs)
            .field("storage_max_wait_secs", &self.storage_max_wait_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("queue_poll_cron", &self.queue_poll_cron)
            .field("default_results_limit", &self.default_results_limit)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field(
                "apify_api_token",
                &self.apify_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("apify_base_url", &self.apify_base_url)
            .field("apify_actor_id", &self.apify_actor_id)
            .finish()
    }
}
