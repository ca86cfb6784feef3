use std::net::SocketAddr;

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
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Shared secret required on the cron trigger endpoints.
    pub cron_secret: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub ai_base_url: String,
    pub ai_api_key: Option<String>,
    /// Timeout for text generation calls.
    pub ai_request_timeout_secs: u64,
    /// Timeout for image/video/html generation calls; media generation is
    /// minutes-scale, so this is much longer than the text timeout.
    pub ai_generation_timeout_secs: u64,
    pub ai_max_retries: u32,
    pub ai_retry_backoff_base_ms: u64,
    pub linkedin_base_url: String,
    pub linkedin_client_id: Option<String>,
    pub linkedin_client_secret: Option<String>,
    pub publish_request_timeout_secs: u64,
    pub media_download_timeout_secs: u64,
    pub default_provider: String,
    pub default_model: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("cron_secret", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("ai_base_url", &self.ai_base_url)
            .field("ai_api_key", &self.ai_api_key.as_ref().map(|_| "[redacted]"))
            .field("ai_request_timeout_secs", &self.ai_request_timeout_secs)
            .field(
                "ai_generation_timeout_secs",
                &self.ai_generation_timeout_secs,
            )
            .field("ai_max_retries", &self.ai_max_retries)
            .field("ai_retry_backoff_base_ms", &self.ai_retry_backoff_base_ms)
            .field("linkedin_base_url", &self.linkedin_base_url)
            .field(
                "linkedin_client_id",
                &self.linkedin_client_id.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "linkedin_client_secret",
                &self.linkedin_client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "publish_request_timeout_secs",
                &self.publish_request_timeout_secs,
            )
            .field(
                "media_download_timeout_secs",
                &self.media_download_timeout_secs,
            )
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .finish()
    }
}
