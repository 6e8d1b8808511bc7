use serde::Deserialize;

/// Main configuration structure for kumo
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Seed URLs the crawl starts from
    pub seeds: Vec<String>,

    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum delay between consecutive outbound requests (seconds)
    #[serde(rename = "delay-seconds", default = "default_delay_seconds")]
    pub delay_seconds: f64,

    /// Maximum number of pages to visit in one run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum link depth from a seed; unlimited when absent
    #[serde(rename = "max-depth", default)]
    pub max_depth: Option<u32>,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-seconds", default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// User agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Whether crawled pages are persisted at all
    #[serde(default = "default_storage_enabled")]
    pub enabled: bool,

    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

/// HTTP API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the API server binds to
    #[serde(rename = "bind-address", default = "default_bind_address")]
    pub bind_address: String,
}

/// Export output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path for the delimited-text export, if any
    #[serde(rename = "text-path", default)]
    pub text_path: Option<String>,

    /// Path for the JSON export, if any
    #[serde(rename = "json-path", default)]
    pub json_path: Option<String>,
}

fn default_delay_seconds() -> f64 {
    1.0
}

fn default_max_pages() -> usize {
    10
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_storage_enabled() -> bool {
    true
}

fn default_database_path() -> String {
    "./kumo.db".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            delay_seconds: default_delay_seconds(),
            max_pages: default_max_pages(),
            max_depth: None,
            request_timeout_seconds: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: default_storage_enabled(),
            database_path: default_database_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}
