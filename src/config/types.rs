use serde::Deserialize;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub defaults: Defaults,
}

// ---------------------------------------------------------------------------
// Backend endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the prediction backend, no trailing slash.
    pub base_url: String,
    pub user_id: String,
    /// Fallback bearer token. `PIPEWATCH_TOKEN` takes precedence.
    pub token: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_owned(),
            user_id: String::new(),
            token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Background poll interval. Also the TTL of the prediction cache.
    pub refetch_interval_minutes: u32,
    /// Page size for the commit feed.
    pub feed_page_size: u32,
    /// A webhook still `Pending` after this long is reported as failed
    /// locally; the next poll observing real server state wins.
    pub webhook_pending_expiry_minutes: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            refetch_interval_minutes: 10,
            feed_page_size: 5,
            webhook_pending_expiry_minutes: 10,
        }
    }
}
