//! Transport configuration

use serde::Deserialize;

/// Outbound proxy settings
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Proxy {
    /// Proxy for `http://` targets
    pub http_url: Option<String>,
    /// Proxy for `https://` targets
    pub https_url: Option<String>,
    /// Seconds an idle pooled connection is kept open
    pub idle_pool_connection_timeout: Option<u64>,
}
