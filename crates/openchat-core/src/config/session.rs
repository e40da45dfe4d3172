//! Session token configuration.

use serde::{Deserialize, Serialize};

/// Session token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie presented on HTTP and upgrade requests.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Token lifetime in hours.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: u64,
    /// Whether issued cookies carry the `Secure` attribute.
    #[serde(default = "default_true")]
    pub secure_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            token_ttl_hours: default_token_ttl(),
            secure_cookies: true,
        }
    }
}

fn default_cookie_name() -> String {
    "openchat_session".to_string()
}

fn default_token_ttl() -> u64 {
    720
}

fn default_true() -> bool {
    true
}
