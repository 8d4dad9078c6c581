// ABOUTME: Shared HTTP client for token exchange and identity-provider API calls
// ABOUTME: Pooled singleton whose timeouts and user agent are fixed once at host startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors

use reqwest::{redirect, Client, ClientBuilder};
use std::sync::OnceLock;
use std::time::Duration;

/// Settings applied to the shared client when it is first built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientSettings {
    /// Whole-request timeout
    pub timeout: Duration,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("oauth2-strategy/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl HttpClientSettings {
    /// Same settings under another `User-Agent`
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build a standalone client from these settings
    ///
    /// Redirects are never followed: token and API endpoints answer directly.
    #[must_use]
    pub fn build_client(&self) -> Client {
        ClientBuilder::new()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.clone())
            .redirect(redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| Client::new())
    }
}

static CLIENT_SETTINGS: OnceLock<HttpClientSettings> = OnceLock::new();

static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Fix the shared client's settings
///
/// Only the first call wins, and only if it happens before the first request.
/// Returns `false` when settings were already in place.
pub fn initialize_shared_client(settings: HttpClientSettings) -> bool {
    CLIENT_SETTINGS.set(settings).is_ok()
}

/// Settings in effect for the shared client, for building derived clients
#[must_use]
pub fn shared_settings() -> HttpClientSettings {
    CLIENT_SETTINGS
        .get_or_init(HttpClientSettings::default)
        .clone()
}

/// Shared pooled client used by strategies that were not given their own
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| shared_settings().build_client())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_user_agent_keeps_timeouts() {
        let settings = HttpClientSettings::default().with_user_agent("custom/1.0");
        assert_eq!(settings.user_agent, "custom/1.0");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
    }
}
