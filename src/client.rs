// ABOUTME: Coinbase API client scoped to one access token
// ABOUTME: Fetches the current user record; the factory seam lets tests substitute a fake client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors

use std::sync::OnceLock;

use async_trait::async_trait;
use oauth2_strategy::shared_settings;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::{api, USER_AGENT};

static COINBASE_CLIENT: OnceLock<Client> = OnceLock::new();

/// Pooled client for Coinbase calls: shared timeouts, Coinbase user agent
#[must_use]
pub fn coinbase_http_client() -> Client {
    COINBASE_CLIENT
        .get_or_init(|| shared_settings().with_user_agent(USER_AGENT).build_client())
        .clone()
}

/// Failures talking to the Coinbase API
#[derive(Debug, thiserror::Error)]
pub enum CoinbaseApiError {
    /// The request never produced a response
    #[error("request to Coinbase API failed")]
    Http(#[from] reqwest::Error),

    /// Coinbase answered with a non-success status
    #[error("Coinbase API returned {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// First error message reported by Coinbase, or the raw body
        message: String,
    },

    /// The response was not the expected `{"data": {...}}` envelope
    #[error("malformed Coinbase API response: {reason}")]
    MalformedResponse {
        /// What was wrong with it
        reason: String,
    },
}

/// Operations of the Coinbase API used during login
#[async_trait]
pub trait CoinbaseApi: Send + Sync {
    /// Fetch the record of the user owning the access token
    async fn get_current_user(&self) -> Result<Value, CoinbaseApiError>;
}

/// Builds an API client for a given access token
///
/// Strategies hold one of these so tests can inject a fake client.
pub trait CoinbaseClientFactory: Send + Sync {
    /// Client scoped to `access_token`
    fn create(&self, access_token: &str) -> Box<dyn CoinbaseApi>;
}

impl<F> CoinbaseClientFactory for F
where
    F: Fn(&str) -> Box<dyn CoinbaseApi> + Send + Sync,
{
    fn create(&self, access_token: &str) -> Box<dyn CoinbaseApi> {
        self(access_token)
    }
}

/// Coinbase v2 REST client
#[derive(Debug, Clone)]
pub struct CoinbaseClient {
    http: Client,
    access_token: String,
    user_profile_url: String,
}

impl CoinbaseClient {
    /// Client for `access_token` calling `user_profile_url` for the current user
    #[must_use]
    pub fn new(
        http: Client,
        access_token: impl Into<String>,
        user_profile_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            access_token: access_token.into(),
            user_profile_url: user_profile_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    message: String,
}

#[async_trait]
impl CoinbaseApi for CoinbaseClient {
    async fn get_current_user(&self) -> Result<Value, CoinbaseApiError> {
        let response = self
            .http
            .get(&self.user_profile_url)
            .bearer_auth(&self.access_token)
            .header(api::VERSION_HEADER, api::VERSION)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Coinbase current-user request failed");
            return Err(CoinbaseApiError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let envelope: Value =
            serde_json::from_str(&body).map_err(|e| CoinbaseApiError::MalformedResponse {
                reason: e.to_string(),
            })?;

        match envelope {
            Value::Object(mut fields) => match fields.remove("data") {
                Some(user @ Value::Object(_)) => {
                    debug!("Coinbase current-user record received");
                    Ok(user)
                }
                Some(_) => Err(CoinbaseApiError::MalformedResponse {
                    reason: "'data' is not a JSON object".to_owned(),
                }),
                None => Err(CoinbaseApiError::MalformedResponse {
                    reason: "missing 'data' field".to_owned(),
                }),
            },
            _ => Err(CoinbaseApiError::MalformedResponse {
                reason: "expected a JSON object".to_owned(),
            }),
        }
    }
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.errors.into_iter().next())
        .map_or_else(|| body.to_owned(), |entry| entry.message)
}

/// Default factory producing HTTP clients against a fixed endpoint
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    http: Client,
    user_profile_url: String,
}

impl HttpClientFactory {
    /// Factory using [`coinbase_http_client`]
    #[must_use]
    pub fn new(user_profile_url: impl Into<String>) -> Self {
        Self {
            http: coinbase_http_client(),
            user_profile_url: user_profile_url.into(),
        }
    }

    /// Use a specific HTTP client
    #[must_use]
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }
}

impl CoinbaseClientFactory for HttpClientFactory {
    fn create(&self, access_token: &str) -> Box<dyn CoinbaseApi> {
        Box::new(CoinbaseClient::new(
            self.http.clone(),
            access_token,
            self.user_profile_url.clone(),
        ))
    }
}
