// ABOUTME: Thin wrapper over the oauth2 crate's BasicClient used by every strategy
// ABOUTME: Builds authorization redirects and runs the code exchange and refresh grants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors

//! # OAuth 2.0 Client
//!
//! The protocol engine is the `oauth2` crate. This module only turns
//! [`OAuth2Options`] into a configured `BasicClient`, and converts its token
//! responses and errors into [`OAuth2Token`] and [`StrategyError`].

use chrono::{DateTime, Duration, Utc};
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, HttpClientError, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken,
    RequestTokenError, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::errors::{StrategyError, StrategyResult};
use crate::http_client::shared_client;
use crate::provider::ParamMap;

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

type TokenRequestError = RequestTokenError<HttpClientError<reqwest::Error>, BasicErrorResponse>;

/// OAuth 2.0 client configuration shared by every strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Options {
    /// OAuth client ID issued by the provider
    pub client_id: String,
    /// OAuth client secret issued by the provider
    pub client_secret: String,
    /// Redirect URI registered with the provider
    pub callback_url: String,
    /// Authorization endpoint URL
    pub authorization_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Scopes requested when the caller does not override them
    #[serde(default)]
    pub scope: Vec<String>,
    /// Separator used to join scopes in the authorization request
    #[serde(default = "default_scope_separator")]
    pub scope_separator: String,
    /// Use PKCE (S256) for the code exchange
    #[serde(default)]
    pub use_pkce: bool,
}

fn default_scope_separator() -> String {
    " ".to_owned()
}

impl OAuth2Options {
    /// Reject configurations the token exchange could never succeed with
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty client ID and `InvalidUrl` for
    /// endpoints that do not parse
    pub fn validate(&self) -> StrategyResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(StrategyError::InvalidConfig {
                field: "client_id",
                reason: "must not be empty".to_owned(),
            });
        }
        Url::parse(&self.authorization_url)?;
        Url::parse(&self.token_url)?;
        Ok(())
    }
}

/// OAuth 2.0 access token as issued by the token endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth2Token {
    /// The access token string
    pub access_token: String,
    /// Token type (usually "bearer")
    pub token_type: String,
    /// Expiration timestamp (UTC), absent when unknown or unrepresentable
    pub expires_at: Option<DateTime<Utc>>,
    /// Refresh token, when the provider issued one
    pub refresh_token: Option<String>,
    /// Granted scopes as reported by the provider
    pub scope: Option<String>,
    /// Complete token response
    pub params: Map<String, Value>,
}

impl OAuth2Token {
    /// Check if the token is expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now())
    }

    /// Check if the token will expire within 5 minutes
    #[must_use]
    pub fn will_expire_soon(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now() + Duration::minutes(5))
    }
}

/// Authorization URL plus the secrets the callback leg needs back
#[derive(Debug, Clone)]
pub struct AuthorizationRedirect {
    /// Where to send the user agent
    pub url: Url,
    /// CSRF `state` sent with the request
    pub state: String,
    /// PKCE verifier, when PKCE is enabled
    pub code_verifier: Option<String>,
}

/// OAuth 2.0 client bound to one set of options
#[derive(Debug, Clone)]
pub struct OAuth2Client {
    options: OAuth2Options,
    inner: ConfiguredClient,
    http: reqwest::Client,
}

impl OAuth2Client {
    /// Create a client using the shared HTTP client
    ///
    /// # Errors
    ///
    /// Returns an error if the options fail validation
    pub fn new(options: OAuth2Options) -> StrategyResult<Self> {
        options.validate()?;

        let mut inner = BasicClient::new(ClientId::new(options.client_id.clone()))
            .set_auth_uri(AuthUrl::new(options.authorization_url.clone())?)
            .set_token_uri(TokenUrl::new(options.token_url.clone())?)
            .set_auth_type(AuthType::RequestBody);
        if !options.client_secret.is_empty() {
            inner = inner.set_client_secret(ClientSecret::new(options.client_secret.clone()));
        }
        if !options.callback_url.is_empty() {
            inner = inner.set_redirect_uri(RedirectUrl::new(options.callback_url.clone())?);
        }

        Ok(Self {
            options,
            inner,
            http: shared_client().clone(),
        })
    }

    /// Replace the HTTP client (custom timeouts, user agent, tests)
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Options this client was built with
    #[must_use]
    pub const fn options(&self) -> &OAuth2Options {
        &self.options
    }

    /// Build the authorization redirect with a fresh `state` (and PKCE pair)
    ///
    /// Scopes are joined with the configured separator into a single `scope`
    /// value; an empty list leaves `scope` off the URL.
    #[must_use]
    pub fn authorize(&self, scope: &[String], extra_params: &ParamMap) -> AuthorizationRedirect {
        let mut request = self.inner.authorize_url(CsrfToken::new_random);

        if !scope.is_empty() {
            request = request.add_scope(Scope::new(scope.join(&self.options.scope_separator)));
        }

        let code_verifier = if self.options.use_pkce {
            let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
            request = request.set_pkce_challenge(challenge);
            Some(verifier.into_secret())
        } else {
            None
        };

        for (name, value) in extra_params {
            request = request.add_extra_param(name.clone(), value.clone());
        }

        let (url, state) = request.url();
        AuthorizationRedirect {
            url,
            state: state.into_secret(),
            code_verifier,
        }
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    ///
    /// Returns an error if the token request fails or the response is unusable
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> StrategyResult<OAuth2Token> {
        let mut request = self
            .inner
            .exchange_code(AuthorizationCode::new(code.to_owned()));
        if let Some(verifier) = code_verifier {
            request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_owned()));
        }

        let response = request
            .request_async(&self.http)
            .await
            .map_err(token_error)?;
        debug!("authorization code exchanged");
        Ok(token_from_response(&response, Utc::now()))
    }

    /// Exchange a refresh token for a new access token
    ///
    /// # Errors
    ///
    /// Returns an error if the token request fails or the response is unusable
    pub async fn refresh_token(&self, refresh_token: &str) -> StrategyResult<OAuth2Token> {
        let refresh_token = RefreshToken::new(refresh_token.to_owned());
        let response = self
            .inner
            .exchange_refresh_token(&refresh_token)
            .request_async(&self.http)
            .await
            .map_err(token_error)?;
        debug!("access token refreshed");
        Ok(token_from_response(&response, Utc::now()))
    }
}

fn token_error(error: TokenRequestError) -> StrategyError {
    match error {
        RequestTokenError::ServerResponse(response) => {
            warn!(error = %response.error(), "token endpoint rejected the request");
            StrategyError::TokenRejected {
                error: response.error().to_string(),
                description: response.error_description().cloned(),
            }
        }
        RequestTokenError::Request(HttpClientError::Reqwest(source)) => {
            warn!(error = %source, "token request failed");
            StrategyError::Http(*source)
        }
        RequestTokenError::Parse(source, body) => {
            warn!(error = %source, "token endpoint response did not parse");
            StrategyError::TokenExchange {
                reason: format!("{source}: {}", String::from_utf8_lossy(&body)),
            }
        }
        other => {
            warn!(error = %other, "token request failed");
            StrategyError::TokenExchange {
                reason: other.to_string(),
            }
        }
    }
}

fn token_from_response(response: &BasicTokenResponse, issued_at: DateTime<Utc>) -> OAuth2Token {
    let params = match serde_json::to_value(response) {
        Ok(Value::Object(params)) => params,
        _ => Map::new(),
    };
    let text = |name: &str| params.get(name).and_then(Value::as_str).map(str::to_owned);

    OAuth2Token {
        access_token: response.access_token().secret().clone(),
        token_type: text("token_type").unwrap_or_else(|| "bearer".to_owned()),
        expires_at: response
            .expires_in()
            .and_then(|lifetime| expiry_after(issued_at, lifetime)),
        refresh_token: response.refresh_token().map(|token| token.secret().clone()),
        scope: text("scope"),
        params,
    }
}

/// `None` when the lifetime runs past what `DateTime` can represent
fn expiry_after(
    issued_at: DateTime<Utc>,
    lifetime: std::time::Duration,
) -> Option<DateTime<Utc>> {
    let lifetime = Duration::from_std(lifetime).ok()?;
    issued_at.checked_add_signed(lifetime)
}
