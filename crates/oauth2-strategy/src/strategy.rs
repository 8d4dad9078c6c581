// ABOUTME: Base OAuth 2.0 authorization-code strategy composed with a provider adapter
// ABOUTME: Drives the redirect and callback legs and dispatches to the verify callback
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors

//! # Authorization-Code Strategy
//!
//! `OAuth2Strategy` handles both legs of the flow through one entry point,
//! [`OAuth2Strategy::authenticate`]:
//!
//! 1. **Redirect leg**: the request carries neither `code` nor `error`. The
//!    strategy answers with [`AuthOutcome::Redirect`], carrying the
//!    authorization URL and a [`PendingAuthorization`] the host keeps in its
//!    session until the user comes back.
//! 2. **Callback leg**: the request carries `code` (or `error`). The strategy
//!    checks `state`, exchanges the code, loads the profile through the
//!    provider adapter and hands everything to the verify callback.
//!
//! Session storage is the host's job; the strategy never holds per-request
//! state, so one instance can serve concurrent requests behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use oauth2::CsrfToken;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::client::{AuthorizationRedirect, OAuth2Client, OAuth2Options, OAuth2Token};
use crate::errors::{StrategyError, StrategyResult};
use crate::profile::Profile;
use crate::provider::{AuthorizeOptions, OAuth2Provider, ParamMap};

/// OAuth 2.0 error code meaning the user declined
const ACCESS_DENIED: &str = "access_denied";

/// Values the host must keep between the redirect and callback legs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    /// `state` sent with the authorization request
    pub state: Option<String>,
    /// PKCE verifier matching the challenge that was sent
    pub code_verifier: Option<String>,
}

/// Incoming request as seen by the strategy
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    /// Query parameters of the request
    pub query: HashMap<String, String>,
    /// Values saved by the host when it issued the redirect
    pub pending: Option<PendingAuthorization>,
}

impl AuthRequest {
    /// Build a request from a raw query string (without the leading `?`)
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        Self {
            query: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            pending: None,
        }
    }

    /// Attach the values saved on the redirect leg
    #[must_use]
    pub fn with_pending(mut self, pending: PendingAuthorization) -> Self {
        self.pending = Some(pending);
        self
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// Result of one `authenticate` call
#[derive(Debug)]
pub enum AuthOutcome<U> {
    /// Send the user agent to `location` and remember `pending`
    Redirect {
        /// Authorization URL
        location: String,
        /// Values to store until the callback arrives
        pending: PendingAuthorization,
    },
    /// The verify callback accepted the user
    Success {
        /// Application user returned by the verify callback
        user: U,
    },
    /// Authentication did not succeed, without anything going wrong
    Fail {
        /// Reason suitable for showing to the user
        message: Option<String>,
    },
}

/// Everything the verify callback gets to decide on
#[derive(Debug, Clone)]
pub struct VerifyInput {
    /// Access token issued by the provider
    pub access_token: String,
    /// Refresh token, when issued
    pub refresh_token: Option<String>,
    /// Complete token response
    pub params: serde_json::Map<String, serde_json::Value>,
    /// Normalized profile, absent when the provider asked to skip it
    pub profile: Option<Profile>,
}

/// Decision returned by the verify callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome<U> {
    /// Sign the user in
    Success(U),
    /// Refuse, with an optional message
    Fail(Option<String>),
}

/// Application callback mapping a provider identity to an application user
#[async_trait]
pub trait Verify<U>: Send + Sync {
    /// Decide whether the authenticated provider user may sign in
    async fn verify(&self, input: VerifyInput) -> anyhow::Result<VerifyOutcome<U>>;
}

#[async_trait]
impl<U, F, Fut> Verify<U> for F
where
    U: Send + 'static,
    F: Fn(VerifyInput) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<VerifyOutcome<U>>> + Send + 'static,
{
    async fn verify(&self, input: VerifyInput) -> anyhow::Result<VerifyOutcome<U>> {
        self(input).await
    }
}

/// OAuth 2.0 authorization-code strategy extended by a provider adapter
pub struct OAuth2Strategy<P, U> {
    client: OAuth2Client,
    provider: P,
    verify: Arc<dyn Verify<U>>,
}

impl<P: fmt::Debug, U> fmt::Debug for OAuth2Strategy<P, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Strategy")
            .field("client", &self.client)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl<P, U> OAuth2Strategy<P, U>
where
    P: OAuth2Provider,
    U: Send + 'static,
{
    /// Compose the base flow with a provider adapter and verify callback
    ///
    /// # Errors
    ///
    /// Returns an error if the OAuth options fail validation
    pub fn new(
        options: OAuth2Options,
        provider: P,
        verify: impl Verify<U> + 'static,
    ) -> StrategyResult<Self> {
        Ok(Self {
            client: OAuth2Client::new(options)?,
            provider,
            verify: Arc::new(verify),
        })
    }

    /// Use a specific HTTP client for token requests
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.client = self.client.with_http_client(http);
        self
    }

    /// Strategy name hosts register this strategy under
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.provider.name()
    }

    /// The provider adapter
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Mutable access to the provider adapter
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// The underlying OAuth 2.0 client
    #[must_use]
    pub const fn client(&self) -> &OAuth2Client {
        &self.client
    }

    /// Fetch the normalized profile for an access token
    ///
    /// # Errors
    ///
    /// Returns whatever the provider adapter reports
    pub async fn user_profile(&self, access_token: &str) -> StrategyResult<Profile> {
        self.provider.user_profile(access_token).await
    }

    /// Provider-specific authorization parameters for a request
    #[must_use]
    pub fn authorization_params(&self, options: &AuthorizeOptions) -> ParamMap {
        self.provider.authorization_params(options)
    }

    /// Exchange a refresh token for a new access token
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint rejects the request
    pub async fn refresh(&self, refresh_token: &str) -> StrategyResult<OAuth2Token> {
        self.client.refresh_token(refresh_token).await
    }

    /// Handle one request of the authorization-code flow
    ///
    /// # Errors
    ///
    /// Returns an error for provider-reported failures other than a refusal,
    /// token endpoint failures, profile failures and verify callback errors
    pub async fn authenticate(
        &self,
        request: &AuthRequest,
        options: &AuthorizeOptions,
    ) -> StrategyResult<AuthOutcome<U>> {
        if let Some(code) = request.param("error") {
            return self.authorization_error(request, code);
        }

        match request.param("code") {
            Some(code) => self.complete(request, code).await,
            None => Ok(self.redirect(options)),
        }
    }

    fn redirect(&self, options: &AuthorizeOptions) -> AuthOutcome<U> {
        let scope = options
            .scope
            .as_deref()
            .unwrap_or(&self.client.options().scope);
        let extra_params = self.provider.authorization_params(options);

        let AuthorizationRedirect {
            url,
            state,
            code_verifier,
        } = self.client.authorize(scope, &extra_params);

        info!(strategy = self.name(), "redirecting to authorization endpoint");
        AuthOutcome::Redirect {
            location: url.into(),
            pending: PendingAuthorization {
                state: Some(state),
                code_verifier,
            },
        }
    }

    fn authorization_error(
        &self,
        request: &AuthRequest,
        code: &str,
    ) -> StrategyResult<AuthOutcome<U>> {
        let description = request.param("error_description").map(str::to_owned);
        if code == ACCESS_DENIED {
            info!(strategy = self.name(), "user denied authorization");
            return Ok(AuthOutcome::Fail {
                message: description,
            });
        }

        warn!(strategy = self.name(), error = code, "authorization server returned an error");
        Err(StrategyError::Authorization {
            code: code.to_owned(),
            description,
            uri: request.param("error_uri").map(str::to_owned),
        })
    }

    async fn complete(&self, request: &AuthRequest, code: &str) -> StrategyResult<AuthOutcome<U>> {
        let config = self.client.options();
        let pending = request.pending.as_ref();

        let Some(expected) = pending.and_then(|p| p.state.as_deref()) else {
            warn!(strategy = self.name(), "no pending state for callback");
            return Ok(fail("Unable to verify authorization request state."));
        };
        if !states_match(expected, request.param("state")) {
            warn!(strategy = self.name(), "callback state mismatch");
            return Ok(fail("Invalid authorization request state."));
        }

        let code_verifier = if config.use_pkce {
            let Some(verifier) = pending.and_then(|p| p.code_verifier.as_deref()) else {
                return Ok(fail("Missing PKCE code verifier."));
            };
            Some(verifier)
        } else {
            None
        };

        let token = self.client.exchange_code(code, code_verifier).await?;

        let profile = if self.provider.skip_user_profile() {
            debug!(strategy = self.name(), "skipping user profile for requested scopes");
            None
        } else {
            Some(self.provider.user_profile(&token.access_token).await?)
        };

        let OAuth2Token {
            access_token,
            refresh_token,
            params,
            ..
        } = token;
        let input = VerifyInput {
            access_token,
            refresh_token,
            params,
            profile,
        };

        match self.verify.verify(input).await.map_err(StrategyError::Verify)? {
            VerifyOutcome::Success(user) => {
                info!(strategy = self.name(), "authentication succeeded");
                Ok(AuthOutcome::Success { user })
            }
            VerifyOutcome::Fail(message) => Ok(AuthOutcome::Fail { message }),
        }
    }
}

fn fail<U>(message: &str) -> AuthOutcome<U> {
    AuthOutcome::Fail {
        message: Some(message.to_owned()),
    }
}

/// Constant-time comparison through `CsrfToken`'s `PartialEq`
fn states_match(expected: &str, actual: Option<&str>) -> bool {
    actual.is_some_and(|actual| {
        CsrfToken::new(expected.to_owned()) == CsrfToken::new(actual.to_owned())
    })
}
