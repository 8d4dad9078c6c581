// ABOUTME: Construction-time configuration for the Coinbase strategy
// ABOUTME: Applies endpoint defaults and keeps optional authorization settings distinguishable from unset
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors

//! # Strategy Configuration
//!
//! `CoinbaseStrategyOptions` is what callers fill in. Every optional field is
//! an `Option`, so "not provided" stays distinct from a provided zero or empty
//! value. `into_parts` splits the options into the generic OAuth 2.0 options
//! consumed by the base strategy and the Coinbase-only settings kept by the
//! adapter, applying defaults on the way.
//!
//! Options can also be loaded from `COINBASE_*` environment variables, see
//! [`CoinbaseStrategyOptions::from_env`].

use std::env;
use std::fmt;
use std::str::FromStr;

use oauth2_strategy::{OAuth2Options, StrategyError, StrategyResult};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::constants::{endpoints, env_config, USER_SCOPE};

/// Caller-supplied strategy options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinbaseStrategyOptions {
    /// OAuth client ID
    #[serde(alias = "clientID")]
    pub client_id: String,
    /// OAuth client secret
    #[serde(alias = "clientSecret")]
    pub client_secret: String,
    /// Redirect URI registered with Coinbase
    #[serde(alias = "callbackURL")]
    pub callback_url: String,
    /// Requested scopes
    #[serde(default)]
    pub scope: Vec<String>,
    /// Authorization endpoint override
    #[serde(default, alias = "authorizationURL")]
    pub authorization_url: Option<String>,
    /// Token endpoint override
    #[serde(default, alias = "tokenURL")]
    pub token_url: Option<String>,
    /// Scope separator override
    #[serde(default, alias = "scopeSeparator")]
    pub scope_separator: Option<String>,
    /// Current-user endpoint override
    #[serde(default, alias = "userProfileURL")]
    pub user_profile_url: Option<String>,
    /// Account selection (`select`, `new` or `all`), passed through as is
    #[serde(default)]
    pub account: Option<String>,
    /// Maximum amount the application may send per period
    #[serde(default)]
    pub send_limit_amount: Option<SendLimitAmount>,
    /// Currency of the send limit (ISO code), passed through as is
    #[serde(default)]
    pub send_limit_currency: Option<String>,
    /// Send limit period (`day`, `month` or `year`), passed through as is
    #[serde(default)]
    pub send_limit_period: Option<String>,
    /// Use PKCE for the code exchange
    #[serde(default)]
    pub use_pkce: bool,
}

/// Send limit amount, kept exactly as the caller wrote it
///
/// Any finite decimal is accepted; `"10.00"` is sent as `10.00`, not `10`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAmount", into = "String")]
pub struct SendLimitAmount(String);

impl SendLimitAmount {
    /// The amount as it goes on the authorization URL
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SendLimitAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SendLimitAmount {
    type Err = StrategyError;

    fn from_str(raw: &str) -> StrategyResult<Self> {
        let text = raw.trim();
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Self(text.to_owned())),
            Ok(_) => Err(invalid_amount(format!("'{raw}' is not a finite number"))),
            Err(e) => Err(invalid_amount(format!("'{raw}' is not a number: {e}"))),
        }
    }
}

impl TryFrom<f64> for SendLimitAmount {
    type Error = StrategyError;

    fn try_from(value: f64) -> StrategyResult<Self> {
        if value.is_finite() {
            Ok(Self(value.to_string()))
        } else {
            Err(invalid_amount(format!("{value} is not a finite number")))
        }
    }
}

impl From<SendLimitAmount> for String {
    fn from(amount: SendLimitAmount) -> Self {
        amount.0
    }
}

/// Wire forms accepted for the amount: a JSON string or a JSON number
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(Number),
}

impl TryFrom<RawAmount> for SendLimitAmount {
    type Error = StrategyError;

    fn try_from(raw: RawAmount) -> StrategyResult<Self> {
        match raw {
            RawAmount::Text(text) => text.parse(),
            RawAmount::Number(number) => number.to_string().parse(),
        }
    }
}

fn invalid_amount(reason: String) -> StrategyError {
    StrategyError::InvalidConfig {
        field: "send_limit_amount",
        reason,
    }
}

/// Coinbase-only settings kept by the adapter after construction
#[derive(Debug, Clone, PartialEq)]
pub struct CoinbaseConfig {
    /// Current-user endpoint
    pub user_profile_url: String,
    /// Account selection
    pub account: Option<String>,
    /// Send limit amount
    pub send_limit_amount: Option<SendLimitAmount>,
    /// Send limit currency
    pub send_limit_currency: Option<String>,
    /// Send limit period
    pub send_limit_period: Option<String>,
    /// Skip the profile fetch for the configured scopes
    pub skip_user_profile: bool,
}

impl CoinbaseStrategyOptions {
    /// Options with the three required values and nothing else set
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            callback_url: callback_url.into(),
            scope: Vec::new(),
            authorization_url: None,
            token_url: None,
            scope_separator: None,
            user_profile_url: None,
            account: None,
            send_limit_amount: None,
            send_limit_currency: None,
            send_limit_period: None,
            use_pkce: false,
        }
    }

    /// Set the requested scopes
    #[must_use]
    pub fn with_scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = scope.into_iter().map(Into::into).collect();
        self
    }

    /// Set the account selection
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Set the send limit amount
    #[must_use]
    pub fn with_send_limit_amount(mut self, amount: SendLimitAmount) -> Self {
        self.send_limit_amount = Some(amount);
        self
    }

    /// Set the send limit currency
    #[must_use]
    pub fn with_send_limit_currency(mut self, currency: impl Into<String>) -> Self {
        self.send_limit_currency = Some(currency.into());
        self
    }

    /// Set the send limit period
    #[must_use]
    pub fn with_send_limit_period(mut self, period: impl Into<String>) -> Self {
        self.send_limit_period = Some(period.into());
        self
    }

    /// Override the endpoint URLs (e.g. sandbox or a local stand-in)
    #[must_use]
    pub fn with_endpoints(
        mut self,
        authorization_url: impl Into<String>,
        token_url: impl Into<String>,
        user_profile_url: impl Into<String>,
    ) -> Self {
        self.authorization_url = Some(authorization_url.into());
        self.token_url = Some(token_url.into());
        self.user_profile_url = Some(user_profile_url.into());
        self
    }

    /// Whether the profile fetch can be skipped for the requested scopes
    ///
    /// True only when scopes were requested and none of them is `user`.
    #[must_use]
    pub fn skip_user_profile(&self) -> bool {
        !self.scope.is_empty() && !self.scope.iter().any(|scope| scope == USER_SCOPE)
    }

    /// Split into base OAuth 2.0 options and adapter settings, applying defaults
    #[must_use]
    pub fn into_parts(self) -> (OAuth2Options, CoinbaseConfig) {
        let skip_user_profile = self.skip_user_profile();

        let oauth = OAuth2Options {
            client_id: self.client_id,
            client_secret: self.client_secret,
            callback_url: self.callback_url,
            authorization_url: self
                .authorization_url
                .unwrap_or_else(|| endpoints::AUTHORIZATION_URL.to_owned()),
            token_url: self
                .token_url
                .unwrap_or_else(|| endpoints::TOKEN_URL.to_owned()),
            scope: self.scope,
            scope_separator: self
                .scope_separator
                .unwrap_or_else(|| endpoints::SCOPE_SEPARATOR.to_owned()),
            use_pkce: self.use_pkce,
        };

        let coinbase = CoinbaseConfig {
            user_profile_url: self
                .user_profile_url
                .unwrap_or_else(|| endpoints::USER_PROFILE_URL.to_owned()),
            account: self.account,
            send_limit_amount: self.send_limit_amount,
            send_limit_currency: self.send_limit_currency,
            send_limit_period: self.send_limit_period,
            skip_user_profile,
        };

        (oauth, coinbase)
    }

    /// Load options from `COINBASE_*` environment variables
    ///
    /// Empty variables count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` when a required variable is absent and
    /// `InvalidConfig` when `COINBASE_SEND_LIMIT_AMOUNT` is not a finite number
    pub fn from_env() -> StrategyResult<Self> {
        let mut options = Self::new(
            required_var(env_config::CLIENT_ID)?,
            required_var(env_config::CLIENT_SECRET)?,
            required_var(env_config::CALLBACK_URL)?,
        );

        if let Some(scope) = optional_var(env_config::SCOPE) {
            options.scope = scope
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect();
        }
        options.authorization_url = optional_var(env_config::AUTHORIZATION_URL);
        options.token_url = optional_var(env_config::TOKEN_URL);
        options.scope_separator = optional_var(env_config::SCOPE_SEPARATOR);
        options.user_profile_url = optional_var(env_config::USER_PROFILE_URL);
        options.account = optional_var(env_config::ACCOUNT);
        options.send_limit_amount = optional_var(env_config::SEND_LIMIT_AMOUNT)
            .map(|raw| raw.parse::<SendLimitAmount>())
            .transpose()?;
        options.send_limit_currency = optional_var(env_config::SEND_LIMIT_CURRENCY);
        options.send_limit_period = optional_var(env_config::SEND_LIMIT_PERIOD);

        Ok(options)
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn required_var(key: &'static str) -> StrategyResult<String> {
    optional_var(key).ok_or(StrategyError::ConfigMissing { key })
}
