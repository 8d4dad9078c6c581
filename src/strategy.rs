// ABOUTME: Coinbase adapter plugged into the generic OAuth 2.0 strategy
// ABOUTME: Supplies the strategy name, authorization parameters and the normalized user profile
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors

//! # Coinbase Strategy
//!
//! [`CoinbaseProvider`] implements [`OAuth2Provider`]; composed with the base
//! [`OAuth2Strategy`] it becomes [`CoinbaseStrategy`], whose `authenticate`
//! drives the whole login. Build one with [`coinbase_strategy`]:
//!
//! ```rust,no_run
//! use coinbase_strategy::{coinbase_strategy, CoinbaseStrategyOptions};
//! use oauth2_strategy::{VerifyInput, VerifyOutcome};
//!
//! # fn main() -> oauth2_strategy::StrategyResult<()> {
//! let options = CoinbaseStrategyOptions::new("id", "secret", "https://app.example.com/auth/coinbase/callback")
//!     .with_scope(["user", "balance"])
//!     .with_account("select");
//!
//! let strategy = coinbase_strategy(options, |input: VerifyInput| async move {
//!     let user_id = input.profile.map(|profile| profile.id);
//!     anyhow::Ok(user_id.map_or(VerifyOutcome::Fail(None), VerifyOutcome::Success))
//! })?;
//! assert_eq!(strategy.name(), "coinbase");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use oauth2_strategy::{
    AuthorizeOptions, OAuth2Provider, OAuth2Strategy, ParamMap, Profile, ProfileEmail,
    StrategyError, StrategyResult, Verify,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::{coinbase_http_client, CoinbaseClientFactory, HttpClientFactory};
use crate::config::{CoinbaseConfig, CoinbaseStrategyOptions};
use crate::constants::{params, PROFILE_FETCH_FAILED, STRATEGY_NAME};

/// The Coinbase login strategy
pub type CoinbaseStrategy<U> = OAuth2Strategy<CoinbaseProvider, U>;

/// Build a Coinbase strategy from options and a verify callback
///
/// # Errors
///
/// Returns `InvalidConfig` if the OAuth options are unusable
pub fn coinbase_strategy<U>(
    options: CoinbaseStrategyOptions,
    verify: impl Verify<U> + 'static,
) -> StrategyResult<CoinbaseStrategy<U>>
where
    U: Send + 'static,
{
    let (oauth, config) = options.into_parts();
    debug!(
        authorization_url = %oauth.authorization_url,
        token_url = %oauth.token_url,
        user_profile_url = %config.user_profile_url,
        skip_user_profile = config.skip_user_profile,
        "configuring Coinbase strategy"
    );
    let strategy = OAuth2Strategy::new(oauth, CoinbaseProvider::new(config), verify)?;
    Ok(strategy.with_http_client(coinbase_http_client()))
}

/// Coinbase-specific half of the strategy
pub struct CoinbaseProvider {
    config: CoinbaseConfig,
    client_factory: Arc<dyn CoinbaseClientFactory>,
}

impl fmt::Debug for CoinbaseProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinbaseProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Fields of the current-user record the profile is built from
#[derive(Debug, Deserialize)]
struct CoinbaseUser {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl CoinbaseProvider {
    /// Adapter calling the Coinbase API over HTTP
    #[must_use]
    pub fn new(config: CoinbaseConfig) -> Self {
        let client_factory = Arc::new(HttpClientFactory::new(config.user_profile_url.clone()));
        Self {
            config,
            client_factory,
        }
    }

    /// Replace the API client factory
    #[must_use]
    pub fn with_client_factory(mut self, factory: impl CoinbaseClientFactory + 'static) -> Self {
        self.set_client_factory(factory);
        self
    }

    /// Replace the API client factory on an already composed strategy
    pub fn set_client_factory(&mut self, factory: impl CoinbaseClientFactory + 'static) {
        self.client_factory = Arc::new(factory);
    }

    /// Settings fixed at construction
    #[must_use]
    pub const fn config(&self) -> &CoinbaseConfig {
        &self.config
    }

    fn profile_from_user(user: Value) -> StrategyResult<Profile> {
        let record = CoinbaseUser::deserialize(&user)?;
        let raw_body = serde_json::to_string(&user)?;

        Ok(Profile {
            provider: STRATEGY_NAME.to_owned(),
            id: record.id,
            display_name: record.name,
            emails: record
                .email
                .map(|value| ProfileEmail { value })
                .into_iter()
                .collect(),
            raw_body,
            raw_fields: user,
        })
    }
}

#[async_trait]
impl OAuth2Provider for CoinbaseProvider {
    fn name(&self) -> &'static str {
        STRATEGY_NAME
    }

    async fn user_profile(&self, access_token: &str) -> StrategyResult<Profile> {
        let client = self.client_factory.create(access_token);
        let user = client.get_current_user().await.map_err(|e| {
            warn!(error = %e, "Coinbase profile request failed");
            StrategyError::external_service(PROFILE_FETCH_FAILED, e)
        })?;

        let profile = Self::profile_from_user(user)?;
        info!(user_id = %profile.id, "loaded Coinbase profile");
        Ok(profile)
    }

    fn authorization_params(&self, _options: &AuthorizeOptions) -> ParamMap {
        let mut extra = ParamMap::new();

        if let Some(account) = &self.config.account {
            extra.insert(params::ACCOUNT.to_owned(), account.clone());
        }
        if let Some(amount) = &self.config.send_limit_amount {
            extra.insert(params::SEND_LIMIT_AMOUNT.to_owned(), amount.as_str().to_owned());
        }
        if let Some(currency) = &self.config.send_limit_currency {
            extra.insert(params::SEND_LIMIT_CURRENCY.to_owned(), currency.clone());
        }
        if let Some(period) = &self.config.send_limit_period {
            extra.insert(params::SEND_LIMIT_PERIOD.to_owned(), period.clone());
        }

        debug!(count = extra.len(), "derived Coinbase authorization parameters");
        extra
    }

    fn skip_user_profile(&self) -> bool {
        self.config.skip_user_profile
    }
}
