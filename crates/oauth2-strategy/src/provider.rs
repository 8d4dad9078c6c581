// ABOUTME: Extension point implemented by identity-provider adapters
// ABOUTME: Profile loading, extra authorization parameters and the advisory skip flag
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors

//! # Provider Extension Point
//!
//! The base [`OAuth2Strategy`](crate::strategy::OAuth2Strategy) owns the
//! authorization-code flow. An adapter supplies only what differs per
//! identity provider:
//!
//! - the strategy name used by hosts to look the strategy up
//! - how to turn an access token into a normalized [`Profile`]
//! - which provider-specific query parameters go on the authorization URL
//! - whether fetching the profile is worth it for the requested scopes
//!
//! ## Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use oauth2_strategy::{AuthorizeOptions, OAuth2Provider, ParamMap, Profile, StrategyResult};
//!
//! struct Example;
//!
//! #[async_trait]
//! impl OAuth2Provider for Example {
//!     fn name(&self) -> &'static str {
//!         "example"
//!     }
//!
//!     async fn user_profile(&self, access_token: &str) -> StrategyResult<Profile> {
//!         unimplemented!("call the provider with {access_token}")
//!     }
//!
//!     fn authorization_params(&self, _options: &AuthorizeOptions) -> ParamMap {
//!         ParamMap::new()
//!     }
//! }
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::errors::StrategyResult;
use crate::profile::Profile;

/// Extra query parameters for the authorization URL, in stable key order
pub type ParamMap = BTreeMap<String, String>;

/// Per-request options handed to `authenticate`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizeOptions {
    /// Scopes for this request only, overriding the configured scopes
    pub scope: Option<Vec<String>>,
}

/// Hooks a provider adapter contributes to the base OAuth 2.0 strategy
#[async_trait]
pub trait OAuth2Provider: Send + Sync {
    /// Strategy name hosts register and look the strategy up by
    fn name(&self) -> &'static str;

    /// Fetch and normalize the profile of the user owning `access_token`
    async fn user_profile(&self, access_token: &str) -> StrategyResult<Profile>;

    /// Provider-specific query parameters added to the authorization URL
    fn authorization_params(&self, options: &AuthorizeOptions) -> ParamMap;

    /// Advisory: the base skips `user_profile` during `authenticate` when true
    fn skip_user_profile(&self) -> bool {
        false
    }
}
