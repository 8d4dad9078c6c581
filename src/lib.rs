// ABOUTME: Coinbase OAuth 2.0 login strategy built on the generic oauth2-strategy crate
// ABOUTME: Endpoint defaults, Coinbase authorization parameters and user profile normalization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors

#![deny(unsafe_code)]

//! # Coinbase Strategy
//!
//! "Log in with Coinbase" for applications driving an OAuth 2.0
//! authorization-code flow. The flow itself lives in the `oauth2-strategy`
//! crate; this crate supplies what is specific to Coinbase:
//!
//! - default authorization, token and current-user endpoints
//! - the `account` and `meta[send_limit_*]` authorization parameters
//! - mapping the Coinbase user record onto a normalized [`Profile`]
//!
//! ## Architecture
//!
//! - **config**: caller options, defaults and environment loading
//! - **strategy**: the `OAuth2Provider` adapter and the `CoinbaseStrategy` alias
//! - **client**: Coinbase API client behind a substitutable factory
//! - **logging**: optional subscriber setup for hosts
//! - **constants**: endpoints, parameter names and environment keys

/// Coinbase API client
pub mod client;

/// Strategy options and defaults
pub mod config;

/// Literals sent to or read from Coinbase and the environment
pub mod constants;

/// Tracing subscriber setup
pub mod logging;

/// The Coinbase adapter
pub mod strategy;

pub use client::{
    coinbase_http_client, CoinbaseApi, CoinbaseApiError, CoinbaseClient, CoinbaseClientFactory,
    HttpClientFactory,
};
pub use config::{CoinbaseConfig, CoinbaseStrategyOptions, SendLimitAmount};
pub use constants::STRATEGY_NAME;
pub use oauth2_strategy::Profile;
pub use strategy::{coinbase_strategy, CoinbaseProvider, CoinbaseStrategy};
