// ABOUTME: Generic OAuth 2.0 authorization-code strategy for pluggable identity providers
// ABOUTME: Base flow, token client, error taxonomy and the provider extension point
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors

#![deny(unsafe_code)]

//! # OAuth2 Strategy
//!
//! Base crate for "log in with ..." strategies. It drives the
//! authorization-code flow (redirect, state check, code exchange, refresh)
//! on top of the `oauth2` crate, which does the protocol work, and leaves the
//! provider-specific parts to an [`OAuth2Provider`] implementation.
//!
//! ## Modules
//!
//! - **client**: `oauth2::basic::BasicClient` configured from [`OAuth2Options`]
//! - **strategy**: the two-leg flow behind `authenticate`
//! - **provider**: extension point implemented by adapters
//! - **profile**: normalized user profile
//! - **errors**: `StrategyError` and `ErrorCode`
//! - **`http_client`**: shared pooled `reqwest` client

/// Configured `oauth2` client
pub mod client;

/// Error taxonomy with stable codes
pub mod errors;

/// Shared HTTP client
pub mod http_client;

/// Normalized user profile
pub mod profile;

/// Provider extension point
pub mod provider;

/// Authorization-code strategy
pub mod strategy;

pub use client::{AuthorizationRedirect, OAuth2Client, OAuth2Options, OAuth2Token};
pub use errors::{BoxError, ErrorCode, StrategyError, StrategyResult};
pub use http_client::{
    initialize_shared_client, shared_client, shared_settings, HttpClientSettings,
};
pub use profile::{Profile, ProfileEmail};
pub use provider::{AuthorizeOptions, OAuth2Provider, ParamMap};
pub use strategy::{
    AuthOutcome, AuthRequest, OAuth2Strategy, PendingAuthorization, Verify, VerifyInput,
    VerifyOutcome,
};
