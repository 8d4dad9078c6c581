// ABOUTME: Error taxonomy for OAuth 2.0 strategies and their provider adapters
// ABOUTME: Maps every failure onto a stable error code with an HTTP status for hosts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors

//! # Strategy Error Types
//!
//! `StrategyError` is the single error type returned by the base strategy and
//! by provider adapters. Two variants matter to adapters:
//!
//! - `ExternalService` wraps a failed call to the identity provider's API and
//!   keeps the original failure reachable through `source()`.
//! - `Mapping` is transparent: a failure while building the normalized
//!   profile is surfaced exactly as the serializer reported it.

use std::error::Error;

use serde::{Deserialize, Serialize};

/// Boxed error used as the cause of an external service failure
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Result alias used throughout the strategy crates
pub type StrategyResult<T> = Result<T, StrategyError>;

/// Stable error codes hosts can switch on when rendering a response
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The user or provider refused the authorization request
    AuthInvalid,
    /// An external service encountered an error
    ExternalServiceError,
    /// Authentication with the external service failed
    ExternalAuthFailed,
    /// Required configuration is missing
    ConfigMissing,
    /// Configuration is invalid
    ConfigInvalid,
    /// Data serialization/deserialization failed
    SerializationError,
    /// Application code rejected the request
    InternalError,
}

impl ErrorCode {
    /// HTTP status a host should answer with for this code
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::AuthInvalid => 401,
            Self::ExternalServiceError => 502,
            Self::ExternalAuthFailed => 503,
            Self::ConfigMissing
            | Self::ConfigInvalid
            | Self::SerializationError
            | Self::InternalError => 500,
        }
    }

    /// User-facing description of this code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthInvalid => "The authorization request was rejected",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::ExternalAuthFailed => "Authentication with external service failed",
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::SerializationError => "Data serialization/deserialization failed",
            Self::InternalError => "An internal error occurred",
        }
    }
}

/// Errors raised by OAuth 2.0 strategies
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// Call to the identity provider's API failed
    #[error("{message}")]
    ExternalService {
        /// Fixed description of the failed operation
        message: &'static str,
        /// Original transport or API failure
        #[source]
        source: BoxError,
    },

    /// Building the normalized profile failed
    #[error(transparent)]
    Mapping(#[from] serde_json::Error),

    /// Token endpoint answered with an OAuth 2.0 error response
    #[error("Token endpoint rejected the request: {error}")]
    TokenRejected {
        /// OAuth 2.0 error code (e.g. `invalid_grant`)
        error: String,
        /// Optional human readable description
        description: Option<String>,
    },

    /// Token endpoint answered with something that is not a token response
    #[error("Unusable token endpoint response: {reason}")]
    TokenExchange {
        /// What was wrong with the response
        reason: String,
    },

    /// Transport failure talking to the authorization server
    #[error("HTTP request to authorization server failed")]
    Http(#[from] reqwest::Error),

    /// A configured endpoint is not a valid URL
    #[error("Invalid endpoint URL")]
    InvalidUrl(#[from] url::ParseError),

    /// Authorization server redirected back with an error
    #[error("Authorization failed: {code}")]
    Authorization {
        /// OAuth 2.0 error code (e.g. `invalid_scope`)
        code: String,
        /// Optional human readable description
        description: Option<String>,
        /// Optional URI with more information
        uri: Option<String>,
    },

    /// A configuration value was rejected
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfig {
        /// Name of the offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// A required configuration value is absent
    #[error("Missing configuration: {key}")]
    ConfigMissing {
        /// Configuration key that is missing
        key: &'static str,
    },

    /// The application's verify callback failed
    #[error("Verify callback failed")]
    Verify(#[source] anyhow::Error),
}

impl StrategyError {
    /// Wrap a failed identity-provider call with a fixed message
    pub fn external_service(
        message: &'static str,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::ExternalService {
            message,
            source: Box::new(source),
        }
    }

    /// Error code for this failure
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ExternalService { .. } | Self::Http(_) => ErrorCode::ExternalServiceError,
            Self::Mapping(_) => ErrorCode::SerializationError,
            Self::TokenRejected { .. } | Self::TokenExchange { .. } => {
                ErrorCode::ExternalAuthFailed
            }
            Self::Authorization { .. } => ErrorCode::AuthInvalid,
            Self::InvalidUrl(_) | Self::InvalidConfig { .. } => ErrorCode::ConfigInvalid,
            Self::ConfigMissing { .. } => ErrorCode::ConfigMissing,
            Self::Verify(_) => ErrorCode::InternalError,
        }
    }

    /// HTTP status a host should answer with
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code().http_status()
    }
}
