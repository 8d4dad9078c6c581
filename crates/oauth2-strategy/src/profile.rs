// ABOUTME: Normalized user profile handed from provider adapters to application code
// ABOUTME: Keeps the provider's raw response alongside the mapped fields
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors

use serde::{Deserialize, Serialize};

/// A single email address attached to a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEmail {
    /// The address itself
    pub value: String,
}

/// Provider-independent representation of an authenticated user
///
/// Built fresh on every profile fetch; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Name of the strategy that produced this profile (e.g. "coinbase")
    pub provider: String,
    /// Provider-assigned user identifier
    pub id: String,
    /// Name suitable for display
    pub display_name: Option<String>,
    /// Email addresses, primary first
    pub emails: Vec<ProfileEmail>,
    /// Provider response serialized verbatim
    #[serde(rename = "_raw")]
    pub raw_body: String,
    /// Provider response as received
    #[serde(rename = "_json")]
    pub raw_fields: serde_json::Value,
}

impl Profile {
    /// Primary email address, if the provider supplied one
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(|email| email.value.as_str())
    }
}
