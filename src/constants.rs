// ABOUTME: Coinbase endpoint defaults, parameter names and environment keys
// ABOUTME: Single place for every literal the strategy sends or reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors

/// Name hosts register and look up the strategy by
pub const STRATEGY_NAME: &str = "coinbase";

/// Message attached to a failed profile fetch
pub const PROFILE_FETCH_FAILED: &str = "failed to fetch user profile";

/// Scope that makes fetching the user profile worthwhile
pub const USER_SCOPE: &str = "user";

/// `User-Agent` sent on token and API requests
pub const USER_AGENT: &str = concat!("coinbase-strategy/", env!("CARGO_PKG_VERSION"));

/// Default endpoint URLs
pub mod endpoints {
    /// OAuth authorization endpoint
    pub const AUTHORIZATION_URL: &str = "https://www.coinbase.com/oauth/authorize";
    /// OAuth token endpoint
    pub const TOKEN_URL: &str = "https://www.coinbase.com/oauth/token";
    /// Current-user endpoint of the v2 API
    pub const USER_PROFILE_URL: &str = "https://api.coinbase.com/v2/user";
    /// Scope separator used in authorization requests
    pub const SCOPE_SEPARATOR: &str = " ";
}

/// Coinbase API request headers
pub mod api {
    /// API version header name
    pub const VERSION_HEADER: &str = "CB-VERSION";
    /// API version this client speaks
    pub const VERSION: &str = "2016-02-18";
}

/// Authorization query parameter names
pub mod params {
    /// Which account(s) the user grants access to
    pub const ACCOUNT: &str = "account";
    /// Send limit amount
    pub const SEND_LIMIT_AMOUNT: &str = "meta[send_limit_amount]";
    /// Send limit currency
    pub const SEND_LIMIT_CURRENCY: &str = "meta[send_limit_currency]";
    /// Send limit period
    pub const SEND_LIMIT_PERIOD: &str = "meta[send_limit_period]";
}

/// Environment variable names read by `CoinbaseStrategyOptions::from_env`
pub mod env_config {
    /// OAuth client ID
    pub const CLIENT_ID: &str = "COINBASE_CLIENT_ID";
    /// OAuth client secret
    pub const CLIENT_SECRET: &str = "COINBASE_CLIENT_SECRET";
    /// Redirect URI
    pub const CALLBACK_URL: &str = "COINBASE_CALLBACK_URL";
    /// Comma separated scopes
    pub const SCOPE: &str = "COINBASE_SCOPE";
    /// Authorization endpoint override
    pub const AUTHORIZATION_URL: &str = "COINBASE_AUTHORIZATION_URL";
    /// Token endpoint override
    pub const TOKEN_URL: &str = "COINBASE_TOKEN_URL";
    /// Scope separator override
    pub const SCOPE_SEPARATOR: &str = "COINBASE_SCOPE_SEPARATOR";
    /// Current-user endpoint override
    pub const USER_PROFILE_URL: &str = "COINBASE_USER_PROFILE_URL";
    /// Account selection
    pub const ACCOUNT: &str = "COINBASE_ACCOUNT";
    /// Send limit amount
    pub const SEND_LIMIT_AMOUNT: &str = "COINBASE_SEND_LIMIT_AMOUNT";
    /// Send limit currency
    pub const SEND_LIMIT_CURRENCY: &str = "COINBASE_SEND_LIMIT_CURRENCY";
    /// Send limit period
    pub const SEND_LIMIT_PERIOD: &str = "COINBASE_SEND_LIMIT_PERIOD";
}
