// ABOUTME: Shared test utilities for the Coinbase strategy integration tests
// ABOUTME: Quiet logging, a fake Coinbase API client and a local stand-in for the Coinbase servers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `coinbase_strategy`

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use axum::extract::Form;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use coinbase_strategy::{
    CoinbaseApi, CoinbaseApiError, CoinbaseClientFactory, CoinbaseStrategyOptions,
};
use serde_json::{json, Value};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// The record every fake returns
pub fn jane_doe() -> Value {
    json!({
        "id": "U1",
        "name": "Jane Doe",
        "email": "jane@example.com"
    })
}

/// Options with only the required values
pub fn test_options() -> CoinbaseStrategyOptions {
    CoinbaseStrategyOptions::new(
        "test-client",
        "test-secret",
        "https://app.example.com/auth/coinbase/callback",
    )
}

/// In-memory Coinbase backend shared by every client a `FakeCoinbase` factory creates
#[derive(Clone, Default)]
pub struct FakeCoinbase {
    user: Option<Value>,
    calls: Arc<AtomicUsize>,
    tokens: Arc<Mutex<Vec<String>>>,
}

impl FakeCoinbase {
    /// Backend answering with `user`
    pub fn returning(user: Value) -> Self {
        Self {
            user: Some(user),
            ..Self::default()
        }
    }

    /// Backend rejecting every token with a 401
    pub fn failing() -> Self {
        Self::default()
    }

    /// Number of `get_current_user` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Access tokens clients were created for
    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

struct FakeClient {
    backend: FakeCoinbase,
}

#[async_trait]
impl CoinbaseApi for FakeClient {
    async fn get_current_user(&self) -> Result<Value, CoinbaseApiError> {
        self.backend.calls.fetch_add(1, Ordering::SeqCst);
        self.backend
            .user
            .clone()
            .ok_or_else(|| CoinbaseApiError::Api {
                status: 401,
                message: "invalid token".to_owned(),
            })
    }
}

impl CoinbaseClientFactory for FakeCoinbase {
    fn create(&self, access_token: &str) -> Box<dyn CoinbaseApi> {
        self.tokens.lock().unwrap().push(access_token.to_owned());
        Box::new(FakeClient {
            backend: self.clone(),
        })
    }
}

/// Refresh token the stand-in answers with an absurd `expires_in`
pub const HUGE_LIFETIME_REFRESH_TOKEN: &str = "refresh-forever";

/// Current-user routes answering 200 with something other than a user envelope
pub mod malformed {
    /// Plain text body
    pub const NOT_JSON: &str = "/v2/user-text";
    /// JSON array instead of an object
    pub const NOT_AN_OBJECT: &str = "/v2/user-array";
    /// Object without `data`
    pub const NO_DATA: &str = "/v2/user-nodata";
    /// `data` holding a string
    pub const DATA_NOT_AN_OBJECT: &str = "/v2/user-data-string";
}

/// Local stand-in for the Coinbase token and current-user endpoints
pub struct MockCoinbaseServer {
    addr: SocketAddr,
    token_requests: Arc<AtomicUsize>,
    user_agents: Arc<Mutex<Vec<String>>>,
}

impl MockCoinbaseServer {
    /// Bind to an ephemeral port and start serving in the background
    pub async fn start() -> Self {
        let token_requests = Arc::new(AtomicUsize::new(0));
        let user_agents: Arc<Mutex<Vec<String>>> = Arc::default();
        let counter = Arc::clone(&token_requests);
        let token_agents = Arc::clone(&user_agents);
        let user_agents_seen = Arc::clone(&user_agents);

        let app = Router::new()
            .route(
                "/oauth/token",
                post(
                    move |headers: HeaderMap, Form(form): Form<HashMap<String, String>>| {
                        let counter = Arc::clone(&counter);
                        let agents = Arc::clone(&token_agents);
                        async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            record_user_agent(&agents, &headers);
                            token_response(&form)
                        }
                    },
                ),
            )
            .route(
                "/v2/user",
                get(move |headers: HeaderMap| {
                    let agents = Arc::clone(&user_agents_seen);
                    async move {
                        record_user_agent(&agents, &headers);
                        current_user(&headers)
                    }
                }),
            )
            .route(malformed::NOT_JSON, get(|| async { "<html>maintenance</html>" }))
            .route(
                malformed::NOT_AN_OBJECT,
                get(|| async { Json(json!([jane_doe()])) }),
            )
            .route(
                malformed::NO_DATA,
                get(|| async { Json(json!({ "user": jane_doe() })) }),
            )
            .route(
                malformed::DATA_NOT_AN_OBJECT,
                get(|| async { Json(json!({ "data": "U1" })) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            token_requests,
            user_agents,
        }
    }

    /// Absolute URL for `path` on this server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Options pointing every endpoint at this server
    pub fn options(&self) -> CoinbaseStrategyOptions {
        self.options_with_user_path("/v2/user")
    }

    /// Options whose current-user endpoint is `path` on this server
    pub fn options_with_user_path(&self, path: &str) -> CoinbaseStrategyOptions {
        test_options().with_endpoints(
            self.url("/oauth/authorize"),
            self.url("/oauth/token"),
            self.url(path),
        )
    }

    /// Number of requests the token endpoint has seen
    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }

    /// `User-Agent` of every token and current-user request, in arrival order
    pub fn user_agents(&self) -> Vec<String> {
        self.user_agents.lock().unwrap().clone()
    }
}

fn record_user_agent(agents: &Mutex<Vec<String>>, headers: &HeaderMap) {
    let agent = headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    agents.lock().unwrap().push(agent);
}

fn form_value<'a>(form: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    form.get(name).map(String::as_str)
}

fn token_response(form: &HashMap<String, String>) -> (StatusCode, Json<Value>) {
    let grant = form_value(form, "grant_type");
    if grant == Some("refresh_token")
        && form_value(form, "refresh_token") == Some(HUGE_LIFETIME_REFRESH_TOKEN)
    {
        return (
            StatusCode::OK,
            Json(json!({
                "access_token": "access-1",
                "token_type": "bearer",
                "expires_in": 1_000_000_000_000_000_u64
            })),
        );
    }

    let valid = match grant {
        Some("authorization_code") => form_value(form, "code") == Some("good-code"),
        Some("refresh_token") => form_value(form, "refresh_token") == Some("refresh-1"),
        _ => false,
    };

    if !valid || form_value(form, "client_secret") != Some("test-secret") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_grant"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "access_token": "access-1",
            "token_type": "bearer",
            "expires_in": 7200,
            "refresh_token": "refresh-1",
            "scope": "user balance"
        })),
    )
}

fn current_user(headers: &HeaderMap) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some("Bearer access-1");
    let versioned = headers
        .get("cb-version")
        .and_then(|value| value.to_str().ok())
        == Some("2016-02-18");

    if !authorized || !versioned {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"errors": [{"id": "invalid_token", "message": "The access token is invalid"}]})),
        );
    }

    (StatusCode::OK, Json(json!({ "data": jane_doe() })))
}
