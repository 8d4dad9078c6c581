// ABOUTME: Integration tests for Coinbase user profile loading and normalization
// ABOUTME: Uses a fake API client injected through the client factory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 coinbase-strategy contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::error::Error as _;

use coinbase_strategy::{coinbase_strategy, CoinbaseApiError, CoinbaseProvider};
use common::{init_test_logging, jane_doe, test_options, FakeCoinbase};
use oauth2_strategy::{ErrorCode, OAuth2Provider, ProfileEmail, StrategyError, VerifyInput, VerifyOutcome};
use serde_json::json;

fn provider_with(fake: &FakeCoinbase) -> CoinbaseProvider {
    let (_, config) = test_options().into_parts();
    CoinbaseProvider::new(config).with_client_factory(fake.clone())
}

#[tokio::test]
async fn test_profile_is_normalized() {
    init_test_logging();
    let fake = FakeCoinbase::returning(jane_doe());
    let provider = provider_with(&fake);

    let profile = provider.user_profile("token-1").await.unwrap();

    assert_eq!(profile.provider, "coinbase");
    assert_eq!(profile.id, "U1");
    assert_eq!(profile.display_name.as_deref(), Some("Jane Doe"));
    assert_eq!(
        profile.emails,
        vec![ProfileEmail {
            value: "jane@example.com".to_owned()
        }]
    );
    assert_eq!(profile.raw_fields, jane_doe());
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&profile.raw_body).unwrap(),
        jane_doe()
    );
    assert_eq!(fake.tokens(), vec!["token-1".to_owned()]);
}

#[tokio::test]
async fn test_extra_fields_survive_in_raw_fields() {
    let record = json!({
        "id": "U2",
        "name": "Sam Roe",
        "email": "sam@example.com",
        "native_currency": "EUR",
        "country": {"code": "FR", "name": "France"}
    });
    let provider = provider_with(&FakeCoinbase::returning(record.clone()));

    let profile = provider.user_profile("token").await.unwrap();

    assert_eq!(profile.raw_fields, record);
    assert_eq!(profile.raw_fields["country"]["code"], "FR");
}

#[tokio::test]
async fn test_api_failure_is_wrapped_with_cause() {
    init_test_logging();
    let provider = provider_with(&FakeCoinbase::failing());

    let error = provider.user_profile("expired").await.unwrap_err();

    assert_eq!(error.code(), ErrorCode::ExternalServiceError);
    assert_eq!(error.to_string(), "failed to fetch user profile");
    let cause = error
        .source()
        .and_then(|source| source.downcast_ref::<CoinbaseApiError>())
        .expect("cause should be the API error");
    assert!(matches!(cause, CoinbaseApiError::Api { status: 401, .. }));
}

#[tokio::test]
async fn test_record_without_id_is_a_mapping_error() {
    let provider = provider_with(&FakeCoinbase::returning(json!({"name": "Nobody"})));

    let error = provider.user_profile("token").await.unwrap_err();

    assert!(matches!(error, StrategyError::Mapping(_)));
    assert_eq!(error.code(), ErrorCode::SerializationError);
}

#[tokio::test]
async fn test_missing_email_yields_no_emails() {
    let provider = provider_with(&FakeCoinbase::returning(json!({"id": "U3", "name": "No Mail"})));

    let profile = provider.user_profile("token").await.unwrap();

    assert!(profile.emails.is_empty());
    assert_eq!(profile.primary_email(), None);
}

#[tokio::test]
async fn test_repeated_fetches_are_independent() {
    let fake = FakeCoinbase::returning(jane_doe());
    let provider = provider_with(&fake);

    let first = provider.user_profile("same-token").await.unwrap();
    let second = provider.user_profile("same-token").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fake.calls(), 2);
    assert_eq!(fake.tokens().len(), 2);
}

#[tokio::test]
async fn test_profile_fetch_ignores_skip_flag() {
    let fake = FakeCoinbase::returning(jane_doe());
    let mut strategy = coinbase_strategy(
        test_options().with_scope(["balance"]),
        |_: VerifyInput| async { anyhow::Ok(VerifyOutcome::<()>::Fail(None)) },
    )
    .unwrap();
    strategy.provider_mut().set_client_factory(fake.clone());

    assert!(strategy.provider().skip_user_profile());
    let profile = strategy.user_profile("token").await.unwrap();

    assert_eq!(profile.id, "U1");
    assert_eq!(fake.calls(), 1);
}
