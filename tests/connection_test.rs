mod common;

use axum::http::StatusCode;
use common::*;
use std::time::Duration;

use qrebel_gate::client::check_connection;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn check(mock: &MockQRebel) -> Result<(), String> {
    check_connection(Some(APP_NAME), Some(API_TOKEN), Some(&mock.base_url), TIMEOUT)
        .await
        .map_err(|e| e.to_string())
}

#[tokio::test]
async fn test_connection_success() {
    let mock = MockQRebel::ok().await;
    assert_eq!(check(&mock).await, Ok(()));

    let requests = mock.issues_requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].query.is_empty());
    assert_eq!(requests[0].authorization.as_deref(), Some(API_TOKEN));
}

#[tokio::test]
async fn test_connection_unauthorized() {
    let mock = MockQRebel::start(StatusCode::UNAUTHORIZED, "").await;
    assert_eq!(check(&mock).await, Err("Authorization failed".to_string()));
}

#[tokio::test]
async fn test_connection_unknown_application() {
    let mock = MockQRebel::start(StatusCode::NOT_FOUND, "").await;
    assert_eq!(check(&mock).await, Err("No application found".to_string()));
}

#[tokio::test]
async fn test_connection_other_failure_surfaces_body() {
    let mock = MockQRebel::start(StatusCode::INTERNAL_SERVER_ERROR, "backend down").await;
    assert_eq!(check(&mock).await, Err("backend down".to_string()));
}

#[tokio::test]
async fn test_connection_blank_parameters() {
    let err = check_connection(Some(APP_NAME), Some("  "), Some("http://localhost:1"), TIMEOUT)
        .await
        .unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.to_string(), "Connection parameters cannot be blank");

    let err = check_connection(None, Some(API_TOKEN), Some("http://localhost:1"), TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Connection parameters cannot be blank");
}
