use std::sync::Arc;

use async_trait::async_trait;
use banking_client::models::TransactionKind;
use banking_client::repositories::{BiometricAuthenticator, BiometricError};
use banking_client::storage::{MemoryTokenStore, TokenStore};
use banking_client::{ErrorCode, Services};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{account_list, client_for, expired, signed_in, token_body};

fn services(server: &MockServer, store: &MemoryTokenStore) -> Services {
    Services::new(client_for(server, store))
}

#[tokio::test]
async fn test_login_stores_pair_and_returns_user() {
    let server = MockServer::start().await;
    let store = MemoryTokenStore::new();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "a@b.com", "password": "x" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "u1", "name": "Ada Lovelace", "email": "a@b.com" },
            "accessToken": "a1",
            "refreshToken": "r1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = services(&server, &store)
        .auth
        .login("a@b.com", "x")
        .await
        .unwrap();

    assert_eq!(user.id, "u1");
    assert_eq!(user.email.as_deref(), Some("a@b.com"));
    assert_eq!(store.get_access_token().await.unwrap().as_deref(), Some("a1"));
    assert_eq!(store.get_refresh_token().await.unwrap().as_deref(), Some("r1"));
}

#[tokio::test]
async fn test_enveloped_login_matches_flat_login() {
    let server = MockServer::start().await;
    let store = MemoryTokenStore::new();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "user": { "id": "u1", "name": "Ada Lovelace" },
                "access_token": "a1",
                "refresh_token": "r1"
            }
        })))
        .mount(&server)
        .await;

    let user = services(&server, &store)
        .auth
        .login("a@b.com", "x")
        .await
        .unwrap();

    assert_eq!(user.id, "u1");
    assert_eq!(user.name, "Ada Lovelace");
    assert_eq!(store.get_access_token().await.unwrap().as_deref(), Some("a1"));
    assert_eq!(store.get_refresh_token().await.unwrap().as_deref(), Some("r1"));
}

#[tokio::test]
#[should_panic(expected = "Received keys: accessToken, user")]
async fn test_login_without_refresh_token_panics() {
    let server = MockServer::start().await;
    let store = MemoryTokenStore::new();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "u1", "name": "Ada" },
            "accessToken": "a1"
        })))
        .mount(&server)
        .await;

    let _ = services(&server, &store).auth.login("a@b.com", "x").await;
}

#[tokio::test]
async fn test_login_then_expired_access_refreshes_once() {
    let server = MockServer::start().await;
    let store = MemoryTokenStore::new();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "u1", "name": "Ada" },
            "accessToken": "a1",
            "refreshToken": "r1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(expired()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "r1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a2", "r2")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_list()))
        .expect(1)
        .mount(&server)
        .await;

    let services = services(&server, &store);
    services.auth.login("a@b.com", "x").await.unwrap();
    let accounts = services.accounts.accounts().await.unwrap();

    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].kind, "checking");
    assert_eq!(store.get_refresh_token().await.unwrap().as_deref(), Some("r2"));
}

#[tokio::test]
async fn test_register_does_not_sign_in() {
    let server = MockServer::start().await;
    let store = MemoryTokenStore::new();

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({ "name": "Ada", "email": "a@b.com", "password": "x" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "user": { "id": "u7", "name": "Ada" } })),
        )
        .mount(&server)
        .await;

    let user = services(&server, &store)
        .auth
        .register("Ada", "a@b.com", "x")
        .await
        .unwrap();
    assert_eq!(user.id, "u7");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_me_uses_profile_endpoint() {
    let server = MockServer::start().await;
    let store = signed_in("a1", "r1");

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u1",
            "firstName": "Ada",
            "lastName": "Lovelace"
        })))
        .mount(&server)
        .await;

    let me = services(&server, &store).auth.me().await.unwrap();
    assert_eq!(me.first_name, "Ada");
    assert_eq!(me.last_name, "Lovelace");
}

#[tokio::test]
async fn test_me_falls_back_to_session_user() {
    let server = MockServer::start().await;
    let store = signed_in("a1", "r1");

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": { "id": "1", "name": "Mock User" } })),
        )
        .mount(&server)
        .await;

    let me = services(&server, &store).auth.me().await.unwrap();
    assert_eq!(me.id, "1");
    assert_eq!(me.first_name, "Mock");
    assert_eq!(me.last_name, "User");
}

#[tokio::test]
async fn test_me_fallback_failure_reports_original_error() {
    let server = MockServer::start().await;
    let store = signed_in("a1", "r1");

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = services(&server, &store).auth.me().await.unwrap_err();
    assert_eq!(err.status_code, Some(404));
}

#[tokio::test]
async fn test_session_user_probe() {
    let server = MockServer::start().await;
    let store = MemoryTokenStore::new();

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": { "id": "1", "name": "Mock User" } })),
        )
        .mount(&server)
        .await;

    let services = services(&server, &store);
    assert!(services.auth.session_user().await.unwrap().is_none());
    let user = services.auth.session_user().await.unwrap().unwrap();
    assert_eq!(user.name, "Mock User");
}

#[tokio::test]
async fn test_logout_clears_both_tokens() {
    let server = MockServer::start().await;
    let store = signed_in("a1", "r1");

    services(&server, &store).auth.logout().await.unwrap();
    assert!(store.get_access_token().await.unwrap().is_none());
    assert!(store.get_refresh_token().await.unwrap().is_none());
}

#[tokio::test]
async fn test_summary() {
    let server = MockServer::start().await;
    let store = signed_in("a1", "r1");

    Mock::given(method("GET"))
        .and(path("/accounts/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalBalance": 11050.5,
            "availableFunds": 1250.5,
            "currency": "USD"
        })))
        .mount(&server)
        .await;

    let summary = services(&server, &store).accounts.summary().await.unwrap();
    assert_eq!(summary.total_balance, 11050.5);
    assert_eq!(summary.currency, "USD");
}

#[tokio::test]
async fn test_transactions_limit_query() {
    let server = MockServer::start().await;
    let store = signed_in("a1", "r1");
    let tx = json!({
        "id": "t1",
        "accountId": "acc-1",
        "amount": 4.5,
        "currency": "USD",
        "type": "debit",
        "description": "Coffee",
        "date": "2024-05-01T08:00:00Z",
        "merchant": "Blue Bottle",
        "status": "posted"
    });

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([tx.clone()])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let services = services(&server, &store);
    let recent = services.transactions.recent(None).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].kind, TransactionKind::Debit);
    assert_eq!(recent[0].merchant.as_deref(), Some("Blue Bottle"));
    assert!(services.transactions.recent(Some(3)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unread_count_is_derived() {
    let server = MockServer::start().await;
    let store = signed_in("a1", "r1");

    Mock::given(method("GET"))
        .and(path("/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "n1", "title": "Deposit", "body": "Paycheck arrived", "read": false, "createdAt": "2024-05-01T08:00:00Z" },
            { "id": "n2", "title": "Card", "body": "New card shipped", "read": true, "createdAt": "2024-04-28T08:00:00Z" },
            { "id": "n3", "title": "Alert", "body": "Low balance", "read": false, "createdAt": "2024-04-27T08:00:00Z" }
        ])))
        .mount(&server)
        .await;

    let services = services(&server, &store);
    assert_eq!(services.notifications.notifications().await.unwrap().len(), 3);
    assert_eq!(services.notifications.unread_count().await.unwrap(), 2);
}

struct AcceptingBiometrics;

#[async_trait]
impl BiometricAuthenticator for AcceptingBiometrics {
    async fn is_available(&self) -> bool {
        true
    }

    async fn biometry_label(&self) -> Option<String> {
        Some("Face ID".to_string())
    }

    async fn authenticate(&self, _reason: &str) -> Result<(), BiometricError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_biometric_login_refreshes_stored_session() {
    let server = MockServer::start().await;
    let store = signed_in("a1", "r1");

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "r1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a2", "r2")))
        .expect(1)
        .mount(&server)
        .await;

    let services = services(&server, &store).with_biometrics(Arc::new(AcceptingBiometrics));
    let biometry = services.biometric_login().await.unwrap();
    assert_eq!(biometry.as_deref(), Some("Face ID"));
    assert_eq!(store.get_access_token().await.unwrap().as_deref(), Some("a2"));
}

#[tokio::test]
async fn test_biometric_login_with_revoked_session() {
    let server = MockServer::start().await;
    let store = signed_in("a1", "r1");

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let services = services(&server, &store).with_biometrics(Arc::new(AcceptingBiometrics));
    let err = services.biometric_login().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthError);
    assert!(store.is_empty().await);
}
