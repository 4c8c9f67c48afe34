use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use novelty_migrator::auth::TokenManager;
use novelty_migrator::config::AuthConfig;
use novelty_migrator::error::MigrateError;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bearer_token(subject: &str, lifetime_secs: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json!({"alg": "none", "typ": "JWT"})).unwrap());
    let now = Utc::now().timestamp();
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&json!({
            "sub": subject,
            "iat": now,
            "exp": now + lifetime_secs,
        }))
        .unwrap(),
    );
    format!("{header}.{payload}.sig")
}

fn auth_config(server: &MockServer) -> AuthConfig {
    AuthConfig {
        url: format!("{}/token", server.uri()),
        client_id: "migrator".to_string(),
        username: "migration-user".to_string(),
        password: "secret".to_string(),
        refresh_threshold_ms: 300_000,
        request_timeout_secs: 5,
    }
}

fn token_response(token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": token,
        "expires_in": 3600,
    }))
}

#[tokio::test]
async fn cached_token_is_reused_within_refresh_window() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=password"))
        .respond_with(token_response(&bearer_token("migration-user", 3600)))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = TokenManager::new(auth_config(&server));
    let first = manager.get_token().await.unwrap();
    let second = manager.get_token().await.unwrap();

    assert_eq!(first, second);
    assert!(manager.is_valid());
    assert!(!manager.is_expiring_soon());
}

#[tokio::test]
async fn clear_token_forces_a_single_new_request() {
    let server = MockServer::start().await;
    let token_a = bearer_token("first", 3600);
    let token_b = bearer_token("second", 3600);

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_response(&token_a))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_response(&token_b))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = TokenManager::new(auth_config(&server));
    let first = manager.get_token().await.unwrap();
    manager.clear_token();
    assert!(!manager.is_valid());

    let second = manager.get_token().await.unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn non_success_status_is_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut manager = TokenManager::new(auth_config(&server));
    let err = manager.get_token().await.unwrap_err();
    assert!(matches!(err, MigrateError::AuthFailure(_)));
    assert!(!manager.is_valid());
}

#[tokio::test]
async fn missing_access_token_is_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "bearer"})))
        .mount(&server)
        .await;

    let mut manager = TokenManager::new(auth_config(&server));
    let err = manager.get_token().await.unwrap_err();
    assert!(matches!(err, MigrateError::AuthFailure(_)));
}

#[tokio::test]
async fn opaque_token_falls_back_to_expires_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "opaque-token-without-claims",
            "expires_in": 3600,
        })))
        .mount(&server)
        .await;

    let mut manager = TokenManager::new(auth_config(&server));
    let token = manager.get_token().await.unwrap();
    assert_eq!(token, "opaque-token-without-claims");
    // expires_in drives the refresh deadline; without a real expiry the
    // token always counts as expiring soon
    assert!(manager.is_valid());
    assert!(manager.is_expiring_soon());
}
