mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{build_app, cookie_value, get, identity, location, set_cookies, test_config};
use portal_auth::db::MemoryStore;
use portal_auth::services::MockProvider;
use std::sync::Arc;
use tower::util::ServiceExt;

#[tokio::test]
async fn authorize_redirects_to_provider_with_state_cookie() {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(MockProvider::returning(identity(1, "alice", 3)));
    let app = build_app(test_config(), store, provider).await;

    let response = get(&app, "/api/oauth/authorize").await;

    assert_eq!(response.status(), StatusCode::FOUND);

    let location = location(&response);
    assert!(location.starts_with("https://connect.linux.do/oauth2/authorize?"));
    assert!(location.contains("response_type=code"));
    assert!(location.contains("client_id=test-client"));
    assert!(location.contains("redirect_uri="));

    let state = cookie_value(&response, "oauth_state").expect("state cookie expected");
    assert_eq!(state.len(), 64);
    assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
    // The redirect carries the same token the cookie stores
    assert!(location.contains(&format!("state={}", state)));

    let cookies = set_cookies(&response);
    let state_cookie = cookies
        .iter()
        .find(|c| c.starts_with("oauth_state="))
        .unwrap();
    assert!(state_cookie.contains("HttpOnly"));
    assert!(state_cookie.contains("SameSite=Lax"));
    assert!(state_cookie.contains("Max-Age=600"));
}

#[tokio::test]
async fn consecutive_authorize_calls_use_fresh_state() {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(MockProvider::returning(identity(1, "alice", 3)));
    let app = build_app(test_config(), store, provider).await;

    let first = get(&app, "/api/oauth/authorize").await;
    let second = get(&app, "/api/oauth/authorize").await;

    let first_state = cookie_value(&first, "oauth_state").unwrap();
    let second_state = cookie_value(&second, "oauth_state").unwrap();
    assert_ne!(first_state, second_state);
}

#[tokio::test]
async fn disabled_feature_returns_403() {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(MockProvider::returning(identity(1, "alice", 3)));
    let mut config = test_config();
    config.oauth.enabled = false;
    let app = build_app(config, store, provider).await;

    let response = get(&app, "/api/oauth/authorize").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_client_credentials_return_500() {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(MockProvider::returning(identity(1, "alice", 3)));
    let mut config = test_config();
    config.oauth.client_secret = String::new();
    let app = build_app(config, store, provider).await;

    let response = get(&app, "/api/oauth/authorize").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn configured_redirect_uri_wins() {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(MockProvider::returning(identity(1, "alice", 3)));
    let mut config = test_config();
    config.oauth.redirect_uri = Some("https://portal.example.com/api/oauth/callback".to_string());
    let app = build_app(config, store, provider).await;

    let response = get(&app, "/api/oauth/authorize").await;
    assert!(location(&response)
        .contains("redirect_uri=https%3A%2F%2Fportal.example.com%2Fapi%2Foauth%2Fcallback"));
}

#[tokio::test]
async fn redirect_uri_derives_from_proxy_headers() {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(MockProvider::returning(identity(1, "alice", 3)));
    let app = build_app(test_config(), store, provider).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/oauth/authorize")
                .header("host", "portal.example.com")
                .header("x-forwarded-proto", "https")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(location(&response)
        .contains("redirect_uri=https%3A%2F%2Fportal.example.com%2Fapi%2Foauth%2Fcallback"));

    // TLS hop means the state cookie is marked Secure
    let cookies = set_cookies(&response);
    let state_cookie = cookies
        .iter()
        .find(|c| c.starts_with("oauth_state="))
        .unwrap();
    assert!(state_cookie.contains("Secure"));
}
