//! Test helpers for portal-auth integration tests.
//!
//! Builds the real router over the in-memory store and a canned identity
//! provider, so tests drive the service through HTTP without a network.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use portal_auth::{
    build_router,
    config::{
        AuthConfig, Environment, OAuthConfig, RateLimitConfig, RegistrationConfig,
        SecurityConfig, SwaggerConfig,
    },
    db::{MemoryStore, UserStore},
    models::Role,
    services::{IdentityProvider, LinuxDoUserInfo, OAuthService, RegistrationService},
    AppState,
};
use portal_core::middleware::rate_limit::create_ip_rate_limiter;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TEST_AUTH_SECRET: &str = "test-auth-secret";

pub fn test_config() -> AuthConfig {
    AuthConfig {
        common: portal_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        environment: Environment::Dev,
        service_name: "portal-auth-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        oauth: OAuthConfig {
            enabled: true,
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            authorize_url: "https://connect.linux.do/oauth2/authorize".to_string(),
            token_url: "https://connect.linux.do/oauth2/token".to_string(),
            user_info_url: "https://connect.linux.do/api/user".to_string(),
            redirect_uri: None,
            min_trust_level: 0,
            auto_register: true,
            default_role: Role::User,
        },
        registration: RegistrationConfig {
            enabled: true,
            require_approval: false,
            max_users: None,
            owner_username: "admin".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            auth_secret: Some(TEST_AUTH_SECRET.to_string()),
        },
        swagger: SwaggerConfig { enabled: false },
        rate_limit: RateLimitConfig {
            register_attempts: 1000,
            register_window_seconds: 60,
            global_ip_limit: 10_000,
            global_ip_window_seconds: 60,
        },
    }
}

pub fn identity(id: i64, handle: &str, trust_level: u8) -> LinuxDoUserInfo {
    LinuxDoUserInfo {
        id,
        username: handle.to_string(),
        name: None,
        active: true,
        silenced: false,
        trust_level,
    }
}

pub async fn build_app(
    config: AuthConfig,
    store: Arc<MemoryStore>,
    provider: Arc<dyn IdentityProvider>,
) -> Router {
    let store: Arc<dyn UserStore> = store;

    let state = AppState {
        config,
        store: store.clone(),
        oauth: OAuthService::new(store.clone(), provider),
        registration: RegistrationService::new(store),
        register_rate_limiter: create_ip_rate_limiter(1000, 60),
        ip_rate_limiter: create_ip_rate_limiter(10_000, 60),
    };

    build_router(state).await.expect("Failed to build router")
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get_with_cookie(app: &Router, uri: &str, cookie: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("cookie", cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Pull the `location` header off a redirect response.
pub fn location(response: &Response<Body>) -> String {
    response.headers()["location"].to_str().unwrap().to_string()
}

/// All `set-cookie` header values on a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|c| c.to_str().unwrap().to_string())
        .collect()
}

/// Extract a named cookie's raw value from `set-cookie` headers.
pub fn cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookies(response).iter().find_map(|c| {
        let (pair, _) = c.split_once(';').unwrap_or((c.as_str(), ""));
        let (cookie_name, value) = pair.split_once('=')?;
        (cookie_name == name).then(|| value.to_string())
    })
}
