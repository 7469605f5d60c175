use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use portal_core::error::AppError;

use crate::{
    dtos::{auth::CallbackQuery, ErrorResponse},
    services::{AuthCredential, OAuthService, ServiceError},
    utils::generate_state_token,
    AppState,
};

pub const STATE_COOKIE: &str = "oauth_state";
pub const AUTH_COOKIE: &str = "auth";

const STATE_COOKIE_MINUTES: i64 = 10;
const AUTH_COOKIE_DAYS: i64 = 7;

/// Start the authorization-code flow
#[utoipa::path(
    get,
    path = "/api/oauth/authorize",
    responses(
        (status = 302, description = "Redirect to the LinuxDo authorization page"),
        (status = 403, description = "LinuxDo sign-in disabled", body = ErrorResponse),
        (status = 500, description = "OAuth misconfigured", body = ErrorResponse)
    ),
    tag = "OAuth"
)]
pub async fn authorize(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    uri: Uri,
) -> Result<(CookieJar, Response), AppError> {
    let oauth_config = &state.config.oauth;

    if !oauth_config.enabled {
        return Err(ServiceError::OAuthDisabled.into());
    }

    if oauth_config.client_id.is_empty() || oauth_config.client_secret.is_empty() {
        tracing::error!("OAuth is enabled but client credentials are missing");
        return Err(ServiceError::OAuthMisconfigured.into());
    }

    let state_token = generate_state_token();
    let redirect_uri = OAuthService::resolve_redirect_uri(oauth_config, &headers, &uri);
    let authorize_url = OAuthService::authorize_url(oauth_config, &redirect_uri, &state_token);

    let state_cookie = Cookie::build((STATE_COOKIE, state_token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(is_tls(&headers, &uri))
        .max_age(time::Duration::minutes(STATE_COOKIE_MINUTES))
        .build();

    Ok((jar.add(state_cookie), redirect_found(&authorize_url)))
}

/// Handle the provider's callback redirect
#[utoipa::path(
    get,
    path = "/api/oauth/callback",
    params(CallbackQuery),
    responses(
        (status = 302, description = "Signed in and redirected home, or redirected to the login page with an oauth_error reason"),
    ),
    tag = "OAuth"
)]
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<CallbackQuery>,
) -> (CookieJar, Response) {
    let stored_state = jar.get(STATE_COOKIE).map(|c| c.value().to_string());

    let code = match OAuthService::validate_callback(&query, stored_state.as_deref()) {
        Ok(code) => code,
        Err(e) => return (jar, login_redirect(&e)),
    };

    let oauth_config = &state.config.oauth;
    if !oauth_config.enabled {
        return (jar, login_redirect(&ServiceError::OAuthDisabled));
    }

    let redirect_uri = OAuthService::resolve_redirect_uri(oauth_config, &headers, &uri);

    let account = match state.oauth.login(oauth_config, &code, &redirect_uri).await {
        Ok(account) => account,
        Err(e) => return (jar, login_redirect(&e)),
    };

    let credential = match AuthCredential::issue(
        &account.username,
        account.role,
        state.config.security.auth_secret.as_deref(),
    )
    .and_then(|c| c.encode())
    {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::error!(error = %e, "Failed to issue auth credential");
            return (jar, login_redirect(&ServiceError::Internal(e)));
        }
    };

    let auth_cookie = Cookie::build((AUTH_COOKIE, credential))
        .path("/")
        .http_only(false)
        .same_site(SameSite::Lax)
        .secure(is_tls(&headers, &uri))
        .max_age(time::Duration::days(AUTH_COOKIE_DAYS))
        .build();

    tracing::info!(user = %account.username, "Signed in via LinuxDo");

    // Removal must match the path the state cookie was set with
    let jar = jar
        .add(auth_cookie)
        .remove(Cookie::build((STATE_COOKIE, "")).path("/").build());
    (jar, redirect_found("/"))
}

/// Every callback failure converges here: back to the login surface with
/// a human-readable reason, never a raw error to the user agent.
fn login_redirect(err: &ServiceError) -> Response {
    let location = format!("/login?oauth_error={}", urlencoding::encode(&err.to_string()));
    redirect_found(&location)
}

fn redirect_found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

fn is_tls(headers: &HeaderMap, uri: &Uri) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|proto| proto.eq_ignore_ascii_case("https"))
        .unwrap_or_else(|| uri.scheme_str() == Some("https"))
}
