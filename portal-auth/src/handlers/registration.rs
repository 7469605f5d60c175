use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    dtos::auth::{RegisterRequest, RegisterResponse},
    services::ServiceError,
    AppState,
};

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered, or queued for approval", body = RegisterResponse),
        (status = 400, description = "Validation or business-rule failure", body = RegisterResponse),
        (status = 403, description = "Registration closed", body = RegisterResponse),
        (status = 500, description = "Unexpected fault", body = RegisterResponse)
    ),
    tag = "Registration"
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(RegisterResponse::failure(format!(
                    "Invalid request body: {}",
                    rejection.body_text()
                ))),
            )
                .into_response();
        }
    };

    let outcome = state
        .registration
        .register(
            &state.config.registration,
            &req.username,
            &req.password,
            &req.confirm_password,
        )
        .await;

    match outcome {
        Ok(outcome) => (
            StatusCode::OK,
            Json(RegisterResponse {
                success: true,
                message: outcome.message,
                needs_approval: outcome.needs_approval.then_some(true),
            }),
        )
            .into_response(),
        Err(e) => {
            let status = match &e {
                ServiceError::RegistrationDisabled => StatusCode::FORBIDDEN,
                ServiceError::Store(_) | ServiceError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_REQUEST,
            };

            let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!(error = %e, "Registration failed on a store fault");
                "Server error; please try again later".to_string()
            } else {
                e.to_string()
            };

            (status, Json(RegisterResponse::failure(message))).into_response()
        }
    }
}
