use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "new_user")]
    pub username: String,

    #[schema(example = "password123")]
    pub password: String,

    #[schema(example = "password123")]
    pub confirm_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    #[schema(example = "Registration successful; sign in with your username and password")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_approval: Option<bool>,
}

impl RegisterResponse {
    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            needs_approval: None,
        }
    }
}

/// Query half of the provider's callback redirect.
#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}
