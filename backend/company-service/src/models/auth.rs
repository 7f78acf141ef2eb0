use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::not_blank;

/// Who a token should be issued for and which authorities it carries.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AuthorizationRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub user: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// `Bearer <jwt>`, ready to be used as an `Authorization` header value
    pub token: String,
}
