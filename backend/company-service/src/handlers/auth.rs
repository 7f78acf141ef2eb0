/// Token issuance endpoint
use actix_web::{web, HttpResponse};
use crypto_core::jwt::BEARER_PREFIX;
use crypto_core::TokenIssuer;
use validator::Validate;

use crate::error::Result;
use crate::models::{AuthorizationRequest, TokenResponse};

/// Issue a signed token for the given user and roles
///
/// No credentials are checked: this endpoint exists for development and
/// testing and is only mounted when `AUTH_ENDPOINT_ENABLED` is on.
#[utoipa::path(
    post,
    path = "/api/auth",
    tag = "auth",
    request_body = AuthorizationRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Blank user or empty role list"),
    )
)]
pub async fn issue_token(
    issuer: web::Data<TokenIssuer>,
    body: web::Json<AuthorizationRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    request.validate()?;

    let token = issuer.issue(&request.user, &request.roles)?;
    tracing::info!(user = %request.user, roles = ?request.roles, "Issued token");

    Ok(HttpResponse::Ok().json(TokenResponse {
        token: format!("{}{}", BEARER_PREFIX, token),
    }))
}
