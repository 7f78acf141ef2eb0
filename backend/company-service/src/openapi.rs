/// OpenAPI documentation for Company Service
use actix_web::HttpResponse;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers::{auth, companies};
use crate::models::{AuthorizationRequest, Company, CompanyRequest, TokenResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Company Service API",
        version = "1.0.0",
        description = "CRUD for companies behind RS256 bearer tokens. Access is granted per route by role and per record by ownership; ADMIN sees everything.",
        license(
            name = "MIT"
        )
    ),
    paths(
        auth::issue_token,
        companies::list_companies,
        companies::get_company,
        companies::create_company,
        companies::update_company,
        companies::delete_company,
    ),
    components(schemas(Company, CompanyRequest, AuthorizationRequest, TokenResponse)),
    tags(
        (name = "auth", description = "Token issuance"),
        (name = "companies", description = "Company creation, retrieval, updates, and deletion"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("RS256 token from POST /api/auth"))
                        .build(),
                ),
            )
        }
    }
}

pub async fn openapi_json() -> actix_web::Result<HttpResponse> {
    let body = ApiDoc::openapi().to_json().map_err(|e| {
        tracing::error!("OpenAPI serialization failed: {}", e);
        actix_web::error::ErrorInternalServerError("OpenAPI serialization error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}
