/// Route table and shared application state
///
/// `configure` is used both by the binary and by the integration tests so
/// that they exercise the same routing, extractors and error handlers.
use actix_middleware::{serve_metrics, JwtAuthMiddleware};
use actix_web::web;
use crypto_core::{TokenIssuer, TokenVerifier};
use std::sync::Arc;

use crate::error::AppError;
use crate::handlers;
use crate::openapi;
use crate::services::CompanyService;

#[derive(Clone)]
pub struct AppState {
    pub companies: web::Data<CompanyService>,
    pub issuer: web::Data<TokenIssuer>,
    pub verifier: Arc<TokenVerifier>,
    pub auth_endpoint_enabled: bool,
}

impl AppState {
    pub fn new(
        companies: CompanyService,
        issuer: TokenIssuer,
        verifier: TokenVerifier,
        auth_endpoint_enabled: bool,
    ) -> Self {
        Self {
            companies: web::Data::new(companies),
            issuer: web::Data::new(issuer),
            verifier: Arc::new(verifier),
            auth_endpoint_enabled,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(state.companies.clone())
        .app_data(state.issuer.clone())
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            AppError::BadRequest(format!("Invalid request body: {}", err)).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            AppError::BadRequest(format!("Invalid query string: {}", err)).into()
        }));

    cfg.route("/metrics", web::get().to(serve_metrics))
        .route("/api/openapi.json", web::get().to(openapi::openapi_json))
        .route("/api/health", web::get().to(handlers::health_summary))
        .route("/api/health/live", web::get().to(handlers::liveness_check))
        .route("/api/health/ready", web::get().to(handlers::readiness_check));

    if state.auth_endpoint_enabled {
        cfg.route("/api/auth", web::post().to(handlers::issue_token));
    }

    cfg.service(
        web::scope("/api/companies")
            .wrap(JwtAuthMiddleware::new(state.verifier.clone()))
            .service(
                web::resource("")
                    .route(web::get().to(handlers::list_companies))
                    .route(web::post().to(handlers::create_company)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(handlers::get_company))
                    .route(web::put().to(handlers::update_company))
                    .route(web::delete().to(handlers::delete_company)),
            ),
    );
}
