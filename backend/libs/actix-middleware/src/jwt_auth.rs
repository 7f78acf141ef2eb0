use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, StatusCode},
    Error, HttpMessage, HttpResponse, ResponseError,
};
use crypto_core::jwt::BEARER_PREFIX;
use crypto_core::{TokenError, TokenVerifier};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;

use crate::principal::AuthenticatedUser;

/// Reasons a request is turned away with 401.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Invalid Authorization header format")]
    InvalidScheme,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("User not authenticated")]
    NotAuthenticated,
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
            .json(serde_json::json!({
                "error": "unauthorized",
                "message": self.to_string(),
                "status": self.status_code().as_u16(),
            }))
    }
}

/// JWT Authentication Middleware
///
/// Verifies `Authorization: Bearer <jwt>` and stores the resulting
/// [`AuthenticatedUser`] in request extensions. Anything else is answered with
/// 401 before the wrapped service runs.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    verifier: Arc<TokenVerifier>,
}

impl JwtAuthMiddleware {
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    verifier: Arc<TokenVerifier>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verifier = self.verifier.clone();

        Box::pin(async move {
            match authenticate(&req, &verifier) {
                Ok(user) => {
                    tracing::debug!(user = %user.subject, "Authenticated request");
                    req.extensions_mut().insert(user);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => {
                    tracing::warn!(path = %req.path(), "JWT authentication failed: {}", err);
                    let response = err.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

fn authenticate(req: &ServiceRequest, verifier: &TokenVerifier) -> Result<AuthenticatedUser, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingHeader)?;

    // Scheme names are case-insensitive
    let (scheme, token) = auth_header
        .trim_start()
        .split_once(char::is_whitespace)
        .ok_or(AuthError::InvalidScheme)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX.trim_end()) || token.is_empty() {
        return Err(AuthError::InvalidScheme);
    }

    let claims = verifier.verify(token)?;
    Ok(AuthenticatedUser::from(claims))
}
