use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use crypto_core::Claims;
use futures::future::{ready, Ready};

use crate::jwt_auth::AuthError;

/// Authorities granting a role are spelled `ROLE_<name>`.
pub const ROLE_PREFIX: &str = "ROLE_";

/// Caller identity established by [`crate::JwtAuthMiddleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub subject: String,
    pub authorities: Vec<String>,
    pub scope: Vec<String>,
    pub token_id: String,
}

impl AuthenticatedUser {
    pub fn new(subject: impl Into<String>, authorities: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            authorities,
            scope: Vec::new(),
            token_id: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.subject
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    /// `role` may be given with or without the `ROLE_` prefix.
    pub fn has_role(&self, role: &str) -> bool {
        let name = role.strip_prefix(ROLE_PREFIX).unwrap_or(role);
        self.authorities
            .iter()
            .any(|a| a.strip_prefix(ROLE_PREFIX) == Some(name))
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            authorities: claims.authorities,
            scope: claims.scope,
            token_id: claims.jti,
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedUser>()
                .cloned()
                .ok_or(AuthError::NotAuthenticated),
        )
    }
}
