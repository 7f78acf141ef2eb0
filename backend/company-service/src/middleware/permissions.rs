/// Authorization rules for company endpoints
///
/// Two layers: a per-route role allow-list, enforced by the [`Authorized`]
/// extractor before the request body is looked at, and an ownership rule
/// applied once the target record has been loaded.
use actix_middleware::AuthenticatedUser;
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use std::marker::PhantomData;
use std::ops::Deref;

use crate::error::AppError;
use crate::models::Company;

pub const ADMIN: &str = "ADMIN";
pub const COMPANY_READ: &str = "COMPANY_READ";
pub const COMPANY_CREATE: &str = "COMPANY_CREATE";
pub const COMPANY_SAVE: &str = "COMPANY_SAVE";
pub const COMPANY_DELETE: &str = "COMPANY_DELETE";

/// Roles any one of which admits a caller to a route.
pub trait RoleRequirement {
    const ROLES: &'static [&'static str];
}

pub struct ListCompanies;
pub struct ReadCompany;
pub struct CreateCompany;
pub struct UpdateCompany;
pub struct DeleteCompany;

impl RoleRequirement for ListCompanies {
    const ROLES: &'static [&'static str] = &[
        ADMIN,
        COMPANY_READ,
        COMPANY_SAVE,
        COMPANY_DELETE,
        COMPANY_CREATE,
    ];
}

impl RoleRequirement for ReadCompany {
    const ROLES: &'static [&'static str] = &[ADMIN, COMPANY_READ, COMPANY_SAVE];
}

impl RoleRequirement for CreateCompany {
    const ROLES: &'static [&'static str] = &[ADMIN, COMPANY_CREATE];
}

impl RoleRequirement for UpdateCompany {
    const ROLES: &'static [&'static str] = &[ADMIN, COMPANY_SAVE];
}

impl RoleRequirement for DeleteCompany {
    const ROLES: &'static [&'static str] = &[ADMIN, COMPANY_DELETE];
}

/// An authenticated caller holding one of `R::ROLES`.
///
/// Missing principal → 401, principal without a listed role → 403.
pub struct Authorized<R> {
    user: AuthenticatedUser,
    _requirement: PhantomData<R>,
}

impl<R> Authorized<R> {
    pub fn into_inner(self) -> AuthenticatedUser {
        self.user
    }
}

impl<R> Deref for Authorized<R> {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl<R: RoleRequirement> FromRequest for Authorized<R> {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => user,
            None => {
                return ready(Err(AppError::Unauthorized(
                    "User not authenticated".to_string(),
                )))
            }
        };

        if !user.has_any_role(R::ROLES) {
            tracing::warn!(
                user = %user.name(),
                path = %req.path(),
                "Caller lacks a required role"
            );
            return ready(Err(AppError::Forbidden("Access Denied".to_string())));
        }

        ready(Ok(Authorized {
            user,
            _requirement: PhantomData,
        }))
    }
}

pub fn is_admin(user: &AuthenticatedUser) -> bool {
    user.has_role(ADMIN)
}

/// Owner or admin may read or update a company.
pub fn check_company_access(user: &AuthenticatedUser, company: &Company) -> Result<(), AppError> {
    if is_admin(user) || company.is_owned_by(user.name()) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "User({}) does not have access to this resource",
            user.name()
        )))
    }
}

/// Owner or admin may delete a company.
pub fn check_company_deletion(user: &AuthenticatedUser, company: &Company) -> Result<(), AppError> {
    if is_admin(user) || company.is_owned_by(user.name()) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "User({}) does not have access to delete this resource",
            user.name()
        )))
    }
}
