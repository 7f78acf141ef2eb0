/// HTTP middleware for company-service
///
/// Token verification itself lives in the shared `actix-middleware` crate;
/// this module adds the company-specific authorization rules on top.
pub mod permissions;

pub use actix_middleware::{AuthenticatedUser, JwtAuthMiddleware, MetricsMiddleware};
pub use permissions::{
    check_company_access, check_company_deletion, is_admin, Authorized, CreateCompany,
    DeleteCompany, ListCompanies, ReadCompany, UpdateCompany,
};
