/// Data models for company-service
mod auth;
mod company;

pub use auth::{AuthorizationRequest, TokenResponse};
pub use company::{Company, CompanyRequest};

use std::borrow::Cow;
use validator::ValidationError;

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some(Cow::Borrowed("must not be blank"));
        return Err(err);
    }
    Ok(())
}
