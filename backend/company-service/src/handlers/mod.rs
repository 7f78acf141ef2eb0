/// HTTP handlers for company-service
///
/// - auth: development token issuance
/// - companies: role- and owner-gated CRUD
/// - health: liveness and readiness probes
pub mod auth;
pub mod companies;
pub mod health;

pub use auth::issue_token;
pub use companies::{create_company, delete_company, get_company, list_companies, update_company};
pub use health::{health_summary, liveness_check, readiness_check};
