//! # Actix Middleware Library
//!
//! Middleware components shared by the company service
//!
//! ## Modules
//! - `jwt_auth`: bearer token authentication
//! - `principal`: the authenticated caller and its extractor
//! - `metrics`: Prometheus request metrics

pub mod jwt_auth;
pub mod metrics;
pub mod principal;

pub use jwt_auth::{AuthError, JwtAuthMiddleware};
pub use metrics::{serve_metrics, MetricsMiddleware};
pub use principal::{AuthenticatedUser, ROLE_PREFIX};
