/// Company Service Library
///
/// CRUD over companies behind RS256 bearer tokens, with per-route role
/// allow-lists and an ownership rule for single records.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `models`: Company and token request/response types
/// - `services`: Business logic and startup seeding
/// - `db`: Repository trait with PostgreSQL and in-memory stores
/// - `middleware`: Role and ownership checks
/// - `routes`: Route table and shared state
/// - `error`: Error types and handling
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use routes::{configure, AppState};
