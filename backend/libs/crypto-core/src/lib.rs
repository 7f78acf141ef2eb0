//! Key material and JWT primitives for the company service.
//!
//! - `keys`: RSA key pair provisioning (generate once, load afterwards)
//! - `jwt`: RS256 token issuance and verification
//!
//! Key material is passed around explicitly as a [`keys::KeyPair`]; nothing in
//! this crate keeps global state.

pub mod jwt;
pub mod keys;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use jwt::{Claims, TokenError, TokenIssuer, TokenVerifier};
pub use keys::{KeyConfig, KeyError, KeyPair};
