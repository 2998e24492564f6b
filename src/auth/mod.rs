//! Authentication for the Lightstreams server
//!
//! Provides:
//! - Argon2 password hashing for the local user registry
//! - JWT session tokens gating the wallet, shelves and profile routes

pub mod password;
pub mod session;

pub use password::{hash_password, verify_password};
pub use session::{extract_bearer_token, SessionClaims, SessionKeeper};
