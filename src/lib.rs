//! Lightstreams demo server
//!
//! Bridges a browser client to the Lightstreams gateway and the smart
//! contracts behind it: user onboarding, wallet balance and top-ups, the
//! proxied storage shelf, and profile/ACL operations on chain. A client
//! state store mirrors the server surface for the browser half of the
//! demo.

pub mod auth;
pub mod chain;
pub mod config;
pub mod gateway;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;
pub mod users;

#[cfg(test)]
pub mod test_support;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{LightstreamsError, Result};
