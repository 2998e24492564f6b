//! HTTP routes for the Lightstreams server
//!
//! Each module owns one path prefix and follows the same request
//! lifecycle: received, validated, delegated to a collaborator, formatted,
//! responded. Validation failures short-circuit before any collaborator is
//! invoked; collaborator failures are translated at the boundary and never
//! retried here.

pub mod auth_routes;
pub mod profile;
pub mod respond;
pub mod shelves;
pub mod wallet;

use hyper::body::Incoming;
use hyper::Request;

use crate::auth::{extract_bearer_token, SessionClaims};
use crate::server::AppState;
use crate::types::{LightstreamsError, Result};

/// Verify the bearer session token on a gated route
///
/// Absence or invalidity yields `Unauthorized` without touching any
/// collaborator.
pub fn authenticate(state: &AppState, req: &Request<Incoming>) -> Result<SessionClaims> {
    let header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    let token = extract_bearer_token(header)
        .ok_or_else(|| LightstreamsError::Unauthorized("Missing bearer token".into()))?;

    state.sessions.verify(token)
}
