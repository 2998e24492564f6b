//! HTTP server for the Lightstreams demo

mod http;

pub use http::run;

use std::sync::Arc;

use crate::auth::SessionKeeper;
use crate::chain::Contracts;
use crate::config::Args;
use crate::gateway::Gateway;
use crate::types::{LightstreamsError, Result};
use crate::users::UserRegistry;

/// Shared application state
///
/// Collaborators are trait objects constructed once at startup and injected
/// here; handlers never reach for globals.
pub struct AppState {
    pub args: Args,
    pub users: UserRegistry,
    pub gateway: Arc<dyn Gateway>,
    pub contracts: Arc<dyn Contracts>,
    pub sessions: SessionKeeper,
}

impl AppState {
    pub fn new(args: Args, gateway: Arc<dyn Gateway>, contracts: Arc<dyn Contracts>) -> Result<Self> {
        let secret = args.jwt_secret().map_err(LightstreamsError::Config)?;
        let sessions = SessionKeeper::new(secret, args.jwt_expiry_seconds)?;

        Ok(Self {
            args,
            users: UserRegistry::new(),
            gateway,
            contracts,
            sessions,
        })
    }
}
