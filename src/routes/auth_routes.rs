//! Authentication routes
//!
//! - POST /auth/create-user   - gateway allocates an account, registry persists the user
//! - POST /auth/authenticate  - verify credentials, refresh the gateway token, issue a session

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::routes::respond::{self, BoxBody};
use crate::server::AppState;
use crate::types::{LightstreamsError, Result};
use crate::users::UserView;

/// Request attributes shared by both auth endpoints
///
/// Fields are optional so that presence is checked here, before any
/// collaborator call, rather than by the JSON decoder.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    fn require(&self) -> Result<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Ok((u, p)),
            _ => Err(LightstreamsError::BadInput(
                "Missing required fields: username, password".into(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserView,
}

pub async fn handle(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let path = req.uri().path().to_string();

    match (req.method().clone(), path.as_str()) {
        (Method::POST, "/auth/create-user") => {
            let attrs = match respond::parse_json_body(req).await {
                Ok(attrs) => attrs,
                Err(e) => return respond::error_response(&e),
            };
            match create_user(&state, &attrs).await {
                Ok(user) => respond::json_data(&serde_json::json!({ "user": user })),
                Err(e) => respond::error_response(&e),
            }
        }
        (Method::POST, "/auth/authenticate") => {
            let attrs = match respond::parse_json_body(req).await {
                Ok(attrs) => attrs,
                Err(e) => return respond::error_response(&e),
            };
            match authenticate(&state, &attrs).await {
                Ok(payload) => respond::json_data(&payload),
                Err(e) => respond::error_response(&e),
            }
        }
        (_, "/auth/create-user") | (_, "/auth/authenticate") => {
            respond::json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        }
        _ => respond::json_error(StatusCode::NOT_FOUND, "Auth endpoint not found"),
    }
}

/// Sign up: the gateway allocates the eth address, the registry persists
/// the user. The address never changes afterwards.
pub async fn create_user(state: &AppState, attrs: &Credentials) -> Result<UserView> {
    let (username, password) = attrs.require()?;

    let account = state.gateway.user_sign_up(password).await?;
    let user = state.users.create(username, password, &account)?;

    info!(username, eth_address = %user.eth_address, "User created");
    Ok(UserView::from(&user))
}

/// Authenticate: local verify, gateway sign-in, session token issue
pub async fn authenticate(state: &AppState, attrs: &Credentials) -> Result<AuthPayload> {
    let (username, password) = attrs.require()?;

    let user = state.users.verify(username, password)?;
    let gateway_token = state
        .gateway
        .user_sign_in(&user.eth_address, password)
        .await?;
    state.users.refresh_gateway_token(username, &gateway_token)?;

    let token = state
        .sessions
        .issue(user.id, &user.username, &user.eth_address)?;

    Ok(AuthPayload {
        token,
        user: UserView::from(&user),
    })
}
