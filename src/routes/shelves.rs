//! Shelf routes (session-gated)
//!
//! Thin proxy over the gateway's storage surface. The user's gateway token
//! rides along; bodies and the content-disposition header pass through
//! untouched so downloads keep their suggested filename.

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::auth::SessionClaims;
use crate::gateway::StorageRequest;
use crate::routes::authenticate;
use crate::routes::respond::{self, full_body, BoxBody};
use crate::server::AppState;
use crate::types::{LightstreamsError, Result};

/// Gateway storage paths backing the shelves surface
const PATH_ITEM_LIST: &str = "/storage/item-list";
const PATH_ITEM_ADD: &str = "/storage/item-add";
const PATH_ITEM_DOWNLOAD: &str = "/storage/item-download";

pub async fn handle(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(claims) => claims,
        Err(e) => return respond::error_response(&e),
    };

    let path = req.uri().path().to_string();
    let target = match (req.method().clone(), path.as_str()) {
        (Method::GET, "/shelves/item-list") => PATH_ITEM_LIST,
        (Method::POST, "/shelves/item-add") => PATH_ITEM_ADD,
        (Method::GET, "/shelves/item-download") => PATH_ITEM_DOWNLOAD,
        (Method::POST, "/shelves/acl-grant") => {
            let attrs = match respond::parse_json_body(req).await {
                Ok(attrs) => attrs,
                Err(e) => return respond::error_response(&e),
            };
            return match acl_grant(&state, &claims, &attrs).await {
                Ok(result) => respond::json_data(&result),
                Err(e) => respond::error_response(&e),
            };
        }
        _ => return respond::json_error(StatusCode::NOT_FOUND, "Shelf endpoint not found"),
    };

    match forward(&state, req, &claims.username, target).await {
        Ok(response) => response,
        Err(e) => respond::error_response(&e),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AclGrantAttrs {
    pub acl: Option<String>,
    pub password: Option<String>,
    pub to_account: Option<String>,
    /// Defaults to "read"
    pub permission_type: Option<String>,
}

/// Grant a permission on a permissioned file through the gateway
///
/// The owner account is always the session's, never taken from the body.
pub async fn acl_grant(
    state: &AppState,
    claims: &SessionClaims,
    attrs: &AclGrantAttrs,
) -> Result<serde_json::Value> {
    let require = |value: Option<&str>, field: &str| {
        value
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
            .ok_or_else(|| LightstreamsError::BadInput(format!("Missing required field: {}", field)))
    };

    let acl = require(attrs.acl.as_deref(), "acl")?;
    let password = require(attrs.password.as_deref(), "password")?;
    let to_account = require(attrs.to_account.as_deref(), "toAccount")?;
    let permission_type = attrs
        .permission_type
        .clone()
        .unwrap_or_else(|| "read".to_string());

    state
        .gateway
        .acl_grant(&acl, &claims.eth_address, &password, &to_account, &permission_type)
        .await
}

/// Forward one request to the gateway storage surface
async fn forward(
    state: &AppState,
    req: Request<Incoming>,
    username: &str,
    gateway_path: &str,
) -> Result<Response<BoxBody>> {
    let user = state
        .users
        .find(username)
        .ok_or_else(|| LightstreamsError::Unauthorized("Unknown session user".into()))?;

    let method = req.method().clone();
    let query = req.uri().query().map(|q| q.to_string());
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let body = req
        .collect()
        .await
        .map_err(|e| LightstreamsError::BadInput(format!("Failed to read body: {}", e)))?
        .to_bytes();

    debug!(%method, gateway_path, "Proxying shelf request");

    let proxied = state
        .gateway
        .storage_request(StorageRequest {
            method,
            path: gateway_path.to_string(),
            query,
            gateway_token: user.gateway_token,
            content_type,
            body: Bytes::from(body),
        })
        .await?;

    let mut builder = Response::builder()
        .status(StatusCode::from_u16(proxied.status).unwrap_or(StatusCode::OK));
    if let Some(content_type) = proxied.content_type {
        builder = builder.header("Content-Type", content_type);
    }
    if let Some(disposition) = proxied.content_disposition {
        builder = builder.header("Content-Disposition", disposition);
    }

    builder
        .body(full_body(proxied.body))
        .map_err(|e| LightstreamsError::Internal(format!("Response build failed: {}", e)))
}
