//! Wallet routes (session-gated)
//!
//! - GET  /wallet/balance         - wei balance from the gateway, pht derived exactly
//! - POST /wallet/request-top-up  - faucet transaction, then a fresh balance

use alloy::primitives::Address;
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::SessionClaims;
use crate::chain::{pht_to_wei, wei_to_pht};
use crate::routes::respond::{self, BoxBody};
use crate::routes::authenticate;
use crate::server::AppState;
use crate::types::{LightstreamsError, Result};

#[derive(Debug, Serialize)]
pub struct BalanceView {
    pub pht: String,
    pub wei: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TopUpAttrs {
    pub amount: Option<String>,
}

pub async fn handle(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    // Gated before any body is read or collaborator touched
    let claims = match authenticate(&state, &req) {
        Ok(claims) => claims,
        Err(e) => return respond::error_response(&e),
    };

    let path = req.uri().path().to_string();
    match (req.method().clone(), path.as_str()) {
        (Method::GET, "/wallet/balance") => match balance(&state, &claims).await {
            Ok(view) => respond::json_data(&view),
            Err(e) => respond::error_response(&e),
        },
        (Method::POST, "/wallet/request-top-up") => {
            let attrs = match respond::parse_json_body(req).await {
                Ok(attrs) => attrs,
                Err(e) => return respond::error_response(&e),
            };
            match request_top_up(&state, &claims, &attrs).await {
                Ok(view) => respond::json_data(&view),
                Err(e) => respond::error_response(&e),
            }
        }
        _ => respond::json_error(StatusCode::NOT_FOUND, "Wallet endpoint not found"),
    }
}

/// Current balance, wei verbatim plus the exact pht rendering
pub async fn balance(state: &AppState, claims: &SessionClaims) -> Result<BalanceView> {
    let wei = state.gateway.wallet_balance(&claims.eth_address).await?;
    Ok(BalanceView {
        pht: wei_to_pht(wei),
        wei: wei.to_string(),
    })
}

/// Ask the faucet for tokens, then report the fresh balance
pub async fn request_top_up(
    state: &AppState,
    claims: &SessionClaims,
    attrs: &TopUpAttrs,
) -> Result<BalanceView> {
    let amount = attrs
        .amount
        .as_deref()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| LightstreamsError::BadInput("Missing required field: amount".into()))?;
    let amount_wei = pht_to_wei(amount)?;

    let beneficiary: Address = claims.eth_address.parse().map_err(|_| {
        LightstreamsError::Internal(format!("Stored eth address is invalid: {}", claims.eth_address))
    })?;

    state
        .contracts
        .request_free_token(beneficiary, amount_wei)
        .await?;

    balance(state, claims).await
}
