//! Gateway client
//!
//! Typed HTTP client for the remote gateway service that brokers wallet,
//! user, ACL and storage operations against the chain on the client's
//! behalf. Every failure (network error or non-2xx status) surfaces as a
//! uniform `Gateway` error before any caller state is touched.

mod client;

pub use client::GatewayClient;

use alloy::primitives::U256;
use async_trait::async_trait;
use bytes::Bytes;

use crate::types::Result;

/// Response from the gateway storage surface, forwarded verbatim by the
/// shelves proxy routes
#[derive(Debug, Clone)]
pub struct ProxiedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Bytes,
}

/// Request forwarded to the gateway storage surface
#[derive(Debug, Clone)]
pub struct StorageRequest {
    pub method: reqwest::Method,
    pub path: String,
    pub query: Option<String>,
    pub gateway_token: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Operations exposed by the remote gateway
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Wallet balance in wei for an account
    async fn wallet_balance(&self, eth_address: &str) -> Result<U256>;

    /// Allocate a new account; returns its eth address
    async fn user_sign_up(&self, password: &str) -> Result<String>;

    /// Authenticate an account; returns a gateway session token
    async fn user_sign_in(&self, eth_address: &str, password: &str) -> Result<String>;

    /// Grant a permission on a permissioned file through the gateway
    async fn acl_grant(
        &self,
        acl: &str,
        owner_account: &str,
        password: &str,
        to_account: &str,
        permission_type: &str,
    ) -> Result<serde_json::Value>;

    /// Forward a storage request (item-list, item-add, item-download)
    async fn storage_request(&self, request: StorageRequest) -> Result<ProxiedResponse>;
}
