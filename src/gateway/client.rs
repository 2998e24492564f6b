//! HTTP implementation of the gateway client

use std::time::Duration;

use alloy::primitives::U256;
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{Gateway, ProxiedResponse, StorageRequest};
use crate::types::{LightstreamsError, Result};

/// Gateway endpoints used by the demo
const PATH_WALLET_BALANCE: &str = "/wallet/balance";
const PATH_USER_SIGNUP: &str = "/user/signup";
const PATH_USER_SIGNIN: &str = "/user/signin";
const PATH_ACL_GRANT: &str = "/acl/grant";

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: String,
}

#[derive(Debug, Deserialize)]
struct SignUpResponse {
    account: String,
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    token: String,
}

/// Error envelope the gateway uses for failed requests
#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    error: GatewayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorDetail {
    message: String,
}

/// reqwest-backed gateway client
pub struct GatewayClient {
    base_url: String,
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LightstreamsError::Config(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a JSON payload after the status check has passed
    async fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T> {
        let checked = check_status(response).await?;
        checked.json::<T>().await.map_err(|e| LightstreamsError::Gateway {
            message: format!("Malformed gateway payload: {}", e),
            cause: Some(Box::new(e)),
        })
    }
}

/// Short-circuit non-2xx responses into a uniform gateway error
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // Prefer the gateway's own error message when the body parses
    let message = match response.json::<GatewayErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => format!("Gateway responded with status {}", status),
    };

    Err(LightstreamsError::Gateway {
        message,
        cause: None,
    })
}

#[async_trait]
impl Gateway for GatewayClient {
    async fn wallet_balance(&self, eth_address: &str) -> Result<U256> {
        debug!(eth_address, "Fetching wallet balance from gateway");

        let response = self
            .http
            .get(self.url(PATH_WALLET_BALANCE))
            .query(&[("ethAddress", eth_address)])
            .send()
            .await?;

        let body: BalanceResponse = Self::decode(response).await?;
        U256::from_str_radix(&body.balance, 10).map_err(|e| LightstreamsError::Gateway {
            message: format!("Gateway returned a non-numeric balance: {}", e),
            cause: None,
        })
    }

    async fn user_sign_up(&self, password: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url(PATH_USER_SIGNUP))
            .json(&json!({ "password": password }))
            .send()
            .await?;

        let body: SignUpResponse = Self::decode(response).await?;
        debug!(account = %body.account, "Gateway allocated account");
        Ok(body.account)
    }

    async fn user_sign_in(&self, eth_address: &str, password: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url(PATH_USER_SIGNIN))
            .json(&json!({ "account": eth_address, "password": password }))
            .send()
            .await?;

        let body: SignInResponse = Self::decode(response).await?;
        Ok(body.token)
    }

    async fn acl_grant(
        &self,
        acl: &str,
        owner_account: &str,
        password: &str,
        to_account: &str,
        permission_type: &str,
    ) -> Result<serde_json::Value> {
        let response = self
            .http
            .post(self.url(PATH_ACL_GRANT))
            .json(&json!({
                "acl": acl,
                "owner": owner_account,
                "password": password,
                "to": to_account,
                "permissionType": permission_type,
            }))
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn storage_request(&self, request: StorageRequest) -> Result<ProxiedResponse> {
        let mut url = self.url(&request.path);
        if let Some(query) = &request.query {
            url = format!("{}?{}", url, query);
        }

        debug!(method = %request.method, url = %url, "Forwarding storage request to gateway");

        let mut builder = self.http.request(request.method, &url);
        if let Some(token) = &request.gateway_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(content_type) = &request.content_type {
            builder = builder.header("Content-Type", content_type.clone());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await?;
        let status = response.status();

        // A failed storage call short-circuits like every other gateway call
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            check_status(response).await?;
            return Err(LightstreamsError::gateway("Gateway storage request failed"));
        }

        let content_type = header_string(&response, "content-type");
        let content_disposition = header_string(&response, "content-disposition");
        let body = response.bytes().await?;

        Ok(ProxiedResponse {
            status: status.as_u16(),
            content_type,
            content_disposition,
            body,
        })
    }
}

fn header_string(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
