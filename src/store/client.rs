//! Action creators
//!
//! Each public method here is one asynchronous capability: it dispatches
//! the request action, performs the HTTP call against the demo server,
//! then dispatches exactly one response or error action. Errors are both
//! captured into the store and rethrown to the caller, so a UI can react
//! to either channel.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::multipart;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::download;
use super::{Action, Capability, ErrorInfo, Item, Store};
use crate::types::{LightstreamsError, Result};

/// Success envelope every server endpoint wraps its payload in
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorInfo,
}

#[derive(Debug, Deserialize)]
struct BalancePayload {
    pht: String,
    wei: String,
}

/// Store-driving client for the demo server
pub struct StoreClient {
    base_url: String,
    session_token: String,
    http: reqwest::Client,
    store: Store,
    /// Where fetched files are materialized
    download_dir: PathBuf,
}

impl StoreClient {
    pub fn new(
        base_url: &str,
        session_token: &str,
        download_dir: PathBuf,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LightstreamsError::Config(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token: session_token.to_string(),
            http,
            store: Store::new(),
            download_dir,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Drop all cached state, as on logout
    pub fn clear(&self) {
        self.store.dispatch(Action::ClearStoredState);
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Run one capability under the request/response/error protocol
    ///
    /// The request action lands before the work starts; whichever way the
    /// work ends, exactly one follow-up action lands, and failures are
    /// rethrown after being captured.
    async fn settle<F>(&self, kind: Capability, work: F) -> Result<Action>
    where
        F: Future<Output = Result<Action>>,
    {
        self.store.dispatch(Action::requested(kind));
        match work.await {
            Ok(action) => {
                self.store.dispatch(action.clone());
                Ok(action)
            }
            Err(e) => {
                self.store.dispatch(Action::ErrorReceived(ErrorInfo::from(&e)));
                Err(e)
            }
        }
    }

    /// Decode the server envelope, folding error envelopes into failures
    async fn decode<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
                Ok(body) => body.error.message,
                Err(_) => format!("Server responded with status {}", status),
            };
            return Err(LightstreamsError::gateway(message));
        }

        let envelope: DataEnvelope<T> = serde_json::from_slice(&bytes)
            .map_err(|e| LightstreamsError::gateway(format!("Malformed server payload: {}", e)))?;
        Ok(envelope.data)
    }

    /// Refresh the cached wallet balance
    pub async fn wallet_balance(&self) -> Result<()> {
        self.settle(Capability::WalletBalance, async {
            let response = self
                .http
                .get(self.url("/wallet/balance"))
                .bearer_auth(&self.session_token)
                .send()
                .await?;
            let balance: BalancePayload = Self::decode(response).await?;
            Ok(Action::WalletBalanceReceived {
                pht: balance.pht,
                wei: balance.wei,
            })
        })
        .await?;
        Ok(())
    }

    /// Refresh the cached shelf listing
    pub async fn item_list(&self) -> Result<()> {
        self.settle(Capability::ItemList, async {
            let response = self
                .http
                .get(self.url("/shelves/item-list"))
                .bearer_auth(&self.session_token)
                .send()
                .await?;
            let items: Vec<Item> = Self::decode(response).await?;
            Ok(Action::ItemListReceived(items))
        })
        .await?;
        Ok(())
    }

    /// Upload a file to the shelf with its display metadata
    pub async fn storage_add(
        &self,
        title: &str,
        description: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = multipart::Form::new()
            .text("title", title.to_string())
            .text("description", description.to_string())
            .part("file", part);

        self.settle(Capability::StorageAdd, async {
            let response = self
                .http
                .post(self.url("/shelves/item-add"))
                .bearer_auth(&self.session_token)
                .multipart(form)
                .send()
                .await?;
            let item: Item = Self::decode(response).await?;
            Ok(Action::StorageAddReceived(item))
        })
        .await?;
        Ok(())
    }

    /// Download one shelf item and materialize it locally
    ///
    /// The suggested filename from the content-disposition header wins;
    /// otherwise the item id names the file.
    pub async fn storage_fetch(&self, item_id: u64) -> Result<PathBuf> {
        let action = self
            .settle(Capability::StorageFetch, async {
                let response = self
                    .http
                    .get(self.url("/shelves/item-download"))
                    .query(&[("item_id", item_id.to_string())])
                    .bearer_auth(&self.session_token)
                    .send()
                    .await?;

                let status = response.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(LightstreamsError::ItemNotFound(format!(
                        "No shelf item with id {}",
                        item_id
                    )));
                }
                if !status.is_success() {
                    return Err(LightstreamsError::gateway(format!(
                        "Download failed with status {}",
                        status
                    )));
                }

                let disposition = response
                    .headers()
                    .get("content-disposition")
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string());
                let filename = download::extract_filename(disposition.as_deref())
                    .unwrap_or_else(|| format!("item-{}", item_id));

                let bytes = response.bytes().await?;
                let path = download::materialize(&self.download_dir, &filename, &bytes).await?;
                debug!(path = %path.display(), "Materialized download");

                Ok(Action::StorageFetchReceived {
                    file_path: path.display().to_string(),
                })
            })
            .await?;

        match action {
            Action::StorageFetchReceived { file_path } => Ok(PathBuf::from(file_path)),
            _ => Err(LightstreamsError::Internal(
                "Download settled with an unexpected action".into(),
            )),
        }
    }

    /// Grant a permission on a permissioned file to another account
    pub async fn acl_grant(
        &self,
        acl: &str,
        password: &str,
        to_account: &str,
        permission_type: &str,
    ) -> Result<()> {
        self.settle(Capability::AclGrant, async {
            let response = self
                .http
                .post(self.url("/shelves/acl-grant"))
                .bearer_auth(&self.session_token)
                .json(&json!({
                    "acl": acl,
                    "password": password,
                    "toAccount": to_account,
                    "permissionType": permission_type,
                }))
                .send()
                .await?;
            let _: serde_json::Value = Self::decode(response).await?;
            Ok(Action::AclGrantReceived)
        })
        .await?;
        Ok(())
    }
}
