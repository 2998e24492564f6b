//! Counting mock collaborators for route tests

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use bytes::Bytes;
use clap::Parser;

use crate::chain::{AccessChange, ChainItem, ChainUserInfo, Contracts, ItemDraft};
use crate::config::Args;
use crate::gateway::{Gateway, ProxiedResponse, StorageRequest};
use crate::server::AppState;
use crate::types::{LightstreamsError, Result};

pub const MOCK_ACCOUNT: &str = "0x00000000000000000000000000000000000000aa";
pub const MOCK_PROFILE: &str = "0x00000000000000000000000000000000000000cc";

/// Gateway double that counts calls and can be told to fail
#[derive(Default)]
pub struct MockGateway {
    pub calls: AtomicUsize,
    pub fail: bool,
    /// Wei balance reported by wallet_balance
    pub balance: Option<U256>,
}

impl MockGateway {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(LightstreamsError::gateway("mock gateway failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn wallet_balance(&self, _eth_address: &str) -> Result<U256> {
        self.tick()?;
        Ok(self
            .balance
            .unwrap_or_else(|| U256::from(1_234_567_890_000_000_000u64)))
    }

    async fn user_sign_up(&self, _password: &str) -> Result<String> {
        self.tick()?;
        Ok(MOCK_ACCOUNT.to_string())
    }

    async fn user_sign_in(&self, _eth_address: &str, _password: &str) -> Result<String> {
        self.tick()?;
        Ok("mock-gateway-token".to_string())
    }

    async fn acl_grant(
        &self,
        _acl: &str,
        _owner_account: &str,
        _password: &str,
        _to_account: &str,
        _permission_type: &str,
    ) -> Result<serde_json::Value> {
        self.tick()?;
        Ok(serde_json::json!({ "granted": true }))
    }

    async fn storage_request(&self, _request: StorageRequest) -> Result<ProxiedResponse> {
        self.tick()?;
        Ok(ProxiedResponse {
            status: 200,
            content_type: Some("application/json".into()),
            content_disposition: None,
            body: Bytes::from_static(br#"{"data":[]}"#),
        })
    }
}

/// Contract adapter double with an in-memory permission set
#[derive(Default)]
pub struct MockContracts {
    pub calls: AtomicUsize,
    pub grants: Mutex<BTreeSet<(Address, u64, Address)>>,
    pub topped_up: Mutex<Vec<(Address, U256)>>,
}

impl MockContracts {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn grant_set(&self) -> BTreeSet<(Address, u64, Address)> {
        self.grants.lock().unwrap().clone()
    }
}

#[async_trait]
impl Contracts for MockContracts {
    async fn create_user(
        &self,
        _eth_address: Address,
        _username: &str,
        _profile_address: Address,
    ) -> Result<Address> {
        self.tick();
        Ok(Address::ZERO)
    }

    async fn retrieve_user_info(&self, eth_address: Address) -> Result<ChainUserInfo> {
        self.tick();
        Ok(ChainUserInfo {
            username: "alice".into(),
            eth_address,
            profile_address: MOCK_PROFILE.parse().unwrap(),
            root_ipfs: String::new(),
        })
    }

    async fn find_user(&self, _username: &str) -> Result<Address> {
        self.tick();
        Ok(MOCK_ACCOUNT.parse().unwrap())
    }

    async fn grant_read_access(
        &self,
        owner: Address,
        item_id: u64,
        beneficiary: Address,
    ) -> Result<AccessChange> {
        self.tick();
        let mut grants = self.grants.lock().unwrap();
        if grants.insert((owner, item_id, beneficiary)) {
            Ok(AccessChange::Applied)
        } else {
            // Duplicate grants revert on chain
            Ok(AccessChange::Reverted)
        }
    }

    async fn revoke_access(
        &self,
        owner: Address,
        item_id: u64,
        beneficiary: Address,
    ) -> Result<AccessChange> {
        self.tick();
        let mut grants = self.grants.lock().unwrap();
        if grants.remove(&(owner, item_id, beneficiary)) {
            Ok(AccessChange::Applied)
        } else {
            Ok(AccessChange::Reverted)
        }
    }

    async fn stack_item(
        &self,
        _owner: Address,
        _password: &str,
        _profile_address: Address,
        _draft: ItemDraft,
    ) -> Result<u64> {
        self.tick();
        Ok(7)
    }

    async fn last_item_id(&self, _profile_address: Address) -> Result<u64> {
        self.tick();
        Ok(7)
    }

    async fn retrieve_item_by_id(
        &self,
        _profile_address: Address,
        item_id: u64,
    ) -> Result<ChainItem> {
        self.tick();
        if item_id == 404 {
            return Err(LightstreamsError::ItemNotFound(format!(
                "No item {} on profile",
                item_id
            )));
        }
        Ok(ChainItem {
            id: item_id,
            title: "a title".into(),
            description: "a description".into(),
            meta: MOCK_PROFILE.parse().unwrap(),
            acl: Address::ZERO,
            permissions: vec![],
        })
    }

    async fn request_free_token(&self, beneficiary: Address, amount_wei: U256) -> Result<()> {
        self.tick();
        self.topped_up.lock().unwrap().push((beneficiary, amount_wei));
        Ok(())
    }
}

pub fn dev_args() -> Args {
    Args::parse_from(["lightstreams", "--dev-mode"])
}

pub fn test_state(gateway: Arc<MockGateway>, contracts: Arc<MockContracts>) -> Arc<AppState> {
    Arc::new(AppState::new(dev_args(), gateway, contracts).unwrap())
}

/// Serve exactly one HTTP request with a canned JSON body, returning the
/// base URL and a handle resolving to the raw request that was received
pub async fn spawn_one_shot_http(
    body: &'static str,
) -> (String, tokio::task::JoinHandle<String>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];

        // Read headers, then exactly content-length bytes of body
        let (header_end, content_length) = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            request.extend_from_slice(&chunk[..n]);
            if let Some(pos) = find_blank_line(&request) {
                let headers = String::from_utf8_lossy(&request[..pos]).to_lowercase();
                let length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                break (pos + 4, length);
            }
        };
        while request.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await.unwrap();
            request.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.flush().await.unwrap();

        String::from_utf8_lossy(&request).to_string()
    });

    (format!("http://{}", addr), handle)
}

fn find_blank_line(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
