//! Smart contract adapter
//!
//! Translates domain operations into on-chain transactions and calls
//! against the fixed Dashboard / Profile / PermissionedFile / Faucet ABIs,
//! and normalizes the outcomes. Gas ceilings are fixed per operation; the
//! adapter never estimates and never retries.

pub mod contracts;
pub mod rpc;
pub mod units;

pub use rpc::{EthRpc, JsonRpcClient, TransactionReceipt, TransactionRequest};
pub use units::{pht_to_wei, wei_to_pht};

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, LogData, U256};
use alloy::sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use contracts::{Dashboard, Faucet, PermissionedFile, Profile};

use crate::types::{LightstreamsError, Result};

/// Gas ceiling for dashboard user registration
pub const GAS_CREATE_USER: u64 = 1_000_000;
/// Gas ceiling for grant/revoke transactions
pub const GAS_ACCESS_CHANGE: u64 = 60_000;
/// Gas ceiling for stacking an item on a profile
pub const GAS_STACK_ITEM: u64 = 1_200_000;
/// Gas ceiling for faucet top-ups
pub const GAS_FAUCET: u64 = 1_000_000;

/// Outcome of a grant or revoke transaction
///
/// The chain does not make these idempotent; a duplicate grant may revert.
/// Callers get to see which of the two happened instead of a bare error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessChange {
    Applied,
    Reverted,
}

/// New item waiting to be stacked on a profile
#[derive(Debug, Clone)]
pub struct ItemDraft {
    pub title: String,
    pub description: String,
    /// Address of the permissioned file contract holding the content
    pub meta: Address,
    pub acl: Address,
}

/// Item read back from a profile contract
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainItem {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub meta: Address,
    pub acl: Address,
    pub permissions: Vec<Address>,
}

/// Dashboard record for a registered account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainUserInfo {
    pub username: String,
    pub eth_address: Address,
    pub profile_address: Address,
    pub root_ipfs: String,
}

/// Domain operations compiled to chain transactions and calls
#[async_trait]
pub trait Contracts: Send + Sync {
    /// Register an account on the dashboard; returns the dashboard address
    async fn create_user(
        &self,
        eth_address: Address,
        username: &str,
        profile_address: Address,
    ) -> Result<Address>;

    /// Read the dashboard record for an account
    async fn retrieve_user_info(&self, eth_address: Address) -> Result<ChainUserInfo>;

    /// Resolve a username to its account address
    async fn find_user(&self, username: &str) -> Result<Address>;

    async fn grant_read_access(
        &self,
        owner: Address,
        item_id: u64,
        beneficiary: Address,
    ) -> Result<AccessChange>;

    async fn revoke_access(
        &self,
        owner: Address,
        item_id: u64,
        beneficiary: Address,
    ) -> Result<AccessChange>;

    /// Stack a new item on the owner's profile contract
    ///
    /// The transaction is signed through a transient password unlock; the
    /// password is borrowed for this call only. The new item id comes from
    /// the StackContent event; a receipt without one is a protocol
    /// violation, never a silent success.
    async fn stack_item(
        &self,
        owner: Address,
        password: &str,
        profile_address: Address,
        draft: ItemDraft,
    ) -> Result<u64>;

    /// Highest item id currently stacked on a profile
    async fn last_item_id(&self, profile_address: Address) -> Result<u64>;

    /// Read an item and the permission list of its meta contract
    async fn retrieve_item_by_id(&self, profile_address: Address, item_id: u64)
        -> Result<ChainItem>;

    /// Ask the faucet to credit an account
    async fn request_free_token(&self, beneficiary: Address, amount_wei: U256) -> Result<()>;
}

/// Adapter over a JSON-RPC node
pub struct ContractAdapter {
    rpc: Arc<dyn EthRpc>,
    dashboard: Address,
    faucet: Address,
}

impl ContractAdapter {
    pub fn new(rpc: Arc<dyn EthRpc>, dashboard: Address, faucet: Address) -> Self {
        Self {
            rpc,
            dashboard,
            faucet,
        }
    }

    /// Send a transaction from the node's default account and wait for it
    async fn transact(&self, to: Address, data: Vec<u8>, gas: u64) -> Result<TransactionReceipt> {
        let hash = self
            .rpc
            .send_transaction(TransactionRequest {
                from: None,
                to,
                gas,
                data: Bytes::from(data),
            })
            .await?;
        self.rpc.wait_for_receipt(hash).await
    }

    /// Send a transaction as `from` with a transient password unlock
    async fn transact_as(
        &self,
        from: Address,
        password: &str,
        to: Address,
        data: Vec<u8>,
        gas: u64,
    ) -> Result<TransactionReceipt> {
        let hash = self
            .rpc
            .personal_send_transaction(
                TransactionRequest {
                    from: Some(from),
                    to,
                    gas,
                    data: Bytes::from(data),
                },
                password,
            )
            .await?;
        self.rpc.wait_for_receipt(hash).await
    }

    /// Run an access-change transaction and surface the outcome
    async fn access_change(&self, data: Vec<u8>, what: &str) -> Result<AccessChange> {
        let receipt = self.transact(self.dashboard, data, GAS_ACCESS_CHANGE).await?;
        if receipt.status {
            Ok(AccessChange::Applied)
        } else {
            warn!("{} transaction reverted", what);
            Ok(AccessChange::Reverted)
        }
    }
}

#[async_trait]
impl Contracts for ContractAdapter {
    async fn create_user(
        &self,
        eth_address: Address,
        username: &str,
        profile_address: Address,
    ) -> Result<Address> {
        let data = Dashboard::createUserCall {
            wallet: eth_address,
            username: username.to_string(),
            profile: profile_address,
            extra: String::new(),
        }
        .abi_encode();

        let receipt = self.transact(self.dashboard, data, GAS_CREATE_USER).await?;
        if !receipt.status {
            return Err(LightstreamsError::ChainTx(format!(
                "createUser reverted for {}",
                username
            )));
        }

        debug!(%eth_address, username, "Registered user on dashboard contract");
        Ok(self.dashboard)
    }

    async fn retrieve_user_info(&self, eth_address: Address) -> Result<ChainUserInfo> {
        let username_raw = self
            .rpc
            .call(
                self.dashboard,
                Dashboard::findUsernameCall { wallet: eth_address }
                    .abi_encode()
                    .into(),
            )
            .await?;
        let username = Dashboard::findUsernameCall::abi_decode_returns(&username_raw)
            .map_err(decode_error)?;

        let profile_raw = self
            .rpc
            .call(
                self.dashboard,
                Dashboard::findProfileCall { wallet: eth_address }
                    .abi_encode()
                    .into(),
            )
            .await?;
        let profile_address =
            Dashboard::findProfileCall::abi_decode_returns(&profile_raw).map_err(decode_error)?;

        let root_raw = self
            .rpc
            .call(
                self.dashboard,
                Dashboard::findRootIPFSCall { wallet: eth_address }
                    .abi_encode()
                    .into(),
            )
            .await?;
        let root_ipfs =
            Dashboard::findRootIPFSCall::abi_decode_returns(&root_raw).map_err(decode_error)?;

        Ok(ChainUserInfo {
            username,
            eth_address,
            profile_address,
            root_ipfs,
        })
    }

    async fn find_user(&self, username: &str) -> Result<Address> {
        let raw = self
            .rpc
            .call(
                self.dashboard,
                Dashboard::findUserCall {
                    username: username.to_string(),
                }
                .abi_encode()
                .into(),
            )
            .await?;
        Dashboard::findUserCall::abi_decode_returns(&raw).map_err(decode_error)
    }

    async fn grant_read_access(
        &self,
        owner: Address,
        item_id: u64,
        beneficiary: Address,
    ) -> Result<AccessChange> {
        let data = Dashboard::grantReadAccessCall {
            owner,
            itemId: U256::from(item_id),
            reader: beneficiary,
        }
        .abi_encode();
        self.access_change(data, "grantReadAccess").await
    }

    async fn revoke_access(
        &self,
        owner: Address,
        item_id: u64,
        beneficiary: Address,
    ) -> Result<AccessChange> {
        let data = Dashboard::revokeAccessCall {
            owner,
            itemId: U256::from(item_id),
            reader: beneficiary,
        }
        .abi_encode();
        self.access_change(data, "revokeAccess").await
    }

    async fn stack_item(
        &self,
        owner: Address,
        password: &str,
        profile_address: Address,
        draft: ItemDraft,
    ) -> Result<u64> {
        let data = Profile::stackItemCall {
            title: draft.title,
            description: draft.description,
            meta: draft.meta,
            acl: draft.acl,
        }
        .abi_encode();

        let receipt = self
            .transact_as(owner, password, profile_address, data, GAS_STACK_ITEM)
            .await?;

        if !receipt.status {
            return Err(LightstreamsError::ChainTx(
                "stackItem transaction reverted".into(),
            ));
        }

        extract_stacked_item_id(&receipt, profile_address)
    }

    async fn last_item_id(&self, profile_address: Address) -> Result<u64> {
        let raw = self
            .rpc
            .call(profile_address, Profile::lastItemIdCall {}.abi_encode().into())
            .await?;
        let id = Profile::lastItemIdCall::abi_decode_returns(&raw).map_err(decode_error)?;
        u64::try_from(id)
            .map_err(|_| LightstreamsError::ChainTx("lastItemId out of range".into()))
    }

    async fn retrieve_item_by_id(
        &self,
        profile_address: Address,
        item_id: u64,
    ) -> Result<ChainItem> {
        // Transport failures propagate as ChainTx; only an empty or
        // undecodable read means the item does not exist
        let not_found =
            || LightstreamsError::ItemNotFound(format!("No item {} on profile", item_id));

        let raw = self
            .rpc
            .call(
                profile_address,
                Profile::itemsCall {
                    itemId: U256::from(item_id),
                }
                .abi_encode()
                .into(),
            )
            .await?;
        let item = Profile::itemsCall::abi_decode_returns(&raw).map_err(|_| not_found())?;

        // A zeroed meta slot means the id was never assigned
        if item.meta == Address::ZERO {
            return Err(not_found());
        }

        let perm_raw = self
            .rpc
            .call(item.meta, PermissionedFile::permissionsCall {}.abi_encode().into())
            .await?;
        let permissions = PermissionedFile::permissionsCall::abi_decode_returns(&perm_raw)
            .map_err(|_| not_found())?;

        Ok(ChainItem {
            id: item_id,
            title: item.title,
            description: item.description,
            meta: item.meta,
            acl: item.acl,
            permissions,
        })
    }

    async fn request_free_token(&self, beneficiary: Address, amount_wei: U256) -> Result<()> {
        let data = Faucet::requestFreeTokenCall {
            beneficiary,
            amount: amount_wei,
        }
        .abi_encode();

        let receipt = self.transact(self.faucet, data, GAS_FAUCET).await?;
        if !receipt.status {
            return Err(LightstreamsError::ChainTx(
                "Faucet requestFreeToken reverted".into(),
            ));
        }

        debug!(%beneficiary, amount = %amount_wei, "Faucet top-up mined");
        Ok(())
    }
}

fn decode_error(err: alloy::sol_types::Error) -> LightstreamsError {
    LightstreamsError::ChainTx(format!("ABI decode failed: {}", err))
}

/// Pull the assigned item id out of the StackContent event
fn extract_stacked_item_id(receipt: &TransactionReceipt, profile: Address) -> Result<u64> {
    for log in &receipt.logs {
        if log.address != profile {
            continue;
        }
        if log.topics.first() != Some(&Profile::StackContent::SIGNATURE_HASH) {
            continue;
        }

        let data = LogData::new_unchecked(log.topics.clone(), log.data.clone());
        let event = Profile::StackContent::decode_log_data(&data)
            .map_err(|e| LightstreamsError::ChainTx(format!("Bad StackContent event: {}", e)))?;

        return u64::try_from(event._itemId)
            .map_err(|_| LightstreamsError::ChainTx("Stacked item id out of range".into()));
    }

    Err(LightstreamsError::ChainTx(
        "stackItem receipt carried no StackContent event".into(),
    ))
}
