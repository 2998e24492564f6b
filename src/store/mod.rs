//! Client state store
//!
//! Browser-side half of the demo: a normalized cache of wallet balance and
//! shelf items driven by a uniform three-phase action protocol. Every
//! asynchronous capability dispatches a request action, then exactly one
//! response or error action; a dedicated clear action rebuilds the cache
//! from scratch on logout.

pub mod client;
pub mod download;
pub mod reducer;

pub use client::StoreClient;
pub use download::extract_filename;
pub use reducer::{reduce, State};

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shelf entry as cached on the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub meta: String,
    #[serde(default)]
    pub acl: String,
}

/// Failure captured into the cache; reducers never crash on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
}

impl From<&crate::types::LightstreamsError> for ErrorInfo {
    fn from(err: &crate::types::LightstreamsError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Closed set of actions the reducer understands
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    WalletBalanceRequested { at: DateTime<Utc> },
    WalletBalanceReceived { pht: String, wei: String },
    ItemListRequested { at: DateTime<Utc> },
    ItemListReceived(Vec<Item>),
    StorageAddRequested { at: DateTime<Utc> },
    StorageAddReceived(Item),
    StorageFetchRequested { at: DateTime<Utc> },
    StorageFetchReceived { file_path: String },
    AclGrantRequested { at: DateTime<Utc> },
    AclGrantReceived,
    ErrorReceived(ErrorInfo),
    ClearStoredState,
}

impl Action {
    /// Request phase of a capability, stamped now
    pub fn requested(kind: Capability) -> Self {
        let at = Utc::now();
        match kind {
            Capability::WalletBalance => Action::WalletBalanceRequested { at },
            Capability::ItemList => Action::ItemListRequested { at },
            Capability::StorageAdd => Action::StorageAddRequested { at },
            Capability::StorageFetch => Action::StorageFetchRequested { at },
            Capability::AclGrant => Action::AclGrantRequested { at },
        }
    }
}

/// The five asynchronous capabilities the store drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    WalletBalance,
    ItemList,
    StorageAdd,
    StorageFetch,
    AclGrant,
}

/// Mutex-guarded state with atomic per-action dispatch
///
/// One mutation completes before the next action's effects are visible;
/// there is no finer-grained locking to reason about.
#[derive(Default)]
pub struct Store {
    state: Mutex<State>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self, action: Action) {
        let mut state = self.state.lock().expect("store mutex poisoned");
        *state = reduce(&state, &action);
    }

    pub fn snapshot(&self) -> State {
        self.state.lock().expect("store mutex poisoned").clone()
    }

    /// Selector: cached files keyed by item id
    pub fn files(&self) -> HashMap<u64, Item> {
        self.snapshot().files
    }

    /// Selector: last captured error, if any
    pub fn error(&self) -> Option<ErrorInfo> {
        self.snapshot().error
    }

    /// Selector: cached balance in pht
    pub fn balance(&self) -> Option<String> {
        self.snapshot().balance
    }
}
