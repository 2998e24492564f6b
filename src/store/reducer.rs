//! The reducer
//!
//! Pure and total over the action set: every action maps old state to new
//! state with no side effects and no panics. Error actions keep previously
//! cached data (stale-but-present); only the clear action empties the
//! cache.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::{Action, ErrorInfo, Item};

/// Client cache shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub is_fetching: bool,
    pub error: Option<ErrorInfo>,
    pub last_requested_at: Option<DateTime<Utc>>,
    /// Shelf items keyed by id
    pub files: HashMap<u64, Item>,
    /// Display balance in pht
    pub balance: Option<String>,
    /// Path of the most recently materialized download
    pub file_path: Option<String>,
}

impl State {
    /// The empty shape the clear action rebuilds
    pub fn initial() -> Self {
        Self::default()
    }

    fn requesting(&self, at: DateTime<Utc>) -> Self {
        Self {
            is_fetching: true,
            error: None,
            last_requested_at: Some(at),
            ..self.clone()
        }
    }
}

/// Apply one action
pub fn reduce(state: &State, action: &Action) -> State {
    match action {
        Action::WalletBalanceRequested { at }
        | Action::ItemListRequested { at }
        | Action::StorageAddRequested { at }
        | Action::StorageFetchRequested { at }
        | Action::AclGrantRequested { at } => state.requesting(*at),

        Action::WalletBalanceReceived { pht, .. } => State {
            is_fetching: false,
            error: None,
            balance: Some(pht.clone()),
            ..state.clone()
        },

        Action::ItemListReceived(items) => {
            // Merge keyed by id; an empty refresh does not blank the cache
            let mut files = state.files.clone();
            for item in items {
                files.insert(item.id, item.clone());
            }
            State {
                is_fetching: false,
                error: None,
                files,
                ..state.clone()
            }
        }

        Action::StorageAddReceived(item) => {
            let mut files = state.files.clone();
            files.insert(item.id, item.clone());
            State {
                is_fetching: false,
                error: None,
                files,
                ..state.clone()
            }
        }

        Action::StorageFetchReceived { file_path } => State {
            is_fetching: false,
            file_path: Some(file_path.clone()),
            ..state.clone()
        },

        Action::AclGrantReceived => State {
            is_fetching: false,
            error: None,
            ..state.clone()
        },

        Action::ErrorReceived(error) => State {
            is_fetching: false,
            error: Some(error.clone()),
            ..state.clone()
        },

        Action::ClearStoredState => State::initial(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Capability;

    fn item(id: u64, title: &str) -> Item {
        Item {
            id,
            title: title.into(),
            description: String::new(),
            meta: String::new(),
            acl: String::new(),
        }
    }

    #[test]
    fn test_request_marks_fetching_and_clears_error() {
        let state = State {
            error: Some(ErrorInfo {
                message: "old failure".into(),
            }),
            ..State::initial()
        };

        let state = reduce(&state, &Action::requested(Capability::WalletBalance));
        assert!(state.is_fetching);
        assert!(state.error.is_none());
        assert!(state.last_requested_at.is_some());
    }

    #[test]
    fn test_balance_response_replaces_scalar() {
        let state = reduce(
            &State::initial(),
            &Action::WalletBalanceReceived {
                pht: "1.23456789".into(),
                wei: "1234567890000000000".into(),
            },
        );
        assert_eq!(state.balance.as_deref(), Some("1.23456789"));
        assert!(!state.is_fetching);
    }

    #[test]
    fn test_item_list_merges_keyed_by_id() {
        let state = reduce(
            &State::initial(),
            &Action::ItemListReceived(vec![item(1, "one"), item(2, "two")]),
        );
        assert_eq!(state.files.len(), 2);

        // A later list updates overlapping ids and keeps the rest
        let state = reduce(&state, &Action::ItemListReceived(vec![item(2, "two v2"), item(3, "three")]));
        assert_eq!(state.files.len(), 3);
        assert_eq!(state.files[&2].title, "two v2");
        assert_eq!(state.files[&1].title, "one");
    }

    #[test]
    fn test_storage_add_inserts_single_item() {
        let state = reduce(&State::initial(), &Action::StorageAddReceived(item(9, "new")));
        assert_eq!(state.files.len(), 1);
        assert_eq!(state.files[&9].title, "new");
    }

    #[test]
    fn test_failed_refresh_is_stale_but_present() {
        let populated = reduce(
            &State::initial(),
            &Action::ItemListReceived(vec![item(1, "one")]),
        );

        let failed = reduce(
            &reduce(&populated, &Action::requested(Capability::ItemList)),
            &Action::ErrorReceived(ErrorInfo {
                message: "gateway down".into(),
            }),
        );

        assert_eq!(failed.files, populated.files);
        assert_eq!(failed.error.unwrap().message, "gateway down");
        assert!(!failed.is_fetching);
    }

    #[test]
    fn test_clear_always_yields_initial_state() {
        let mut state = State::initial();
        for action in [
            Action::requested(Capability::WalletBalance),
            Action::WalletBalanceReceived {
                pht: "2".into(),
                wei: "2000000000000000000".into(),
            },
            Action::requested(Capability::ItemList),
            Action::ItemListReceived(vec![item(1, "one")]),
            Action::ErrorReceived(ErrorInfo {
                message: "boom".into(),
            }),
        ] {
            state = reduce(&state, &action);
        }

        assert_eq!(reduce(&state, &Action::ClearStoredState), State::initial());
        assert_eq!(
            reduce(&State::initial(), &Action::ClearStoredState),
            State::initial()
        );
    }
}
