//! In-process user registry
//!
//! The demo keeps its user table in memory; durability belongs to the
//! gateway and the chain. Usernames are unique and the eth address is
//! immutable once the gateway has allocated it.

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::types::{LightstreamsError, Result};

/// A registered user
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub eth_address: String,
    /// Gateway session token, refreshed on every authentication
    pub gateway_token: Option<String>,
}

/// Serializable view of a user; never carries the password hash
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub eth_address: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            eth_address: user.eth_address.clone(),
        }
    }
}

/// Registry of users, keyed by username
#[derive(Default)]
pub struct UserRegistry {
    users: DashMap<String, User>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a user; the password is hashed before storage
    ///
    /// Fails with `BadInput` on a duplicate username so the route layer maps
    /// it to a 400, matching the validation-error contract.
    pub fn create(&self, username: &str, password: &str, eth_address: &str) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            eth_address: eth_address.to_string(),
            gateway_token: None,
        };

        match self.users.entry(username.to_string()) {
            dashmap::Entry::Occupied(_) => Err(LightstreamsError::BadInput(format!(
                "Username already taken: {}",
                username
            ))),
            dashmap::Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    /// Verify credentials, returning the user on success
    pub fn verify(&self, username: &str, password: &str) -> Result<User> {
        let user = self
            .users
            .get(username)
            .ok_or_else(|| LightstreamsError::Unauthorized("Unknown username or password".into()))?;

        if verify_password(password, &user.password_hash)? {
            Ok(user.clone())
        } else {
            Err(LightstreamsError::Unauthorized(
                "Unknown username or password".into(),
            ))
        }
    }

    /// Look up a user by username
    pub fn find(&self, username: &str) -> Option<User> {
        self.users.get(username).map(|u| u.clone())
    }

    /// Replace the stored gateway token after a fresh sign-in
    pub fn refresh_gateway_token(&self, username: &str, token: &str) -> Result<()> {
        let mut user = self
            .users
            .get_mut(username)
            .ok_or_else(|| LightstreamsError::Internal(format!("No such user: {}", username)))?;
        user.gateway_token = Some(token.to_string());
        Ok(())
    }
}
