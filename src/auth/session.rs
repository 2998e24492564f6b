//! JWT session tokens
//!
//! Tokens are signed with HS256 and carry the user id, username and eth
//! address so that gated routes can reach the gateway without a registry
//! lookup. Default expiry is one hour.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::types::{LightstreamsError, Result};

/// Payload stored in a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: Uuid,
    pub username: String,
    /// Gateway-allocated account, immutable for the user's lifetime
    pub eth_address: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct SessionKeeper {
    secret: String,
    expiry_seconds: u64,
}

impl SessionKeeper {
    /// Create a new session keeper
    ///
    /// Returns an error if the secret is empty or too short.
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self> {
        if secret.len() < 32 {
            return Err(LightstreamsError::Config(
                "JWT secret must be at least 32 characters".into(),
            ));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Issue a token for an authenticated user
    pub fn issue(&self, user_id: Uuid, username: &str, eth_address: &str) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| LightstreamsError::Internal(format!("System time error: {}", e)))?
            .as_secs();

        let claims = SessionClaims {
            sub: user_id,
            username: username.to_string(),
            eth_address: eth_address.to_string(),
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| LightstreamsError::Internal(format!("Failed to issue token: {}", e)))
    }

    /// Verify and decode a session token
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            let msg = match err.kind() {
                ErrorKind::ExpiredSignature => "Session expired",
                ErrorKind::InvalidSignature => "Invalid signature",
                _ => "Invalid session token",
            };
            LightstreamsError::Unauthorized(msg.into())
        })
    }
}

/// Extract a bearer token from an Authorization header value
pub fn extract_bearer_token(auth_header: Option<&str>) -> Option<&str> {
    let token = auth_header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
