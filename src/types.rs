//! Error types for the Lightstreams demo server

use hyper::StatusCode;

/// Main error type for Lightstreams operations
///
/// Errors are a closed taxonomy checked explicitly at the route boundary;
/// control flow never branches on type identity.
#[derive(Debug, thiserror::Error)]
pub enum LightstreamsError {
    /// Missing or malformed request fields; raised before any collaborator call
    #[error("Bad input: {0}")]
    BadInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Remote gateway failure (network error or non-2xx response)
    #[error("Gateway error: {message}")]
    Gateway {
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transaction reverted, ran out of gas, or an expected event was absent
    #[error("Chain transaction error: {0}")]
    ChainTx(String),

    /// Read-only contract call returned empty or reverted
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LightstreamsError {
    /// Build a gateway error with no underlying cause
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
            cause: None,
        }
    }

    /// Convert error to HTTP status code
    ///
    /// Validation errors map to 400, authentication to 401, missing items to
    /// 404; every collaborator or internal failure is a 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::ItemNotFound(_) => StatusCode::NOT_FOUND,
            Self::Gateway { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ChainTx(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client
    ///
    /// 4xx errors carry their own message; 5xx detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::BadInput(_) | Self::Unauthorized(_) | Self::ItemNotFound(_) => self.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<std::io::Error> for LightstreamsError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for LightstreamsError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadInput(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for LightstreamsError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<reqwest::Error> for LightstreamsError {
    fn from(err: reqwest::Error) -> Self {
        Self::Gateway {
            message: err.to_string(),
            cause: Some(Box::new(err)),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for LightstreamsError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

/// Result type alias for Lightstreams operations
pub type Result<T> = std::result::Result<T, LightstreamsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            LightstreamsError::BadInput("missing username".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LightstreamsError::Unauthorized("no token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            LightstreamsError::ItemNotFound("item 7".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LightstreamsError::gateway("connection refused").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            LightstreamsError::ChainTx("reverted".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_does_not_leak_internal_detail() {
        let err = LightstreamsError::ChainTx("revert at 0xdead".into());
        assert_eq!(err.public_message(), "Internal server error");

        let err = LightstreamsError::BadInput("missing amount".into());
        assert!(err.public_message().contains("missing amount"));
    }
}
