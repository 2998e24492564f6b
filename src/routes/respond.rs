//! Shared response formatting
//!
//! One envelope for the whole HTTP surface: `{"data": …}` on success,
//! `{"error": {"message": …}}` on failure. The error path doubles as the
//! generic error-handling stage; 5xx detail is logged here and never
//! reaches the client.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::types::{LightstreamsError, Result};

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(full_body(json))
        .unwrap()
}

/// Success envelope
pub fn json_data<T: Serialize>(value: &T) -> Response<BoxBody> {
    json_response(StatusCode::OK, &json!({ "data": value }))
}

/// Failure envelope with an explicit status
pub fn json_error(status: StatusCode, message: &str) -> Response<BoxBody> {
    json_response(status, &json!({ "error": { "message": message } }))
}

/// Translate a domain error into its HTTP response
pub fn error_response(err: &LightstreamsError) -> Response<BoxBody> {
    let status = err.status_code();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        // Collaborator and internal failures keep their detail in the logs
        error!("Request failed: {}", err);
    }
    json_error(status, &err.public_message())
}

/// Collect and deserialize a JSON request body
pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(req: Request<Incoming>) -> Result<T> {
    let body = req
        .collect()
        .await
        .map_err(|e| LightstreamsError::BadInput(format!("Failed to read body: {}", e)))?
        .to_bytes();

    serde_json::from_slice(&body)
        .map_err(|e| LightstreamsError::BadInput(format!("Invalid JSON body: {}", e)))
}

/// Single query parameter lookup
pub fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    for pair in query?.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if key == name {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param() {
        assert_eq!(
            query_param(Some("item_id=7&foo=bar"), "item_id"),
            Some("7".into())
        );
        assert_eq!(query_param(Some("foo=bar"), "item_id"), None);
        assert_eq!(query_param(None, "item_id"), None);
    }

    #[test]
    fn test_error_response_shapes() {
        let resp = error_response(&LightstreamsError::BadInput("missing amount".into()));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = error_response(&LightstreamsError::Unauthorized("no token".into()));
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = error_response(&LightstreamsError::ChainTx("reverted".into()));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
