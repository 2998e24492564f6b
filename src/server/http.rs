//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one spawned task per connection. Route
//! modules are tried in order by path prefix; unmatched paths fall through
//! to a JSON 404.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::routes::{self, respond};
use crate::routes::respond::BoxBody;
use crate::server::AppState;
use crate::types::Result;

/// Run the server until the process is stopped
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;
    info!("Listening on {}", state.args.listen);

    loop {
        let (stream, remote) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = Arc::clone(&state);

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let state = Arc::clone(&state);
                async move { Ok::<_, Infallible>(dispatch(req, state).await) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Connection from {} ended: {}", remote, e);
            }
        });
    }
}

/// Top-level route dispatch
///
/// The request body is consumed by whichever module owns the prefix, so
/// the prefix decision happens here before handing the request off.
async fn dispatch(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!(%method, %path, "Request received");

    if method == Method::GET && path == "/health" {
        return respond::json_data(&serde_json::json!({ "healthy": true }));
    }

    let prefix = path.split('/').nth(1).unwrap_or("");
    match prefix {
        "auth" => routes::auth_routes::handle(req, state).await,
        "wallet" => routes::wallet::handle(req, state).await,
        "shelves" => routes::shelves::handle(req, state).await,
        "profile" => routes::profile::handle(req, state).await,
        _ => respond::json_error(StatusCode::NOT_FOUND, &format!("No route for {}", path)),
    }
}
