//! Lightstreams - demo server for the content shelf

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lightstreams::chain::{ContractAdapter, JsonRpcClient};
use lightstreams::config::Args;
use lightstreams::gateway::GatewayClient;
use lightstreams::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("lightstreams={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Lightstreams demo server");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Gateway: {}", args.gateway_url);
    info!("Chain RPC: {}", args.chain_rpc_url);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("======================================");

    let request_timeout = Duration::from_millis(args.request_timeout_ms);
    let receipt_timeout = Duration::from_millis(args.receipt_timeout_ms);

    let gateway = GatewayClient::new(&args.gateway_url, request_timeout)?;

    let rpc = JsonRpcClient::new(&args.chain_rpc_url, request_timeout, receipt_timeout)?;
    let dashboard = args
        .dashboard_address()
        .map_err(lightstreams::LightstreamsError::Config)?;
    let faucet = args
        .faucet_address()
        .map_err(lightstreams::LightstreamsError::Config)?;
    let contracts = ContractAdapter::new(Arc::new(rpc), dashboard, faucet);

    let state = AppState::new(args, Arc::new(gateway), Arc::new(contracts))?;

    server::run(Arc::new(state)).await?;

    Ok(())
}
