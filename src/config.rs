//! Configuration for the Lightstreams demo server
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

use alloy::primitives::Address;

/// Lightstreams - demo server bridging a browser client to the gateway and chain
#[derive(Parser, Debug, Clone)]
#[command(name = "lightstreams")]
#[command(about = "Demo server for the Lightstreams content shelf")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Base URL of the remote gateway service (wallet, user, acl, storage)
    #[arg(long, env = "GATEWAY_URL", default_value = "http://localhost:9090")]
    pub gateway_url: String,

    /// Ethereum JSON-RPC endpoint
    #[arg(long, env = "CHAIN_RPC_URL", default_value = "http://localhost:8545")]
    pub chain_rpc_url: String,

    /// Dashboard contract address (user registry, ACL grants)
    #[arg(long, env = "DASHBOARD_ADDRESS")]
    pub dashboard_address: Option<String>,

    /// Faucet contract address (free token top-ups)
    #[arg(long, env = "FAUCET_ADDRESS")]
    pub faucet_address: Option<String>,

    /// JWT secret for session token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Enable development mode (relaxed secrets, default contract addresses)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Outbound request timeout in milliseconds (gateway and chain RPC)
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// How long to wait for a transaction receipt in milliseconds
    #[arg(long, env = "RECEIPT_TIMEOUT_MS", default_value = "60000")]
    pub receipt_timeout_ms: u64,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> Result<String, String> {
        if self.dev_mode {
            Ok(self
                .jwt_secret
                .clone()
                .unwrap_or_else(|| "dev-only-insecure-secret-0123456789abcdef".to_string()))
        } else {
            self.jwt_secret
                .clone()
                .ok_or_else(|| "JWT_SECRET is required in production mode".to_string())
        }
    }

    /// Parsed dashboard contract address (zero address in dev mode when unset)
    pub fn dashboard_address(&self) -> Result<Address, String> {
        parse_contract_address(self.dashboard_address.as_deref(), self.dev_mode, "DASHBOARD_ADDRESS")
    }

    /// Parsed faucet contract address (zero address in dev mode when unset)
    pub fn faucet_address(&self) -> Result<Address, String> {
        parse_contract_address(self.faucet_address.as_deref(), self.dev_mode, "FAUCET_ADDRESS")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            match &self.jwt_secret {
                None => return Err("JWT_SECRET is required in production mode".to_string()),
                Some(s) if s.len() < 32 => {
                    return Err("JWT_SECRET must be at least 32 characters".to_string())
                }
                _ => {}
            }
        }

        self.dashboard_address()?;
        self.faucet_address()?;

        if self.gateway_url.is_empty() {
            return Err("GATEWAY_URL must not be empty".to_string());
        }

        Ok(())
    }
}

fn parse_contract_address(
    value: Option<&str>,
    dev_mode: bool,
    name: &str,
) -> Result<Address, String> {
    match value {
        Some(raw) => raw
            .parse::<Address>()
            .map_err(|e| format!("{} is not a valid address: {}", name, e)),
        None if dev_mode => Ok(Address::ZERO),
        None => Err(format!("{} is required in production mode", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_args() -> Args {
        Args::parse_from(["lightstreams", "--dev-mode"])
    }

    #[test]
    fn test_dev_mode_flag_parses_without_value() {
        // --dev-mode is a bare flag; a trailing value would be rejected
        let args = dev_args();
        assert!(args.dev_mode);
        assert!(Args::try_parse_from(["lightstreams", "--dev-mode", "true"]).is_err());
    }

    #[test]
    fn test_dev_mode_defaults() {
        let args = dev_args();
        assert!(args.validate().is_ok());
        assert_eq!(args.dashboard_address().unwrap(), Address::ZERO);
        assert!(args.jwt_secret().unwrap().len() >= 32);
    }

    #[test]
    fn test_production_requires_secret_and_addresses() {
        let args = Args::parse_from(["lightstreams"]);
        assert!(args.validate().is_err());
        assert!(args.jwt_secret().is_err());
    }

    #[test]
    fn test_invalid_address_rejected() {
        let args = Args::parse_from([
            "lightstreams",
            "--dev-mode",
            "--dashboard-address",
            "not-an-address",
        ]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_valid_address_parsed() {
        let args = Args::parse_from([
            "lightstreams",
            "--dev-mode",
            "--dashboard-address",
            "0x00000000000000000000000000000000000000aa",
        ]);
        let addr = args.dashboard_address().unwrap();
        assert_ne!(addr, Address::ZERO);
    }
}
