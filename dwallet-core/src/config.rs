//! Service configuration
//!
//! Collected once at startup from the environment (a `.env` file is
//! honored) into an explicit value passed to `WalletCore::init`. No module
//! reads the environment after that.

use crate::core::vault::KdfCosts;
use crate::shared::constants::DEFAULT_RPC_TIMEOUT_SECS;
use crate::shared::error::WalletError;
use crate::shared::WalletResult;
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one encrypted key record per account.
    pub vault_dir: PathBuf,
    /// JSON-RPC endpoint of the configured network node.
    pub node_rpc_url: String,
    /// Chain identifier of the configured network; transaction requests
    /// must match it.
    pub chain_id: u64,
    /// Upper bound on every outbound node call.
    pub rpc_timeout: Duration,
    /// Argon2id costs for newly sealed key records.
    pub kdf_costs: KdfCosts,
    /// Listen address for the HTTP layer.
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> WalletResult<Self> {
        dotenv().ok();

        let vault_dir =
            PathBuf::from(env::var("DWALLET_HOME").unwrap_or_else(|_| "./wallets".to_string()));
        let node_rpc_url = env::var("DWALLET_NODE_RPC_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8545".to_string());
        let chain_id = parse_env_u64("DWALLET_CHAIN_ID")?.unwrap_or(1);
        let rpc_timeout = Duration::from_secs(
            parse_env_u64("DWALLET_RPC_TIMEOUT_SECS")?.unwrap_or(DEFAULT_RPC_TIMEOUT_SECS),
        );
        let bind_addr =
            env::var("DWALLET_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

        let defaults = KdfCosts::default();
        let kdf_costs = KdfCosts {
            m_cost: parse_env_u32("DWALLET_KDF_M_COST")?.unwrap_or(defaults.m_cost),
            t_cost: parse_env_u32("DWALLET_KDF_T_COST")?.unwrap_or(defaults.t_cost),
            p_cost: parse_env_u32("DWALLET_KDF_P_COST")?.unwrap_or(defaults.p_cost),
        };

        let config = Self {
            vault_dir,
            node_rpc_url,
            chain_id,
            rpc_timeout,
            kdf_costs,
            bind_addr,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WalletResult<()> {
        if !self.node_rpc_url.starts_with("http://") && !self.node_rpc_url.starts_with("https://") {
            return Err(WalletError::config(format!(
                "Node RPC URL must be http(s): {}",
                self.node_rpc_url
            )));
        }
        if self.rpc_timeout.is_zero() {
            return Err(WalletError::config("RPC timeout must be non-zero"));
        }
        if self.chain_id == 0 {
            return Err(WalletError::config("Chain id must be non-zero"));
        }
        Ok(())
    }
}

fn parse_env_u64(key: &str) -> WalletResult<Option<u64>> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| WalletError::config(format!("{} must be an integer, got {:?}", key, raw))),
        Err(_) => Ok(None),
    }
}

fn parse_env_u32(key: &str) -> WalletResult<Option<u32>> {
    Ok(parse_env_u64(key)?
        .map(|v| {
            u32::try_from(v)
                .map_err(|_| WalletError::config(format!("{} is out of range", key)))
        })
        .transpose()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            vault_dir: PathBuf::from("./wallets"),
            node_rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: 3,
            rpc_timeout: Duration::from_secs(10),
            kdf_costs: KdfCosts::default(),
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_rpc_url() {
        let mut config = base_config();
        config.node_rpc_url = "ws://127.0.0.1:8546".to_string();
        assert!(matches!(config.validate(), Err(WalletError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = base_config();
        config.rpc_timeout = Duration::ZERO;
        assert!(matches!(config.validate(), Err(WalletError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_chain_id() {
        let mut config = base_config();
        config.chain_id = 0;
        assert!(matches!(config.validate(), Err(WalletError::Config(_))));
    }
}
