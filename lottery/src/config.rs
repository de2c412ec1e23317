// lottery/src/config.rs

use crate::networks::is_development_chain;
use dotenv::dotenv;
use eyre::{Result, WrapErr};
use std::{env, path::PathBuf};
use tracing::info;

/// First account of the hardhat/anvil default mnemonic. Only used on development chains.
pub const DEV_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

#[derive(Debug, Clone)]
pub struct Config {
    // Network & Keys
    pub network: String,
    pub rpc_url: String,
    pub private_key: String,
    pub chain_id: Option<u64>,

    // Block explorer
    pub etherscan_api_key: Option<String>,

    // Frontend sync
    pub update_frontend: bool,
    pub frontend_addresses_file: PathBuf,
    pub frontend_abi_file: PathBuf,

    // Paths
    pub artifacts_dir: PathBuf,
    pub deployments_dir: PathBuf,
    pub networks_file: Option<PathBuf>,

    // Timing
    pub tx_confirmation_timeout_secs: u64,
    pub keeper_poll_interval_secs: u64,
}

impl Config {
    pub fn is_development(&self) -> bool {
        is_development_chain(&self.network)
    }

    /// Builds the config from any key lookup; `load_config` feeds it the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var_name: &str| lookup(var_name).filter(|s| !s.trim().is_empty());
        let parse_u64_env = |var_name: &str, default: u64| -> Result<u64> {
            match non_empty(var_name) {
                Some(s) => s
                    .trim()
                    .parse::<u64>()
                    .wrap_err_with(|| format!("{} must be an unsigned integer, got `{}`", var_name, s)),
                None => Ok(default),
            }
        };
        let path_env = |var_name: &str, default: &str| -> PathBuf {
            non_empty(var_name).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(default))
        };

        let network = non_empty("NETWORK").unwrap_or_else(|| "localhost".to_string());
        let rpc_url = non_empty("RPC_URL").unwrap_or_else(|| "http://127.0.0.1:8545".to_string());
        let private_key = match non_empty("PRIVATE_KEY") {
            Some(key) => key,
            None if is_development_chain(&network) => DEV_PRIVATE_KEY.to_string(),
            None => eyre::bail!("PRIVATE_KEY required for non-development network `{}`", network),
        };
        let chain_id = match non_empty("CHAIN_ID") {
            Some(s) => Some(s.trim().parse::<u64>().wrap_err("CHAIN_ID must be a number")?),
            None => None,
        };

        let config = Config {
            network,
            rpc_url,
            private_key,
            chain_id,
            etherscan_api_key: non_empty("ETHERSCAN_API_KEY"),
            update_frontend: crate::frontend::should_update(lookup("UPDATE_FRONTEND").as_deref()),
            frontend_addresses_file: path_env(
                "FRONTEND_ADDRESSES_FILE",
                "../frontend/app/constants/contractAddresses.json",
            ),
            frontend_abi_file: path_env("FRONTEND_ABI_FILE", "../frontend/app/constants/contractAbi.json"),
            artifacts_dir: path_env("ARTIFACTS_DIR", "./artifacts"),
            deployments_dir: path_env("DEPLOYMENTS_DIR", "./deployments"),
            networks_file: non_empty("NETWORKS_FILE").map(PathBuf::from),
            tx_confirmation_timeout_secs: parse_u64_env("TX_CONFIRMATION_TIMEOUT_SECS", 120)?,
            keeper_poll_interval_secs: parse_u64_env("KEEPER_POLL_INTERVAL_SECS", 30)?,
        };
        Ok(config)
    }
}

pub fn load_config() -> Result<Config> {
    dotenv().ok();
    let config = Config::from_lookup(|key| env::var(key).ok())?;
    info!(network = %config.network, rpc = %config.rpc_url, "Configuration loaded.");
    Ok(config)
}
