// lottery/src/networks.rs
// Per-chain deployment parameters for the lottery constructor.

use crate::error::OpsError;
use ethers::{
    types::{Address, H256, U256},
    utils::parse_ether,
};
use eyre::{Result, WrapErr};
use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path, str::FromStr};

/// Network names that get mocks instead of live coordinators.
pub const DEVELOPMENT_CHAINS: [&str; 3] = ["hardhat", "localhost", "anvil"];

pub const LOCAL_CHAIN_ID: u64 = 31337;
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

const DEFAULT_KEY_HASH: &str = "0x474e34a077df58807dbe9c96d3c009b23b3c6d0cce433e59b4d5b34d2b0e4c8c";
const SEPOLIA_VRF_COORDINATOR: &str = "0x8103B0A8A00be2DDC778e6e7eaa21791Cd364625";

pub fn is_development_chain(network_name: &str) -> bool {
    DEVELOPMENT_CHAINS.contains(&network_name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub name: String,
    pub entry_fee: U256,
    pub key_hash: H256,
    pub callback_gas_limit: u32,
    /// Seconds between lottery rounds.
    pub interval: u64,
    pub vrf_coordinator: Option<Address>,
    pub subscription_id: Option<u64>,
    pub block_confirmations: Option<u64>,
}

impl NetworkConfig {
    pub fn confirmations(&self) -> u64 {
        self.block_confirmations.unwrap_or(1)
    }
}

/// File representation: entry fees are written in ether.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkEntry {
    name: String,
    entry_fee: String,
    key_hash: H256,
    callback_gas_limit: u32,
    interval: u64,
    #[serde(default)]
    vrf_coordinator: Option<Address>,
    #[serde(default)]
    subscription_id: Option<u64>,
    #[serde(default)]
    block_confirmations: Option<u64>,
}

impl TryFrom<NetworkEntry> for NetworkConfig {
    type Error = eyre::Report;

    fn try_from(entry: NetworkEntry) -> Result<Self> {
        let entry_fee: U256 = parse_ether(&entry.entry_fee)
            .wrap_err_with(|| format!("invalid entryFee `{}` for {}", entry.entry_fee, entry.name))?;
        Ok(NetworkConfig {
            name: entry.name,
            entry_fee,
            key_hash: entry.key_hash,
            callback_gas_limit: entry.callback_gas_limit,
            interval: entry.interval,
            vrf_coordinator: entry.vrf_coordinator,
            subscription_id: entry.subscription_id,
            block_confirmations: entry.block_confirmations,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    networks: BTreeMap<u64, NetworkConfig>,
}

impl NetworkRegistry {
    pub fn builtin() -> Self {
        let key_hash = H256::from_str(DEFAULT_KEY_HASH).unwrap_or_default();
        let entry_fee = U256::exp10(16); // 0.01 ETH

        let mut networks = BTreeMap::new();
        networks.insert(
            SEPOLIA_CHAIN_ID,
            NetworkConfig {
                name: "sepolia".to_string(),
                entry_fee,
                key_hash,
                callback_gas_limit: 500_000,
                interval: 30,
                vrf_coordinator: Address::from_str(SEPOLIA_VRF_COORDINATOR).ok(),
                subscription_id: Some(0),
                block_confirmations: Some(6),
            },
        );
        networks.insert(
            LOCAL_CHAIN_ID,
            NetworkConfig {
                name: "localhost".to_string(),
                entry_fee,
                key_hash,
                callback_gas_limit: 500_000,
                interval: 30,
                vrf_coordinator: None,
                subscription_id: None,
                block_confirmations: None,
            },
        );
        Self { networks }
    }

    /// Loads `{ "<chainId>": { name, entryFee, keyHash, ... } }`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read networks file: {:?}", path))?;
        Self::from_json(&raw).wrap_err_with(|| format!("Invalid networks file: {:?}", path))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let entries: BTreeMap<String, NetworkEntry> = serde_json::from_str(raw)?;
        let mut networks = BTreeMap::new();
        for (chain_id, entry) in entries {
            let chain_id: u64 = chain_id
                .parse()
                .wrap_err_with(|| format!("chain id key `{}` is not a number", chain_id))?;
            networks.insert(chain_id, NetworkConfig::try_from(entry)?);
        }
        Ok(Self { networks })
    }

    pub fn get(&self, chain_id: u64) -> Result<&NetworkConfig, OpsError> {
        self.networks.get(&chain_id).ok_or(OpsError::UnknownChain(chain_id))
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.networks.keys().copied()
    }
}
