// lottery/src/deployments.rs
// Records of deployed contracts: deployments/<network>/<Name>.json

use crate::error::OpsError;
use chrono::{DateTime, Utc};
use ethers::types::{Address, TxHash, U64};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub address: Address,
    pub abi: serde_json::Value,
    pub transaction_hash: TxHash,
    pub block_number: Option<U64>,
    /// Hex-encoded ABI constructor arguments.
    pub args: String,
    pub deployed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DeploymentStore {
    dir: PathBuf,
    network: String,
}

impl DeploymentStore {
    pub fn new(root: impl AsRef<Path>, network: &str) -> Self {
        Self {
            dir: root.as_ref().join(network),
            network: network.to_string(),
        }
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    pub fn save(&self, name: &str, record: &DeploymentRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .wrap_err_with(|| format!("Failed to create {:?}", self.dir))?;
        let path = self.record_path(name);
        fs::write(&path, serde_json::to_string_pretty(record)?)
            .wrap_err_with(|| format!("Failed to write deployment record {:?}", path))?;
        debug!(?path, "Saved deployment of {}", name);
        Ok(())
    }

    pub fn load(&self, name: &str) -> Result<DeploymentRecord> {
        let path = self.record_path(name);
        if !path.exists() {
            return Err(OpsError::MissingDeployment {
                name: name.to_string(),
                network: self.network.clone(),
            }
            .into());
        }
        let raw = fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read deployment record {:?}", path))?;
        serde_json::from_str(&raw).wrap_err_with(|| format!("Corrupt deployment record {:?}", path))
    }
}
