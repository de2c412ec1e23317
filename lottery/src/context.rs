// lottery/src/context.rs

use crate::bindings::{Lottery, VRFCoordinatorV2Mock};
use crate::chain::{self, SignerClient};
use crate::client;
use crate::config::Config;
use crate::deployments::DeploymentStore;
use crate::error::OpsError;
use crate::frontend;
use crate::networks::{NetworkConfig, NetworkRegistry};
use ethers::{signers::Signer, types::Address};
use eyre::Result;
use std::sync::Arc;
use tracing::debug;

pub const LOTTERY_CONTRACT: &str = "Lottery";
pub const COORDINATOR_MOCK_CONTRACT: &str = "VRFCoordinatorV2Mock";

/// Everything a command needs: config, a connected signer and the deployment records.
#[derive(Debug, Clone)]
pub struct OpsContext {
    pub config: Config,
    pub client: Arc<SignerClient>,
    pub chain_id: u64,
    pub registry: NetworkRegistry,
    pub store: DeploymentStore,
}

impl OpsContext {
    pub async fn connect(config: Config) -> Result<Self> {
        let client = chain::connect(&config).await?;
        let chain_id = client.signer().chain_id();
        let registry = match &config.networks_file {
            Some(path) => NetworkRegistry::from_file(path)?,
            None => NetworkRegistry::builtin(),
        };
        debug!(chains = ?registry.chain_ids().collect::<Vec<_>>(), "Network registry loaded");
        let store = DeploymentStore::new(&config.deployments_dir, &config.network);
        Ok(Self { config, client, chain_id, registry, store })
    }

    pub fn is_development(&self) -> bool {
        self.config.is_development()
    }

    pub fn network(&self) -> Result<&NetworkConfig> {
        Ok(self.registry.get(self.chain_id)?)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.config.tx_confirmation_timeout_secs
    }

    /// The latest recorded deployment, else the first frontend address for this chain.
    pub fn lottery_address(&self) -> Result<Address> {
        match self.store.load(LOTTERY_CONTRACT) {
            Ok(record) => return Ok(record.address),
            Err(e) if matches!(e.downcast_ref::<OpsError>(), Some(OpsError::MissingDeployment { .. })) => {
                debug!("No deployment record, trying frontend constants");
            }
            Err(e) => return Err(e),
        }
        let addresses = frontend::read_addresses(&self.config.frontend_addresses_file)?;
        client::lottery_address(&addresses, self.chain_id)?
            .ok_or_else(|| OpsError::NoLotteryAddress(self.chain_id).into())
    }

    pub fn lottery(&self) -> Result<Lottery<SignerClient>> {
        Ok(Lottery::new(self.lottery_address()?, self.client.clone()))
    }

    pub fn coordinator_mock(&self) -> Result<VRFCoordinatorV2Mock<SignerClient>> {
        let record = self.store.load(COORDINATOR_MOCK_CONTRACT)?;
        Ok(VRFCoordinatorV2Mock::new(record.address, self.client.clone()))
    }

    pub fn require_development(&self, action: &'static str) -> Result<()> {
        if self.is_development() {
            Ok(())
        } else {
            Err(OpsError::DevelopmentOnly {
                action,
                network: self.config.network.clone(),
            }
            .into())
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::offline_context;
    use super::*;
    use crate::networks::{LOCAL_CHAIN_ID, SEPOLIA_CHAIN_ID};
    use serde_json::json;

    #[test]
    fn development_actions_are_refused_on_live_networks() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = offline_context(tmp.path(), "sepolia", SEPOLIA_CHAIN_ID);
        let err = ctx.require_development("fulfill").unwrap_err();
        match err.downcast_ref::<OpsError>() {
            Some(OpsError::DevelopmentOnly { action, network }) => {
                assert_eq!(*action, "fulfill");
                assert_eq!(network, "sepolia");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let local = offline_context(tmp.path(), "localhost", LOCAL_CHAIN_ID);
        assert!(local.require_development("fulfill").is_ok());
    }

    #[test]
    fn lottery_address_falls_back_to_frontend_constants() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = offline_context(tmp.path(), "localhost", LOCAL_CHAIN_ID);
        let err = ctx.lottery_address().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OpsError>(),
            Some(OpsError::NoLotteryAddress(LOCAL_CHAIN_ID))
        ));

        std::fs::write(
            &ctx.config.frontend_addresses_file,
            json!({ "31337": ["0x5FbDB2315678afecb367f032d93F642f64180aa3"] }).to_string(),
        )
        .unwrap();
        assert_eq!(
            ctx.lottery_address().unwrap(),
            "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse::<Address>().unwrap()
        );
    }
}
