// lottery/src/deploy.rs
// Tagged deploy steps: mocks, lottery, frontend.

use crate::artifacts::{find_artifact, ContractArtifact};
use crate::bindings::SubscriptionCreatedFilter;
use crate::chain::{confirm, contract_error, find_event, SignerClient};
use crate::context::{OpsContext, COORDINATOR_MOCK_CONTRACT, LOTTERY_CONTRACT};
use crate::deployments::DeploymentRecord;
use crate::error::OpsError;
use crate::frontend::sync_frontend;
use crate::networks::NetworkConfig;
use crate::verify::verify_contract;
use chrono::Utc;
use ethers::{
    abi::{self, Tokenize},
    prelude::ContractFactory,
    types::{Address, TransactionReceipt, H256, U256},
};
use eyre::{eyre, Result};
use std::{fmt, str::FromStr, sync::Arc, time::Duration};
use tokio::time::timeout;
use tracing::{info, instrument, warn};

/// Mock coordinator base fee: 0.25 LINK per request.
pub const BASE_FEE: u64 = 250_000_000_000_000_000;
/// Mock LINK per gas.
pub const GAS_PRICE_LINK: u64 = 1_000_000_000;
/// Amount a fresh local subscription is funded with (uint96 on-chain).
pub const VRF_SUB_FUND_AMOUNT: u128 = 5_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployTag {
    All,
    Mocks,
    Lottery,
    Frontend,
}

impl FromStr for DeployTag {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(DeployTag::All),
            "mocks" => Ok(DeployTag::Mocks),
            "lottery" => Ok(DeployTag::Lottery),
            "frontend" => Ok(DeployTag::Frontend),
            other => Err(eyre!("Unknown deploy tag `{}` (expected all, mocks, lottery or frontend)", other)),
        }
    }
}

/// Deploy steps in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStep {
    Mocks,
    Lottery,
    Frontend,
}

impl DeployStep {
    pub const ORDER: [DeployStep; 3] = [DeployStep::Mocks, DeployStep::Lottery, DeployStep::Frontend];

    pub fn tags(&self) -> [DeployTag; 2] {
        match self {
            DeployStep::Mocks => [DeployTag::All, DeployTag::Mocks],
            DeployStep::Lottery => [DeployTag::All, DeployTag::Lottery],
            DeployStep::Frontend => [DeployTag::All, DeployTag::Frontend],
        }
    }

    /// Steps carrying any of `tags`, in order. No tags selects everything.
    pub fn selected(tags: &[DeployTag]) -> Vec<DeployStep> {
        if tags.is_empty() {
            return Self::ORDER.to_vec();
        }
        Self::ORDER
            .into_iter()
            .filter(|step| step.tags().iter().any(|t| tags.contains(t)))
            .collect()
    }
}

impl fmt::Display for DeployStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployStep::Mocks => "mocks",
            DeployStep::Lottery => "lottery",
            DeployStep::Frontend => "frontend",
        };
        f.write_str(name)
    }
}

/// Lottery constructor arguments, in constructor order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotteryArgs {
    pub vrf_coordinator: Address,
    pub entry_fee: U256,
    pub key_hash: H256,
    pub subscription_id: u64,
    pub callback_gas_limit: u32,
    pub interval: U256,
}

impl LotteryArgs {
    pub fn assemble(network: &NetworkConfig, vrf_coordinator: Address, subscription_id: u64) -> Self {
        Self {
            vrf_coordinator,
            entry_fee: network.entry_fee,
            key_hash: network.key_hash,
            subscription_id,
            callback_gas_limit: network.callback_gas_limit,
            interval: U256::from(network.interval),
        }
    }

    pub fn tokens(&self) -> (Address, U256, H256, u64, u32, U256) {
        (
            self.vrf_coordinator,
            self.entry_fee,
            self.key_hash,
            self.subscription_id,
            self.callback_gas_limit,
            self.interval,
        )
    }
}

/// Coordinator and subscription configured for a live network.
pub fn live_coordinator(network: &NetworkConfig) -> Result<(Address, u64)> {
    let coordinator = network.vrf_coordinator.ok_or_else(|| OpsError::MissingNetworkField {
        network: network.name.clone(),
        field: "vrfCoordinator",
    })?;
    let subscription_id = network.subscription_id.ok_or_else(|| OpsError::MissingNetworkField {
        network: network.name.clone(),
        field: "subscriptionId",
    })?;
    Ok((coordinator, subscription_id))
}

/// `0x`-prefixed ABI encoding of constructor arguments.
pub fn encode_args<T: Tokenize>(args: T) -> String {
    format!("0x{}", hex::encode(abi::encode(&args.into_tokens())))
}

#[derive(Debug, Clone)]
pub struct Deployed {
    pub address: Address,
    pub receipt: TransactionReceipt,
    pub args: String,
}

impl Deployed {
    pub fn record(&self, artifact: &ContractArtifact) -> DeploymentRecord {
        DeploymentRecord {
            address: self.address,
            abi: artifact.abi.clone(),
            transaction_hash: self.receipt.transaction_hash,
            block_number: self.receipt.block_number,
            args: self.args.clone(),
            deployed_at: Utc::now(),
        }
    }
}

/// Deploys `artifact` with `args` and waits for `confirmations` blocks.
#[instrument(skip(client, artifact, args), fields(contract = %artifact.contract_name))]
pub async fn deploy_contract<T: Tokenize + Clone>(
    client: Arc<SignerClient>,
    artifact: &ContractArtifact,
    args: T,
    confirmations: usize,
    timeout_secs: u64,
) -> Result<Deployed> {
    let encoded = encode_args(args.clone());
    let factory = ContractFactory::new(artifact.abi()?, artifact.bytecode.clone(), client);
    let deployer = factory
        .deploy(args)
        .map_err(|e| contract_error(e, "Failed to construct deployment"))?
        .confirmations(confirmations);

    info!("Sending deployment transaction...");
    let (contract, receipt) = match timeout(Duration::from_secs(timeout_secs), deployer.send_with_receipt()).await {
        Ok(result) => result.map_err(|e| contract_error(e, "Deployment failed"))?,
        Err(_) => {
            return Err(OpsError::Timeout {
                what: format!("deployment of {}", artifact.contract_name),
                secs: timeout_secs,
            }
            .into())
        }
    };
    info!(
        address = ?contract.address(),
        tx = ?receipt.transaction_hash,
        gas_used = ?receipt.gas_used,
        "deployed {}", artifact.contract_name
    );
    Ok(Deployed {
        address: contract.address(),
        receipt,
        args: encoded,
    })
}

/// Mock coordinator on development chains; nothing elsewhere.
pub async fn deploy_mocks(ctx: &OpsContext) -> Result<Option<Address>> {
    if !ctx.is_development() {
        info!(network = %ctx.config.network, "Live network, no mocks needed");
        return Ok(None);
    }
    info!("Local network detected! Deploying mocks...");
    let artifact = find_artifact(&ctx.config.artifacts_dir, COORDINATOR_MOCK_CONTRACT)?;
    let deployed = deploy_contract(
        ctx.client.clone(),
        &artifact,
        (U256::from(BASE_FEE), U256::from(GAS_PRICE_LINK)),
        1,
        ctx.timeout_secs(),
    )
    .await?;
    ctx.store.save(COORDINATOR_MOCK_CONTRACT, &deployed.record(&artifact))?;
    info!("Mocks deployed!");
    info!("----------------------------------------------------");
    Ok(Some(deployed.address))
}

/// Creates and funds a subscription on the local mock coordinator.
async fn local_subscription(ctx: &OpsContext) -> Result<(Address, u64)> {
    let mock = ctx.coordinator_mock()?;
    let call = mock.create_subscription();
    let pending = call
        .send()
        .await
        .map_err(|e| contract_error(e, "createSubscription failed"))?;
    let receipt = confirm(pending, 1, ctx.timeout_secs()).await?;
    let created: SubscriptionCreatedFilter = find_event(&receipt)?;
    info!(sub_id = created.sub_id, "Subscription created");

    let call = mock.fund_subscription(created.sub_id, VRF_SUB_FUND_AMOUNT);
    let pending = call
        .send()
        .await
        .map_err(|e| contract_error(e, "fundSubscription failed"))?;
    confirm(pending, 1, ctx.timeout_secs()).await?;
    Ok((mock.address(), created.sub_id))
}

pub async fn deploy_lottery(ctx: &OpsContext) -> Result<Address> {
    let network = ctx.network()?;
    // Resolve before any chain writes.
    let artifact = find_artifact(&ctx.config.artifacts_dir, LOTTERY_CONTRACT)?;
    let (coordinator, subscription_id) = if ctx.is_development() {
        local_subscription(ctx).await?
    } else {
        live_coordinator(network)?
    };
    let args = LotteryArgs::assemble(network, coordinator, subscription_id);
    let deployed = deploy_contract(
        ctx.client.clone(),
        &artifact,
        args.tokens(),
        network.confirmations() as usize,
        ctx.timeout_secs(),
    )
    .await?;
    ctx.store.save(LOTTERY_CONTRACT, &deployed.record(&artifact))?;
    info!(address = ?deployed.address, "Lottery deployed");

    if !ctx.is_development() {
        if let Some(api_key) = &ctx.config.etherscan_api_key {
            if let Err(e) = verify_contract(ctx.chain_id, api_key, deployed.address, &artifact, &deployed.args).await {
                warn!(error = ?e, "Verification did not complete");
            }
        }
    }

    if ctx.is_development() {
        let mock = ctx.coordinator_mock()?;
        let call = mock.add_consumer(subscription_id, deployed.address);
        let pending = call
            .send()
            .await
            .map_err(|e| contract_error(e, "addConsumer failed"))?;
        confirm(pending, 1, ctx.timeout_secs()).await?;
        info!("Consumer is added");
    }
    info!("----------------------------------------------------");
    Ok(deployed.address)
}

/// Runs every step carrying one of `tags`, in order.
#[instrument(skip(ctx), fields(network = %ctx.config.network, chain_id = ctx.chain_id))]
pub async fn run_deploy(ctx: &OpsContext, tags: &[DeployTag]) -> Result<()> {
    for step in DeployStep::selected(tags) {
        info!(%step, "Running deploy step");
        match step {
            DeployStep::Mocks => {
                deploy_mocks(ctx).await?;
            }
            DeployStep::Lottery => {
                deploy_lottery(ctx).await?;
            }
            DeployStep::Frontend => {
                sync_frontend(&ctx.config, ctx.chain_id, &ctx.store)?;
            }
        }
    }
    Ok(())
}
