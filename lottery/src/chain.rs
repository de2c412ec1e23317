// lottery/src/chain.rs
// Signer client setup and transaction confirmation handling.

use crate::config::Config;
use crate::error::{LotteryRevert, OpsError};
use ethers::{
    abi::RawLog,
    contract::{ContractError, EthEvent, EthLogDecode},
    middleware::SignerMiddleware,
    providers::{Http, Middleware, PendingTransaction, Provider},
    signers::{LocalWallet, Signer},
    types::{TransactionReceipt, U64},
};
use eyre::{eyre, Result, WrapErr};
use std::{sync::Arc, time::Duration};
use tokio::time::timeout;
use tracing::{debug, info, instrument};

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

const PROVIDER_POLL_INTERVAL_MS: u64 = 500;
const TX_SUCCESS_STATUS: U64 = U64([1]);

/// Connects to `config.rpc_url` and binds the configured key to the node's chain id.
#[instrument(skip_all, fields(network = %config.network))]
pub async fn connect(config: &Config) -> Result<Arc<SignerClient>> {
    let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
        .wrap_err_with(|| format!("Invalid RPC_URL `{}`", config.rpc_url))?
        .interval(Duration::from_millis(PROVIDER_POLL_INTERVAL_MS));
    let chain_id = match config.chain_id {
        Some(id) => id,
        None => provider
            .get_chainid()
            .await
            .wrap_err("Failed to query chain id from RPC")?
            .as_u64(),
    };
    let wallet = config
        .private_key
        .parse::<LocalWallet>()
        .wrap_err("PRIVATE_KEY is not a valid secp256k1 key")?
        .with_chain_id(chain_id);
    info!(chain_id, account = ?wallet.address(), "RPC OK.");
    Ok(Arc::new(SignerMiddleware::new(provider, wallet)))
}

/// Waits for `confirmations` blocks on top of the transaction, bounded by `timeout_secs`.
/// A mined receipt with failed status is an error.
pub async fn confirm(
    pending: PendingTransaction<'_, Http>,
    confirmations: usize,
    timeout_secs: u64,
) -> Result<TransactionReceipt> {
    let tx_hash = pending.tx_hash();
    debug!(?tx_hash, confirmations, "Waiting for receipt...");
    let receipt = match timeout(Duration::from_secs(timeout_secs), pending.confirmations(confirmations)).await {
        Ok(Ok(Some(receipt))) => receipt,
        Ok(Ok(None)) => return Err(OpsError::Dropped(tx_hash).into()),
        Ok(Err(e)) => return Err(eyre!(e).wrap_err(format!("Error waiting for receipt of {:?}", tx_hash))),
        Err(_) => {
            return Err(OpsError::Timeout {
                what: format!("receipt of {:?}", tx_hash),
                secs: timeout_secs,
            }
            .into())
        }
    };
    if receipt.status != Some(TX_SUCCESS_STATUS) {
        return Err(OpsError::Reverted(tx_hash).into());
    }
    debug!(
        ?tx_hash,
        block = ?receipt.block_number,
        gas_used = ?receipt.gas_used,
        "TX Confirmed."
    );
    Ok(receipt)
}

/// Maps a contract call failure to `OpsError::Revert` when it carries revert data.
pub fn contract_error(err: ContractError<SignerClient>, context: &str) -> eyre::Report {
    match err.as_revert() {
        Some(data) => eyre::Report::new(OpsError::Revert(LotteryRevert::decode(data))),
        None => eyre!(err).wrap_err(context.to_string()),
    }
}

/// Decodes the first log in `receipt` that matches event `E`.
pub fn find_event<E: EthEvent>(receipt: &TransactionReceipt) -> Result<E> {
    receipt
        .logs
        .iter()
        .find_map(|log| <E as EthLogDecode>::decode_log(&RawLog::from(log.clone())).ok())
        .ok_or_else(|| {
            OpsError::MissingEvent {
                event: E::name().into_owned(),
                tx_hash: receipt.transaction_hash,
            }
            .into()
        })
}
