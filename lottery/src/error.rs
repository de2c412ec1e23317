// lottery/src/error.rs

use ethers::{
    abi::{self, ParamType},
    types::{Bytes, TxHash, U256},
    utils::id,
};
use lazy_static::lazy_static;
use thiserror::Error;

/// Conditions callers match on. Carried inside `eyre::Report`, recover with `downcast_ref`.
#[derive(Debug, Error)]
pub enum OpsError {
    #[error("no network configuration for chain id {0}")]
    UnknownChain(u64),

    #[error("network `{network}` has no `{field}` configured")]
    MissingNetworkField { network: String, field: &'static str },

    #[error("no deployment of `{name}` recorded for network `{network}`")]
    MissingDeployment { name: String, network: String },

    #[error("artifact for contract `{0}` not found")]
    ArtifactNotFound(String),

    #[error("receipt of {tx_hash:?} carries no `{event}` event")]
    MissingEvent { event: String, tx_hash: TxHash },

    #[error("transaction {0:?} was dropped before confirmation")]
    Dropped(TxHash),

    #[error("timed out after {secs}s waiting for {what}")]
    Timeout { what: String, secs: u64 },

    #[error("transaction {0:?} reverted on-chain")]
    Reverted(TxHash),

    #[error("lottery call reverted: {0}")]
    Revert(#[from] LotteryRevert),

    #[error("`{action}` is only available on development chains (network `{network}`)")]
    DevelopmentOnly { action: &'static str, network: String },

    #[error("no lottery address recorded for chain id {0}")]
    NoLotteryAddress(u64),
}

/// Custom errors the lottery contract reverts with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LotteryRevert {
    #[error("Lottery__notEnoughEthEntered")]
    NotEnoughEthEntered,
    #[error("Lottery__NotOpen")]
    NotOpen,
    #[error("Lottery__UpKeepNotNeeded(balance={balance}, players={players}, state={state})")]
    UpkeepNotNeeded { balance: U256, players: U256, state: U256 },
    #[error("Lottery__TransferFailed")]
    TransferFailed,
    #[error("unrecognised revert data {0}")]
    Unknown(Bytes),
}

lazy_static! {
    static ref NOT_ENOUGH_ETH_SELECTOR: [u8; 4] = id("Lottery__notEnoughEthEntered()");
    static ref NOT_OPEN_SELECTOR: [u8; 4] = id("Lottery__NotOpen()");
    static ref UPKEEP_NOT_NEEDED_SELECTOR: [u8; 4] =
        id("Lottery__UpKeepNotNeeded(uint256,uint256,uint256)");
    static ref TRANSFER_FAILED_SELECTOR: [u8; 4] = id("Lottery__TransferFailed()");
}

impl LotteryRevert {
    /// Decodes raw revert data by its 4-byte selector.
    pub fn decode(data: &Bytes) -> Self {
        if data.len() < 4 {
            return LotteryRevert::Unknown(data.clone());
        }
        let (selector, args) = data.split_at(4);
        if selector == NOT_ENOUGH_ETH_SELECTOR.as_slice() {
            LotteryRevert::NotEnoughEthEntered
        } else if selector == NOT_OPEN_SELECTOR.as_slice() {
            LotteryRevert::NotOpen
        } else if selector == TRANSFER_FAILED_SELECTOR.as_slice() {
            LotteryRevert::TransferFailed
        } else if selector == UPKEEP_NOT_NEEDED_SELECTOR.as_slice() {
            let decoded = abi::decode(&[ParamType::Uint(256), ParamType::Uint(256), ParamType::Uint(256)], args);
            match decoded.as_deref() {
                Ok([balance, players, state]) => LotteryRevert::UpkeepNotNeeded {
                    balance: balance.clone().into_uint().unwrap_or_default(),
                    players: players.clone().into_uint().unwrap_or_default(),
                    state: state.clone().into_uint().unwrap_or_default(),
                },
                _ => LotteryRevert::Unknown(data.clone()),
            }
        } else {
            LotteryRevert::Unknown(data.clone())
        }
    }
}
