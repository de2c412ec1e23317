// lottery/src/client.rs
// Terminal counterpart of the lottery entrance page: three reads, one write.

use crate::bindings::Lottery;
use crate::chain::{confirm, contract_error, SignerClient};
use crate::frontend::ContractAddresses;
use ethers::{
    signers::Signer,
    types::{Address, U256},
    utils::{format_ether, to_checksum},
};
use eyre::{Result, WrapErr};
use std::{fmt, sync::Arc};
use tracing::{error, info, instrument};

pub const TX_COMPLETED_MESSAGE: &str = "Transaction Completed!";
pub const NO_LOTTERY_MESSAGE: &str = "No Lottery Address detected!";

/// First address the frontend lists for `chain_id`, if any.
pub fn lottery_address(addresses: &ContractAddresses, chain_id: u64) -> Result<Option<Address>> {
    match addresses.get(&chain_id.to_string()).and_then(|list| list.first()) {
        Some(raw) => Ok(Some(
            raw.parse::<Address>()
                .wrap_err_with(|| format!("Malformed lottery address `{}` for chain {}", raw, chain_id))?,
        )),
        None => Ok(None),
    }
}

/// `0x1234...abcd`
pub fn short_address(address: &Address) -> String {
    let full = to_checksum(address, None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotteryView {
    pub entry_fee: U256,
    pub num_players: U256,
    pub recent_winner: Address,
}

impl fmt::Display for LotteryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Entry Fee: {} ETH", trim_ether(&format_ether(self.entry_fee)))?;
        writeln!(f, "Number of players: {}", self.num_players)?;
        write!(f, "Recent Winner: {}", to_checksum(&self.recent_winner, None))
    }
}

// format_ether pads to 18 decimals; drop trailing zeros but keep one digit after the point.
fn trim_ether(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, frac)
            }
        }
        None => formatted.to_string(),
    }
}

pub struct LotteryClient {
    lottery: Lottery<SignerClient>,
    timeout_secs: u64,
}

impl LotteryClient {
    pub fn new(address: Address, client: Arc<SignerClient>, timeout_secs: u64) -> Self {
        Self {
            lottery: Lottery::new(address, client),
            timeout_secs,
        }
    }

    pub fn address(&self) -> Address {
        self.lottery.address()
    }

    pub fn account(&self) -> Address {
        self.lottery.client().signer().address()
    }

    #[instrument(skip(self), fields(lottery = ?self.address()))]
    pub async fn refresh(&self) -> Result<LotteryView> {
        let entry_fee = self
            .lottery
            .get_entry_fee()
            .call()
            .await
            .map_err(|e| contract_error(e, "getEntryFee failed"))?;
        let num_players = self
            .lottery
            .get_number_of_players()
            .call()
            .await
            .map_err(|e| contract_error(e, "getNumberOfPlayers failed"))?;
        let recent_winner = self
            .lottery
            .get_recent_winner()
            .call()
            .await
            .map_err(|e| contract_error(e, "getRecentWinner failed"))?;
        Ok(LotteryView { entry_fee, num_players, recent_winner })
    }

    /// Pays the current entry fee, waits one confirmation, then re-reads the lottery.
    #[instrument(skip(self), fields(lottery = ?self.address(), account = ?self.account()))]
    pub async fn enter(&self) -> Result<LotteryView> {
        let result = async {
            let view = self.refresh().await?;
            let call = self.lottery.enter_lottery().value(view.entry_fee);
            let pending = call.send().await.map_err(|e| contract_error(e, "enterLottery failed"))?;
            let receipt = confirm(pending, 1, self.timeout_secs).await?;
            info!(tx = ?receipt.transaction_hash, "{}", TX_COMPLETED_MESSAGE);
            self.refresh().await
        }
        .await;
        if let Err(e) = &result {
            error!(error = ?e, "Entering the lottery failed");
        }
        result
    }
}
