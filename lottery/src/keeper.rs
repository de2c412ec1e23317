// lottery/src/keeper.rs
// Upkeep polling and local randomness fulfilment.

use crate::bindings::{Lottery, RequestedLotteryWinnerFilter, WinnerPickedFilter};
use crate::chain::{confirm, contract_error, find_event, SignerClient};
use crate::context::OpsContext;
use crate::error::OpsError;
use ethers::{
    providers::Middleware,
    types::{Address, Bytes, U256},
};
use eyre::{eyre, Result, WrapErr};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

/// Static call of `checkUpkeep("0x")`.
pub async fn check_upkeep(lottery: &Lottery<SignerClient>) -> Result<bool> {
    let (upkeep_needed, _perform_data) = lottery
        .check_upkeep(Bytes::new())
        .call()
        .await
        .map_err(|e| contract_error(e, "checkUpkeep failed"))?;
    Ok(upkeep_needed)
}

/// Sends `performUpkeep("0x")` and returns the randomness request id it emitted.
#[instrument(skip(lottery), fields(lottery = ?lottery.address()))]
pub async fn perform_upkeep(lottery: &Lottery<SignerClient>, timeout_secs: u64) -> Result<U256> {
    let call = lottery.perform_upkeep(Bytes::new());
    let pending = call
        .send()
        .await
        .map_err(|e| contract_error(e, "performUpkeep failed"))?;
    let receipt = confirm(pending, 1, timeout_secs).await?;
    let requested: RequestedLotteryWinnerFilter = find_event(&receipt)?;
    info!(request_id = %requested.request_id, "Winner requested");
    Ok(requested.request_id)
}

/// Plays the coordinator's part on a development chain. Returns the picked winner.
#[instrument(skip(ctx))]
pub async fn fulfill_locally(ctx: &OpsContext, request_id: U256) -> Result<Address> {
    ctx.require_development("fulfill")?;
    let mock = ctx.coordinator_mock()?;
    let lottery_address = ctx.lottery_address()?;
    let call = mock.fulfill_random_words(request_id, lottery_address);
    let pending = call
        .send()
        .await
        .map_err(|e| contract_error(e, "fulfillRandomWords failed"))?;
    let receipt = confirm(pending, 1, ctx.timeout_secs()).await?;
    let picked: WinnerPickedFilter = find_event(&receipt)?;
    info!(winner = ?picked.winner, "WinnerPicked event fired!");
    Ok(picked.winner)
}

/// Resolves on the next `WinnerPicked` event.
#[instrument(skip(lottery), fields(lottery = ?lottery.address()))]
pub async fn wait_for_winner(lottery: &Lottery<SignerClient>, timeout_secs: u64) -> Result<Address> {
    let event = lottery.winner_picked_filter();
    let mut stream = event
        .stream()
        .await
        .map_err(|e| contract_error(e, "Failed to watch WinnerPicked"))?;
    info!("Waiting for WinnerPicked...");
    match timeout(Duration::from_secs(timeout_secs), stream.next()).await {
        Ok(Some(Ok(picked))) => {
            info!(winner = ?picked.winner, "WinnerPicked event fired!");
            Ok(picked.winner)
        }
        Ok(Some(Err(e))) => Err(eyre!(e).wrap_err("Failed to decode WinnerPicked")),
        Ok(None) => Err(eyre!("WinnerPicked stream ended")),
        Err(_) => Err(OpsError::Timeout {
            what: "WinnerPicked".to_string(),
            secs: timeout_secs,
        }
        .into()),
    }
}

fn poll_period(poll_secs: u64) -> Duration {
    Duration::from_secs(poll_secs.max(1))
}

/// One keeper tick: performs upkeep when the contract asks for it.
pub async fn upkeep_tick(lottery: &Lottery<SignerClient>, timeout_secs: u64) -> Result<Option<U256>> {
    if !check_upkeep(lottery).await? {
        debug!("Upkeep not needed");
        return Ok(None);
    }
    perform_upkeep(lottery, timeout_secs).await.map(Some)
}

/// Polls `checkUpkeep` every `poll_secs`. Tick errors are logged and the loop carries on.
/// With `once` the loop exits after the first tick and reports its outcome.
#[instrument(skip(lottery), fields(lottery = ?lottery.address()))]
pub async fn run_keeper(
    lottery: &Lottery<SignerClient>,
    poll_secs: u64,
    timeout_secs: u64,
    once: bool,
) -> Result<Option<U256>> {
    let mut ticker = interval(poll_period(poll_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(poll_secs, "Keeper started");
    loop {
        ticker.tick().await;
        let outcome = upkeep_tick(lottery, timeout_secs).await;
        if once {
            return outcome;
        }
        match outcome {
            Ok(Some(request_id)) => info!(%request_id, "Upkeep performed"),
            Ok(None) => {}
            Err(e) => error!(error = ?e, "Keeper tick failed"),
        }
    }
}

/// Moves a dev node's clock forward and mines a block.
pub async fn advance_time(client: &SignerClient, seconds: u64) -> Result<()> {
    let provider = client.provider();
    provider
        .request::<_, serde_json::Value>("evm_increaseTime", [seconds])
        .await
        .wrap_err("evm_increaseTime failed")?;
    provider
        .request::<_, serde_json::Value>("evm_mine", ())
        .await
        .wrap_err("evm_mine failed")?;
    debug!(seconds, "Advanced dev node time");
    Ok(())
}
