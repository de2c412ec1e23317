// tests/lottery_flow.rs
#![cfg(feature = "local_simulation")]
// End-to-end against a fresh Anvil node. Needs `anvil` on PATH and compiled
// Hardhat artifacts (LOTTERY_ARTIFACTS_DIR, default ./artifacts).
// Run: cargo test --features local_simulation -- --ignored

use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Bytes, U256},
    utils::{Anvil, AnvilInstance},
};
use eyre::Result;
use lottery_ops::{
    bindings::{Lottery, LotteryEnterFilter},
    chain::{confirm, contract_error, find_event, SignerClient},
    client::{lottery_address, LotteryClient},
    config::Config,
    deploy::{run_deploy, DeployTag},
    frontend::read_addresses,
    keeper::{advance_time, check_upkeep, fulfill_locally, perform_upkeep, run_keeper, wait_for_winner},
    LotteryRevert, OpsContext, OpsError,
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tempfile::TempDir;
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

const INTERVAL_SECS: u64 = 30;

fn setup_tracing() {
    let _ = fmt()
        .with_max_level(LevelFilter::INFO)
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Harness {
    anvil: AnvilInstance,
    _workdir: TempDir,
    ctx: OpsContext,
    lottery: Lottery<SignerClient>,
}

async fn deployed_lottery() -> Result<Harness> {
    setup_tracing();
    let anvil = Anvil::new().spawn();
    let workdir = tempfile::tempdir()?;
    let artifacts = std::env::var("LOTTERY_ARTIFACTS_DIR").unwrap_or_else(|_| "./artifacts".to_string());
    let vars: HashMap<&str, String> = HashMap::from([
        ("NETWORK", "anvil".to_string()),
        ("RPC_URL", anvil.endpoint()),
        ("ARTIFACTS_DIR", artifacts),
        ("DEPLOYMENTS_DIR", workdir.path().join("deployments").display().to_string()),
        ("UPDATE_FRONTEND", "true".to_string()),
        ("FRONTEND_ADDRESSES_FILE", workdir.path().join("contractAddresses.json").display().to_string()),
        ("FRONTEND_ABI_FILE", workdir.path().join("contractAbi.json").display().to_string()),
        ("TX_CONFIRMATION_TIMEOUT_SECS", "30".to_string()),
    ]);
    let config = Config::from_lookup(|key| vars.get(key).cloned())?;
    let ctx = OpsContext::connect(config).await?;
    run_deploy(&ctx, &[DeployTag::All]).await?;
    let lottery = ctx.lottery()?;
    Ok(Harness { anvil, _workdir: workdir, ctx, lottery })
}

/// Lottery handle signed by Anvil account `index`.
fn lottery_as(h: &Harness, index: usize) -> Result<Lottery<SignerClient>> {
    let provider = Provider::<Http>::try_from(h.anvil.endpoint())?;
    let wallet = LocalWallet::from(h.anvil.keys()[index].clone()).with_chain_id(h.anvil.chain_id());
    Ok(Lottery::new(h.lottery.address(), Arc::new(SignerMiddleware::new(provider, wallet))))
}

async fn enter(lottery: &Lottery<SignerClient>, timeout_secs: u64) -> Result<()> {
    let fee = lottery.get_entry_fee().call().await?;
    let call = lottery.enter_lottery().value(fee);
    let pending = call.send().await.map_err(|e| contract_error(e, "enterLottery"))?;
    confirm(pending, 1, timeout_secs).await?;
    Ok(())
}

fn revert_of(err: &eyre::Report) -> Option<&LotteryRevert> {
    match err.downcast_ref::<OpsError>() {
        Some(OpsError::Revert(revert)) => Some(revert),
        _ => None,
    }
}

#[tokio::test]
#[ignore]
async fn deploy_initialises_lottery_and_frontend() -> Result<()> {
    let h = deployed_lottery().await?;
    assert_eq!(h.lottery.get_lottery_state().call().await?, 0);
    assert_eq!(h.lottery.get_interval().call().await?, U256::from(INTERVAL_SECS));

    let addresses = read_addresses(&h.ctx.config.frontend_addresses_file)?;
    assert_eq!(lottery_address(&addresses, h.ctx.chain_id)?, Some(h.lottery.address()));
    Ok(())
}

#[tokio::test]
#[ignore]
async fn entering_without_fee_reverts() -> Result<()> {
    let h = deployed_lottery().await?;
    let call = h.lottery.enter_lottery();
    let err = contract_error(call.send().await.err().ok_or_else(|| eyre::eyre!("entry without fee succeeded"))?, "enterLottery");
    assert_eq!(revert_of(&err), Some(&LotteryRevert::NotEnoughEthEntered));
    Ok(())
}

#[tokio::test]
#[ignore]
async fn entering_records_player_and_emits_event() -> Result<()> {
    let h = deployed_lottery().await?;
    let client = LotteryClient::new(h.lottery.address(), h.ctx.client.clone(), h.ctx.timeout_secs());
    let view = client.enter().await?;
    assert_eq!(view.num_players, U256::one());
    assert_eq!(h.lottery.get_player(U256::zero()).call().await?, client.account());

    let fee = h.lottery.get_entry_fee().call().await?;
    let call = h.lottery.enter_lottery().value(fee);
    let receipt = confirm(call.send().await?, 1, h.ctx.timeout_secs()).await?;
    let entered: LotteryEnterFilter = find_event(&receipt)?;
    assert_eq!(entered.player, client.account());
    Ok(())
}

#[tokio::test]
#[ignore]
async fn entry_is_refused_while_calculating() -> Result<()> {
    let h = deployed_lottery().await?;
    enter(&h.lottery, h.ctx.timeout_secs()).await?;
    advance_time(&h.ctx.client, INTERVAL_SECS + 1).await?;
    perform_upkeep(&h.lottery, h.ctx.timeout_secs()).await?;
    assert_eq!(h.lottery.get_lottery_state().call().await?, 1);

    let err = enter(&h.lottery, h.ctx.timeout_secs()).await.unwrap_err();
    assert_eq!(revert_of(&err), Some(&LotteryRevert::NotOpen));
    Ok(())
}

#[tokio::test]
#[ignore]
async fn upkeep_needs_players_and_elapsed_interval() -> Result<()> {
    let h = deployed_lottery().await?;
    advance_time(&h.ctx.client, INTERVAL_SECS + 1).await?;
    assert!(!check_upkeep(&h.lottery).await?, "no players yet");

    enter(&h.lottery, h.ctx.timeout_secs()).await?;
    assert!(check_upkeep(&h.lottery).await?);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn upkeep_is_not_needed_before_interval() -> Result<()> {
    let h = deployed_lottery().await?;
    enter(&h.lottery, h.ctx.timeout_secs()).await?;
    assert!(!check_upkeep(&h.lottery).await?);

    let call = h.lottery.perform_upkeep(Bytes::new());
    let err = contract_error(call.send().await.err().ok_or_else(|| eyre::eyre!("upkeep succeeded early"))?, "performUpkeep");
    assert!(matches!(revert_of(&err), Some(LotteryRevert::UpkeepNotNeeded { .. })));
    Ok(())
}

#[tokio::test]
#[ignore]
async fn upkeep_not_needed_while_calculating() -> Result<()> {
    let h = deployed_lottery().await?;
    enter(&h.lottery, h.ctx.timeout_secs()).await?;
    advance_time(&h.ctx.client, INTERVAL_SECS + 1).await?;
    perform_upkeep(&h.lottery, h.ctx.timeout_secs()).await?;

    assert_eq!(h.lottery.get_lottery_state().call().await?, 1);
    assert!(!check_upkeep(&h.lottery).await?);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn fulfilment_needs_a_pending_request() -> Result<()> {
    let h = deployed_lottery().await?;
    enter(&h.lottery, h.ctx.timeout_secs()).await?;
    assert!(fulfill_locally(&h.ctx, U256::zero()).await.is_err());
    assert!(fulfill_locally(&h.ctx, U256::one()).await.is_err());
    Ok(())
}

/// Entrants are accounts 1..=4 so the winner never pays gas after entering.
#[tokio::test]
#[ignore]
async fn picks_winner_pays_out_and_resets() -> Result<()> {
    let h = deployed_lottery().await?;
    let fee = h.lottery.get_entry_fee().call().await?;
    let mut entrants = Vec::new();
    for index in 1..=4 {
        let player = lottery_as(&h, index)?;
        enter(&player, h.ctx.timeout_secs()).await?;
        entrants.push(player.client().signer().address());
    }
    let mut starting_balances = HashMap::new();
    for entrant in &entrants {
        starting_balances.insert(*entrant, h.ctx.client.get_balance(*entrant, None).await?);
    }
    let starting_timestamp = h.lottery.get_latest_time_stamp().call().await?;

    advance_time(&h.ctx.client, INTERVAL_SECS + 1).await?;
    let request_id = perform_upkeep(&h.lottery, h.ctx.timeout_secs()).await?;
    assert!(request_id > U256::zero());

    let winner = fulfill_locally(&h.ctx, request_id).await?;
    assert!(entrants.contains(&winner));
    assert_eq!(h.lottery.get_recent_winner().call().await?, winner);
    assert_eq!(h.lottery.get_number_of_players().call().await?, U256::zero());
    assert_eq!(h.lottery.get_lottery_state().call().await?, 0);
    assert!(h.lottery.get_latest_time_stamp().call().await? > starting_timestamp);

    let ending_balance = h.ctx.client.get_balance(winner, None).await?;
    assert_eq!(ending_balance, starting_balances[&winner] + fee * U256::from(entrants.len()));
    Ok(())
}

#[tokio::test]
#[ignore]
async fn winner_watch_resolves_on_fulfilment() -> Result<()> {
    let h = deployed_lottery().await?;
    enter(&h.lottery, h.ctx.timeout_secs()).await?;
    enter(&lottery_as(&h, 1)?, h.ctx.timeout_secs()).await?;

    let watched = h.lottery.clone();
    let watcher = tokio::spawn(async move { wait_for_winner(&watched, 60).await });
    // Give the watcher time to install its log filter.
    tokio::time::sleep(Duration::from_secs(1)).await;

    advance_time(&h.ctx.client, INTERVAL_SECS + 1).await?;
    let request_id = perform_upkeep(&h.lottery, h.ctx.timeout_secs()).await?;
    let winner = fulfill_locally(&h.ctx, request_id).await?;

    let seen = watcher.await??;
    assert_eq!(seen, winner);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn single_keeper_tick_performs_only_when_due() -> Result<()> {
    let h = deployed_lottery().await?;
    enter(&h.lottery, h.ctx.timeout_secs()).await?;
    assert_eq!(run_keeper(&h.lottery, 1, h.ctx.timeout_secs(), true).await?, None);

    advance_time(&h.ctx.client, INTERVAL_SECS + 1).await?;
    let request_id = run_keeper(&h.lottery, 1, h.ctx.timeout_secs(), true).await?;
    assert!(matches!(request_id, Some(id) if id > U256::zero()));
    assert_eq!(h.lottery.get_lottery_state().call().await?, 1);
    Ok(())
}
