// lottery/src/main.rs

use clap::{Parser, Subcommand};
use ethers::{signers::Signer, types::U256};
use eyre::{Result, WrapErr};
use lottery_ops::{
    client::{short_address, LotteryClient, NO_LOTTERY_MESSAGE},
    config::load_config,
    deploy::{run_deploy, DeployTag},
    frontend::sync_frontend,
    init_tracing,
    keeper::{fulfill_locally, perform_upkeep, run_keeper, wait_for_winner},
    OpsContext, OpsError,
};
use tracing::info;

const DEFAULT_WINNER_TIMEOUT_SECS: u64 = 300;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lottery deployment and client tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run deploy steps (mocks, lottery, frontend).
    Deploy {
        /// Comma separated tags: all, mocks, lottery, frontend.
        #[arg(long, value_delimiter = ',', default_value = "all")]
        tags: Vec<String>,
    },
    /// Write the recorded lottery address and ABI to the frontend files.
    SyncFrontend,
    /// Show entry fee, player count and recent winner.
    Status,
    /// Enter the lottery paying the current entry fee.
    Enter,
    /// Poll checkUpkeep and perform upkeep when needed.
    Keeper {
        #[arg(long)]
        once: bool,
    },
    /// Fulfil a randomness request with the mock coordinator (development chains).
    Fulfill {
        /// Decimal request id; performs upkeep first when omitted.
        #[arg(long)]
        request_id: Option<String>,
    },
    /// Block until the next WinnerPicked event.
    WaitWinner {
        #[arg(long, default_value_t = DEFAULT_WINNER_TIMEOUT_SECS)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config()?;
    let ctx = OpsContext::connect(config).await?;

    match cli.command {
        Command::Deploy { tags } => {
            let tags = tags
                .iter()
                .map(|t| t.parse::<DeployTag>())
                .collect::<Result<Vec<_>>>()?;
            run_deploy(&ctx, &tags).await?;
        }
        Command::SyncFrontend => {
            sync_frontend(&ctx.config, ctx.chain_id, &ctx.store)?;
        }
        Command::Status => {
            let Some(client) = lottery_client(&ctx)? else {
                println!("{}", NO_LOTTERY_MESSAGE);
                return Ok(());
            };
            println!("Account: {}", short_address(&ctx.client.signer().address()));
            println!("{}", client.refresh().await?);
        }
        Command::Enter => {
            let Some(client) = lottery_client(&ctx)? else {
                println!("{}", NO_LOTTERY_MESSAGE);
                return Ok(());
            };
            println!("Account: {}", short_address(&client.account()));
            println!("{}", client.enter().await?);
        }
        Command::Keeper { once } => {
            let lottery = ctx.lottery()?;
            let outcome = run_keeper(
                &lottery,
                ctx.config.keeper_poll_interval_secs,
                ctx.timeout_secs(),
                once,
            )
            .await?;
            if let Some(request_id) = outcome {
                println!("Requested winner, request id {}", request_id);
            }
        }
        Command::Fulfill { request_id } => {
            let request_id = match request_id {
                Some(raw) => U256::from_dec_str(&raw)
                    .wrap_err_with(|| format!("Invalid request id `{}`", raw))?,
                None => perform_upkeep(&ctx.lottery()?, ctx.timeout_secs()).await?,
            };
            let winner = fulfill_locally(&ctx, request_id).await?;
            println!("Winner: {:?}", winner);
        }
        Command::WaitWinner { timeout_secs } => {
            let winner = wait_for_winner(&ctx.lottery()?, timeout_secs).await?;
            println!("Winner: {:?}", winner);
        }
    }
    info!("Done.");
    Ok(())
}

/// `None` when no lottery address is known for the connected chain.
fn lottery_client(ctx: &OpsContext) -> Result<Option<LotteryClient>> {
    match ctx.lottery_address() {
        Ok(address) => Ok(Some(LotteryClient::new(address, ctx.client.clone(), ctx.timeout_secs()))),
        Err(e) if matches!(e.downcast_ref::<OpsError>(), Some(OpsError::NoLotteryAddress(_))) => Ok(None),
        Err(e) => Err(e),
    }
}
