// lottery/src/lib.rs
// Deployment, frontend sync and client tooling for the lottery contract.

pub mod artifacts;
pub mod bindings;
pub mod chain;
pub mod client;
pub mod config;
pub mod context;
pub mod deploy;
pub mod deployments;
pub mod error;
pub mod frontend;
pub mod keeper;
pub mod networks;
pub mod verify;

pub use context::OpsContext;
pub use error::{LotteryRevert, OpsError};

use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

/// INFO by default, `RUST_LOG` overrides.
pub fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .try_init();
}
