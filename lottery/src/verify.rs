// lottery/src/verify.rs
// Block explorer source verification from the Hardhat build-info.

use crate::artifacts::ContractArtifact;
use ethers::{
    etherscan::{verify::CodeFormat, verify::VerifyContract, Client},
    types::{Address, Chain},
};
use eyre::{eyre, Result, WrapErr};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

const STATUS_POLL_INTERVAL_SECS: u64 = 5;
const MAX_STATUS_POLLS: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Verified,
    AlreadyVerified,
    Failed(String),
}

impl VerificationStatus {
    /// Classifies an explorer status or error message.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("already verified") {
            VerificationStatus::AlreadyVerified
        } else if lower.contains("pending in queue") || lower.contains("in progress") {
            VerificationStatus::Pending
        } else if lower.starts_with("pass") {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Failed(message.to_string())
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, VerificationStatus::Verified | VerificationStatus::AlreadyVerified)
    }
}

/// Submits standard-JSON verification and polls until the explorer settles.
#[instrument(skip(api_key, artifact, encoded_args), fields(contract = %artifact.contract_name))]
pub async fn verify_contract(
    chain_id: u64,
    api_key: &str,
    address: Address,
    artifact: &ContractArtifact,
    encoded_args: &str,
) -> Result<VerificationStatus> {
    info!("Verifying contract...");
    let chain = Chain::try_from(chain_id).map_err(|_| eyre!("Chain id {} is not known to the explorer", chain_id))?;
    let client = Client::new(chain, api_key).wrap_err("Failed to build explorer client")?;

    let build_info = artifact.build_info()?;
    let source = serde_json::to_string(&build_info.input)?;
    let request = VerifyContract::new(
        address,
        artifact.fully_qualified_name(),
        source,
        format!("v{}", build_info.solc_long_version),
    )
    .code_format(CodeFormat::StandardJsonInput)
    .constructor_arguments(Some(encoded_args.trim_start_matches("0x").to_string()));

    let guid = match client.submit_contract_verification(&request).await {
        Ok(resp) if resp.status == "1" => resp.result,
        Ok(resp) => return settle(VerificationStatus::classify(&resp.result)),
        Err(e) => return settle(VerificationStatus::classify(&e.to_string())),
    };
    info!(%guid, "Verification submitted");

    for _ in 0..MAX_STATUS_POLLS {
        sleep(Duration::from_secs(STATUS_POLL_INTERVAL_SECS)).await;
        let status = match client.check_contract_verification_status(&guid).await {
            Ok(resp) => VerificationStatus::classify(&resp.result),
            Err(e) => VerificationStatus::classify(&e.to_string()),
        };
        if status != VerificationStatus::Pending {
            return settle(status);
        }
    }
    Err(eyre!("Verification {} still pending after {} polls", guid, MAX_STATUS_POLLS))
}

fn settle(status: VerificationStatus) -> Result<VerificationStatus> {
    if status.is_done() {
        info!(?status, "Verified!");
        return Ok(status);
    }
    match status {
        VerificationStatus::Failed(reason) => {
            warn!(%reason, "Verification failed");
            Err(eyre!("Verification failed: {}", reason))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_explorer_messages() {
        assert_eq!(
            VerificationStatus::classify("Contract source code already verified"),
            VerificationStatus::AlreadyVerified
        );
        assert_eq!(VerificationStatus::classify("Pending in queue"), VerificationStatus::Pending);
        assert_eq!(VerificationStatus::classify("Pass - Verified"), VerificationStatus::Verified);
        assert!(matches!(
            VerificationStatus::classify("Fail - Unable to verify"),
            VerificationStatus::Failed(_)
        ));
    }

    #[test]
    fn already_verified_counts_as_done() {
        assert!(VerificationStatus::AlreadyVerified.is_done());
        assert!(VerificationStatus::Verified.is_done());
        assert!(!VerificationStatus::Pending.is_done());
        assert!(settle(VerificationStatus::AlreadyVerified).is_ok());
        assert!(settle(VerificationStatus::Failed("bad".into())).is_err());
    }
}
