// lottery/src/frontend.rs
// Keeps the frontend's contract constants in step with the latest deployment.

use crate::config::Config;
use crate::context::LOTTERY_CONTRACT;
use crate::deployments::DeploymentStore;
use ethers::{types::Address, utils::to_checksum};
use eyre::{Result, WrapErr};
use std::{collections::BTreeMap, fs, path::Path};
use tracing::{debug, info, instrument};

/// `{ "<chainId>": ["0x...", ...] }` as consumed by the frontend.
pub type ContractAddresses = BTreeMap<String, Vec<String>>;

/// The flag is on for any non-empty value except `0` and `false`.
/// A plain presence check would treat `UPDATE_FRONTEND=false` as on; this one does not.
pub fn should_update(flag: Option<&str>) -> bool {
    match flag.map(str::trim) {
        None | Some("") => false,
        Some(v) => !(v == "0" || v.eq_ignore_ascii_case("false")),
    }
}

/// A missing file reads as an empty map.
pub fn read_addresses(path: impl AsRef<Path>) -> Result<ContractAddresses> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(?path, "No addresses file yet");
        return Ok(ContractAddresses::new());
    }
    let raw = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read addresses file: {:?}", path))?;
    if raw.trim().is_empty() {
        return Ok(ContractAddresses::new());
    }
    serde_json::from_str(&raw).wrap_err_with(|| format!("Invalid addresses file: {:?}", path))
}

/// Appends `address` under `chain_id` unless already listed. Returns whether it was added.
pub fn update_contract_addresses(path: impl AsRef<Path>, chain_id: u64, address: Address) -> Result<bool> {
    let path = path.as_ref();
    let mut addresses = read_addresses(path)?;
    let entry = addresses.entry(chain_id.to_string()).or_default();
    let already_listed = entry
        .iter()
        .any(|listed| listed.parse::<Address>().map_or(false, |a| a == address));
    if !already_listed {
        entry.push(to_checksum(&address, None));
    }
    write_file(path, &serde_json::to_string(&addresses)?)?;
    Ok(!already_listed)
}

/// Overwrites the ABI file.
pub fn update_abi(path: impl AsRef<Path>, abi: &serde_json::Value) -> Result<()> {
    write_file(path.as_ref(), &serde_json::to_string(abi)?)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).wrap_err_with(|| format!("Failed to create {:?}", parent))?;
    }
    fs::write(path, contents).wrap_err_with(|| format!("Failed to write {:?}", path))
}

/// Copies the recorded lottery address and ABI into the frontend constants.
/// Does nothing unless `UPDATE_FRONTEND` is set.
#[instrument(skip(config, store))]
pub fn sync_frontend(config: &Config, chain_id: u64, store: &DeploymentStore) -> Result<bool> {
    if !config.update_frontend {
        debug!("UPDATE_FRONTEND not set, skipping frontend sync");
        return Ok(false);
    }
    let record = store.load(LOTTERY_CONTRACT)?;
    info!("Updating frontend");
    update_contract_addresses(&config.frontend_addresses_file, chain_id, record.address)?;
    info!("updated address!");
    update_abi(&config.frontend_abi_file, &record.abi)?;
    info!("updated abi!");
    Ok(true)
}
