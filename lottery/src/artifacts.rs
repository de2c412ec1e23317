// lottery/src/artifacts.rs
// Hardhat compile output: artifacts/<source>.sol/<Name>.json plus build-info.

use crate::error::OpsError;
use ethers::{abi::Abi, types::Bytes};
use eyre::{Result, WrapErr};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    #[serde(default)]
    pub source_name: Option<String>,
    /// Kept as raw JSON so it can be written to the frontend untouched.
    pub abi: serde_json::Value,
    pub bytecode: Bytes,
    #[serde(skip)]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct DebugFile {
    #[serde(rename = "buildInfo")]
    build_info: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_long_version: String,
    /// Standard JSON input the contract was compiled from.
    pub input: serde_json::Value,
}

impl ContractArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read artifact: {:?}", path))?;
        let mut artifact: ContractArtifact = serde_json::from_str(&raw)
            .wrap_err_with(|| format!("Failed to parse artifact: {:?}", path))?;
        artifact.path = path.to_path_buf();
        Ok(artifact)
    }

    pub fn abi(&self) -> Result<Abi> {
        serde_json::from_value(self.abi.clone())
            .wrap_err_with(|| format!("Invalid ABI in artifact for {}", self.contract_name))
    }

    /// `contracts/Lottery.sol:Lottery`, the form block explorers expect.
    pub fn fully_qualified_name(&self) -> String {
        match &self.source_name {
            Some(source) => format!("{}:{}", source, self.contract_name),
            None => self.contract_name.clone(),
        }
    }

    /// Follows the sibling `<Name>.dbg.json` to the build-info file.
    pub fn build_info(&self) -> Result<BuildInfo> {
        let dbg_path = self.path.with_extension("dbg.json");
        let raw = fs::read_to_string(&dbg_path)
            .wrap_err_with(|| format!("Failed to read debug file: {:?}", dbg_path))?;
        let dbg: DebugFile = serde_json::from_str(&raw)?;
        let base = dbg_path.parent().unwrap_or_else(|| Path::new("."));
        let build_info_path = base.join(&dbg.build_info);
        let raw = fs::read_to_string(&build_info_path)
            .wrap_err_with(|| format!("Failed to read build info: {:?}", build_info_path))?;
        serde_json::from_str(&raw).wrap_err("Failed to parse build info")
    }
}

/// Finds `<name>.json` anywhere under `artifacts_dir`.
pub fn find_artifact(artifacts_dir: impl AsRef<Path>, name: &str) -> Result<ContractArtifact> {
    let file_name = format!("{}.json", name);
    let path = search(artifacts_dir.as_ref(), &file_name)?
        .ok_or_else(|| OpsError::ArtifactNotFound(name.to_string()))?;
    debug!(?path, "Found artifact for {}", name);
    ContractArtifact::load(path)
}

fn search(dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut entries = fs::read_dir(dir)
        .wrap_err_with(|| format!("Failed to list {:?}", dir))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().map_or(false, |n| n == "build-info") {
                continue;
            }
            if let Some(found) = search(&path, file_name)? {
                return Ok(Some(found));
            }
        } else if path.file_name().map_or(false, |n| n == file_name) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}
