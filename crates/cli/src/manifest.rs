use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;

use crate::report::{Error, ErrorExt, Report};

#[derive(Deserialize)]
struct CargoManifest {
    name: String,
    version: String,
    #[serde(default)]
    metadata: Option<PackageMetadata>,
}

#[derive(Deserialize)]
struct PackageMetadata {
    #[serde(default)]
    tally: TallyMetadata,
}

/// The `[package.metadata.tally]` table.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TallyMetadata {
    pub dist: Option<PathBuf>,
    pub filename: Option<String>,
}

#[derive(Deserialize)]
struct Metadata {
    target_directory: PathBuf,
}

#[derive(Debug)]
pub struct Manifest {
    pub crate_name: String,
    pub crate_version: String,
    pub target: PathBuf,
    pub tally: TallyMetadata,
}

/// Read the manifest of the crate in the current directory.
pub fn manifest() -> Report<Manifest> {
    let manifest = cargo(&["read-manifest"], "failed to read cargo manifest")?;
    let metadata = cargo(
        &[
            "metadata",
            "--format-version=1",
            "--filter-platform=wasm32-unknown-unknown",
            "--no-deps",
        ],
        "failed to read cargo metadata",
    )?;

    parse(&manifest, &metadata)
}

fn cargo(args: &[&str], failure: &str) -> Report<Vec<u8>> {
    let out = Command::new("cargo")
        .args(args)
        .output()
        .message("failed to run cargo")?;

    if !out.status.success() {
        let err = String::from_utf8_lossy(&out.stderr);
        return Err(Error::message(format!("{failure}\n{err}")));
    }

    Ok(out.stdout)
}

fn parse(manifest: &[u8], metadata: &[u8]) -> Report<Manifest> {
    let manifest: CargoManifest =
        serde_json::from_slice(manifest).message("failed to parse cargo manifest")?;
    let metadata: Metadata =
        serde_json::from_slice(metadata).message("failed to parse cargo metadata")?;

    Ok(Manifest {
        crate_name: manifest.name,
        crate_version: manifest.version,
        target: metadata.target_directory,
        tally: manifest.metadata.map(|m| m.tally).unwrap_or_default(),
    })
}
