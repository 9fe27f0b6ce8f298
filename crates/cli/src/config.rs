use std::path::PathBuf;

use crate::manifest::{manifest, Manifest};
use crate::report::{Error, Report};
use crate::{Build, When};

const DEFAULT_DIST: &str = "dist";

/// Everything a build needs to know, resolved from command line flags first,
/// then `[package.metadata.tally]`, then defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub crate_name: String,
    pub crate_version: String,
    /// Cargo target directory
    pub target: PathBuf,
    /// Output directory of the bundle
    pub dist: PathBuf,
    /// Name of the bundle files, without extension
    pub filename: String,
    pub release: bool,
    pub autoreload: bool,
}

impl Config {
    pub fn load(b: &Build) -> Report<Self> {
        Config::resolve(b, manifest()?)
    }

    fn resolve(b: &Build, manifest: Manifest) -> Report<Self> {
        let Manifest {
            crate_name,
            crate_version,
            target,
            tally,
        } = manifest;

        let dist = b
            .dist
            .clone()
            .or(tally.dist)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DIST));

        let filename = b
            .filename
            .clone()
            .or(tally.filename)
            .unwrap_or_else(|| crate_name.replace('-', "_"));

        if filename.is_empty() || filename.contains(['/', '\\', '.']) {
            return Err(Error::message(format!(
                "invalid bundle filename `{filename}`, expected a name without extension or directories",
            )));
        }

        let autoreload = match b.autoreload {
            When::Auto => !b.release,
            When::Always => true,
            When::Never => false,
        };

        Ok(Config {
            crate_name,
            crate_version,
            target,
            dist,
            filename,
            release: b.release,
            autoreload,
        })
    }

    /// The `.wasm` file cargo produces for this crate.
    pub fn cargo_wasm(&self) -> PathBuf {
        let mut wasm = self.target.join("wasm32-unknown-unknown");

        wasm.push(if self.release { "release" } else { "debug" });
        wasm.push(self.crate_name.replace('-', "_"));
        wasm.set_extension("wasm");
        wasm
    }

    /// JavaScript entry module of the bundle.
    pub fn bundle_js(&self) -> PathBuf {
        self.dist.join(format!("{}.js", self.filename))
    }

    /// WebAssembly binary loaded by the entry module.
    pub fn bundle_wasm(&self) -> PathBuf {
        self.dist.join(format!("{}_bg.wasm", self.filename))
    }
}
