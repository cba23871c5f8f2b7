//! `trustctl` subcommands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use trustmesh_core::TrustmeshConfig;
use trustmesh_core::config::IdentityConfig;
use trustmesh_store::Remotes;

pub mod cert;
pub mod check;
pub mod init;
pub mod store;

/// Config file contents merged with command-line overrides.
#[derive(Debug, Default)]
pub struct Settings {
    config: Option<TrustmeshConfig>,
    trust_dir: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(config: Option<&Path>, dir: Option<PathBuf>) -> Result<Self> {
        let config = config
            .map(|path| {
                TrustmeshConfig::from_file(path)
                    .with_context(|| format!("failed to load config {}", path.display()))
            })
            .transpose()?;
        let trust_dir = dir.or_else(|| config.as_ref().map(|c| c.trust.dir.clone()));
        Ok(Self { config, trust_dir })
    }

    pub fn log_filter(&self) -> Option<&str> {
        self.config.as_ref().and_then(TrustmeshConfig::log_filter)
    }

    pub fn trust_dir(&self) -> Result<&Path> {
        self.trust_dir
            .as_deref()
            .context("no trust directory; pass --dir or --config")
    }

    pub fn identity(&self) -> Result<&IdentityConfig> {
        self.config
            .as_ref()
            .and_then(|c| c.identity.as_ref())
            .context("no [identity] section; pass --config with one")
    }

    /// Load the truststore from the trust directory.
    pub fn open_store(&self) -> Result<Remotes> {
        let dir = self.trust_dir()?;
        let remotes = Remotes::new();
        remotes
            .load(dir)
            .with_context(|| format!("failed to load truststore {}", dir.display()))?;
        Ok(remotes)
    }
}
