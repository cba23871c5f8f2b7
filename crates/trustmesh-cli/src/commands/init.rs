use std::path::Path;

use anyhow::Result;
use trustmesh_core::TrustmeshConfig;

/// Print a config scaffold rooted at `state_dir`.
pub fn init(state_dir: &Path) -> Result<()> {
    let config = TrustmeshConfig::scaffold(state_dir);
    print!("{}", config.to_toml_string()?);
    Ok(())
}
