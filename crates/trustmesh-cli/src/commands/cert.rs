use std::path::Path;

use anyhow::{Context, Result};
use trustmesh_core::X509Certificate;

pub fn fingerprint(path: &Path) -> Result<()> {
    let cert = read_certificate(path)?;
    println!("{}", cert.fingerprint());
    Ok(())
}

/// Read a PEM certificate file.
pub fn read_certificate(path: &Path) -> Result<X509Certificate> {
    let pem = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    X509Certificate::from_pem(&pem)
        .with_context(|| format!("invalid certificate in {}", path.display()))
}
