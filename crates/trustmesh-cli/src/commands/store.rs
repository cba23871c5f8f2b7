//! Truststore inspection and edits.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::info;
use trustmesh_core::AddrPort;
use trustmesh_store::{ClusterMember, Remote, Remotes};

use super::Settings;
use super::cert::read_certificate;

/// How `show` picks a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Name(String),
    Address(AddrPort),
    Fingerprint(String),
}

/// The JSON shape of one `list` row.
#[derive(Debug, Serialize)]
struct RemoteSummary<'a> {
    name: &'a str,
    address: &'a AddrPort,
    fingerprint: String,
}

impl<'a> From<&'a Remote> for RemoteSummary<'a> {
    fn from(remote: &'a Remote) -> Self {
        Self {
            name: &remote.name,
            address: &remote.address,
            fingerprint: remote.fingerprint(),
        }
    }
}

pub fn list(settings: &Settings, format: &str) -> Result<()> {
    let remotes = sorted(&settings.open_store()?);

    match format {
        "json" => {
            let rows: Vec<RemoteSummary<'_>> = remotes.iter().map(RemoteSummary::from).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => print!("{}", format_table(&remotes)),
    }

    Ok(())
}

pub fn show(settings: &Settings, by: &Lookup) -> Result<()> {
    let remotes = settings.open_store()?;
    let Some(remote) = lookup(&remotes, by) else {
        bail!("no trusted peer matches {by:?}");
    };

    println!("name:        {}", remote.name);
    println!("address:     {}", remote.address);
    println!("fingerprint: {}", remote.fingerprint());
    print!("{}", remote.certificate.to_pem());
    Ok(())
}

pub fn add(settings: &Settings, name: &str, address: &str, cert: &Path) -> Result<()> {
    let address: AddrPort = address.parse()?;
    let certificate = read_certificate(cert)?;
    let remote = Remote::new(name, address, certificate);

    let remotes = settings.open_store()?;
    match remotes.add(settings.trust_dir()?, [remote]) {
        Ok(()) => {
            println!("✓ Trusted {name}");
            Ok(())
        }
        Err(e) if e.is_collision() => {
            info!(%name, "peer already trusted");
            println!("{name} is already trusted");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn replace(settings: &Settings, members_path: &Path) -> Result<()> {
    let members = read_members(members_path)?;
    let count = members.len();

    let remotes = settings.open_store()?;
    remotes
        .replace(settings.trust_dir()?, members)
        .context("truststore left unchanged")?;

    println!("✓ Truststore now holds {count} peers");
    Ok(())
}

fn read_members(path: &Path) -> Result<Vec<ClusterMember>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("invalid members file {}", path.display()))
}

fn lookup(remotes: &Remotes, by: &Lookup) -> Option<Remote> {
    match by {
        Lookup::Name(name) => remotes.remotes_by_name().remove(name),
        Lookup::Address(address) => remotes.remote_by_address(address),
        Lookup::Fingerprint(fingerprint) => remotes.remote_by_certificate_fingerprint(fingerprint),
    }
}

fn sorted(remotes: &Remotes) -> Vec<Remote> {
    let mut all: Vec<Remote> = remotes.remotes_by_name().into_values().collect();
    all.sort_by(|a, b| a.name.cmp(&b.name));
    all
}

fn format_table(remotes: &[Remote]) -> String {
    if remotes.is_empty() {
        return "No trusted peers.\n".to_string();
    }

    let name_width = remotes.iter().map(|r| r.name.len()).max().unwrap_or(0).max(4);
    let addr_width = remotes
        .iter()
        .map(|r| r.address.to_string().len())
        .max()
        .unwrap_or(0)
        .max(7);

    let mut out = String::new();
    let _ = writeln!(out, "{:<name_width$}  {:<addr_width$}  FINGERPRINT", "NAME", "ADDRESS");
    for remote in remotes {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<addr_width$}  {}",
            remote.name,
            remote.address.to_string(),
            remote.fingerprint()
        );
    }
    out
}
