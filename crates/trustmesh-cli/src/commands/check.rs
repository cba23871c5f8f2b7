//! `trustctl check`: handshake with every trusted peer.

use anyhow::{Result, bail};
use tracing::{info, warn};
use trustmesh_cluster::{ClusterBuilder, NodeIdentity};
use trustmesh_core::AddrPort;
use trustmesh_store::Remotes;

use super::Settings;
use super::cert::read_certificate;

/// Outcome of one peer handshake.
#[derive(Debug)]
struct PeerStatus {
    address: AddrPort,
    result: std::result::Result<(), String>,
}

pub async fn check(settings: &Settings, notify: bool) -> Result<()> {
    let identity_config = settings.identity()?;
    let identity = NodeIdentity::from_files(&identity_config.cert, &identity_config.key)?;
    let anchor = read_certificate(&identity_config.cluster_cert)?;
    let remotes = settings.open_store()?;

    let mut builder = ClusterBuilder::new(&remotes, &identity, &anchor).notification(notify);
    if !identity_config.address.is_empty() {
        builder = builder.skip_address(identity_config.address.clone());
    }
    let cluster = builder.build()?;

    if cluster.is_empty() {
        println!("No peers to check.");
        return Ok(());
    }

    let mut statuses = cluster
        .query(true, |client| async move {
            let result = client.connect().await.map(drop).map_err(|e| e.to_string());
            Ok(PeerStatus {
                address: client.address().clone(),
                result,
            })
        })
        .await?;
    statuses.sort_by_key(|s| s.address.to_string());

    print!("{}", format_report(&remotes, &statuses));

    let failed = statuses.iter().filter(|s| s.result.is_err()).count();
    if failed > 0 {
        warn!(failed, total = statuses.len(), "peer check failed");
        bail!("{failed} of {} peers failed the handshake", statuses.len());
    }
    info!(total = statuses.len(), "all peers reachable");
    Ok(())
}

fn format_report(remotes: &Remotes, statuses: &[PeerStatus]) -> String {
    let mut out = String::new();
    for status in statuses {
        let name = remotes
            .remote_by_address(&status.address)
            .map(|r| r.name)
            .unwrap_or_else(|| "?".to_string());
        match &status.result {
            Ok(()) => out.push_str(&format!("✓ {name} ({})\n", status.address)),
            Err(e) => out.push_str(&format!("✗ {name} ({}): {e}\n", status.address)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustmesh_core::X509Certificate;
    use trustmesh_store::Remote;

    #[test]
    fn test_format_report() {
        let dir = tempfile::tempdir().unwrap();
        let key = rcgen::KeyPair::generate().unwrap();
        let cert = rcgen::CertificateParams::new(vec!["node".to_string()])
            .unwrap()
            .self_signed(&key)
            .unwrap();
        let remotes = Remotes::new();
        remotes
            .add(
                dir.path(),
                [Remote::new(
                    "n1",
                    "10.0.0.1:8443".parse().unwrap(),
                    X509Certificate::from_pem(&cert.pem()).unwrap(),
                )],
            )
            .unwrap();

        let statuses = vec![
            PeerStatus {
                address: "10.0.0.1:8443".parse().unwrap(),
                result: Ok(()),
            },
            PeerStatus {
                address: "10.0.0.9:8443".parse().unwrap(),
                result: Err("connection refused".to_string()),
            },
        ];
        let report = format_report(&remotes, &statuses);
        assert_eq!(
            report,
            "✓ n1 (10.0.0.1:8443)\n✗ ? (10.0.0.9:8443): connection refused\n"
        );
    }

    #[tokio::test]
    async fn test_check_requires_identity() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::resolve(None, Some(dir.path().to_path_buf())).unwrap();
        let err = check(&settings, false).await.unwrap_err();
        assert!(err.to_string().contains("[identity]"));
    }
}
