//! trustmesh.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::addr::AddrPort;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrustmeshConfig {
    pub trust: TrustConfig,
    pub identity: Option<IdentityConfig>,
    pub log: Option<LogConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrustConfig {
    /// Directory holding one `<name>.yaml` file per trusted peer.
    pub dir: PathBuf,
}

/// The local node's TLS identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityConfig {
    /// PEM certificate chain presented to peers.
    pub cert: PathBuf,
    /// PEM private key for `cert`.
    pub key: PathBuf,
    /// PEM certificate peers are pinned against.
    pub cluster_cert: PathBuf,
    /// This node's own address, skipped when fanning out.
    #[serde(default)]
    pub address: AddrPort,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive string.
    pub filter: Option<String>,
}

impl TrustmeshConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TrustmeshConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a config rooted at `state_dir`.
    pub fn scaffold(state_dir: &Path) -> Self {
        TrustmeshConfig {
            trust: TrustConfig {
                dir: state_dir.join("truststore"),
            },
            identity: Some(IdentityConfig {
                cert: state_dir.join("server.crt"),
                key: state_dir.join("server.key"),
                cluster_cert: state_dir.join("cluster.crt"),
                address: AddrPort::default(),
            }),
            log: Some(LogConfig {
                filter: Some("info".to_string()),
            }),
        }
    }

    /// The configured log filter, if any.
    pub fn log_filter(&self) -> Option<&str> {
        self.log.as_ref().and_then(|log| log.filter.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaffold() {
        let config = TrustmeshConfig::scaffold(Path::new("/var/lib/trustmesh"));
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("/var/lib/trustmesh/truststore"));
        assert!(toml_str.contains("cluster_cert"));

        let back: TrustmeshConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_parse_minimal() {
        let toml_str = r#"
[trust]
dir = "/tmp/trust"
"#;
        let config: TrustmeshConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.trust.dir, PathBuf::from("/tmp/trust"));
        assert!(config.identity.is_none());
        assert_eq!(config.log_filter(), None);
    }

    #[test]
    fn test_parse_identity_address() {
        let toml_str = r#"
[trust]
dir = "/tmp/trust"

[identity]
cert = "/tmp/server.crt"
key = "/tmp/server.key"
cluster_cert = "/tmp/cluster.crt"
address = "[::1]:8443"

[log]
filter = "debug"
"#;
        let config: TrustmeshConfig = toml::from_str(toml_str).unwrap();
        let identity = config.identity.as_ref().unwrap();
        assert_eq!(identity.address.to_string(), "[::1]:8443");
        assert_eq!(config.log_filter(), Some("debug"));
    }

    #[test]
    fn test_parse_rejects_bad_address() {
        let toml_str = r#"
[trust]
dir = "/tmp/trust"

[identity]
cert = "a"
key = "b"
cluster_cert = "c"
address = "nowhere"
"#;
        assert!(toml::from_str::<TrustmeshConfig>(toml_str).is_err());
    }
}
