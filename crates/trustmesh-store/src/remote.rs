//! Membership records.
//!
//! A [`Remote`] is one trusted peer. On disk it is a small YAML document:
//!
//! ```yaml
//! name: n1
//! address: 10.0.0.1:8443
//! certificate: |
//!   -----BEGIN CERTIFICATE-----
//!   ...
//!   -----END CERTIFICATE-----
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use trustmesh_core::{AddrPort, X509Certificate};

use crate::error::{TrustError, TrustResult};

/// Substrings that may not appear in a remote name, which becomes a file name.
const DISALLOWED_NAME_SUBSTRINGS: &[&str] = &["..", "/", "\\"];

/// A trusted peer: its name, address, and certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Remote {
    pub name: String,
    pub address: AddrPort,
    pub certificate: X509Certificate,
}

impl Remote {
    pub fn new(name: impl Into<String>, address: AddrPort, certificate: X509Certificate) -> Self {
        Self {
            name: name.into(),
            address,
            certificate,
        }
    }

    /// `https://` URL of the remote's address.
    pub fn url(&self) -> String {
        format!("https://{}", self.address)
    }

    pub fn fingerprint(&self) -> String {
        self.certificate.fingerprint()
    }
}

/// A member row as handed over by the cluster's authoritative database.
///
/// The certificate is optional because rows may be incomplete;
/// [`Remotes::replace`](crate::Remotes::replace) rejects those.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub name: String,
    #[serde(default)]
    pub address: AddrPort,
    #[serde(default)]
    pub certificate: Option<X509Certificate>,
}

impl From<Remote> for ClusterMember {
    fn from(remote: Remote) -> Self {
        Self {
            name: remote.name,
            address: remote.address,
            certificate: Some(remote.certificate),
        }
    }
}

impl TryFrom<ClusterMember> for Remote {
    type Error = TrustError;

    fn try_from(member: ClusterMember) -> TrustResult<Self> {
        let certificate = member
            .certificate
            .ok_or_else(|| TrustError::MissingCertificate {
                name: member.name.clone(),
            })?;
        Ok(Self {
            name: member.name,
            address: member.address,
            certificate,
        })
    }
}

/// Check that `name` is usable as a record file name.
pub fn validate_name(name: &str) -> TrustResult<()> {
    if name.is_empty() {
        return Err(TrustError::InvalidName {
            name: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }

    for disallowed in DISALLOWED_NAME_SUBSTRINGS {
        if name.contains(disallowed) {
            return Err(TrustError::InvalidName {
                name: name.to_string(),
                reason: format!("contains illegal subcontent {disallowed:?}"),
            });
        }
    }

    Ok(())
}

/// On-disk shape. Every field is lenient so a missing certificate is
/// reported as such rather than as a generic parse error.
#[derive(Deserialize)]
struct RemoteFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    address: AddrPort,
    #[serde(default)]
    certificate: Option<String>,
}

pub(crate) fn encode(remote: &Remote) -> TrustResult<String> {
    serde_yaml::to_string(remote).map_err(|source| TrustError::Encode {
        name: remote.name.clone(),
        source,
    })
}

pub(crate) fn decode(path: &Path, content: &str) -> TrustResult<Remote> {
    let file: RemoteFile = serde_yaml::from_str(content).map_err(|source| TrustError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let pem = match file.certificate.as_deref().map(str::trim) {
        None | Some("") => return Err(TrustError::MissingCertificate { name: file.name }),
        Some(pem) => pem,
    };
    let certificate =
        X509Certificate::from_pem(pem).map_err(|source| TrustError::InvalidCertificate {
            name: file.name.clone(),
            source,
        })?;

    Ok(Remote {
        name: file.name,
        address: file.address,
        certificate,
    })
}
