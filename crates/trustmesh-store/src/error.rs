//! Error types for the truststore.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use trustmesh_core::CertificateError;

/// Result type alias for truststore operations.
pub type TrustResult<T> = Result<T, TrustError>;

/// Errors that can occur while loading or updating the truststore.
#[derive(Debug, Error)]
pub enum TrustError {
    #[error("invalid remote name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("remote {name:?} has no certificate")]
    MissingCertificate { name: String },

    #[error("remote {name:?} has an invalid certificate: {source}")]
    InvalidCertificate {
        name: String,
        source: CertificateError,
    },

    #[error("a remote with name {name:?} already exists")]
    AlreadyExists { name: String },

    #[error("remote file {} already exists", path.display())]
    FileExists { path: PathBuf },

    #[error("remote {name:?} appears more than once")]
    DuplicateName { name: String },

    #[error("received empty remotes")]
    EmptyReplacement,

    #[error("unable to read trust directory {}: {source}", path.display())]
    ReadDir { path: PathBuf, source: io::Error },

    #[error("unable to read {}: {source}", path.display())]
    ReadFile { path: PathBuf, source: io::Error },

    #[error("unable to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to encode remote {name:?}: {source}")]
    Encode {
        name: String,
        source: serde_yaml::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to remove {}: {source}", path.display())]
    Remove { path: PathBuf, source: io::Error },
}

impl TrustError {
    /// Whether the error means the remote is already trusted, either in
    /// memory or by a file on disk.
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. } | Self::FileExists { .. })
    }
}
