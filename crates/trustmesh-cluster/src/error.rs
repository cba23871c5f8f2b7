//! Error types for building and using cluster clients.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for cluster operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("invalid node identity: {0}")]
    Identity(String),

    #[error("unable to read {}: {source}", path.display())]
    ReadFile { path: PathBuf, source: io::Error },

    #[error("invalid trust anchor: {0}")]
    TrustAnchor(String),

    #[error("tls configuration error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("no usable address for peer {address:?}")]
    InvalidAddress { address: String },

    #[error("failed to connect to {address}: {source}")]
    Connect { address: String, source: io::Error },

    #[error("tls handshake with {address} failed: {source}")]
    Handshake { address: String, source: io::Error },

    #[error("cluster task failed: {0}")]
    Task(String),
}
