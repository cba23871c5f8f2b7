//! trustmesh-core: value types shared by every trustmesh crate.
//!
//! - [`AddrPort`]: a validated `ip:port` endpoint with an optional IPv6 zone
//!   and an explicit empty value meaning "no address".
//! - [`X509Certificate`]: a DER certificate with PEM text encoding and a
//!   SHA-256 fingerprint used as its identity.
//! - [`TrustmeshConfig`]: the `trustmesh.toml` configuration file.

pub mod addr;
pub mod cert;
pub mod config;
pub mod error;

pub use addr::{AddrPort, AddrPorts};
pub use cert::X509Certificate;
pub use config::TrustmeshConfig;
pub use error::{AddrParseError, CertificateError};
