//! Parse errors for the core value types.

use thiserror::Error;

/// Returned when text is not a valid `ip:port` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address {input:?}: {reason}")]
pub struct AddrParseError {
    input: String,
    reason: &'static str,
}

impl AddrParseError {
    pub(crate) fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }

    /// The text that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn reason(&self) -> &str {
        self.reason
    }
}

/// Errors building an [`X509Certificate`](crate::X509Certificate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertificateError {
    #[error("certificate is empty")]
    Empty,

    #[error("no CERTIFICATE block found in PEM input")]
    NoPemBlock,

    #[error("malformed PEM: {0}")]
    Pem(String),

    #[error("not a valid X.509 certificate: {0}")]
    Invalid(String),
}
