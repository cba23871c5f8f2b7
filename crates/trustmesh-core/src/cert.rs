//! X.509 certificates and their fingerprints.
//!
//! Certificates are kept as DER bytes and travel as PEM text in every
//! serialized form. A certificate's identity is the lowercase hex SHA-256
//! of its DER encoding.

use std::fmt;

use pem::{EncodeConfig, LineEnding, Pem};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::CertificateError;

const PEM_TAG: &str = "CERTIFICATE";

/// A DER-encoded X.509 certificate, checked to parse on construction.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct X509Certificate {
    der: Vec<u8>,
}

impl X509Certificate {
    /// Wrap DER bytes that parse as exactly one X.509 certificate.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Result<Self, CertificateError> {
        let der = der.into();
        if der.is_empty() {
            return Err(CertificateError::Empty);
        }

        let (rest, _) = x509_parser::parse_x509_certificate(&der)
            .map_err(|e| CertificateError::Invalid(e.to_string()))?;
        if !rest.is_empty() {
            return Err(CertificateError::Invalid(format!(
                "{} trailing bytes after certificate",
                rest.len()
            )));
        }

        Ok(Self { der })
    }

    /// Decode the first `CERTIFICATE` block of PEM text.
    pub fn from_pem(pem: &str) -> Result<Self, CertificateError> {
        if pem.trim().is_empty() {
            return Err(CertificateError::Empty);
        }

        let mut reader = pem.as_bytes();
        let der = rustls_pemfile::certs(&mut reader)
            .next()
            .ok_or(CertificateError::NoPemBlock)?
            .map_err(|e| CertificateError::Pem(e.to_string()))?;

        Self::from_der(der.as_ref())
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Encode as a single PEM `CERTIFICATE` block with `\n` line endings.
    pub fn to_pem(&self) -> String {
        let config = EncodeConfig::new().set_line_ending(LineEnding::LF);
        pem::encode_config(&Pem::new(PEM_TAG, self.der.clone()), config)
    }

    /// SHA-256 fingerprint of the DER encoding, lowercase hex.
    pub fn fingerprint(&self) -> String {
        fingerprint_sha256(&self.der)
    }
}

/// Compute the lowercase hex SHA-256 fingerprint of DER bytes.
pub fn fingerprint_sha256(der: &[u8]) -> String {
    hex::encode(Sha256::digest(der))
}

impl fmt::Debug for X509Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X509Certificate")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

impl Serialize for X509Certificate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_pem())
    }
}

impl<'de> Deserialize<'de> for X509Certificate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pem = String::deserialize(deserializer)?;
        Self::from_pem(&pem).map_err(serde::de::Error::custom)
    }
}
