//! mTLS client configuration.
//!
//! Every peer client presents this node's [`NodeIdentity`] and accepts a
//! server only if its certificate matches the cluster trust anchor. A peer
//! passes when it presents the anchor itself, or a certificate issued by
//! the anchor that is valid for the address being dialed.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::debug;
use trustmesh_core::X509Certificate;

use crate::error::{ClusterError, ClusterResult};

/// The local node's certificate chain and private key.
pub struct NodeIdentity {
    cert_chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl NodeIdentity {
    /// Parse a PEM certificate chain and a PEM private key.
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> ClusterResult<Self> {
        let cert_chain = rustls_pemfile::certs(&mut cert_pem.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ClusterError::Identity(format!("bad certificate PEM: {e}")))?;
        if cert_chain.is_empty() {
            return Err(ClusterError::Identity("no certificate found".to_string()));
        }

        let key = rustls_pemfile::private_key(&mut key_pem.as_bytes())
            .map_err(|e| ClusterError::Identity(format!("bad key PEM: {e}")))?
            .ok_or_else(|| ClusterError::Identity("no private key found".to_string()))?;

        Ok(Self { cert_chain, key })
    }

    pub fn from_files(cert: &Path, key: &Path) -> ClusterResult<Self> {
        let read = |path: &Path| {
            std::fs::read_to_string(path).map_err(|source| ClusterError::ReadFile {
                path: path.to_path_buf(),
                source,
            })
        };
        Self::from_pem(&read(cert)?, &read(key)?)
    }

    pub fn cert_chain(&self) -> &[CertificateDer<'static>] {
        &self.cert_chain
    }

    pub fn key(&self) -> &PrivateKeyDer<'static> {
        &self.key
    }

    /// The leaf certificate.
    pub fn certificate(&self) -> ClusterResult<X509Certificate> {
        let leaf = self
            .cert_chain
            .first()
            .ok_or_else(|| ClusterError::Identity("no certificate found".to_string()))?;
        X509Certificate::from_der(leaf.to_vec())
            .map_err(|e| ClusterError::Identity(e.to_string()))
    }
}

impl fmt::Debug for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fingerprint = self
            .cert_chain
            .first()
            .map(|leaf| trustmesh_core::cert::fingerprint_sha256(leaf.as_ref()));
        f.debug_struct("NodeIdentity")
            .field("fingerprint", &fingerprint)
            .field("chain_len", &self.cert_chain.len())
            .finish_non_exhaustive()
    }
}

/// Build the client configuration shared by every peer client.
pub fn client_config(
    identity: &NodeIdentity,
    trust_anchor: &X509Certificate,
) -> ClusterResult<Arc<ClientConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = PinnedServerVerifier::new(trust_anchor.clone(), Arc::clone(&provider))?;

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_client_auth_cert(identity.cert_chain.clone(), identity.key.clone_key())?;

    debug!(anchor = %trust_anchor.fingerprint(), "built peer client configuration");
    Ok(Arc::new(config))
}

/// Accepts the trust anchor verbatim, or a chain issued by it.
#[derive(Debug)]
struct PinnedServerVerifier {
    anchor: X509Certificate,
    issued: Arc<WebPkiServerVerifier>,
    provider: Arc<CryptoProvider>,
}

impl PinnedServerVerifier {
    fn new(anchor: X509Certificate, provider: Arc<CryptoProvider>) -> ClusterResult<Self> {
        let mut roots = RootCertStore::empty();
        roots
            .add(CertificateDer::from(anchor.der().to_vec()))
            .map_err(|e| ClusterError::TrustAnchor(e.to_string()))?;

        let issued = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), Arc::clone(&provider))
            .build()
            .map_err(|e| ClusterError::TrustAnchor(e.to_string()))?;

        Ok(Self {
            anchor,
            issued,
            provider,
        })
    }
}

impl ServerCertVerifier for PinnedServerVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if end_entity.as_ref() == self.anchor.der() {
            return Ok(ServerCertVerified::assertion());
        }
        self.issued
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
