//! Throwaway PKI and a minimal mTLS peer for handshake tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, KeyPair, SanType,
};
use rustls::pki_types::CertificateDer;
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use trustmesh_cluster::NodeIdentity;
use trustmesh_core::X509Certificate;

/// Greeting every test peer writes after the handshake.
pub const GREETING: &[u8] = b"trusted";

/// A PEM certificate and its private key.
#[derive(Debug, Clone)]
pub struct CertKeyPair {
    pub cert_pem: String,
    pub key_pem: String,
}

impl CertKeyPair {
    pub fn certificate(&self) -> X509Certificate {
        X509Certificate::from_pem(&self.cert_pem).unwrap()
    }

    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity::from_pem(&self.cert_pem, &self.key_pem).unwrap()
    }
}

pub struct TestCa {
    pub pair: CertKeyPair,
    key: KeyPair,
    cert: rcgen::Certificate,
}

impl TestCa {
    pub fn new() -> Self {
        let mut params = CertificateParams::default();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let mut dn = DistinguishedName::new();
        dn.push(DnType::OrganizationName, "trustmesh");
        dn.push(DnType::CommonName, "trustmesh test CA");
        params.distinguished_name = dn;

        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        Self {
            pair: CertKeyPair {
                cert_pem: cert.pem(),
                key_pem: key.serialize_pem(),
            },
            key,
            cert,
        }
    }

    /// A leaf usable for both server and client auth, with a SAN per address.
    pub fn issue(&self, node: &str, addresses: &[&str]) -> CertKeyPair {
        let mut params = leaf_params(node, addresses);
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];
        let key = KeyPair::generate().unwrap();
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
        CertKeyPair {
            cert_pem: cert.pem(),
            key_pem: key.serialize_pem(),
        }
    }
}

/// A self-signed leaf, as used for a shared cluster certificate.
pub fn self_signed(node: &str, addresses: &[&str]) -> CertKeyPair {
    let key = KeyPair::generate().unwrap();
    let cert = leaf_params(node, addresses).self_signed(&key).unwrap();
    CertKeyPair {
        cert_pem: cert.pem(),
        key_pem: key.serialize_pem(),
    }
}

fn leaf_params(node: &str, addresses: &[&str]) -> CertificateParams {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::OrganizationName, "trustmesh");
    dn.push(DnType::CommonName, node);
    params.distinguished_name = dn;

    for addr in addresses {
        match addr.parse::<std::net::IpAddr>() {
            Ok(ip) => params.subject_alt_names.push(SanType::IpAddress(ip)),
            Err(_) => params
                .subject_alt_names
                .push(SanType::DnsName(addr.to_string().try_into().unwrap())),
        }
    }
    params
}

/// Serve `server` on a loopback port, requiring client certificates
/// issued by `client_ca`. Each accepted connection receives [`GREETING`].
pub async fn spawn_peer(server: &CertKeyPair, client_ca: &CertKeyPair) -> SocketAddr {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let mut roots = RootCertStore::empty();
    roots
        .add(CertificateDer::from(client_ca.certificate().der().to_vec()))
        .unwrap();
    let client_verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider.clone())
        .build()
        .unwrap();

    let identity = server.identity();
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_client_cert_verifier(client_verifier)
        .with_single_cert(identity.cert_chain().to_vec(), identity.key().clone_key())
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(mut tls) = acceptor.accept(tcp).await {
                    let _ = tls.write_all(GREETING).await;
                    let _ = tls.shutdown().await;
                }
            });
        }
    });

    addr
}
