//! A TLS client bound to one peer.

use std::sync::Arc;

use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;
use trustmesh_core::AddrPort;

use crate::error::{ClusterError, ClusterResult};

/// User agent sent on notification traffic.
pub const NOTIFIER_USER_AGENT: &str = "trustmesh-notifier";

/// User agent sent on ordinary request traffic.
pub const CLIENT_USER_AGENT: &str = "trustmesh-client";

#[derive(Debug, Clone)]
pub struct PeerClient {
    address: AddrPort,
    url: String,
    config: Arc<ClientConfig>,
    is_notification: bool,
}

impl PeerClient {
    /// Fails if `address` is empty.
    pub fn new(
        address: AddrPort,
        config: Arc<ClientConfig>,
        is_notification: bool,
    ) -> ClusterResult<Self> {
        if address.is_empty() {
            return Err(ClusterError::InvalidAddress {
                address: address.to_string(),
            });
        }

        Ok(Self {
            url: format!("https://{address}"),
            address,
            config,
            is_notification,
        })
    }

    pub fn address(&self) -> &AddrPort {
        &self.address
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_notification(&self) -> bool {
        self.is_notification
    }

    pub fn user_agent(&self) -> &'static str {
        if self.is_notification {
            NOTIFIER_USER_AGENT
        } else {
            CLIENT_USER_AGENT
        }
    }

    /// Open a TCP connection to the peer and complete the mTLS handshake.
    pub async fn connect(&self) -> ClusterResult<TlsStream<TcpStream>> {
        let (Some(socket), Some(ip)) = (self.address.to_socket_addr(), self.address.ip()) else {
            return Err(ClusterError::InvalidAddress {
                address: self.address.to_string(),
            });
        };

        let tcp = TcpStream::connect(socket)
            .await
            .map_err(|source| ClusterError::Connect {
                address: self.address.to_string(),
                source,
            })?;

        let connector = TlsConnector::from(Arc::clone(&self.config));
        let stream = connector
            .connect(ServerName::IpAddress(ip.into()), tcp)
            .await
            .map_err(|source| ClusterError::Handshake {
                address: self.address.to_string(),
                source,
            })?;

        debug!(peer = %self.address, agent = self.user_agent(), "peer connection established");
        Ok(stream)
    }
}
