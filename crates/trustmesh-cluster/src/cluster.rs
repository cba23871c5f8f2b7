//! Fan-out over every trusted peer.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::debug;
use trustmesh_core::{AddrPort, X509Certificate};
use trustmesh_store::Remotes;

use crate::client::PeerClient;
use crate::error::{ClusterError, ClusterResult};
use crate::tls::{NodeIdentity, client_config};

/// One client per trusted peer, in remote-name order.
#[derive(Debug, Clone, Default)]
pub struct Cluster {
    clients: Vec<PeerClient>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerClient> {
        self.clients.iter()
    }

    pub fn addresses(&self) -> Vec<AddrPort> {
        self.clients.iter().map(|c| c.address().clone()).collect()
    }

    /// Run `f` against every peer.
    ///
    /// With `concurrent` set, all peers are queried at once and results
    /// arrive in completion order; otherwise peers are queried one after
    /// another in cluster order. The first error is returned and any
    /// queries still in flight are aborted.
    pub async fn query<T, F, Fut>(&self, concurrent: bool, f: F) -> ClusterResult<Vec<T>>
    where
        F: Fn(PeerClient) -> Fut,
        Fut: Future<Output = ClusterResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let mut results = Vec::with_capacity(self.clients.len());

        if !concurrent {
            for client in &self.clients {
                results.push(f(client.clone()).await?);
            }
            return Ok(results);
        }

        let mut tasks = JoinSet::new();
        for client in &self.clients {
            tasks.spawn(f(client.clone()));
        }
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|e| ClusterError::Task(e.to_string()))?;
            results.push(result?);
        }
        Ok(results)
    }
}

impl<'a> IntoIterator for &'a Cluster {
    type Item = &'a PeerClient;
    type IntoIter = std::slice::Iter<'a, PeerClient>;

    fn into_iter(self) -> Self::IntoIter {
        self.clients.iter()
    }
}

/// Builds a [`Cluster`] from the current truststore contents.
pub struct ClusterBuilder<'a> {
    remotes: &'a Remotes,
    identity: &'a NodeIdentity,
    trust_anchor: &'a X509Certificate,
    is_notification: bool,
    skip: Option<AddrPort>,
}

impl<'a> ClusterBuilder<'a> {
    pub fn new(
        remotes: &'a Remotes,
        identity: &'a NodeIdentity,
        trust_anchor: &'a X509Certificate,
    ) -> Self {
        Self {
            remotes,
            identity,
            trust_anchor,
            is_notification: false,
            skip: None,
        }
    }

    /// Mark the clients as carrying notifications.
    pub fn notification(mut self, is_notification: bool) -> Self {
        self.is_notification = is_notification;
        self
    }

    /// Leave out the peer at `address`, typically this node itself.
    pub fn skip_address(mut self, address: AddrPort) -> Self {
        self.skip = Some(address);
        self
    }

    /// Build one client per remote. Fails on the first remote whose
    /// client cannot be constructed.
    pub fn build(self) -> ClusterResult<Cluster> {
        let config = client_config(self.identity, self.trust_anchor)?;

        let mut members: Vec<(String, AddrPort)> = self.remotes.addresses().into_iter().collect();
        members.sort_by(|a, b| a.0.cmp(&b.0));

        let mut clients = Vec::with_capacity(members.len());
        for (name, address) in members {
            if self.skip.as_ref() == Some(&address) {
                debug!(%name, %address, "skipping local member");
                continue;
            }

            let client = PeerClient::new(address, Arc::clone(&config), self.is_notification)
                .map_err(|e| {
                    debug!(%name, error = %e, "unable to build peer client");
                    e
                })?;
            clients.push(client);
        }

        debug!(
            peers = clients.len(),
            notification = self.is_notification,
            "built cluster clients"
        );
        Ok(Cluster { clients })
    }
}

/// Build a client for every trusted peer.
pub fn build_cluster(
    remotes: &Remotes,
    identity: &NodeIdentity,
    trust_anchor: &X509Certificate,
    is_notification: bool,
) -> ClusterResult<Cluster> {
    ClusterBuilder::new(remotes, identity, trust_anchor)
        .notification(is_notification)
        .build()
}
