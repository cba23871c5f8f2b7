//! trustmesh-cluster: mTLS clients for every trusted peer.
//!
//! Turns the truststore into a set of ready-to-use peer clients and fans
//! requests out across them.
//!
//! # Architecture
//!
//! ```text
//! Remotes (truststore)
//!   └── ClusterBuilder
//!       ├── client_config() → one rustls ClientConfig
//!       │   ├── presents NodeIdentity (client auth)
//!       │   └── pins peers to the cluster trust anchor
//!       └── PeerClient per remote (local address skipped)
//!
//! Cluster
//!   └── query(concurrent, f)
//!       ├── sequential: peers in name order
//!       └── concurrent: JoinSet, first error aborts the rest
//! ```

pub mod client;
pub mod cluster;
pub mod error;
pub mod tls;

pub use client::{CLIENT_USER_AGENT, NOTIFIER_USER_AGENT, PeerClient};
pub use cluster::{Cluster, ClusterBuilder, build_cluster};
pub use error::{ClusterError, ClusterResult};
pub use tls::{NodeIdentity, client_config};
