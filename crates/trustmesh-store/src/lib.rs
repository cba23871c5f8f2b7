//! trustmesh-store: the set of peers this node trusts.
//!
//! # Architecture
//!
//! [`Remotes`] keeps every trusted peer ([`Remote`]: name, address,
//! certificate) in memory behind a single reader/writer lock and mirrors
//! each one to `<dir>/<name>.yaml`. Writes go to a temporary file in the
//! same directory and are renamed into place, so other processes watching
//! the directory never see a partially written record.
//!
//! ```text
//! load(dir)            disk ──► memory   (empty result ignored if already populated)
//! add(dir, remotes)    memory + disk     (never overwrites)
//! replace(dir, set)    memory + disk     (total; stale files removed)
//! queries              memory only       (shared lock)
//! ```

pub mod error;
mod files;
pub mod remote;
pub mod store;

pub use error::{TrustError, TrustResult};
pub use remote::{ClusterMember, Remote, validate_name};
pub use store::Remotes;
