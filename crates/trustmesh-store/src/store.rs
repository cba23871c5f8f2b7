//! Remotes: the in-memory truststore and its directory mirror.
//!
//! Every mutation (`load`, `add`, `replace`) holds the write lock across both
//! the disk I/O and the map update, so readers of this store see either the
//! whole old set or the whole new one. Queries never touch disk.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};
use trustmesh_core::{AddrPort, X509Certificate};

use crate::error::{TrustError, TrustResult};
use crate::files;
use crate::remote::{self, ClusterMember, Remote, validate_name};

/// Thread-safe set of trusted remotes, keyed by name.
///
/// Share it between threads with `Arc<Remotes>`.
#[derive(Debug, Default)]
pub struct Remotes {
    data: RwLock<HashMap<String, Remote>>,
}

impl Remotes {
    /// Create an empty truststore. Call [`load`](Self::load) to populate it.
    pub fn new() -> Self {
        Self::default()
    }

    // The map is only ever replaced whole or extended by complete records,
    // so a writer that panicked cannot have left it half-updated.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Remote>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Remote>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Mutations ──────────────────────────────────────────────────

    /// Read every `*.yaml` record in `dir` into memory.
    ///
    /// Any unreadable or invalid record fails the whole load and leaves the
    /// current set untouched. If the directory yields no records while the
    /// store already holds some, the result is treated as a transient read
    /// of a directory being rewritten: the current set is kept and a warning
    /// is logged.
    pub fn load(&self, dir: &Path) -> TrustResult<()> {
        let mut data = self.write();

        let mut fresh = HashMap::new();
        for (file_name, path) in files::record_files(dir)? {
            let content = std::fs::read_to_string(&path).map_err(|source| TrustError::ReadFile {
                path: path.clone(),
                source,
            })?;
            let remote = remote::decode(&path, &content)?;
            validate_name(&remote.name)?;

            if remote.name != file_name {
                warn!(file = %path.display(), name = %remote.name, "remote name does not match its file name");
            }
            if let Some(previous) = fresh.insert(remote.name.clone(), remote) {
                warn!(name = %previous.name, "remote defined by more than one file, keeping the last");
            }
        }

        if fresh.is_empty() && !data.is_empty() {
            warn!(
                dir = %dir.display(),
                current = data.len(),
                "failed to parse new remotes from truststore, keeping current set"
            );
            return Ok(());
        }

        debug!(dir = %dir.display(), remotes = fresh.len(), "truststore loaded");
        *data = fresh;
        Ok(())
    }

    /// Trust new remotes, writing one record file each.
    ///
    /// Never overwrites: a name already in memory fails with
    /// [`TrustError::AlreadyExists`], an existing file with
    /// [`TrustError::FileExists`]. Remotes are written in order and the first
    /// failure stops the call; remotes written before it stay written and
    /// trusted.
    pub fn add(&self, dir: &Path, remotes: impl IntoIterator<Item = Remote>) -> TrustResult<()> {
        let mut data = self.write();

        for remote in remotes {
            validate_name(&remote.name)?;

            if data.contains_key(&remote.name) {
                return Err(TrustError::AlreadyExists { name: remote.name });
            }

            let path = files::remote_path(dir, &remote.name)?;
            files::ensure_absent(&path)?;

            let contents = remote::encode(&remote)?;
            files::write_new(dir, &path, contents.as_bytes())?;

            info!(name = %remote.name, address = %remote.address, "added remote to truststore");
            data.insert(remote.name.clone(), remote);
        }

        Ok(())
    }

    /// Replace the whole set with `members`, the authoritative list.
    ///
    /// Every member is validated before anything is written. Record files
    /// for names not in `members` are deleted. An empty `members` fails with
    /// [`TrustError::EmptyReplacement`] and changes nothing.
    pub fn replace(
        &self,
        dir: &Path,
        members: impl IntoIterator<Item = ClusterMember>,
    ) -> TrustResult<()> {
        let mut data = self.write();

        let mut seen = HashSet::new();
        let mut staged = Vec::new();
        for member in members {
            let remote = Remote::try_from(member)?;
            validate_name(&remote.name)?;
            if !seen.insert(remote.name.clone()) {
                return Err(TrustError::DuplicateName { name: remote.name });
            }

            let path = files::remote_path(dir, &remote.name)?;
            let contents = remote::encode(&remote)?;
            staged.push((path, contents, remote));
        }

        if staged.is_empty() {
            return Err(TrustError::EmptyReplacement);
        }

        let mut fresh = HashMap::with_capacity(staged.len());
        for (path, contents, remote) in staged {
            files::write_replace(dir, &path, contents.as_bytes())?;
            fresh.insert(remote.name.clone(), remote);
        }

        let mut removed = 0;
        for (name, path) in files::record_files(dir)? {
            if !fresh.contains_key(&name) {
                files::remove(&path)?;
                debug!(%name, "removed outdated remote");
                removed += 1;
            }
        }

        info!(remotes = fresh.len(), removed, "replaced truststore");
        *data = fresh;
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────────

    /// A uniformly chosen remote, or `None` if the store is empty.
    ///
    /// Candidates are ordered by name first, so a seeded `rng` gives a
    /// repeatable choice.
    pub fn select_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Remote> {
        let data = self.read();
        let mut names: Vec<&String> = data.keys().collect();
        names.sort();
        names.choose(rng).and_then(|name| data.get(*name)).cloned()
    }

    /// Address of every remote, keyed by name.
    pub fn addresses(&self) -> HashMap<String, AddrPort> {
        self.read()
            .values()
            .map(|remote| (remote.name.clone(), remote.address.clone()))
            .collect()
    }

    /// The remote listening on `address`. The empty address matches nothing.
    pub fn remote_by_address(&self, address: &AddrPort) -> Option<Remote> {
        if address.is_empty() {
            return None;
        }
        self.read()
            .values()
            .find(|remote| remote.address == *address)
            .cloned()
    }

    /// The remote whose certificate has the given SHA-256 fingerprint
    /// (hex, either case).
    pub fn remote_by_certificate_fingerprint(&self, fingerprint: &str) -> Option<Remote> {
        self.read()
            .values()
            .find(|remote| remote.fingerprint().eq_ignore_ascii_case(fingerprint))
            .cloned()
    }

    /// Every remote's certificate, keyed by fingerprint.
    pub fn certificates(&self) -> HashMap<String, X509Certificate> {
        self.read()
            .values()
            .map(|remote| (remote.fingerprint(), remote.certificate.clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// A copy of every remote, keyed by name.
    pub fn remotes_by_name(&self) -> HashMap<String, Remote> {
        self.read().clone()
    }
}
