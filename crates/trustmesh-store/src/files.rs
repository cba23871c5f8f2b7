//! Trust directory layout and crash-safe file writes.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{TrustError, TrustResult};

/// Suffix of every record file in the trust directory.
pub(crate) const RECORD_SUFFIX: &str = ".yaml";

/// Path of the record file for `name`, checked to stay inside `dir`.
pub(crate) fn remote_path(dir: &Path, name: &str) -> TrustResult<PathBuf> {
    let invalid = |reason: &str| TrustError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let dir = std::path::absolute(dir).map_err(|_| invalid("unable to resolve trust directory"))?;
    let path = dir.join(format!("{name}{RECORD_SUFFIX}"));

    if path.parent() != Some(dir.as_path()) {
        return Err(invalid("path escapes the trust directory"));
    }

    Ok(path)
}

/// Record files directly inside `dir`, as `(name, path)` sorted by name.
///
/// Subdirectories and files without the record suffix are skipped.
pub(crate) fn record_files(dir: &Path) -> TrustResult<Vec<(String, PathBuf)>> {
    let read_dir_err = |source| TrustError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        if entry.file_type().map_err(read_dir_err)?.is_dir() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(name) = file_name
            .to_str()
            .and_then(|f| f.strip_suffix(RECORD_SUFFIX))
        else {
            continue;
        };
        files.push((name.to_string(), entry.path()));
    }

    files.sort();
    Ok(files)
}

/// Fail with [`TrustError::FileExists`] if anything is already at `path`.
pub(crate) fn ensure_absent(path: &Path) -> TrustResult<()> {
    match fs::symlink_metadata(path) {
        Ok(_) => Err(TrustError::FileExists {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(TrustError::ReadFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Atomically write a record that must not exist yet.
pub(crate) fn write_new(dir: &Path, path: &Path, contents: &[u8]) -> TrustResult<()> {
    let tmp = stage(dir, path, contents)?;
    tmp.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            TrustError::FileExists {
                path: path.to_path_buf(),
            }
        } else {
            TrustError::Write {
                path: path.to_path_buf(),
                source: e.error,
            }
        }
    })?;
    Ok(())
}

/// Atomically write a record, replacing any existing file.
pub(crate) fn write_replace(dir: &Path, path: &Path, contents: &[u8]) -> TrustResult<()> {
    let tmp = stage(dir, path, contents)?;
    tmp.persist(path).map_err(|e| TrustError::Write {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

pub(crate) fn remove(path: &Path) -> TrustResult<()> {
    fs::remove_file(path).map_err(|source| TrustError::Remove {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `contents` to a synced temporary file in `dir`, ready to be renamed.
///
/// The temporary name is dot-prefixed and never carries the record suffix,
/// so directory scans and watchers ignore it.
fn stage(dir: &Path, path: &Path, contents: &[u8]) -> TrustResult<NamedTempFile> {
    let write_err = |source| TrustError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".remote-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(write_err)?;
    }

    tmp.as_file().sync_all().map_err(write_err)?;
    Ok(tmp)
}
