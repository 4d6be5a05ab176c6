//! Atomic file writes through a temp file in the target directory.
//!
//! Artifacts are always written in full to a temp file first and only then
//! linked into place, so a failed write never leaves a partial artifact under
//! its final name.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{EvidenceError, Result};

/// Persists `bytes` under the first name in `candidates` not already taken
/// in `dir`. Never replaces an existing file.
pub(crate) fn persist_new(
    dir: &Path,
    bytes: &[u8],
    candidates: impl IntoIterator<Item = String>,
) -> Result<PathBuf> {
    let mut file = staged(dir, bytes)?;

    for name in candidates {
        let target = dir.join(name);
        match file.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(err) if err.error.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(path = %target.display(), "artifact name already taken");
                file = err.file;
            }
            Err(err) => {
                return Err(EvidenceError::Io {
                    path: target,
                    source: err.error,
                });
            }
        }
    }

    Err(EvidenceError::Io {
        path: dir.to_path_buf(),
        source: std::io::Error::new(ErrorKind::AlreadyExists, "no unused artifact file name"),
    })
}

/// Persists `bytes` at `target`, atomically replacing any previous file.
pub(crate) fn persist_replace(target: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file = staged(dir, bytes)?;
    file.persist(target).map_err(|err| EvidenceError::Io {
        path: target.to_path_buf(),
        source: err.error,
    })?;
    Ok(())
}

fn staged(dir: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir).map_err(EvidenceError::io(dir))?;
    file.write_all(bytes).map_err(EvidenceError::io(file.path()))?;
    file.as_file().sync_all().map_err(EvidenceError::io(file.path()))?;
    Ok(file)
}
