//! Atomic on-disk writes and quarantine-on-corruption reads, shared by
//! the super-chunk and stream-chunk disk caches.
//!
//! Grounded in the teacher's `streaming::disk_io` (`tokio::fs`, a
//! `{base_dir}/...` path layout per cache entry), minus the rkyv/lz4
//! envelope: spec.md §6.1/§6.2 pin exact byte layouts, so these helpers
//! move plain byte buffers rather than an opaque archive format.

use std::path::{Path, PathBuf};

use crate::core::{Error, Result};

/// Writes `bytes` to `path` via a sibling temp file, then renames it into
/// place, so no concurrent reader ever observes a partially written file
/// (spec.md §4.5, §5, §9).
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = tmp_sibling(path);
    tokio::fs::write(&tmp_path, bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// Reads `path` if it exists, returning `None` on a cache miss. Any I/O
/// error other than "not found" is returned to the caller so it can
/// decide whether to recompute (spec.md §4.5: "cache-read failure is not
/// fatal, the stage recomputes").
pub async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Renames a corrupt cache entry aside (so recomputation doesn't collide
/// with the bad file) rather than silently overwriting or deleting it,
/// per spec.md §7's CacheCorruption recovery: "the file is quarantined
/// (renamed with a suffix) before recompute."
pub async fn quarantine(path: &Path) -> Result<()> {
    let quarantined = path.with_extension(format!(
        "{}.corrupt",
        path.extension().and_then(|e| e.to_str()).unwrap_or("bin")
    ));
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        tokio::fs::rename(path, quarantined).await?;
    }
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("entry");
    path.with_file_name(format!(".{file_name}.tmp"))
}
