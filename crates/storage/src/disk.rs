//! Disk-backed content-addressed blob store
//!
//! Each object is one file named `blob-<hex digest>.bin` in the store
//! directory. Files are written to a temporary name, synced, then renamed
//! into place, and an existing object file is never reopened for writing.
//! Reads re-hash the file and refuse bytes that no longer match their name.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use loupe_core::{BlobRef, BlobStore, Error, Result, DEFAULT_MAX_BLOB_SIZE};

use crate::content::{content_address, verify};

/// Generate the object path for a blob
pub fn blob_path(dir: &Path, blob: &BlobRef) -> PathBuf {
    dir.join(format!("blob-{}.bin", blob.to_hex()))
}

/// Parse a blob reference from an object file name
///
/// Returns None if the file name doesn't match the expected format.
pub fn parse_blob_file_name(file_name: &str) -> Option<BlobRef> {
    let hex = file_name.strip_prefix("blob-")?.strip_suffix(".bin")?;
    BlobRef::from_hex(hex)
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Temporary path for one in-flight write of `blob`
///
/// Unique per process and per write, so concurrent writers of the same
/// bytes never share a file.
fn tmp_path(dir: &Path, blob: &BlobRef) -> PathBuf {
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(
        "blob-{}.{}-{}.tmp",
        blob.to_hex(),
        std::process::id(),
        seq
    ))
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Write-once blob store rooted at a directory
#[derive(Debug)]
pub struct DiskBlobStore {
    dir: PathBuf,
    max_blob_size: usize,
}

impl DiskBlobStore {
    /// Open (creating if needed) a store in `dir` with the default size limit
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_max_blob_size(dir, DEFAULT_MAX_BLOB_SIZE)
    }

    /// Open (creating if needed) a store in `dir` with a custom size limit
    pub fn open_with_max_blob_size(dir: impl AsRef<Path>, max_blob_size: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!(target: "loupe::blob", path = %dir.display(), "Opened disk blob store");
        Ok(DiskBlobStore { dir, max_blob_size })
    }

    /// Store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All stored blob references, sorted
    pub fn list(&self) -> Result<Vec<BlobRef>> {
        let mut blobs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            if let Some(blob) = parse_blob_file_name(&file_name) {
                blobs.push(blob);
            }
        }
        blobs.sort();
        Ok(blobs)
    }
}

impl BlobStore for DiskBlobStore {
    fn write(&self, bytes: &[u8]) -> Result<BlobRef> {
        if bytes.len() > self.max_blob_size {
            return Err(Error::BlobTooLarge {
                size: bytes.len(),
                max: self.max_blob_size,
            });
        }

        let blob = content_address(bytes);
        let path = blob_path(&self.dir, &blob);
        if path.exists() {
            debug!(target: "loupe::blob", %blob, "Blob already stored");
            return Ok(blob);
        }

        let tmp = tmp_path(&self.dir, &blob);
        if let Err(e) = write_synced(&tmp, bytes).and_then(|()| fs::rename(&tmp, &path)) {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(target: "loupe::blob", path = %tmp.display(), error = %cleanup, "Failed to remove temporary blob file");
                }
            }
            return Err(e.into());
        }
        debug!(target: "loupe::blob", %blob, size = bytes.len(), "Blob written");
        Ok(blob)
    }

    fn read(&self, blob: &BlobRef) -> Result<Arc<[u8]>> {
        let path = blob_path(&self.dir, blob);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::BlobNotFound(*blob)),
            Err(e) => return Err(e.into()),
        };
        if !verify(blob, &bytes) {
            warn!(target: "loupe::blob", %blob, path = %path.display(), "Blob content does not match its address");
            return Err(Error::Corruption(format!(
                "blob {} does not match its content address",
                blob
            )));
        }
        Ok(Arc::from(bytes))
    }

    fn contains(&self, blob: &BlobRef) -> bool {
        blob_path(&self.dir, blob).exists()
    }

    fn max_blob_size(&self) -> usize {
        self.max_blob_size
    }

    fn object_count(&self) -> usize {
        match self.list() {
            Ok(blobs) => blobs.len(),
            Err(e) => {
                warn!(target: "loupe::blob", path = %self.dir.display(), error = %e, "Failed to list blob store");
                0
            }
        }
    }
}
