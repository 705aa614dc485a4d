//! Content addressing
//!
//! A blob's reference is the SHA-256 digest of its bytes, so a reference
//! can only ever resolve to the bytes it was derived from.

use sha2::{Digest, Sha256};

use loupe_core::BlobRef;

/// Compute the content address of `bytes`
pub fn content_address(bytes: &[u8]) -> BlobRef {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    BlobRef(out)
}

/// Whether `bytes` hash to `blob`
pub fn verify(blob: &BlobRef, bytes: &[u8]) -> bool {
    content_address(bytes) == *blob
}
