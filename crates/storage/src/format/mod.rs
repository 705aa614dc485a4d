//! Byte formats for stored snapshots.
//!
//! Keeping serialization separate from the cache logic that decides when
//! snapshots are built makes format evolution easier to manage.
//!
//! # Module Structure
//!
//! - `snapshot`: snapshot blob header, payload encoding, zero-copy view

pub mod snapshot;

pub use snapshot::{
    decode_handler_list, encode_handler_list, encode_payload, encode_snapshot, payload_size,
    GroupIter, GroupRecord, SnapshotFormatError, SnapshotHeader, SnapshotView,
    GROUP_HEADER_SIZE, PAYLOAD_OFFSET, RECORD_WIDTH, SNAPSHOT_FORMAT_VERSION,
    SNAPSHOT_HEADER_SIZE, SNAPSHOT_MAGIC,
};
