//! Snapshot blob format
//!
//! A snapshot is the serialized enumeration of one category: every unique
//! handler followed by the selectors routed to it. Snapshots are written
//! once to a blob store and decoded in place on every cached read.
//!
//! # Blob Structure
//!
//! ```text
//! +----------------------+ 0
//! | magic "LOUP"         | 4 bytes
//! | format version       | 1 byte
//! | reserved             | 3 bytes (zero)
//! | payload offset       | u32 LE, always 16
//! | payload length       | u32 LE, multiple of RECORD_WIDTH
//! +----------------------+ 16
//! | group 0              | handler (20) | count (u32 LE) | count x selector (4)
//! | group 1              | ...
//! +----------------------+
//! ```
//!
//! The payload on its own is the minimal packed form: no header, fixed
//! width records only. Every record is a whole number of 4-byte words, so
//! the payload length is always a multiple of [`RECORD_WIDTH`].
//!
//! Decoding never copies the payload. [`SnapshotView::parse`] validates the
//! header and walks the groups once, after which the view hands out
//! borrowed [`PackedSelectors`] for each group.

use byteorder::{ByteOrder, LittleEndian};
use loupe_core::{Error, HandlerRef, PackedSelectors, Selector, HANDLER_WIDTH, SELECTOR_WIDTH};

/// Magic bytes: "LOUP"
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"LOUP";

/// Snapshot format version for forward compatibility
pub const SNAPSHOT_FORMAT_VERSION: u8 = 1;

/// Snapshot header size in bytes
pub const SNAPSHOT_HEADER_SIZE: usize = 16;

/// Offset the header must declare for the payload
pub const PAYLOAD_OFFSET: u32 = SNAPSHOT_HEADER_SIZE as u32;

/// Width of the smallest record in the payload (one selector)
pub const RECORD_WIDTH: usize = SELECTOR_WIDTH;

/// Size of the (handler, count) record opening each group
pub const GROUP_HEADER_SIZE: usize = HANDLER_WIDTH + 4;

/// Snapshot header (16 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Magic bytes: "LOUP"
    pub magic: [u8; 4],
    /// Format version
    pub format_version: u8,
    /// Reserved, zero
    pub reserved: [u8; 3],
    /// Where the payload starts, relative to the start of the blob
    pub payload_offset: u32,
    /// Payload length in bytes
    pub payload_len: u32,
}

impl SnapshotHeader {
    /// Create a header for a payload of `payload_len` bytes
    pub fn new(payload_len: u32) -> Self {
        SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            format_version: SNAPSHOT_FORMAT_VERSION,
            reserved: [0u8; 3],
            payload_offset: PAYLOAD_OFFSET,
            payload_len,
        }
    }

    /// Serialize header to bytes
    pub fn to_bytes(&self) -> [u8; SNAPSHOT_HEADER_SIZE] {
        let mut bytes = [0u8; SNAPSHOT_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.format_version;
        bytes[5..8].copy_from_slice(&self.reserved);
        LittleEndian::write_u32(&mut bytes[8..12], self.payload_offset);
        LittleEndian::write_u32(&mut bytes[12..16], self.payload_len);
        bytes
    }

    /// Parse header from bytes
    pub fn from_bytes(bytes: &[u8; SNAPSHOT_HEADER_SIZE]) -> Self {
        SnapshotHeader {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            format_version: bytes[4],
            reserved: [bytes[5], bytes[6], bytes[7]],
            payload_offset: LittleEndian::read_u32(&bytes[8..12]),
            payload_len: LittleEndian::read_u32(&bytes[12..16]),
        }
    }

    /// Validate the header fields that do not depend on the blob length
    pub fn validate(&self) -> Result<(), SnapshotFormatError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotFormatError::InvalidMagic {
                expected: SNAPSHOT_MAGIC,
                actual: self.magic,
            });
        }
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotFormatError::UnsupportedVersion {
                version: self.format_version,
                supported: SNAPSHOT_FORMAT_VERSION,
            });
        }
        if self.payload_offset != PAYLOAD_OFFSET {
            return Err(SnapshotFormatError::OffsetMismatch {
                expected: PAYLOAD_OFFSET,
                actual: self.payload_offset,
            });
        }
        if self.payload_len as usize % RECORD_WIDTH != 0 {
            return Err(SnapshotFormatError::MisalignedPayload {
                len: self.payload_len as usize,
                width: RECORD_WIDTH,
            });
        }
        Ok(())
    }
}

/// Errors that can occur when validating snapshot bytes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotFormatError {
    /// Blob is smaller than the fixed header
    #[error("Blob of {len} bytes is shorter than the 16-byte header")]
    TooShort {
        /// Blob length
        len: usize,
    },
    /// Invalid magic bytes
    #[error("Invalid magic bytes: expected {expected:?}, got {actual:?}")]
    InvalidMagic {
        /// Expected magic bytes
        expected: [u8; 4],
        /// Actual magic bytes found
        actual: [u8; 4],
    },
    /// Unsupported format version
    #[error("Unsupported snapshot version {version}, supported is {supported}")]
    UnsupportedVersion {
        /// Version found in the blob
        version: u8,
        /// Version this build reads
        supported: u8,
    },
    /// Header declares a payload offset other than the fixed one
    #[error("Payload offset {actual} does not match expected offset {expected}")]
    OffsetMismatch {
        /// Fixed offset
        expected: u32,
        /// Declared offset
        actual: u32,
    },
    /// Payload length is not a whole number of records
    #[error("Payload length {len} is not a multiple of record width {width}")]
    MisalignedPayload {
        /// Payload length
        len: usize,
        /// Record width
        width: usize,
    },
    /// Declared payload length disagrees with the bytes present
    #[error("Header declares {declared} payload bytes but {available} are present")]
    LengthMismatch {
        /// Length from the header
        declared: usize,
        /// Bytes after the header
        available: usize,
    },
    /// A group runs past the end of the payload
    #[error("Group {group} needs {needed} bytes but only {available} remain")]
    GroupOverrun {
        /// Index of the offending group
        group: usize,
        /// Bytes the group requires
        needed: usize,
        /// Bytes left in the payload
        available: usize,
    },
    /// A group declares zero selectors
    #[error("Group {group} has no selectors")]
    EmptyGroup {
        /// Index of the offending group
        group: usize,
    },
    /// Packed handler list length is not a multiple of the handler width
    #[error("Handler list length {len} is not a multiple of 20")]
    MisalignedHandlerList {
        /// Buffer length
        len: usize,
    },
}

impl From<SnapshotFormatError> for Error {
    fn from(e: SnapshotFormatError) -> Self {
        Error::MalformedSnapshot(e.to_string())
    }
}

/// Size of the payload needed for the given groups
pub fn payload_size<'a, I>(groups: I) -> usize
where
    I: IntoIterator<Item = (HandlerRef, &'a [Selector])>,
{
    groups
        .into_iter()
        .map(|(_, sels)| GROUP_HEADER_SIZE + sels.len() * SELECTOR_WIDTH)
        .sum()
}

/// Encode the payload (minimal packed form) for the given groups
pub fn encode_payload<'a, I>(groups: I) -> Vec<u8>
where
    I: IntoIterator<Item = (HandlerRef, &'a [Selector])>,
{
    let mut out = Vec::new();
    write_groups(&mut out, groups);
    out
}

/// Encode a complete snapshot blob (header + payload)
///
/// Output is a pure function of the groups and their order, so encoding
/// the same enumeration twice yields byte-identical blobs.
pub fn encode_snapshot<'a, I>(groups: I) -> Vec<u8>
where
    I: IntoIterator<Item = (HandlerRef, &'a [Selector])> + Clone,
{
    let payload_len = payload_size(groups.clone());
    let mut out = Vec::with_capacity(SNAPSHOT_HEADER_SIZE + payload_len);
    out.extend_from_slice(&SnapshotHeader::new(payload_len as u32).to_bytes());
    write_groups(&mut out, groups);
    out
}

fn write_groups<'a, I>(out: &mut Vec<u8>, groups: I)
where
    I: IntoIterator<Item = (HandlerRef, &'a [Selector])>,
{
    let mut count = [0u8; 4];
    for (handler, selectors) in groups {
        out.extend_from_slice(handler.as_bytes());
        LittleEndian::write_u32(&mut count, selectors.len() as u32);
        out.extend_from_slice(&count);
        for s in selectors {
            out.extend_from_slice(s.as_bytes());
        }
    }
}

/// Encode handlers back to back, 20 bytes each, no header
pub fn encode_handler_list<I>(handlers: I) -> Vec<u8>
where
    I: IntoIterator<Item = HandlerRef>,
{
    let mut out = Vec::new();
    for h in handlers {
        out.extend_from_slice(h.as_bytes());
    }
    out
}

/// Decode a packed handler list
pub fn decode_handler_list(bytes: &[u8]) -> Result<Vec<HandlerRef>, SnapshotFormatError> {
    if bytes.len() % HANDLER_WIDTH != 0 {
        return Err(SnapshotFormatError::MisalignedHandlerList { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(HANDLER_WIDTH)
        .filter_map(HandlerRef::from_slice)
        .collect())
}

/// One decoded group: a handler and the selectors routed to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRecord<'a> {
    /// Handler reference
    pub handler: HandlerRef,
    /// Selectors routed to the handler, borrowed from the blob
    pub selectors: PackedSelectors<'a>,
}

/// Validated, borrowed view of a snapshot payload
#[derive(Debug, Clone, Copy)]
pub struct SnapshotView<'a> {
    payload: &'a [u8],
    group_count: usize,
    selector_count: usize,
}

impl<'a> SnapshotView<'a> {
    /// Validate a full snapshot blob and expose its payload in place
    pub fn parse(blob: &'a [u8]) -> Result<Self, SnapshotFormatError> {
        let header_bytes: &[u8; SNAPSHOT_HEADER_SIZE] = blob
            .get(..SNAPSHOT_HEADER_SIZE)
            .and_then(|h| h.try_into().ok())
            .ok_or(SnapshotFormatError::TooShort { len: blob.len() })?;
        let header = SnapshotHeader::from_bytes(header_bytes);
        header.validate()?;

        let body = &blob[SNAPSHOT_HEADER_SIZE..];
        let declared = header.payload_len as usize;
        if declared != body.len() {
            return Err(SnapshotFormatError::LengthMismatch {
                declared,
                available: body.len(),
            });
        }
        Self::parse_payload(body)
    }

    /// Validate a headerless payload (the minimal packed form)
    pub fn parse_payload(payload: &'a [u8]) -> Result<Self, SnapshotFormatError> {
        if payload.len() % RECORD_WIDTH != 0 {
            return Err(SnapshotFormatError::MisalignedPayload {
                len: payload.len(),
                width: RECORD_WIDTH,
            });
        }

        let mut cursor = 0usize;
        let mut group_count = 0usize;
        let mut selector_count = 0usize;
        while cursor < payload.len() {
            let available = payload.len() - cursor;
            if available < GROUP_HEADER_SIZE {
                return Err(SnapshotFormatError::GroupOverrun {
                    group: group_count,
                    needed: GROUP_HEADER_SIZE,
                    available,
                });
            }
            let count =
                LittleEndian::read_u32(&payload[cursor + HANDLER_WIDTH..cursor + GROUP_HEADER_SIZE])
                    as usize;
            if count == 0 {
                return Err(SnapshotFormatError::EmptyGroup { group: group_count });
            }
            let needed = count
                .checked_mul(SELECTOR_WIDTH)
                .and_then(|n| n.checked_add(GROUP_HEADER_SIZE))
                .unwrap_or(usize::MAX);
            if needed > available {
                return Err(SnapshotFormatError::GroupOverrun {
                    group: group_count,
                    needed,
                    available,
                });
            }
            cursor += needed;
            group_count += 1;
            selector_count += count;
        }

        Ok(SnapshotView {
            payload,
            group_count,
            selector_count,
        })
    }

    /// Payload bytes (the minimal packed form)
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Number of groups (unique handlers)
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Total selectors across all groups
    pub fn selector_count(&self) -> usize {
        self.selector_count
    }

    /// Iterate groups in stored order
    pub fn groups(&self) -> GroupIter<'a> {
        GroupIter {
            payload: self.payload,
            cursor: 0,
        }
    }

    /// Handlers in stored order
    pub fn handlers(&self) -> impl Iterator<Item = HandlerRef> + 'a {
        self.groups().map(|g| g.handler)
    }

    /// Selectors stored for `handler`, if it has a group
    pub fn selectors_of(&self, handler: HandlerRef) -> Option<PackedSelectors<'a>> {
        self.groups()
            .find(|g| g.handler == handler)
            .map(|g| g.selectors)
    }
}

/// Iterator over the groups of a validated payload
#[derive(Debug, Clone)]
pub struct GroupIter<'a> {
    payload: &'a [u8],
    cursor: usize,
}

impl<'a> Iterator for GroupIter<'a> {
    type Item = GroupRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.payload.get(self.cursor..)?;
        let handler = HandlerRef::from_slice(rest)?;
        let count = LittleEndian::read_u32(rest.get(HANDLER_WIDTH..GROUP_HEADER_SIZE)?) as usize;
        let end = GROUP_HEADER_SIZE + count * SELECTOR_WIDTH;
        let selectors = PackedSelectors::new(rest.get(GROUP_HEADER_SIZE..end)?)?;
        self.cursor += end;
        Some(GroupRecord { handler, selectors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(n: u64) -> HandlerRef {
        HandlerRef::from_low_u64(n)
    }

    fn sels(range: std::ops::Range<u32>) -> Vec<Selector> {
        range.map(Selector::from_u32).collect()
    }

    fn sample_blob() -> Vec<u8> {
        let a = sels(1..3);
        let b = sels(10..13);
        encode_snapshot(vec![(h(1), a.as_slice()), (h(2), b.as_slice())])
    }

    #[test]
    fn test_header_roundtrip() {
        let header = SnapshotHeader::new(48);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"LOUP");
        assert_eq!(SnapshotHeader::from_bytes(&bytes), header);
        assert!(header.validate().is_ok());
    }

    #[test]
    fn test_header_validation() {
        let header = SnapshotHeader::new(8);

        let mut bad_magic = header.clone();
        bad_magic.magic = *b"NOPE";
        assert!(matches!(
            bad_magic.validate(),
            Err(SnapshotFormatError::InvalidMagic { .. })
        ));

        let mut future = header.clone();
        future.format_version = 9;
        assert!(matches!(
            future.validate(),
            Err(SnapshotFormatError::UnsupportedVersion { .. })
        ));

        let mut moved = header.clone();
        moved.payload_offset = 32;
        assert!(matches!(
            moved.validate(),
            Err(SnapshotFormatError::OffsetMismatch {
                expected: 16,
                actual: 32
            })
        ));

        let mut odd = header;
        odd.payload_len = 10;
        assert!(matches!(
            odd.validate(),
            Err(SnapshotFormatError::MisalignedPayload { len: 10, width: 4 })
        ));
    }

    #[test]
    fn test_encode_layout() {
        let blob = sample_blob();
        // 2 groups: 24 + 2*4 and 24 + 3*4
        assert_eq!(blob.len(), SNAPSHOT_HEADER_SIZE + 32 + 36);
        assert_eq!(LittleEndian::read_u32(&blob[12..16]), 68);
        assert_eq!(&blob[16..36], h(1).as_bytes());
        assert_eq!(LittleEndian::read_u32(&blob[36..40]), 2);
    }

    #[test]
    fn test_parse_exposes_groups_in_place() {
        let blob = sample_blob();
        let view = SnapshotView::parse(&blob).unwrap();
        assert_eq!(view.group_count(), 2);
        assert_eq!(view.selector_count(), 5);

        let groups: Vec<_> = view.groups().collect();
        assert_eq!(groups[0].handler, h(1));
        assert_eq!(groups[0].selectors.to_vec(), sels(1..3));
        assert_eq!(groups[1].handler, h(2));
        assert_eq!(groups[1].selectors.to_vec(), sels(10..13));

        // borrowed straight out of the blob
        let start = groups[1].selectors.as_bytes().as_ptr() as usize;
        assert_eq!(start - blob.as_ptr() as usize, SNAPSHOT_HEADER_SIZE + 32 + 24);
    }

    #[test]
    fn test_parse_rejects_short_blob() {
        let blob = sample_blob();
        for len in [0, 1, 8, 15] {
            assert!(matches!(
                SnapshotView::parse(&blob[..len]),
                Err(SnapshotFormatError::TooShort { .. })
            ));
        }
    }

    #[test]
    fn test_parse_rejects_misaligned_length() {
        let mut blob = sample_blob();
        blob.push(0);
        LittleEndian::write_u32(&mut blob[12..16], 69);
        assert!(matches!(
            SnapshotView::parse(&blob),
            Err(SnapshotFormatError::MisalignedPayload { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_offset() {
        let mut blob = sample_blob();
        LittleEndian::write_u32(&mut blob[8..12], 20);
        assert!(matches!(
            SnapshotView::parse(&blob),
            Err(SnapshotFormatError::OffsetMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_length_mismatch() {
        let mut blob = sample_blob();
        blob.truncate(blob.len() - 4);
        assert!(matches!(
            SnapshotView::parse(&blob),
            Err(SnapshotFormatError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_group_overrun() {
        let mut blob = sample_blob();
        // claim 1000 selectors in the first group
        LittleEndian::write_u32(&mut blob[36..40], 1000);
        assert!(matches!(
            SnapshotView::parse(&blob),
            Err(SnapshotFormatError::GroupOverrun { group: 0, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_empty_group() {
        let mut blob = sample_blob();
        LittleEndian::write_u32(&mut blob[36..40], 0);
        assert!(matches!(
            SnapshotView::parse(&blob),
            Err(SnapshotFormatError::EmptyGroup { group: 0 })
        ));
    }

    #[test]
    fn test_payload_matches_headerless_encoding() {
        let a = sels(1..3);
        let b = sels(10..13);
        let groups = vec![(h(1), a.as_slice()), (h(2), b.as_slice())];
        let blob = encode_snapshot(groups.clone());
        let payload = encode_payload(groups);

        let view = SnapshotView::parse(&blob).unwrap();
        assert_eq!(view.payload(), payload.as_slice());

        let minimal = SnapshotView::parse_payload(&payload).unwrap();
        assert_eq!(minimal.group_count(), 2);
        assert_eq!(minimal.selectors_of(h(2)).unwrap().len(), 3);
        assert!(minimal.selectors_of(h(9)).is_none());
    }

    #[test]
    fn test_empty_snapshot_is_valid() {
        let blob = encode_snapshot(Vec::<(HandlerRef, &[Selector])>::new());
        assert_eq!(blob.len(), SNAPSHOT_HEADER_SIZE);
        let view = SnapshotView::parse(&blob).unwrap();
        assert_eq!(view.group_count(), 0);
        assert_eq!(view.groups().count(), 0);
    }

    #[test]
    fn test_handler_list() {
        let list = encode_handler_list(vec![h(1), h(2), h(3)]);
        assert_eq!(list.len(), 60);
        assert_eq!(decode_handler_list(&list).unwrap(), vec![h(1), h(2), h(3)]);
        assert!(matches!(
            decode_handler_list(&list[..59]),
            Err(SnapshotFormatError::MisalignedHandlerList { len: 59 })
        ));
    }

    #[test]
    fn test_format_error_converts_to_malformed() {
        let err: Error = SnapshotFormatError::TooShort { len: 3 }.into();
        assert!(err.is_malformed());
    }
}
