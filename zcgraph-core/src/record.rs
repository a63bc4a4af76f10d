//! Fixed-width node, edge and index records.
//!
//! # Design Principles
//!
//! Every record type has a **fixed size**, which allows direct addressing:
//! `record_offset = table_offset + (position * RECORD_SIZE)`. Tables are
//! overlaid on the mapped bytes as `&[Record]` with no decoding step.
//!
//! Variable-length payloads do not live in the records; a record only holds
//! the absolute offset of its payload entry (or [`NO_PAYLOAD`]).

use zerocopy::byteorder::{LittleEndian, U16, U32, U64};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

/// Position of a node in the node table
pub type NodeIndex = u32;

/// Position of an edge in the edge table
pub type EdgeIndex = u32;

/// Sentinel meaning "no such edge" (end of an adjacency chain)
pub const NO_EDGE: EdgeIndex = EdgeIndex::MAX;

/// Sentinel meaning "no such node"
pub const NO_NODE: NodeIndex = NodeIndex::MAX;

/// Sentinel meaning "this element carries no payload"
pub const NO_PAYLOAD: u64 = u64::MAX;

/// Largest number of nodes or edges a file can hold (the sentinels are reserved)
pub const MAX_ELEMENTS: u32 = u32::MAX - 1;

/// On-disk node record.
///
/// # Layout (24 bytes)
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       8     id
/// 8       2     node_type
/// 10      2     flags
/// 12      4     first_edge (NO_EDGE if the node has no out-edges)
/// 16      8     payload (absolute offset or NO_PAYLOAD)
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromZeroes, FromBytes, AsBytes, Unaligned)]
pub struct NodeRecord {
    id: U64<LittleEndian>,
    node_type: U16<LittleEndian>,
    flags: U16<LittleEndian>,
    first_edge: U32<LittleEndian>,
    payload: U64<LittleEndian>,
}

impl NodeRecord {
    /// Size of the record in bytes
    pub const SIZE: usize = size_of::<Self>();

    /// Create a node record with no edges and no payload
    #[must_use]
    pub fn new(id: u64, node_type: u16, flags: u16) -> Self {
        Self {
            id: U64::new(id),
            node_type: U16::new(node_type),
            flags: U16::new(flags),
            first_edge: U32::new(NO_EDGE),
            payload: U64::new(NO_PAYLOAD),
        }
    }

    /// Application-level identifier
    pub fn id(&self) -> u64 {
        self.id.get()
    }

    /// Type tag
    pub fn node_type(&self) -> u16 {
        self.node_type.get()
    }

    /// Application flag bits
    pub fn flags(&self) -> u16 {
        self.flags.get()
    }

    /// Head of this node's out-edge chain, if any
    pub fn first_edge(&self) -> Option<EdgeIndex> {
        let first = self.first_edge.get();
        (first != NO_EDGE).then_some(first)
    }

    /// Raw first-edge field, including the sentinel
    pub(crate) fn first_edge_raw(&self) -> EdgeIndex {
        self.first_edge.get()
    }

    /// Absolute offset of the payload entry, if any
    pub fn payload_offset(&self) -> Option<u64> {
        let offset = self.payload.get();
        (offset != NO_PAYLOAD).then_some(offset)
    }

    pub(crate) fn set_first_edge(&mut self, edge: EdgeIndex) {
        self.first_edge = U32::new(edge);
    }

    pub(crate) fn set_payload_offset(&mut self, offset: u64) {
        self.payload = U64::new(offset);
    }
}

/// On-disk edge record.
///
/// # Layout (24 bytes)
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     source (node position)
/// 4       4     target (node position)
/// 8       4     edge_type
/// 12      4     next (next edge of the same source, or NO_EDGE)
/// 16      8     payload (absolute offset or NO_PAYLOAD)
/// ```
///
/// Chains are threaded in table order, so a valid `next` is always greater
/// than the index of the record holding it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromZeroes, FromBytes, AsBytes, Unaligned)]
pub struct EdgeRecord {
    source: U32<LittleEndian>,
    target: U32<LittleEndian>,
    edge_type: U32<LittleEndian>,
    next: U32<LittleEndian>,
    payload: U64<LittleEndian>,
}

impl EdgeRecord {
    /// Size of the record in bytes
    pub const SIZE: usize = size_of::<Self>();

    /// Create an unlinked edge record with no payload
    #[must_use]
    pub fn new(source: NodeIndex, target: NodeIndex, edge_type: u32) -> Self {
        Self {
            source: U32::new(source),
            target: U32::new(target),
            edge_type: U32::new(edge_type),
            next: U32::new(NO_EDGE),
            payload: U64::new(NO_PAYLOAD),
        }
    }

    /// Position of the source node
    pub fn source(&self) -> NodeIndex {
        self.source.get()
    }

    /// Position of the target node
    pub fn target(&self) -> NodeIndex {
        self.target.get()
    }

    /// Type value
    pub fn edge_type(&self) -> u32 {
        self.edge_type.get()
    }

    /// Next edge leaving the same source, if any
    pub fn next(&self) -> Option<EdgeIndex> {
        let next = self.next.get();
        (next != NO_EDGE).then_some(next)
    }

    pub(crate) fn next_raw(&self) -> EdgeIndex {
        self.next.get()
    }

    /// Absolute offset of the payload entry, if any
    pub fn payload_offset(&self) -> Option<u64> {
        let offset = self.payload.get();
        (offset != NO_PAYLOAD).then_some(offset)
    }

    pub(crate) fn set_next(&mut self, next: EdgeIndex) {
        self.next = U32::new(next);
    }

    pub(crate) fn set_payload_offset(&mut self, offset: u64) {
        self.payload = U64::new(offset);
    }
}

/// Entry of the identifier index, sorted by `id`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromZeroes, FromBytes, AsBytes, Unaligned)]
pub struct IdIndexEntry {
    id: U64<LittleEndian>,
    position: U32<LittleEndian>,
    reserved: U32<LittleEndian>,
}

impl IdIndexEntry {
    /// Size of the entry in bytes
    pub const SIZE: usize = size_of::<Self>();

    pub(crate) fn new(id: u64, position: NodeIndex) -> Self {
        Self {
            id: U64::new(id),
            position: U32::new(position),
            reserved: U32::new(0),
        }
    }

    /// Node identifier
    pub fn id(&self) -> u64 {
        self.id.get()
    }

    /// Position of the node in the node table
    pub fn position(&self) -> NodeIndex {
        self.position.get()
    }
}

/// One 8-byte slot of the payload offset index or the weight column
pub type U64Slot = U64<LittleEndian>;

/// Size of one [`U64Slot`]
pub const SLOT_SIZE: usize = size_of::<U64Slot>();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(NodeRecord::SIZE, 24);
        assert_eq!(EdgeRecord::SIZE, 24);
        assert_eq!(IdIndexEntry::SIZE, 16);
        assert_eq!(SLOT_SIZE, 8);
    }

    #[test]
    fn test_node_record_sentinels() {
        let mut node = NodeRecord::new(7, 3, 0x10);
        assert_eq!(node.id(), 7);
        assert_eq!(node.node_type(), 3);
        assert_eq!(node.flags(), 0x10);
        assert_eq!(node.first_edge(), None);
        assert_eq!(node.payload_offset(), None);

        node.set_first_edge(4);
        node.set_payload_offset(512);
        assert_eq!(node.first_edge(), Some(4));
        assert_eq!(node.payload_offset(), Some(512));
    }

    #[test]
    fn test_edge_record_layout() {
        let mut edge = EdgeRecord::new(1, 2, 9);
        edge.set_next(5);

        let bytes = edge.as_bytes();
        assert_eq!(&bytes[0..4], &1u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &2u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &9u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &5u32.to_le_bytes());
        assert_eq!(&bytes[16..24], &NO_PAYLOAD.to_le_bytes());
    }

    #[test]
    fn test_records_overlay_unaligned_bytes() {
        let records = [NodeRecord::new(1, 0, 0), NodeRecord::new(2, 0, 0)];

        // Shift by one byte: the overlay must not care about alignment
        let mut bytes = vec![0u8; 1];
        bytes.extend_from_slice(records.as_bytes());

        let view = NodeRecord::slice_from(&bytes[1..]).unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(view[1].id(), 2);
    }
}
