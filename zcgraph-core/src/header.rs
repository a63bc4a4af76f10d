//! File header and metadata block.
//!
//! Both live at the front of every zcgraph file and are read in place from
//! the mapping. All fields are little-endian and byte-aligned, so the structs
//! can be overlaid on any offset of the mapped bytes.

use crate::error::{Error, Result};
use zerocopy::byteorder::{LittleEndian, U16, U32, U64};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

/// Magic bytes identifying a zcgraph file
pub const MAGIC: &[u8; 8] = b"ZCGRAPH\0";

/// Current file format version. Readers accept exactly this version.
pub const VERSION: u16 = 1;

/// Size of the header in bytes
pub const HEADER_SIZE: usize = size_of::<FileHeader>();

/// Size of the metadata block that follows the header
pub const METADATA_SIZE: usize = size_of::<MetadataBlock>();

/// Build-time flag bits stored in the header.
pub mod flags {
    /// An offset index (node position -> payload offset) follows the payloads
    pub const BUILD_INDEX: u16 = 1 << 0;
    /// A fixed-width weight column accompanies the edge table
    pub const WEIGHTED_EDGES: u16 = 1 << 1;
    /// Reserved for compression; currently stored and round-tripped only
    pub const COMPRESS: u16 = 1 << 2;
    /// A precomputed statistics block is present
    pub const HAS_STATS: u16 = 1 << 3;
    /// Node ids are not positions; an identifier index is present
    pub const SPARSE_IDS: u16 = 1 << 4;

    /// Every bit this version understands
    pub const KNOWN: u16 = BUILD_INDEX | WEIGHTED_EDGES | COMPRESS | HAS_STATS | SPARSE_IDS;
}

/// Fixed 64-byte header at file offset 0.
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       8     magic
/// 8       2     version
/// 10      2     flags
/// 12      4     node_count
/// 16      4     edge_count
/// 20      4     reserved
/// 24      8     node_table_offset
/// 32      8     edge_table_offset
/// 40      8     index_offset (0 = absent)
/// 48      8     stats_offset (0 = absent)
/// 56      8     checksum (xxh3-64 of everything after the header)
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, FromZeroes, FromBytes, AsBytes, Unaligned)]
pub struct FileHeader {
    magic: [u8; 8],
    version: U16<LittleEndian>,
    flags: U16<LittleEndian>,
    node_count: U32<LittleEndian>,
    edge_count: U32<LittleEndian>,
    reserved: U32<LittleEndian>,
    node_table_offset: U64<LittleEndian>,
    edge_table_offset: U64<LittleEndian>,
    index_offset: U64<LittleEndian>,
    stats_offset: U64<LittleEndian>,
    checksum: U64<LittleEndian>,
}

impl FileHeader {
    /// Creates a header with counts set and every offset still a placeholder
    pub fn new(flags: u16, node_count: u32, edge_count: u32) -> Self {
        let mut header = Self::new_zeroed();
        header.magic = *MAGIC;
        header.version = U16::new(VERSION);
        header.flags = U16::new(flags);
        header.node_count = U32::new(node_count);
        header.edge_count = U32::new(edge_count);
        header
    }

    /// Validates magic, version and flag bits.
    ///
    /// Offsets and the checksum are checked by the reader, which knows the
    /// file length.
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` naming the first field that does not match.
    pub fn validate(&self) -> Result<()> {
        if self.magic != *MAGIC {
            return Err(Error::corrupt("not a zcgraph file (bad magic)"));
        }
        let version = self.version.get();
        if version != VERSION {
            return Err(Error::corrupt(format!(
                "unsupported format version {version} (expected {VERSION})"
            )));
        }
        let unknown = self.flags.get() & !flags::KNOWN;
        if unknown != 0 {
            return Err(Error::corrupt(format!("unknown flag bits {unknown:#06x}")));
        }
        Ok(())
    }

    /// Magic bytes as stored
    pub fn magic(&self) -> &[u8; 8] {
        &self.magic
    }

    /// Format version
    pub fn version(&self) -> u16 {
        self.version.get()
    }

    /// Raw flag bits
    pub fn flags(&self) -> u16 {
        self.flags.get()
    }

    /// Whether `flag` is set
    pub fn has_flag(&self, flag: u16) -> bool {
        self.flags.get() & flag != 0
    }

    /// Number of node records
    pub fn node_count(&self) -> u32 {
        self.node_count.get()
    }

    /// Number of edge records
    pub fn edge_count(&self) -> u32 {
        self.edge_count.get()
    }

    /// Absolute offset of the node table
    pub fn node_table_offset(&self) -> u64 {
        self.node_table_offset.get()
    }

    /// Absolute offset of the edge table
    pub fn edge_table_offset(&self) -> u64 {
        self.edge_table_offset.get()
    }

    /// Absolute offset of the payload offset index, if one was built
    pub fn index_offset(&self) -> Option<u64> {
        non_zero(self.index_offset.get())
    }

    /// Absolute offset of the statistics block, if one was written
    pub fn stats_offset(&self) -> Option<u64> {
        non_zero(self.stats_offset.get())
    }

    /// Stored checksum
    pub fn checksum(&self) -> u64 {
        self.checksum.get()
    }

    pub(crate) fn set_table_offsets(&mut self, node_table: u64, edge_table: u64) {
        self.node_table_offset = U64::new(node_table);
        self.edge_table_offset = U64::new(edge_table);
    }

    pub(crate) fn set_index_offset(&mut self, offset: Option<u64>) {
        self.index_offset = U64::new(offset.unwrap_or(0));
    }

    pub(crate) fn set_stats_offset(&mut self, offset: Option<u64>) {
        self.stats_offset = U64::new(offset.unwrap_or(0));
    }

    pub(crate) fn set_checksum(&mut self, checksum: u64) {
        self.checksum = U64::new(checksum);
    }
}

/// Fixed 64-byte metadata block following the header.
///
/// Records where the variable-size sections landed. The writer reserves it
/// before placing any section and backfills it afterwards.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromZeroes, FromBytes, AsBytes, Unaligned)]
pub struct MetadataBlock {
    payload_offset: U64<LittleEndian>,
    payload_len: U64<LittleEndian>,
    weights_offset: U64<LittleEndian>,
    id_index_offset: U64<LittleEndian>,
    reserved: [U64<LittleEndian>; 4],
}

impl MetadataBlock {
    /// Absolute offset of the payload section
    pub fn payload_offset(&self) -> u64 {
        self.payload_offset.get()
    }

    /// Length in bytes of the payload section
    pub fn payload_len(&self) -> u64 {
        self.payload_len.get()
    }

    /// Absolute offset of the weight column, if edges are weighted
    pub fn weights_offset(&self) -> Option<u64> {
        non_zero(self.weights_offset.get())
    }

    /// Absolute offset of the identifier index, if ids are sparse
    pub fn id_index_offset(&self) -> Option<u64> {
        non_zero(self.id_index_offset.get())
    }

    pub(crate) fn set_payload(&mut self, offset: u64, len: u64) {
        self.payload_offset = U64::new(offset);
        self.payload_len = U64::new(len);
    }

    pub(crate) fn set_weights_offset(&mut self, offset: Option<u64>) {
        self.weights_offset = U64::new(offset.unwrap_or(0));
    }

    pub(crate) fn set_id_index_offset(&mut self, offset: Option<u64>) {
        self.id_index_offset = U64::new(offset.unwrap_or(0));
    }
}

fn non_zero(offset: u64) -> Option<u64> {
    (offset != 0).then_some(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(HEADER_SIZE, 64, "Header must be exactly 64 bytes");
        assert_eq!(METADATA_SIZE, 64, "Metadata block must be exactly 64 bytes");
    }

    #[test]
    fn test_new_header_validates() {
        let header = FileHeader::new(flags::BUILD_INDEX, 10, 20);
        header.validate().unwrap();
        assert_eq!(header.node_count(), 10);
        assert_eq!(header.edge_count(), 20);
        assert!(header.has_flag(flags::BUILD_INDEX));
        assert!(!header.has_flag(flags::WEIGHTED_EDGES));
        assert_eq!(header.index_offset(), None);
    }

    #[test]
    fn test_header_byte_layout() {
        let mut header = FileHeader::new(0, 3, 4);
        header.set_table_offsets(128, 200);
        header.set_checksum(0xDEAD_BEEF);

        let bytes = header.as_bytes();
        assert_eq!(&bytes[..8], MAGIC);
        assert_eq!(&bytes[8..10], &VERSION.to_le_bytes());
        assert_eq!(&bytes[12..16], &3u32.to_le_bytes());
        assert_eq!(&bytes[16..20], &4u32.to_le_bytes());
        assert_eq!(&bytes[24..32], &128u64.to_le_bytes());
        assert_eq!(&bytes[56..64], &0xDEAD_BEEFu64.to_le_bytes());

        let restored = FileHeader::read_from(bytes).unwrap();
        assert_eq!(restored.edge_table_offset(), 200);
        assert_eq!(restored.checksum(), 0xDEAD_BEEF);
    }

    #[test]
    fn test_invalid_magic() {
        let mut header = FileHeader::new(0, 1, 0);
        header.magic = *b"INVALID\0";
        assert!(header.validate().unwrap_err().to_string().contains("magic"));
    }

    #[test]
    fn test_version_must_match_exactly() {
        let mut header = FileHeader::new(0, 1, 0);
        header.version = U16::new(VERSION + 1);
        assert!(header.validate().unwrap_err().is_corrupt());

        header.version = U16::new(0);
        assert!(header.validate().unwrap_err().is_corrupt());
    }

    #[test]
    fn test_unknown_flags_rejected() {
        let header = FileHeader::new(1 << 15, 1, 0);
        assert!(header.validate().unwrap_err().is_corrupt());
    }
}
