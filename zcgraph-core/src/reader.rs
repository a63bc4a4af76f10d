//! Zero-copy reader over a memory-mapped zcgraph file.
//!
//! A file is validated once, in full, when it is opened: preamble length,
//! magic, version, flags, checksum, section bounds and adjacency-chain
//! structure. After that every accessor is a bounds-checked slice into the
//! mapping and nothing is deserialized.
//!
//! All borrowed data is tied to the lifetime of the owning [`GraphFile`], so
//! a view can never outlive the mapping it points into.

use crate::error::{Error, Result};
use crate::header::{FileHeader, HEADER_SIZE, METADATA_SIZE, MetadataBlock, flags};
use crate::record::{
    EdgeIndex, EdgeRecord, IdIndexEntry, MAX_ELEMENTS, NO_EDGE, NO_PAYLOAD, NodeIndex, NodeRecord,
    SLOT_SIZE, U64Slot,
};
use crate::stats::StatsBlock;
use crate::table::{EdgeTable, IdIndex, NodeTable};
use crate::traversal::GraphView;
use crate::varint;
use fs2::FileExt;
use memmap2::Mmap;
use std::fs::File;
use std::ops::Range;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64;
use zerocopy::FromBytes;

/// Bytes before the first section
const PREAMBLE_SIZE: usize = HEADER_SIZE + METADATA_SIZE;

#[derive(Debug, Clone, Copy)]
struct Section {
    offset: usize,
    len: usize,
}

impl Section {
    fn range(self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Section placement, checked against the file length
#[derive(Debug, Clone, Copy)]
struct Layout {
    header: FileHeader,
    metadata: MetadataBlock,
    nodes: Section,
    edges: Section,
    weights: Option<Section>,
    payload: Section,
    index: Option<Section>,
    id_index: Option<Section>,
    stats: Option<Section>,
}

/// A validated graph borrowed from a byte buffer.
///
/// [`GraphFile`] hands these out over its mapping; [`GraphBytes::parse`]
/// builds one over any in-memory buffer, such as the output of
/// [`crate::GraphWriter::write`].
#[derive(Clone, Copy)]
pub struct GraphBytes<'a> {
    bytes: &'a [u8],
    layout: Layout,
}

impl std::fmt::Debug for GraphBytes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphBytes")
            .field("len", &self.bytes.len())
            .field("nodes", &self.layout.header.node_count())
            .field("edges", &self.layout.header.edge_count())
            .field("flags", &self.layout.header.flags())
            .finish()
    }
}

impl<'a> GraphBytes<'a> {
    /// Validates `bytes` as a complete zcgraph file.
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` if the buffer is too short, carries the wrong magic,
    /// version or unknown flags, fails the checksum, places a section outside
    /// the buffer, or has malformed adjacency chains or identifiers.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let layout = read_layout(bytes)?;
        let graph = Self { bytes, layout };
        graph.check_structure()?;
        Ok(graph)
    }

    /// File header
    pub fn header(&self) -> &FileHeader {
        &self.layout.header
    }

    /// Metadata block
    pub fn metadata(&self) -> &MetadataBlock {
        &self.layout.metadata
    }

    /// Node table
    pub fn nodes(&self) -> NodeTable<'a> {
        NodeTable::new(self.slice_of(self.layout.nodes))
    }

    /// Edge table
    pub fn edges(&self) -> EdgeTable<'a> {
        EdgeTable::new(self.slice_of(self.layout.edges))
    }

    /// Node record at `position`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` past the node count.
    pub fn node(&self, position: NodeIndex) -> Result<&'a NodeRecord> {
        self.nodes().get(position)
    }

    /// Edge record at `position`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` past the edge count.
    pub fn edge(&self, position: EdgeIndex) -> Result<&'a EdgeRecord> {
        self.edges().get(position)
    }

    /// Weight of the edge at `position`, or `None` if edges are unweighted
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` past the edge count.
    pub fn weight(&self, position: EdgeIndex) -> Result<Option<f64>> {
        self.edge(position)?;
        let Some(section) = self.layout.weights else {
            return Ok(None);
        };
        let slots: &[U64Slot] = self.slice_of(section);
        let bits = slots.get(position as usize).map(|slot| slot.get());
        Ok(bits.map(f64::from_bits))
    }

    /// Payload bytes of the node at `position`, `None` if it has none.
    ///
    /// Reads the offset index when the file has one, the node record
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` past the node count, or `Corrupt` if the payload
    /// entry does not lie inside the payload section.
    pub fn node_payload(&self, position: NodeIndex) -> Result<Option<&'a [u8]>> {
        let node = self.node(position)?;
        let offset = match self.layout.index {
            Some(section) => {
                let slots: &[U64Slot] = self.slice_of(section);
                slots
                    .get(position as usize)
                    .map(|slot| slot.get())
                    .filter(|&o| o != NO_PAYLOAD)
            }
            None => node.payload_offset(),
        };
        self.payload_at(offset)
    }

    /// Payload bytes of the edge at `position`, `None` if it has none
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` past the edge count, or `Corrupt` if the payload
    /// entry does not lie inside the payload section.
    pub fn edge_payload(&self, position: EdgeIndex) -> Result<Option<&'a [u8]>> {
        let edge = self.edge(position)?;
        self.payload_at(edge.payload_offset())
    }

    /// Identifier lookup for this graph
    pub fn id_index(&self) -> IdIndex<'a> {
        match self.layout.id_index {
            Some(section) => IdIndex::Sparse(self.slice_of(section)),
            None => IdIndex::Dense {
                len: self.layout.header.node_count(),
            },
        }
    }

    /// Position of the node with identifier `id`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if no node carries `id`.
    pub fn position_of(&self, id: u64) -> Result<NodeIndex> {
        self.id_index().position_of(id)
    }

    /// Stored statistics block, if the file has one.
    ///
    /// This is a cache written at build time; see
    /// [`GraphView::verify_stats`].
    pub fn stats(&self) -> Option<&'a StatsBlock> {
        let section = self.layout.stats?;
        self.bytes
            .get(section.range())
            .and_then(StatsBlock::ref_from)
    }

    /// Traversal view over the tables
    pub fn view(&self) -> GraphView<'a> {
        GraphView::new(self.nodes(), self.edges(), self.id_index(), self.stats())
    }

    fn slice_of<T: FromBytes + zerocopy::Unaligned>(&self, section: Section) -> &'a [T] {
        // Sections were bounds-checked when the layout was read
        self.bytes
            .get(section.range())
            .and_then(T::slice_from)
            .unwrap_or_default()
    }

    fn payload_at(&self, offset: Option<u64>) -> Result<Option<&'a [u8]>> {
        let Some(offset) = offset else {
            return Ok(None);
        };
        let section = self.layout.payload.range();
        let start = usize::try_from(offset)
            .ok()
            .filter(|o| section.contains(o))
            .ok_or_else(|| {
                Error::corrupt(format!("payload offset {offset} lies outside the payload section"))
            })?;

        let entry = self.bytes.get(start..section.end).unwrap_or_default();
        let (len, prefix) = varint::decode(entry)
            .ok_or_else(|| Error::corrupt(format!("malformed payload length at offset {offset}")))?;
        let body = usize::try_from(len)
            .ok()
            .and_then(|len| entry.get(prefix..prefix.checked_add(len)?))
            .ok_or_else(|| {
                Error::corrupt(format!("payload at offset {offset} runs past the payload section"))
            })?;
        Ok(Some(body))
    }

    /// Every chain must move forward, stay within one source, and together
    /// the chains must cover the edge table exactly once. Ids must match the
    /// identifier index (or the positions, when dense).
    fn check_structure(&self) -> Result<()> {
        let nodes = self.nodes();
        let edges = self.edges();
        let node_count = nodes.len() as u64;
        let edge_count = edges.len();

        for (i, edge) in edges.iter().enumerate() {
            if u64::from(edge.source()) >= node_count || u64::from(edge.target()) >= node_count {
                return Err(Error::corrupt(format!(
                    "edge {i} connects {} -> {} but there are {node_count} nodes",
                    edge.source(),
                    edge.target()
                )));
            }
            let next = edge.next_raw();
            if next != NO_EDGE && (next as usize <= i || next as usize >= edge_count) {
                return Err(Error::corrupt(format!(
                    "edge {i} links to edge {next} out of chain order"
                )));
            }
        }

        let mut chained = 0usize;
        for (node, position) in nodes.iter().zip(0u32..) {
            let first = node.first_edge_raw();
            if first != NO_EDGE && first as usize >= edge_count {
                return Err(Error::corrupt(format!(
                    "node {position} starts its chain at missing edge {first}"
                )));
            }
            for edge in edges.chain(first) {
                if edge.source() != position {
                    return Err(Error::corrupt(format!(
                        "out-edge chain of node {position} contains an edge leaving node {}",
                        edge.source()
                    )));
                }
                chained += 1;
            }
        }
        if chained != edge_count {
            return Err(Error::corrupt(format!(
                "adjacency chains cover {chained} of {edge_count} edges"
            )));
        }

        if let Some(section) = self.layout.index {
            let slots: &[U64Slot] = self.slice_of(section);
            for ((node, slot), position) in nodes.iter().zip(slots).zip(0u32..) {
                let expected = node.payload_offset().unwrap_or(NO_PAYLOAD);
                if slot.get() != expected {
                    return Err(Error::corrupt(format!(
                        "offset index gives node {position} offset {}, record says {expected}",
                        slot.get()
                    )));
                }
            }
        }

        match self.id_index() {
            IdIndex::Dense { .. } => {
                let mismatch = nodes
                    .iter()
                    .zip(0u64..)
                    .position(|(node, pos)| node.id() != pos);
                if let Some(position) = mismatch {
                    return Err(Error::corrupt(format!(
                        "node {position} has a non-positional id but no identifier index"
                    )));
                }
            }
            IdIndex::Sparse(entries) => {
                let sorted = entries
                    .windows(2)
                    .all(|pair| matches!(pair, [a, b] if a.id() < b.id()));
                if !sorted {
                    return Err(Error::corrupt("identifier index is not strictly sorted"));
                }
                for entry in entries {
                    let consistent = nodes
                        .get(entry.position())
                        .is_ok_and(|node| node.id() == entry.id());
                    if !consistent {
                        return Err(Error::corrupt(format!(
                            "identifier index maps id {} to node {}, which carries another id",
                            entry.id(),
                            entry.position()
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

fn read_layout(bytes: &[u8]) -> Result<Layout> {
    let file_len = bytes.len();
    if file_len < PREAMBLE_SIZE {
        return Err(Error::corrupt(format!(
            "{file_len} bytes is shorter than the {PREAMBLE_SIZE}-byte preamble"
        )));
    }

    let header = bytes
        .get(..HEADER_SIZE)
        .and_then(FileHeader::read_from)
        .ok_or_else(|| Error::corrupt("unreadable header"))?;
    header.validate()?;

    let computed = xxh3_64(bytes.get(HEADER_SIZE..).unwrap_or_default());
    if computed != header.checksum() {
        return Err(Error::corrupt(format!(
            "checksum mismatch: stored {:#018x}, computed {computed:#018x}",
            header.checksum()
        )));
    }

    let metadata = bytes
        .get(HEADER_SIZE..PREAMBLE_SIZE)
        .and_then(MetadataBlock::read_from)
        .ok_or_else(|| Error::corrupt("unreadable metadata block"))?;

    let node_count = u64::from(header.node_count());
    let edge_count = u64::from(header.edge_count());
    if header.node_count() > MAX_ELEMENTS || header.edge_count() > MAX_ELEMENTS {
        return Err(Error::corrupt("element count collides with a sentinel value"));
    }

    let place = |what: &str, offset: u64, count: u64, width: usize| {
        section(file_len, what, offset, count, width)
    };
    let optional = |what: &str, flagged: bool, offset: Option<u64>, count: u64, width: usize| {
        match (flagged, offset) {
            (true, Some(offset)) => place(what, offset, count, width).map(Some),
            (false, None) => Ok(None),
            (true, None) => Err(Error::corrupt(format!("{what} is flagged but has no offset"))),
            (false, Some(_)) => {
                Err(Error::corrupt(format!("{what} has an offset but is not flagged")))
            }
        }
    };

    Ok(Layout {
        header,
        metadata,
        nodes: place(
            "node table",
            header.node_table_offset(),
            node_count,
            NodeRecord::SIZE,
        )?,
        edges: place(
            "edge table",
            header.edge_table_offset(),
            edge_count,
            EdgeRecord::SIZE,
        )?,
        weights: optional(
            "weight column",
            header.has_flag(flags::WEIGHTED_EDGES),
            metadata.weights_offset(),
            edge_count,
            SLOT_SIZE,
        )?,
        payload: place(
            "payload section",
            metadata.payload_offset(),
            metadata.payload_len(),
            1,
        )?,
        index: optional(
            "offset index",
            header.has_flag(flags::BUILD_INDEX),
            header.index_offset(),
            node_count,
            SLOT_SIZE,
        )?,
        id_index: optional(
            "identifier index",
            header.has_flag(flags::SPARSE_IDS),
            metadata.id_index_offset(),
            node_count,
            IdIndexEntry::SIZE,
        )?,
        stats: optional(
            "statistics block",
            header.has_flag(flags::HAS_STATS),
            header.stats_offset(),
            1,
            StatsBlock::SIZE,
        )?,
    })
}

fn section(file_len: usize, what: &str, offset: u64, count: u64, width: usize) -> Result<Section> {
    let start = usize::try_from(offset).ok().filter(|&o| o >= PREAMBLE_SIZE);
    let len = usize::try_from(count)
        .ok()
        .and_then(|c| c.checked_mul(width));
    let fits = |offset: usize, len: usize| {
        offset.checked_add(len).is_some_and(|end| end <= file_len)
    };
    match (start, len) {
        (Some(offset), Some(len)) if fits(offset, len) => Ok(Section { offset, len }),
        _ => Err(Error::corrupt(format!(
            "{what} at offset {offset} ({count} x {width} bytes) does not fit in {file_len} bytes"
        ))),
    }
}

/// Read-only handle over a mapped zcgraph file
///
/// Holds a shared advisory lock for its whole lifetime, so a concurrent
/// [`crate::GraphWriter::write_to_file`] on the same path fails instead of
/// rewriting the bytes under the mapping.
#[derive(Debug)]
pub struct GraphFile {
    /// File handle (owns the lock)
    file: File,

    /// Read-only mapping of the whole file
    mmap: Mmap,

    layout: Layout,
}

impl GraphFile {
    /// Opens and validates a graph file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a file produced by [`crate::GraphWriter`]
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened or mapped (`Io`)
    /// - Another process holds it under an exclusive lock (`Io`)
    /// - Any validation step fails (`Corrupt`)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use zcgraph_core::GraphFile;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let graph = GraphFile::open("social.zcg")?;
    /// let reached = graph.view().bfs(0, &Default::default())?.reached;
    /// println!("{reached} of {} nodes reachable", graph.nodes().len());
    /// graph.close();
    /// # Ok(())
    /// # }
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display();

        let file = File::open(path)
            .map_err(|e| Error::io(format!("failed to open graph file {shown}"), e))?;

        FileExt::try_lock_shared(&file)
            .map_err(|e| Error::io(format!("graph file {shown} is locked by a writer"), e))?;

        let len = file
            .metadata()
            .map_err(|e| Error::io(format!("failed to stat graph file {shown}"), e))?
            .len();
        if len < PREAMBLE_SIZE as u64 {
            tracing::warn!(path = %shown, bytes = len, "rejected graph file: truncated");
            return Err(Error::corrupt(format!(
                "{len} bytes is shorter than the {PREAMBLE_SIZE}-byte preamble"
            )));
        }

        // SAFETY: the mapping is read-only and the shared lock keeps
        // cooperating writers out while it lives. Every typed view built on
        // it is bounds-checked and borrows from `self`.
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| Error::io(format!("failed to map graph file {shown}"), e))?;

        let layout = match GraphBytes::parse(&mmap) {
            Ok(graph) => graph.layout,
            Err(e) => {
                tracing::warn!(path = %shown, error = %e, "rejected graph file");
                return Err(e);
            }
        };

        tracing::info!(
            path = %shown,
            nodes = layout.header.node_count(),
            edges = layout.header.edge_count(),
            flags = layout.header.flags(),
            "opened graph file"
        );

        Ok(Self { file, mmap, layout })
    }

    /// Releases the mapping and the lock
    pub fn close(self) {
        drop(self);
    }

    /// Borrowed, validated view over the mapped bytes
    pub fn as_bytes(&self) -> GraphBytes<'_> {
        GraphBytes {
            bytes: &self.mmap,
            layout: self.layout,
        }
    }

    /// File header
    pub fn header(&self) -> &FileHeader {
        &self.layout.header
    }

    /// Metadata block
    pub fn metadata(&self) -> &MetadataBlock {
        &self.layout.metadata
    }

    /// Node table
    pub fn nodes(&self) -> NodeTable<'_> {
        self.as_bytes().nodes()
    }

    /// Edge table
    pub fn edges(&self) -> EdgeTable<'_> {
        self.as_bytes().edges()
    }

    /// Node record at `position`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` past the node count.
    pub fn node(&self, position: NodeIndex) -> Result<&NodeRecord> {
        self.as_bytes().node(position)
    }

    /// Edge record at `position`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` past the edge count.
    pub fn edge(&self, position: EdgeIndex) -> Result<&EdgeRecord> {
        self.as_bytes().edge(position)
    }

    /// See [`GraphBytes::weight`]
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` past the edge count.
    pub fn weight(&self, position: EdgeIndex) -> Result<Option<f64>> {
        self.as_bytes().weight(position)
    }

    /// See [`GraphBytes::node_payload`]
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` past the node count or `Corrupt` for a bad entry.
    pub fn node_payload(&self, position: NodeIndex) -> Result<Option<&[u8]>> {
        self.as_bytes().node_payload(position)
    }

    /// See [`GraphBytes::edge_payload`]
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` past the edge count or `Corrupt` for a bad entry.
    pub fn edge_payload(&self, position: EdgeIndex) -> Result<Option<&[u8]>> {
        self.as_bytes().edge_payload(position)
    }

    /// Position of the node with identifier `id`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if no node carries `id`.
    pub fn position_of(&self, id: u64) -> Result<NodeIndex> {
        self.as_bytes().position_of(id)
    }

    /// Stored statistics block, if any
    pub fn stats(&self) -> Option<&StatsBlock> {
        self.as_bytes().stats()
    }

    /// Traversal view borrowing this file
    pub fn view(&self) -> GraphView<'_> {
        self.as_bytes().view()
    }

    /// Size of the mapped file in bytes
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Always false for a file that passed validation
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

impl Drop for GraphFile {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeSpec, Graph, NodeSpec};
    use crate::writer::{GraphWriter, WriteOptions};
    use zerocopy::AsBytes;

    fn ring(n: u64) -> Vec<u8> {
        let graph = Graph::from_edges(n, (0..n).map(|i| (i, (i + 1) % n)));
        GraphWriter::default().write(&graph).unwrap()
    }

    /// Rewrites the checksum so structural checks run on a tampered buffer
    fn reseal(buf: &mut [u8]) {
        let mut header = FileHeader::read_from(&buf[..HEADER_SIZE]).unwrap();
        header.set_checksum(xxh3_64(&buf[HEADER_SIZE..]));
        buf[..HEADER_SIZE].copy_from_slice(header.as_bytes());
    }

    fn edge_offset(buf: &[u8], edge: usize) -> usize {
        let header = FileHeader::read_from(&buf[..HEADER_SIZE]).unwrap();
        header.edge_table_offset() as usize + edge * EdgeRecord::SIZE
    }

    #[test]
    fn test_parse_valid_buffer() {
        let buf = ring(4);
        let graph = GraphBytes::parse(&buf).unwrap();
        assert_eq!(graph.nodes().len(), 4);
        assert_eq!(graph.edges().len(), 4);
        assert_eq!(graph.edge(3).unwrap().target(), 0);
        assert!(graph.stats().is_some());
    }

    #[test]
    fn test_short_buffer_is_corrupt() {
        let buf = ring(3);
        assert!(GraphBytes::parse(&buf[..100]).unwrap_err().is_corrupt());
        assert!(GraphBytes::parse(&[]).unwrap_err().is_corrupt());
    }

    #[test]
    fn test_bad_magic_and_version() {
        let mut buf = ring(3);
        buf[0] = b'X';
        let err = GraphBytes::parse(&buf).unwrap_err();
        assert!(err.to_string().contains("magic"));

        let mut buf = ring(3);
        buf[8] = 2;
        let err = GraphBytes::parse(&buf).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut buf = ring(3);
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;
        let err = GraphBytes::parse(&buf).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_backward_chain_link_rejected() {
        let mut buf = ring(3);
        // Edge 2 -> next = 0
        let at = edge_offset(&buf, 2) + 12;
        buf[at..at + 4].copy_from_slice(&0u32.to_le_bytes());
        reseal(&mut buf);

        let err = GraphBytes::parse(&buf).unwrap_err();
        assert!(err.is_corrupt());
        assert!(err.to_string().contains("chain order"));
    }

    #[test]
    fn test_endpoint_out_of_bounds_rejected() {
        let mut buf = ring(3);
        let at = edge_offset(&buf, 1) + 4;
        buf[at..at + 4].copy_from_slice(&9u32.to_le_bytes());
        reseal(&mut buf);

        let err = GraphBytes::parse(&buf).unwrap_err();
        assert!(err.to_string().contains("edge 1 connects"));
    }

    #[test]
    fn test_foreign_edge_in_chain_rejected() {
        let graph = Graph::from_edges(3, [(0, 1), (1, 2)]);
        let mut buf = GraphWriter::default().write(&graph).unwrap();
        // Link node 0's chain into node 1's edge
        let at = edge_offset(&buf, 0) + 12;
        buf[at..at + 4].copy_from_slice(&1u32.to_le_bytes());
        reseal(&mut buf);

        let err = GraphBytes::parse(&buf).unwrap_err();
        assert!(err.to_string().contains("out-edge chain of node 0"));
    }

    #[test]
    fn test_orphan_edge_rejected() {
        let graph = Graph::from_edges(2, [(0, 1), (0, 0)]);
        let mut buf = GraphWriter::default().write(&graph).unwrap();
        // Cut the chain after the first edge
        let at = edge_offset(&buf, 0) + 12;
        buf[at..at + 4].copy_from_slice(&NO_EDGE.to_le_bytes());
        reseal(&mut buf);

        let err = GraphBytes::parse(&buf).unwrap_err();
        assert!(err.to_string().contains("cover 1 of 2"));
    }

    #[test]
    fn test_payload_access() {
        let mut graph = Graph::new();
        graph.add_node(NodeSpec::new(0).with_payload(b"alpha".to_vec()));
        graph.add_node(NodeSpec::new(1));
        graph.add_node(NodeSpec::new(2).with_payload(Vec::new()));
        graph.add_edge(EdgeSpec::new(0, 1).with_payload(vec![7u8; 300]));

        for build_index in [false, true] {
            let options = WriteOptions {
                build_index,
                ..WriteOptions::default()
            };
            let buf = GraphWriter::new(options).write(&graph).unwrap();
            let parsed = GraphBytes::parse(&buf).unwrap();

            assert_eq!(parsed.node_payload(0).unwrap(), Some(&b"alpha"[..]));
            assert_eq!(parsed.node_payload(1).unwrap(), None);
            assert_eq!(parsed.node_payload(2).unwrap(), Some(&[][..]));
            assert_eq!(parsed.edge_payload(0).unwrap().map(<[u8]>::len), Some(300));
            assert!(parsed.node_payload(3).unwrap_err().is_out_of_range());
        }
    }

    #[test]
    fn test_shifted_offset_index_rejected() {
        let mut graph = Graph::new();
        for (id, name) in [(0, "alice"), (1, "mallory"), (2, "carol")] {
            let payload = name.as_bytes().to_vec();
            graph.add_node(NodeSpec::new(id).with_payload(payload));
        }
        let options = WriteOptions {
            build_index: true,
            ..WriteOptions::default()
        };
        let mut buf = GraphWriter::new(options).write(&graph).unwrap();
        let parsed = GraphBytes::parse(&buf).unwrap();
        assert_eq!(parsed.node_payload(0).unwrap(), Some(&b"alice"[..]));

        // The header sits outside the checksum; point the index one slot later
        let index = u64::from_le_bytes(buf[40..48].try_into().unwrap());
        buf[40..48].copy_from_slice(&(index + 8).to_le_bytes());

        let err = GraphBytes::parse(&buf).unwrap_err();
        assert!(err.is_corrupt());
        assert!(err.to_string().contains("offset index"));
    }

    #[test]
    fn test_weights_absent_when_unweighted() {
        let buf = ring(2);
        let graph = GraphBytes::parse(&buf).unwrap();
        assert_eq!(graph.weight(0).unwrap(), None);
        assert!(graph.weight(2).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_sparse_position_lookup() {
        let mut graph = Graph::new();
        graph.add_node(NodeSpec::new(500));
        graph.add_node(NodeSpec::new(20));
        graph.add_edge(EdgeSpec::new(500, 20));
        let buf = GraphWriter::default().write(&graph).unwrap();
        let parsed = GraphBytes::parse(&buf).unwrap();

        assert_eq!(parsed.position_of(500).unwrap(), 0);
        assert_eq!(parsed.position_of(20).unwrap(), 1);
        assert!(parsed.position_of(0).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_open_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.zcg");
        std::fs::write(&path, b"ZCGRAPH\0").unwrap();

        assert!(GraphFile::open(&path).unwrap_err().is_corrupt());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GraphFile::open(dir.path().join("missing.zcg")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
