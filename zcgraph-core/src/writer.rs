//! Serializes an in-memory [`Graph`] into the zcgraph file layout.
//!
//! # Layout
//!
//! ```text
//! [Header: 64B] [Metadata: 64B] [Node table] [Edge table] [Weight column]?
//! [Payload section] [Offset index]? [Identifier index]? [Statistics]?
//! ```
//!
//! Every section starts on an 8-byte boundary. The whole layout is planned
//! from a first pass over element and payload sizes, so the output buffer is
//! reserved once, up front, with a fallible allocation.

use crate::error::{Error, Result, reserve_failed};
use crate::graph::Graph;
use crate::header::{FileHeader, HEADER_SIZE, METADATA_SIZE, MetadataBlock, flags};
use crate::record::{
    EdgeIndex, EdgeRecord, IdIndexEntry, MAX_ELEMENTS, NO_EDGE, NO_PAYLOAD, NodeIndex, NodeRecord,
    SLOT_SIZE,
};
use crate::stats::{GraphStats, StatsBlock};
use crate::varint;
use fs2::FileExt;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64;
use zerocopy::{AsBytes, FromZeroes};

/// Build-time options, stored as header flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Emit the node position -> payload offset index
    pub build_index: bool,

    /// Emit a fixed-width weight column for edges
    pub weighted_edges: bool,

    /// Reserved for compression. Only sets the header flag; data is unchanged.
    pub compress: bool,

    /// Emit a precomputed statistics block
    pub stats: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            build_index: false,
            weighted_edges: false,
            compress: false,
            stats: true,
        }
    }
}

impl WriteOptions {
    /// Header flag bits for these options (sparse-id bit excluded)
    pub fn flags(&self) -> u16 {
        let mut bits = 0;
        if self.build_index {
            bits |= flags::BUILD_INDEX;
        }
        if self.weighted_edges {
            bits |= flags::WEIGHTED_EDGES;
        }
        if self.compress {
            bits |= flags::COMPRESS;
        }
        if self.stats {
            bits |= flags::HAS_STATS;
        }
        bits
    }
}

/// Section offsets decided before any byte is written
#[derive(Debug, Clone, Copy)]
struct Plan {
    node_table: usize,
    edge_table: usize,
    weights: Option<usize>,
    payload: usize,
    payload_len: usize,
    index: Option<usize>,
    id_index: Option<usize>,
    stats: Option<usize>,
    total: usize,
}

/// Writes graphs in the zcgraph format
#[derive(Debug, Clone, Default)]
pub struct GraphWriter {
    options: WriteOptions,
}

impl GraphWriter {
    /// Creates a writer with the given options
    pub fn new(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Options this writer applies
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Serializes `graph` into a new, fully valid buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The graph has no nodes, duplicate node ids, an edge naming an
    ///   unknown id, or more elements than the format can address
    ///   (`InvalidArgument`)
    /// - The output buffer cannot be allocated (`OutOfMemory`); nothing is
    ///   returned in that case
    pub fn write(&self, graph: &Graph) -> Result<Vec<u8>> {
        let node_count = element_count("node", graph.node_count())?;
        let edge_count = element_count("edge", graph.edge_count())?;
        if node_count == 0 {
            return Err(Error::invalid_argument("graph has no nodes"));
        }

        let positions = resolve_positions(graph)?;
        let dense = positions.is_none();
        let endpoints = resolve_endpoints(graph, positions.as_ref())?;

        let plan = self.plan(graph, dense)?;
        let mut buf: Vec<u8> = Vec::new();
        buf.try_reserve_exact(plan.total)
            .map_err(reserve_failed(plan.total))?;

        // Header and metadata are placeholders until every section is placed
        let mut header_flags = self.options.flags();
        if !dense {
            header_flags |= flags::SPARSE_IDS;
        }
        let mut header = FileHeader::new(header_flags, node_count, edge_count);
        let mut metadata = MetadataBlock::new_zeroed();
        buf.extend_from_slice(header.as_bytes());
        buf.extend_from_slice(metadata.as_bytes());

        let (nodes, edges) = build_records(graph, &endpoints, plan.payload)?;

        debug_assert_eq!(buf.len(), plan.node_table);
        buf.extend_from_slice(nodes.as_bytes());
        debug_assert_eq!(buf.len(), plan.edge_table);
        buf.extend_from_slice(edges.as_bytes());

        if plan.weights.is_some() {
            for edge in graph.edges() {
                buf.extend_from_slice(&edge.weight.to_bits().to_le_bytes());
            }
        }

        debug_assert_eq!(buf.len(), plan.payload);
        let payloads = graph
            .nodes()
            .iter()
            .map(|n| n.payload.as_deref())
            .chain(graph.edges().iter().map(|e| e.payload.as_deref()));
        for payload in payloads.flatten() {
            varint::encode(payload.len() as u64, &mut buf);
            buf.extend_from_slice(payload);
        }
        debug_assert_eq!(buf.len(), plan.payload + plan.payload_len);

        if let Some(offset) = plan.index {
            pad_to(&mut buf, offset);
            for node in &nodes {
                buf.extend_from_slice(&node.payload_offset().unwrap_or(NO_PAYLOAD).to_le_bytes());
            }
        }

        if let Some(offset) = plan.id_index {
            pad_to(&mut buf, offset);
            let mut entries: Vec<IdIndexEntry> = Vec::new();
            let bytes = graph.node_count() * IdIndexEntry::SIZE;
            entries
                .try_reserve_exact(graph.node_count())
                .map_err(reserve_failed(bytes))?;
            let records = graph
                .nodes()
                .iter()
                .zip(0u32..)
                .map(|(node, position)| IdIndexEntry::new(node.id, position));
            entries.extend(records);
            entries.sort_unstable_by_key(IdIndexEntry::id);
            buf.extend_from_slice(entries.as_bytes());
        }

        if let Some(offset) = plan.stats {
            pad_to(&mut buf, offset);
            let stats = GraphStats::try_compute(node_count, endpoints.iter().copied())?;
            buf.extend_from_slice(StatsBlock::from(&stats).as_bytes());
        }
        pad_to(&mut buf, plan.total);
        debug_assert_eq!(buf.len(), plan.total);

        // Backfill the offsets recorded while placing sections
        header.set_table_offsets(plan.node_table as u64, plan.edge_table as u64);
        header.set_index_offset(plan.index.map(|o| o as u64));
        header.set_stats_offset(plan.stats.map(|o| o as u64));
        metadata.set_payload(plan.payload as u64, plan.payload_len as u64);
        metadata.set_weights_offset(plan.weights.map(|o| o as u64));
        metadata.set_id_index_offset(plan.id_index.map(|o| o as u64));
        patch(&mut buf, HEADER_SIZE, metadata.as_bytes());

        let checksum = xxh3_64(buf.get(HEADER_SIZE..).unwrap_or_default());
        header.set_checksum(checksum);
        patch(&mut buf, 0, header.as_bytes());

        tracing::debug!(
            nodes = node_count,
            edges = edge_count,
            bytes = buf.len(),
            sparse_ids = !dense,
            "serialized graph"
        );

        Ok(buf)
    }

    /// Serializes several independent graphs, one buffer each.
    ///
    /// # Errors
    ///
    /// Fails on the first graph that cannot be written. Buffers produced
    /// earlier in the batch are released before the error is returned.
    pub fn write_batch(&self, graphs: &[Graph]) -> Result<Vec<Vec<u8>>> {
        let mut buffers: Vec<Vec<u8>> = Vec::new();
        buffers
            .try_reserve_exact(graphs.len())
            .map_err(reserve_failed(graphs.len() * size_of::<Vec<u8>>()))?;

        for (i, graph) in graphs.iter().enumerate() {
            match self.write(graph) {
                Ok(buf) => buffers.push(buf),
                Err(e) => {
                    tracing::warn!(
                        graph = i,
                        written = buffers.len(),
                        error = %e,
                        "batch serialization failed"
                    );
                    drop(buffers);
                    return Err(e);
                }
            }
        }

        Ok(buffers)
    }

    /// Serializes `graph` and writes it to `path`, returning the file size.
    ///
    /// The file is created or replaced under an exclusive advisory lock and
    /// synced to disk before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails, the file cannot be created,
    /// is locked by another process, or cannot be written and synced.
    pub fn write_to_file<P: AsRef<Path>>(&self, graph: &Graph, path: P) -> Result<u64> {
        let path = path.as_ref();
        let shown = path.display();
        let bytes = self.write(graph)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::io(format!("failed to create graph file {shown}"), e))?;

        // Truncate only once we own the file
        FileExt::try_lock_exclusive(&file)
            .map_err(|e| Error::io(format!("graph file {shown} is open by another process"), e))?;

        let written = replace_contents(&mut file, &bytes);
        let _ = FileExt::unlock(&file);
        written.map_err(|e| Error::io(format!("failed to write graph file {shown}"), e))?;

        tracing::info!(path = %shown, bytes = bytes.len(), "wrote graph file");
        Ok(bytes.len() as u64)
    }

    fn plan(&self, graph: &Graph, dense: bool) -> Result<Plan> {
        let overflow = || Error::invalid_argument("graph too large for this platform");
        let size = |count: usize, width: usize| count.checked_mul(width).ok_or_else(overflow);
        let add = |a: usize, b: usize| a.checked_add(b).ok_or_else(overflow);

        let node_table = HEADER_SIZE + METADATA_SIZE;
        let edge_table = add(node_table, size(graph.node_count(), NodeRecord::SIZE)?)?;
        let mut cursor = add(edge_table, size(graph.edge_count(), EdgeRecord::SIZE)?)?;

        let weights = if self.options.weighted_edges {
            let offset = cursor;
            cursor = add(cursor, size(graph.edge_count(), SLOT_SIZE)?)?;
            Some(offset)
        } else {
            None
        };

        let payload = cursor;
        let mut payload_len = 0usize;
        let payloads = graph
            .nodes()
            .iter()
            .map(|n| n.payload.as_deref())
            .chain(graph.edges().iter().map(|e| e.payload.as_deref()));
        for bytes in payloads.flatten() {
            let entry = add(varint::encoded_len(bytes.len() as u64), bytes.len())?;
            payload_len = add(payload_len, entry)?;
        }
        cursor = add(payload, payload_len)?;

        let index_len = size(graph.node_count(), SLOT_SIZE)?;
        let id_index_len = size(graph.node_count(), IdIndexEntry::SIZE)?;
        let mut section = |enabled: bool, len: usize| -> Result<Option<usize>> {
            if !enabled {
                return Ok(None);
            }
            let offset = align8(cursor).ok_or_else(overflow)?;
            cursor = add(offset, len)?;
            Ok(Some(offset))
        };

        let index = section(self.options.build_index, index_len)?;
        let id_index = section(!dense, id_index_len)?;
        let stats = section(self.options.stats, StatsBlock::SIZE)?;
        let total = align8(cursor).ok_or_else(overflow)?;

        Ok(Plan {
            node_table,
            edge_table,
            weights,
            payload,
            payload_len,
            index,
            id_index,
            stats,
            total,
        })
    }
}

fn element_count(what: &str, count: usize) -> Result<u32> {
    u32::try_from(count)
        .ok()
        .filter(|&c| c <= MAX_ELEMENTS)
        .ok_or_else(|| {
            Error::invalid_argument(format!("too many {what}s: {count} (max {MAX_ELEMENTS})"))
        })
}

/// Id -> position map, or `None` when every id already equals its position.
fn resolve_positions(graph: &Graph) -> Result<Option<HashMap<u64, NodeIndex>>> {
    let dense = graph
        .nodes()
        .iter()
        .zip(0u64..)
        .all(|(node, position)| node.id == position);
    if dense {
        return Ok(None);
    }

    let mut positions = HashMap::new();
    positions
        .try_reserve(graph.node_count())
        .map_err(|_| Error::OutOfMemory {
            bytes: graph.node_count() * 12,
        })?;
    for (node, position) in graph.nodes().iter().zip(0u32..) {
        match positions.entry(node.id) {
            Entry::Occupied(_) => {
                return Err(Error::invalid_argument(format!("duplicate node id {}", node.id)));
            }
            Entry::Vacant(slot) => {
                slot.insert(position);
            }
        }
    }
    Ok(Some(positions))
}

fn resolve_endpoints(
    graph: &Graph,
    positions: Option<&HashMap<u64, NodeIndex>>,
) -> Result<Vec<(NodeIndex, NodeIndex)>> {
    let node_count = graph.node_count() as u64;
    let lookup = |id: u64| -> Option<NodeIndex> {
        match positions {
            None => (id < node_count).then_some(id as NodeIndex),
            Some(map) => map.get(&id).copied(),
        }
    };

    let mut endpoints = Vec::new();
    endpoints
        .try_reserve_exact(graph.edge_count())
        .map_err(reserve_failed(graph.edge_count() * 8))?;
    for (i, edge) in graph.edges().iter().enumerate() {
        let source = lookup(edge.source).ok_or_else(|| {
            Error::invalid_argument(format!("edge {i} names unknown source id {}", edge.source))
        })?;
        let target = lookup(edge.target).ok_or_else(|| {
            Error::invalid_argument(format!("edge {i} names unknown target id {}", edge.target))
        })?;
        endpoints.push((source, target));
    }
    Ok(endpoints)
}

/// Builds node and edge records, threading each source's out-edges into a
/// chain in table order and assigning payload offsets from `payload_start`.
fn build_records(
    graph: &Graph,
    endpoints: &[(NodeIndex, NodeIndex)],
    payload_start: usize,
) -> Result<(Vec<NodeRecord>, Vec<EdgeRecord>)> {
    let mut nodes: Vec<NodeRecord> = Vec::new();
    nodes
        .try_reserve_exact(graph.node_count())
        .map_err(reserve_failed(graph.node_count() * NodeRecord::SIZE))?;
    let mut edges: Vec<EdgeRecord> = Vec::new();
    edges
        .try_reserve_exact(graph.edge_count())
        .map_err(reserve_failed(graph.edge_count() * EdgeRecord::SIZE))?;

    let mut cursor = payload_start as u64;
    let mut next_payload = |payload: Option<&[u8]>| {
        payload.map(|bytes| {
            let offset = cursor;
            cursor += (varint::encoded_len(bytes.len() as u64) + bytes.len()) as u64;
            offset
        })
    };

    for node in graph.nodes() {
        let mut record = NodeRecord::new(node.id, node.node_type, node.flags);
        if let Some(offset) = next_payload(node.payload.as_deref()) {
            record.set_payload_offset(offset);
        }
        nodes.push(record);
    }

    let mut last_edge: Vec<EdgeIndex> = Vec::new();
    last_edge
        .try_reserve_exact(graph.node_count())
        .map_err(reserve_failed(graph.node_count() * size_of::<EdgeIndex>()))?;
    last_edge.resize(graph.node_count(), NO_EDGE);
    for ((edge, &(source, target)), index) in graph.edges().iter().zip(endpoints).zip(0u32..) {
        let mut record = EdgeRecord::new(source, target, edge.edge_type);
        if let Some(offset) = next_payload(edge.payload.as_deref()) {
            record.set_payload_offset(offset);
        }
        edges.push(record);

        let Some(last) = last_edge.get_mut(source as usize) else {
            continue;
        };
        if *last == NO_EDGE {
            if let Some(node) = nodes.get_mut(source as usize) {
                node.set_first_edge(index);
            }
        } else if let Some(previous) = edges.get_mut(*last as usize) {
            previous.set_next(index);
        }
        *last = index;
    }

    Ok((nodes, edges))
}

fn replace_contents(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    file.set_len(0)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn align8(offset: usize) -> Option<usize> {
    offset.checked_add(7).map(|o| o & !7)
}

fn pad_to(buf: &mut Vec<u8>, offset: usize) {
    if buf.len() < offset {
        buf.resize(offset, 0);
    }
}

fn patch(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    if let Some(dst) = buf.get_mut(offset..offset + bytes.len()) {
        dst.copy_from_slice(bytes);
    }
}
