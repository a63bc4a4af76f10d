//! Aggregate graph statistics and their on-disk block.
//!
//! The writer computes [`GraphStats`] once at build time and may store it as
//! a [`StatsBlock`]. Readers treat the block as a cache: it is only trusted
//! after [`crate::GraphView::verify_stats`] recomputes and compares it.

use crate::error::{Result, reserve_failed};
use crate::primitives::{BitSet, DisjointSet};
use crate::record::NodeIndex;
use zerocopy::byteorder::{LittleEndian, U32, U64};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

/// Aggregate values over a whole graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphStats {
    /// Number of nodes
    pub node_count: u32,
    /// Number of edges
    pub edge_count: u32,
    /// Smallest out-degree
    pub min_out_degree: u32,
    /// Largest out-degree
    pub max_out_degree: u32,
    /// Edges per node
    pub mean_out_degree: f64,
    /// Components when edge direction is ignored
    pub weak_components: u32,
    /// Nodes with neither in- nor out-edges
    pub isolated_nodes: u32,
    /// Edges whose source equals their target
    pub self_loops: u32,
}

impl GraphStats {
    /// Computes statistics over `node_count` nodes and `(source, target)`
    /// position pairs. Pairs naming a position past `node_count` are skipped.
    pub fn compute(
        node_count: u32,
        edges: impl IntoIterator<Item = (NodeIndex, NodeIndex)>,
    ) -> Self {
        let n = node_count as usize;
        Self::tally(
            node_count,
            vec![0u32; n],
            BitSet::new(n),
            DisjointSet::new(node_count),
            edges,
        )
    }

    /// Fallible form of [`GraphStats::compute`] used on the write path.
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if the per-node working arrays cannot be
    /// allocated.
    pub fn try_compute(
        node_count: u32,
        edges: impl IntoIterator<Item = (NodeIndex, NodeIndex)>,
    ) -> Result<Self> {
        let n = node_count as usize;
        let mut out_degree = Vec::new();
        out_degree
            .try_reserve_exact(n)
            .map_err(reserve_failed(n.saturating_mul(size_of::<u32>())))?;
        out_degree.resize(n, 0u32);
        Ok(Self::tally(
            node_count,
            out_degree,
            BitSet::try_new(n)?,
            DisjointSet::try_new(node_count)?,
            edges,
        ))
    }

    fn tally(
        node_count: u32,
        mut out_degree: Vec<u32>,
        mut has_in_edge: BitSet,
        mut components: DisjointSet,
        edges: impl IntoIterator<Item = (NodeIndex, NodeIndex)>,
    ) -> Self {
        let n = node_count as usize;
        let mut edge_count = 0u32;
        let mut self_loops = 0u32;

        for (source, target) in edges {
            if source >= node_count || target >= node_count {
                continue;
            }
            edge_count += 1;
            if let Some(d) = out_degree.get_mut(source as usize) {
                *d += 1;
            }
            has_in_edge.set(target as usize);
            components.union(source, target);
            if source == target {
                self_loops += 1;
            }
        }

        let isolated_nodes = out_degree
            .iter()
            .enumerate()
            .filter(|&(pos, &d)| d == 0 && !has_in_edge.test(pos))
            .count() as u32;

        let mean_out_degree = if n == 0 { 0.0 } else { f64::from(edge_count) / n as f64 };

        Self {
            node_count,
            edge_count,
            min_out_degree: out_degree.iter().copied().min().unwrap_or(0),
            max_out_degree: out_degree.iter().copied().max().unwrap_or(0),
            mean_out_degree,
            weak_components: components.set_count() as u32,
            isolated_nodes,
            self_loops,
        }
    }
}

/// On-disk statistics block.
///
/// # Layout (40 bytes)
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     node_count
/// 4       4     edge_count
/// 8       4     min_out_degree
/// 12      4     max_out_degree
/// 16      8     mean_out_degree (f64 bits)
/// 24      4     weak_components
/// 28      4     isolated_nodes
/// 32      4     self_loops
/// 36      4     reserved
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, FromZeroes, FromBytes, AsBytes, Unaligned)]
pub struct StatsBlock {
    node_count: U32<LittleEndian>,
    edge_count: U32<LittleEndian>,
    min_out_degree: U32<LittleEndian>,
    max_out_degree: U32<LittleEndian>,
    mean_out_degree: U64<LittleEndian>,
    weak_components: U32<LittleEndian>,
    isolated_nodes: U32<LittleEndian>,
    self_loops: U32<LittleEndian>,
    reserved: U32<LittleEndian>,
}

impl StatsBlock {
    /// Size of the block in bytes
    pub const SIZE: usize = size_of::<Self>();

    /// Decodes the stored values
    pub fn to_stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.node_count.get(),
            edge_count: self.edge_count.get(),
            min_out_degree: self.min_out_degree.get(),
            max_out_degree: self.max_out_degree.get(),
            mean_out_degree: f64::from_bits(self.mean_out_degree.get()),
            weak_components: self.weak_components.get(),
            isolated_nodes: self.isolated_nodes.get(),
            self_loops: self.self_loops.get(),
        }
    }
}

impl From<&GraphStats> for StatsBlock {
    fn from(stats: &GraphStats) -> Self {
        Self {
            node_count: U32::new(stats.node_count),
            edge_count: U32::new(stats.edge_count),
            min_out_degree: U32::new(stats.min_out_degree),
            max_out_degree: U32::new(stats.max_out_degree),
            mean_out_degree: U64::new(stats.mean_out_degree.to_bits()),
            weak_components: U32::new(stats.weak_components),
            isolated_nodes: U32::new(stats.isolated_nodes),
            self_loops: U32::new(stats.self_loops),
            reserved: U32::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_block_size() {
        assert_eq!(StatsBlock::SIZE, 40);
    }

    #[test]
    fn test_compute_small_graph() {
        // 0 -> 1 -> 2, 2 -> 2, node 3 isolated, node 4 only has an in-edge from 1
        let stats = GraphStats::compute(5, [(0, 1), (1, 2), (2, 2), (1, 4)]);

        assert_eq!(stats.node_count, 5);
        assert_eq!(stats.edge_count, 4);
        assert_eq!(stats.min_out_degree, 0);
        assert_eq!(stats.max_out_degree, 2);
        assert_eq!(stats.mean_out_degree, 0.8);
        assert_eq!(stats.weak_components, 2);
        assert_eq!(stats.isolated_nodes, 1);
        assert_eq!(stats.self_loops, 1);
    }

    #[test]
    fn test_try_compute_matches_compute() {
        let edges = [(0, 1), (1, 2), (2, 2), (1, 4)];
        let fallible = GraphStats::try_compute(5, edges).unwrap();
        assert_eq!(fallible, GraphStats::compute(5, edges));
    }

    #[test]
    fn test_block_preserves_values() {
        let stats = GraphStats::compute(3, [(0, 1), (1, 0)]);
        let block = StatsBlock::from(&stats);
        assert_eq!(block.to_stats(), stats);
    }

    #[test]
    fn test_compute_skips_out_of_range_pairs() {
        let stats = GraphStats::compute(2, [(0, 1), (0, 7)]);
        assert_eq!(stats.edge_count, 1);
    }
}
