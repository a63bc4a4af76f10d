//! Breadth-first search with a fixed-capacity frontier queue.

use super::{GraphView, TraversalMetrics, TraversalOptions, UNREACHED};
use crate::error::Result;
use crate::primitives::{BitSet, FrontierQueue};
use crate::record::NodeIndex;

/// Outcome of a breadth-first search
#[derive(Debug, Clone)]
pub struct BfsResult {
    /// Number of nodes reached, the start included
    pub reached: u32,
    /// Positions reached
    pub visited: BitSet,
    /// Hop distance per position (`UNREACHED` if not reached), when requested
    pub distances: Option<Vec<u32>>,
    /// Work counters
    pub metrics: TraversalMetrics,
}

impl BfsResult {
    /// Distance of `position` from the start, if distances were recorded and
    /// the node was reached
    pub fn distance(&self, position: NodeIndex) -> Option<u32> {
        self.distances
            .as_ref()
            .and_then(|d| d.get(position as usize))
            .copied()
            .filter(|&d| d != UNREACHED)
    }
}

impl GraphView<'_> {
    /// Level-order traversal from `start` along out-edges.
    ///
    /// Nodes are marked on discovery, so each is enqueued at most once and
    /// the frontier never exceeds the node count. Nodes the search cannot
    /// reach are simply left unmarked.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `start` is not a node position.
    pub fn bfs(&self, start: NodeIndex, options: &TraversalOptions) -> Result<BfsResult> {
        self.check_node(start)?;
        let n = self.node_count() as usize;

        let mut visited = BitSet::new(n);
        let mut queue = FrontierQueue::with_capacity(n);
        let mut distances = options.record_distances.then(|| vec![UNREACHED; n]);
        let mut metrics = TraversalMetrics::default();

        visited.set(start as usize);
        queue.push(start)?;
        if let Some(d) = distances.as_mut().and_then(|d| d.get_mut(start as usize)) {
            *d = 0;
        }

        // Nodes left in the level being expanded, and found for the next one
        let mut level = 0u32;
        let mut remaining = 1usize;
        let mut discovered = 0usize;

        while let Some(node) = queue.pop() {
            metrics.nodes_visited += 1;
            for edge in self.chain(node) {
                metrics.edges_scanned += 1;
                let target = edge.target();
                if visited.test_and_set(target as usize) {
                    queue.push(target)?;
                    discovered += 1;
                    if let Some(d) = distances.as_mut().and_then(|d| d.get_mut(target as usize)) {
                        *d = level + 1;
                    }
                }
            }

            remaining -= 1;
            if remaining == 0 {
                metrics.levels += 1;
                level += 1;
                remaining = std::mem::take(&mut discovered);
            }
        }

        let reached = visited.count_ones() as u32;
        tracing::debug!(start, reached, levels = metrics.levels, "bfs complete");

        Ok(BfsResult {
            reached,
            visited,
            distances,
            metrics,
        })
    }
}
