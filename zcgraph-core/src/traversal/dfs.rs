//! Depth-first search on an explicit frame stack.

use super::{GraphView, TraversalMetrics, TraversalOptions};
use crate::error::{Error, Result};
use crate::primitives::BitSet;
use crate::record::NodeIndex;
use crate::table::OutEdges;

/// Outcome of a depth-first search
#[derive(Debug, Clone)]
pub struct DfsResult {
    /// Positions in pre-order
    pub order: Vec<NodeIndex>,
    /// Positions reached
    pub visited: BitSet,
    /// Work counters; `levels` is the deepest stack reached
    pub metrics: TraversalMetrics,
}

impl GraphView<'_> {
    /// Pre-order traversal from `start`.
    ///
    /// Visits a node before its children and children in edge-chain order,
    /// the same order as the recursive formulation. Each frame holds a node's
    /// partially consumed out-edge iterator, so the call stack does not grow
    /// with the graph.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `start` is not a node position,
    /// `InvalidArgument` if `options.max_depth` is zero, and `DepthExceeded`
    /// if the frame stack would grow past `options.max_depth`.
    pub fn dfs(&self, start: NodeIndex, options: &TraversalOptions) -> Result<DfsResult> {
        self.check_node(start)?;
        if options.max_depth == 0 {
            return Err(Error::invalid_argument("max_depth must be at least 1"));
        }
        let n = self.node_count() as usize;

        let mut visited = BitSet::new(n);
        let mut order = Vec::new();
        let mut metrics = TraversalMetrics::default();
        let mut stack: Vec<OutEdges<'_>> = Vec::new();

        visited.set(start as usize);
        order.push(start);
        stack.push(self.chain(start));
        metrics.levels = 1;

        while let Some(edges) = stack.last_mut() {
            let Some(edge) = edges.next() else {
                stack.pop();
                continue;
            };
            metrics.edges_scanned += 1;

            let target = edge.target();
            if !visited.test_and_set(target as usize) {
                continue;
            }
            if stack.len() >= options.max_depth {
                tracing::debug!(start, limit = options.max_depth, "dfs depth limit reached");
                return Err(Error::DepthExceeded {
                    limit: options.max_depth,
                });
            }
            order.push(target);
            stack.push(self.chain(target));
            metrics.levels = metrics.levels.max(stack.len() as u32);
        }

        metrics.nodes_visited = order.len() as u64;
        Ok(DfsResult {
            order,
            visited,
            metrics,
        })
    }
}
