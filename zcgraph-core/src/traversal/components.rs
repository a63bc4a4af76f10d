//! Component counting.

use super::{ComponentMode, GraphView};
use crate::error::Result;
use crate::primitives::{BitSet, DisjointSet, FrontierQueue};

impl GraphView<'_> {
    /// Number of components under `mode`.
    ///
    /// [`ComponentMode::Weak`] unions the endpoints of every edge in one pass
    /// over the edge table. [`ComponentMode::Reachability`] sweeps from the
    /// lowest unvisited position along out-edges, counting one component per
    /// sweep; nodes reached by an earlier sweep are never recounted, so the
    /// result depends on edge direction and position order.
    ///
    /// # Errors
    ///
    /// Only fails if an internal frontier overflows, which a validated graph
    /// cannot cause.
    pub fn connected_components(&self, mode: ComponentMode) -> Result<u32> {
        let count = match mode {
            ComponentMode::Weak => self.weak_components(),
            ComponentMode::Reachability => self.reachability_sweeps()?,
        };
        tracing::debug!(?mode, count, "counted components");
        Ok(count)
    }

    fn weak_components(&self) -> u32 {
        let mut sets = DisjointSet::new(self.node_count());
        for edge in self.edges().iter() {
            sets.union(edge.source(), edge.target());
        }
        sets.set_count() as u32
    }

    fn reachability_sweeps(&self) -> Result<u32> {
        let n = self.node_count() as usize;
        let mut visited = BitSet::new(n);
        let mut queue = FrontierQueue::with_capacity(n);
        let mut count = 0u32;
        let mut from = 0usize;

        while let Some(root) = visited.next_clear(from) {
            count += 1;
            from = root + 1;

            visited.set(root);
            queue.clear();
            queue.push(root as u32)?;
            while let Some(node) = queue.pop() {
                for edge in self.chain(node) {
                    if visited.test_and_set(edge.target() as usize) {
                        queue.push(edge.target())?;
                    }
                }
            }
        }

        Ok(count)
    }
}
