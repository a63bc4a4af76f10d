//! Degree distribution and statistics verification.

use super::GraphView;
use crate::stats::GraphStats;

/// Result of comparing the stored statistics block with a recomputation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatsCheck {
    /// The file carries no statistics block
    Absent,
    /// Stored and recomputed values agree
    Match,
    /// The stored block is stale or damaged
    Mismatch {
        /// Values read from the file
        stored: GraphStats,
        /// Values recomputed from the tables
        actual: GraphStats,
    },
}

impl GraphView<'_> {
    /// Out-degree of every node, indexed by position.
    ///
    /// Walks each chain once, so the cost is O(nodes + edges). The sum of
    /// the result equals the edge count.
    pub fn degree_distribution(&self) -> Vec<u32> {
        (0..self.node_count())
            .map(|position| self.chain(position).count() as u32)
            .collect()
    }

    /// Recomputes the statistics stored in a statistics block
    pub fn degree_stats(&self) -> GraphStats {
        let pairs = self.edges().iter().map(|e| (e.source(), e.target()));
        GraphStats::compute(self.node_count(), pairs)
    }

    /// Compares the stored statistics block against [`Self::degree_stats`]
    pub fn verify_stats(&self) -> StatsCheck {
        let Some(block) = self.stored_stats() else {
            return StatsCheck::Absent;
        };
        let stored = block.to_stats();
        let actual = self.degree_stats();
        if stored == actual {
            StatsCheck::Match
        } else {
            tracing::warn!(?stored, ?actual, "stored statistics do not match the graph");
            StatsCheck::Mismatch { stored, actual }
        }
    }
}
