//! Traversal engine over the mapped node and edge tables.
//!
//! Every algorithm walks the adjacency chains in place. Auxiliary state
//! (visited sets, frontiers, distance and parent arrays) is O(node count)
//! and owned by the call, so any number of traversals can share one
//! [`GraphView`] concurrently.
//!
//! Traversal entry points take node *positions*. The [`Neighborhood`]
//! interface is the exception: it speaks application ids.

mod bfs;
mod components;
mod degree;
mod dfs;
mod parallel;
mod path;

pub use bfs::BfsResult;
pub use degree::StatsCheck;
pub use dfs::DfsResult;
pub use parallel::ParallelOptions;
pub use path::Path;

use crate::error::Result;
use crate::record::{EdgeRecord, NO_EDGE, NodeIndex};
use crate::stats::StatsBlock;
use crate::table::{EdgeTable, IdIndex, NodeTable, OutEdges};

/// Distance recorded for nodes a traversal never reached
pub const UNREACHED: u32 = u32::MAX;

/// Default bound on the DFS frame stack
pub const DEFAULT_MAX_DEPTH: usize = 1_000_000;

/// Options shared by the sequential traversals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalOptions {
    /// Keep a per-node distance array in BFS results
    pub record_distances: bool,

    /// Largest DFS stack depth before the walk fails with `DepthExceeded`
    pub max_depth: usize,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            record_distances: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Work counters reported alongside traversal results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalMetrics {
    /// Nodes expanded
    pub nodes_visited: u64,
    /// Edge records read
    pub edges_scanned: u64,
    /// BFS levels expanded, or the deepest DFS stack reached
    pub levels: u32,
}

/// How edge direction is treated when counting components
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComponentMode {
    /// Edges connect both endpoints regardless of direction
    #[default]
    Weak,
    /// Repeatedly BFS along out-edges from the lowest unvisited position,
    /// counting one component per sweep
    Reachability,
}

/// Read-only traversal view over a validated graph.
///
/// Cheap to copy; borrows the tables of a [`crate::GraphFile`] or
/// [`crate::GraphBytes`].
#[derive(Debug, Clone, Copy)]
pub struct GraphView<'a> {
    nodes: NodeTable<'a>,
    edges: EdgeTable<'a>,
    ids: IdIndex<'a>,
    stats: Option<&'a StatsBlock>,
}

impl<'a> GraphView<'a> {
    pub(crate) fn new(
        nodes: NodeTable<'a>,
        edges: EdgeTable<'a>,
        ids: IdIndex<'a>,
        stats: Option<&'a StatsBlock>,
    ) -> Self {
        Self {
            nodes,
            edges,
            ids,
            stats,
        }
    }

    /// Number of nodes
    pub fn node_count(&self) -> u32 {
        self.nodes.len() as u32
    }

    /// Number of edges
    pub fn edge_count(&self) -> u32 {
        self.edges.len() as u32
    }

    /// Node table
    pub fn nodes(&self) -> NodeTable<'a> {
        self.nodes
    }

    /// Edge table
    pub fn edges(&self) -> EdgeTable<'a> {
        self.edges
    }

    /// Out-edges of the node at `position`, in chain order
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` past the node count.
    pub fn out_edges(&self, position: NodeIndex) -> Result<OutEdges<'a>> {
        let node = self.nodes.get(position)?;
        Ok(self.edges.chain(node.first_edge_raw()))
    }

    /// Number of out-edges of the node at `position`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` past the node count.
    pub fn out_degree(&self, position: NodeIndex) -> Result<u32> {
        Ok(self.out_edges(position)?.count() as u32)
    }

    /// Position of the node with identifier `id`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if no node carries `id`.
    pub fn position_of(&self, id: u64) -> Result<NodeIndex> {
        self.ids.position_of(id)
    }

    /// Identifier of the node at `position`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` past the node count.
    pub fn id_of(&self, position: NodeIndex) -> Result<u64> {
        Ok(self.nodes.get(position)?.id())
    }

    pub(crate) fn check_node(&self, position: NodeIndex) -> Result<()> {
        self.nodes.get(position).map(|_| ())
    }

    /// Chain of `position`, or an empty walk for a position past the table.
    /// Callers have already checked `position`.
    #[inline]
    pub(crate) fn chain(&self, position: NodeIndex) -> OutEdges<'a> {
        let first = self
            .nodes
            .get(position)
            .map_or(NO_EDGE, |node| node.first_edge_raw());
        self.edges.chain(first)
    }

    pub(crate) fn stored_stats(&self) -> Option<&'a StatsBlock> {
        self.stats
    }
}

/// Neighbor lookup by application id.
///
/// This is the boundary other components (query engines, reasoners) consume:
/// ids go in and ids come out, never positions or byte offsets.
pub trait Neighborhood {
    /// Ids of the targets of `id`'s out-edges, in chain order
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if no node carries `id`.
    fn neighbors(&self, id: u64) -> Result<Neighbors<'_>>;

    /// Number of out-edges of `id`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if no node carries `id`.
    fn degree(&self, id: u64) -> Result<u32>;
}

/// Lazy iterator over neighbor ids.
///
/// Finite and restartable: cloning before iterating gives an independent
/// walk over the same chain.
#[derive(Debug, Clone)]
pub struct Neighbors<'a> {
    edges: OutEdges<'a>,
    nodes: NodeTable<'a>,
}

impl Iterator for Neighbors<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let edge: &EdgeRecord = self.edges.next()?;
        // Endpoints were validated on open
        self.nodes.get(edge.target()).ok().map(|node| node.id())
    }
}

impl Neighborhood for GraphView<'_> {
    fn neighbors(&self, id: u64) -> Result<Neighbors<'_>> {
        let position = self.position_of(id)?;
        Ok(Neighbors {
            edges: self.out_edges(position)?,
            nodes: self.nodes,
        })
    }

    fn degree(&self, id: u64) -> Result<u32> {
        self.out_degree(self.position_of(id)?)
    }
}

impl Neighborhood for crate::reader::GraphFile {
    fn neighbors(&self, id: u64) -> Result<Neighbors<'_>> {
        let view = self.view();
        let position = view.position_of(id)?;
        Ok(Neighbors {
            edges: view.out_edges(position)?,
            nodes: view.nodes,
        })
    }

    fn degree(&self, id: u64) -> Result<u32> {
        self.view().degree(id)
    }
}
