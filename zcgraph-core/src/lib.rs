//! zcgraph - Zero-copy binary format for directed graphs
//!
//! zcgraph writes a directed graph once into a flat, self-describing file
//! and then traverses it straight out of a read-only memory mapping. Opening
//! a file validates it and maps it; nothing is deserialized, so open latency
//! is independent of graph size and graphs larger than RAM page in on demand.
//!
//! # Features
//!
//! - Fixed-width node and edge records, directly indexed by position
//! - Little-endian, alignment-free layout read through typed overlays
//! - xxh3 checksum and structural validation on open
//! - BFS, DFS, components, shortest path and degree statistics in place
//! - Level-synchronous parallel BFS over a shared atomic visited set
//!
//! # Example
//!
//! ```no_run
//! use zcgraph_core::{Graph, GraphFile, GraphWriter, Neighborhood, TraversalOptions, WriteOptions};
//!
//! # fn main() -> anyhow::Result<()> {
//! // Build and write a directed ring of 10 nodes
//! let graph = Graph::from_edges(10, (0..10).map(|i| (i, (i + 1) % 10)));
//! GraphWriter::new(WriteOptions::default()).write_to_file(&graph, "ring.zcg")?;
//!
//! // Map it and traverse in place
//! let file = GraphFile::open("ring.zcg")?;
//! let view = file.view();
//!
//! let bfs = view.bfs(0, &TraversalOptions::default())?;
//! assert_eq!(bfs.reached, 10);
//!
//! let path = view.shortest_path(0, 3)?.expect("ring is strongly connected");
//! assert_eq!(path.nodes, vec![0, 1, 2, 3]);
//!
//! let next: Vec<u64> = file.neighbors(9)?.collect();
//! assert_eq!(next, vec![0]);
//! # Ok(())
//! # }
//! ```
//!
//! # Design Philosophy
//!
//! Files are build-once, read-many. There is no in-place mutation, schema
//! evolution or compression; rebuilding a graph means writing a new file.

pub mod error;
pub mod graph;
pub mod header;
pub mod primitives;
pub mod reader;
pub mod record;
pub mod stats;
pub mod table;
pub mod traversal;
pub mod writer;

#[cfg(feature = "internals")]
pub mod varint;
#[cfg(not(feature = "internals"))]
pub(crate) mod varint;

pub use error::{Error, Result};
pub use graph::{EdgeSpec, Graph, NodeSpec};
pub use header::{FileHeader, HEADER_SIZE, MAGIC, METADATA_SIZE, MetadataBlock, VERSION, flags};
pub use reader::{GraphBytes, GraphFile};
pub use record::{EdgeIndex, EdgeRecord, NO_EDGE, NO_NODE, NO_PAYLOAD, NodeIndex, NodeRecord};
pub use stats::{GraphStats, StatsBlock};
pub use table::{EdgeTable, IdIndex, NodeTable, OutEdges};
pub use traversal::{
    BfsResult, ComponentMode, DfsResult, GraphView, Neighborhood, Neighbors, ParallelOptions, Path,
    StatsCheck, TraversalMetrics, TraversalOptions, UNREACHED,
};
pub use writer::{GraphWriter, WriteOptions};

/// Library version, as reported over the C ABI
pub const LIB_VERSION: &str = env!("CARGO_PKG_VERSION");
