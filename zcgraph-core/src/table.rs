//! Borrowed, checked views over the mapped node and edge tables.

use crate::error::{Error, Result};
use crate::record::{EdgeIndex, EdgeRecord, IdIndexEntry, NO_EDGE, NodeIndex, NodeRecord};

/// The node table as a flat array indexed by position
#[derive(Debug, Clone, Copy)]
pub struct NodeTable<'a> {
    records: &'a [NodeRecord],
}

impl<'a> NodeTable<'a> {
    pub(crate) fn new(records: &'a [NodeRecord]) -> Self {
        Self { records }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `position`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `position >= len()`.
    #[inline]
    pub fn get(&self, position: NodeIndex) -> Result<&'a NodeRecord> {
        self.records
            .get(position as usize)
            .ok_or_else(|| Error::out_of_range("node", position, self.records.len() as u64))
    }

    /// All records in table order
    pub fn as_slice(&self) -> &'a [NodeRecord] {
        self.records
    }

    /// Iterator over records in table order
    pub fn iter(&self) -> std::slice::Iter<'a, NodeRecord> {
        self.records.iter()
    }
}

/// The edge table as a flat array indexed by position
#[derive(Debug, Clone, Copy)]
pub struct EdgeTable<'a> {
    records: &'a [EdgeRecord],
}

impl<'a> EdgeTable<'a> {
    pub(crate) fn new(records: &'a [EdgeRecord]) -> Self {
        Self { records }
    }

    /// Number of edges
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `position`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `position >= len()`.
    #[inline]
    pub fn get(&self, position: EdgeIndex) -> Result<&'a EdgeRecord> {
        self.records
            .get(position as usize)
            .ok_or_else(|| Error::out_of_range("edge", position, self.records.len() as u64))
    }

    /// All records in table order
    pub fn as_slice(&self) -> &'a [EdgeRecord] {
        self.records
    }

    /// Iterator over records in table order
    pub fn iter(&self) -> std::slice::Iter<'a, EdgeRecord> {
        self.records.iter()
    }

    /// Walks an adjacency chain starting at `first` (which may be `NO_EDGE`)
    pub fn chain(&self, first: EdgeIndex) -> OutEdges<'a> {
        OutEdges {
            records: self.records,
            cursor: first,
        }
    }
}

/// Iterator over one node's out-edges, following the next-edge chain.
///
/// Cloning restarts nothing; it copies the current cursor, so a clone taken
/// before the first `next()` replays the whole chain.
#[derive(Debug, Clone)]
pub struct OutEdges<'a> {
    records: &'a [EdgeRecord],
    cursor: EdgeIndex,
}

impl<'a> Iterator for OutEdges<'a> {
    type Item = &'a EdgeRecord;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NO_EDGE {
            return None;
        }
        let edge = self.records.get(self.cursor as usize)?;
        let next = edge.next_raw();
        // Chains only move forward; anything else ends the walk
        self.cursor = if next == NO_EDGE || next > self.cursor { next } else { NO_EDGE };
        Some(edge)
    }
}

/// Identifier -> position lookup
#[derive(Debug, Clone, Copy)]
pub enum IdIndex<'a> {
    /// Every id equals its position
    Dense {
        /// Number of nodes
        len: u32,
    },
    /// Entries sorted by id
    Sparse(&'a [IdIndexEntry]),
}

impl IdIndex<'_> {
    /// Position of the node with identifier `id`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if no node has this id.
    pub fn position_of(&self, id: u64) -> Result<NodeIndex> {
        match *self {
            IdIndex::Dense { len } => {
                if id < u64::from(len) {
                    Ok(id as NodeIndex)
                } else {
                    Err(Error::out_of_range("node id", id, len))
                }
            }
            IdIndex::Sparse(entries) => entries
                .binary_search_by_key(&id, IdIndexEntry::id)
                .ok()
                .and_then(|i| entries.get(i))
                .map(IdIndexEntry::position)
                .ok_or_else(|| Error::out_of_range("node id", id, entries.len() as u64)),
        }
    }
}
