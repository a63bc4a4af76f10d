//! Unweighted shortest paths.

use super::GraphView;
use crate::error::Result;
use crate::primitives::FrontierQueue;
use crate::record::{NO_NODE, NodeIndex};

/// A path as the positions it visits, source first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    /// Positions from source to target inclusive
    pub nodes: Vec<NodeIndex>,
}

impl Path {
    /// Number of edges on the path
    pub fn distance(&self) -> u32 {
        self.nodes.len().saturating_sub(1) as u32
    }

    /// First position
    pub fn source(&self) -> Option<NodeIndex> {
        self.nodes.first().copied()
    }

    /// Last position
    pub fn target(&self) -> Option<NodeIndex> {
        self.nodes.last().copied()
    }
}

impl GraphView<'_> {
    /// Fewest-hops path from `source` to `target` along out-edges.
    ///
    /// Returns `Ok(None)` when `target` is unreachable, and the one-node path
    /// when `source == target`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if either endpoint is not a node position.
    pub fn shortest_path(&self, source: NodeIndex, target: NodeIndex) -> Result<Option<Path>> {
        self.check_node(source)?;
        self.check_node(target)?;
        if source == target {
            return Ok(Some(Path {
                nodes: vec![source],
            }));
        }

        let n = self.node_count() as usize;
        let mut parent = vec![NO_NODE; n];
        let mut queue = FrontierQueue::with_capacity(n);
        if let Some(p) = parent.get_mut(source as usize) {
            *p = source;
        }
        queue.push(source)?;

        'search: while let Some(node) = queue.pop() {
            for edge in self.chain(node) {
                let next = edge.target();
                let Some(slot) = parent.get_mut(next as usize) else {
                    continue;
                };
                if *slot != NO_NODE {
                    continue;
                }
                *slot = node;
                if next == target {
                    break 'search;
                }
                queue.push(next)?;
            }
        }

        if parent.get(target as usize).is_none_or(|&p| p == NO_NODE) {
            return Ok(None);
        }

        let mut nodes = vec![target];
        let mut cursor = target;
        while cursor != source {
            match parent.get(cursor as usize) {
                Some(&p) if p != NO_NODE => {
                    nodes.push(p);
                    cursor = p;
                }
                _ => return Ok(None),
            }
        }
        nodes.reverse();

        Ok(Some(Path { nodes }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::GraphBytes;
    use crate::traversal::fixtures;

    #[test]
    fn test_ring_path() {
        let buf = fixtures::ring(10);
        let view = GraphBytes::parse(&buf).unwrap().view();

        let path = view.shortest_path(0, 3).unwrap().unwrap();
        assert_eq!(path.nodes, vec![0, 1, 2, 3]);
        assert_eq!(path.distance(), 3);
        assert_eq!(path.source(), Some(0));
        assert_eq!(path.target(), Some(3));

        // Direction matters: going back takes the long way round
        assert_eq!(view.shortest_path(3, 0).unwrap().unwrap().distance(), 7);
    }

    #[test]
    fn test_prefers_fewest_hops() {
        // 0 -> 1 -> 2 -> 3 and a shortcut 0 -> 3
        let buf = fixtures::bytes(4, &[(0, 1), (1, 2), (2, 3), (0, 3)]);
        let view = GraphBytes::parse(&buf).unwrap().view();
        assert_eq!(view.shortest_path(0, 3).unwrap().unwrap().nodes, vec![0, 3]);
    }

    #[test]
    fn test_unreachable_is_none() {
        let buf = fixtures::bytes(3, &[(0, 1), (2, 0)]);
        let view = GraphBytes::parse(&buf).unwrap().view();
        assert_eq!(view.shortest_path(0, 2).unwrap(), None);
    }

    #[test]
    fn test_same_endpoint() {
        let buf = fixtures::bytes(2, &[]);
        let view = GraphBytes::parse(&buf).unwrap().view();
        let path = view.shortest_path(1, 1).unwrap().unwrap();
        assert_eq!(path.nodes, vec![1]);
        assert_eq!(path.distance(), 0);
    }

    #[test]
    fn test_endpoints_checked() {
        let buf = fixtures::ring(3);
        let view = GraphBytes::parse(&buf).unwrap().view();
        assert!(view.shortest_path(0, 3).unwrap_err().is_out_of_range());
        assert!(view.shortest_path(5, 0).unwrap_err().is_out_of_range());
    }
}
