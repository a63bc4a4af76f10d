//! Level-synchronous parallel BFS.
//!
//! Each level's frontier is split into one chunk per worker. Workers scan
//! the out-edges of their chunk and claim targets through a shared
//! [`AtomicBitSet`]; a target belongs to whichever worker's `test_and_set`
//! flips its bit. Collecting every chunk's claims is the level barrier.
//! Distances are then assigned on the calling thread and the frontier
//! buffers swap.

use super::{BfsResult, GraphView, TraversalMetrics, UNREACHED};
use crate::error::{Error, Result};
use crate::primitives::AtomicBitSet;
use crate::record::NodeIndex;
use rayon::ThreadPool;
use rayon::prelude::*;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Frontier size below which a level is expanded on the calling thread
pub const DEFAULT_MIN_PARALLEL_FRONTIER: usize = 1024;

/// Configuration for [`GraphView::parallel_bfs`]
#[derive(Debug, Clone)]
pub struct ParallelOptions {
    /// Worker threads in the pool built for the call. Ignored when `pool`
    /// is set.
    pub workers: usize,

    /// Existing pool to run on instead of building one per call
    pub pool: Option<Arc<ThreadPool>>,

    /// Frontiers smaller than this are expanded inline
    pub min_parallel_frontier: usize,

    /// Keep a per-node distance array in the result
    pub record_distances: bool,

    /// Checked at every level boundary; when set the search stops with
    /// `Cancelled`
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ParallelOptions {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(1, std::num::NonZero::get),
            min_parallel_frontier: DEFAULT_MIN_PARALLEL_FRONTIER,
            pool: None,
            record_distances: true,
            cancel: None,
        }
    }
}

impl ParallelOptions {
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    fn thread_pool(&self) -> Result<Arc<ThreadPool>> {
        if let Some(pool) = &self.pool {
            return Ok(Arc::clone(pool));
        }
        if self.workers == 0 {
            return Err(Error::invalid_argument("parallel BFS needs at least one worker"));
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map(Arc::new)
            .map_err(|e| {
                let context = format!("failed to start {} BFS workers", self.workers);
                Error::io(context, io::Error::other(e))
            })
    }
}

impl GraphView<'_> {
    /// Breadth-first search whose levels are expanded by a rayon pool.
    ///
    /// Reachability and distances are identical to [`GraphView::bfs`]; only
    /// the work split differs.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `start` is not a node position (`OutOfRange`)
    /// - `options.workers` is zero and no pool was supplied (`InvalidArgument`)
    /// - the worker threads cannot be started (`Io`)
    /// - the cancellation flag is observed at a level boundary (`Cancelled`)
    pub fn parallel_bfs(&self, start: NodeIndex, options: &ParallelOptions) -> Result<BfsResult> {
        self.check_node(start)?;
        let pool = options.thread_pool()?;
        let workers = pool.current_num_threads().max(1);

        let n = self.node_count() as usize;
        let visited = AtomicBitSet::new(n);
        let mut distances = options.record_distances.then(|| vec![UNREACHED; n]);
        let mut metrics = TraversalMetrics::default();

        visited.test_and_set(start as usize);
        if let Some(d) = distances.as_mut().and_then(|d| d.get_mut(start as usize)) {
            *d = 0;
        }

        let mut current: Vec<NodeIndex> = vec![start];
        let mut next: Vec<NodeIndex> = Vec::new();
        let mut level = 0u32;

        while !current.is_empty() {
            if options.is_cancelled() {
                tracing::debug!(start, level, "parallel bfs cancelled");
                return Err(Error::Cancelled);
            }
            metrics.levels += 1;
            metrics.nodes_visited += current.len() as u64;
            next.clear();

            let inline = workers == 1 || current.len() < options.min_parallel_frontier;
            metrics.edges_scanned += if inline {
                expand(self, &current, &visited, &mut next)
            } else {
                let chunk = current.len().div_ceil(workers);
                let claims: Vec<(Vec<NodeIndex>, u64)> = pool.install(|| {
                    current
                        .par_chunks(chunk)
                        .map(|part| {
                            let mut won = Vec::new();
                            let scanned = expand(self, part, &visited, &mut won);
                            (won, scanned)
                        })
                        .collect()
                });

                let mut scanned = 0;
                for (won, count) in claims {
                    next.extend_from_slice(&won);
                    scanned += count;
                }
                scanned
            };

            if let Some(d) = distances.as_mut() {
                for &node in &next {
                    if let Some(slot) = d.get_mut(node as usize) {
                        *slot = level + 1;
                    }
                }
            }

            tracing::debug!(
                level,
                frontier = current.len(),
                next = next.len(),
                inline,
                "expanded level"
            );
            level += 1;
            std::mem::swap(&mut current, &mut next);
        }

        let visited = visited.into_bitset();
        let reached = visited.count_ones() as u32;
        Ok(BfsResult {
            reached,
            visited,
            distances,
            metrics,
        })
    }
}

/// Scans the out-edges of `frontier`, pushing every target this call claims.
/// Returns the number of edges read.
fn expand(
    view: &GraphView<'_>,
    frontier: &[NodeIndex],
    visited: &AtomicBitSet,
    won: &mut Vec<NodeIndex>,
) -> u64 {
    let mut scanned = 0;
    for &node in frontier {
        for edge in view.chain(node) {
            scanned += 1;
            if visited.test_and_set(edge.target() as usize) {
                won.push(edge.target());
            }
        }
    }
    scanned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::GraphBytes;
    use crate::traversal::{TraversalOptions, fixtures};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn eager(workers: usize) -> ParallelOptions {
        ParallelOptions {
            workers,
            min_parallel_frontier: 1,
            ..ParallelOptions::default()
        }
    }

    #[test]
    fn test_matches_sequential_on_random_graph() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 2_000u64;
        let edges: Vec<_> = (0..8_000)
            .map(|_| (rng.random_range(0..n), rng.random_range(0..n)))
            .collect();
        let buf = fixtures::bytes(n, &edges);
        let view = GraphBytes::parse(&buf).unwrap().view();

        let with_distances = TraversalOptions {
            record_distances: true,
            ..TraversalOptions::default()
        };
        let sequential = view.bfs(0, &with_distances).unwrap();
        for workers in [1, 2, 4] {
            let parallel = view.parallel_bfs(0, &eager(workers)).unwrap();
            assert_eq!(parallel.visited, sequential.visited);
            assert_eq!(parallel.distances, sequential.distances);
            assert_eq!(parallel.reached, sequential.reached);
            assert_eq!(parallel.metrics, sequential.metrics);
        }
    }

    #[test]
    fn test_ring_levels() {
        let buf = fixtures::ring(10);
        let view = GraphBytes::parse(&buf).unwrap().view();
        let result = view.parallel_bfs(4, &eager(3)).unwrap();
        assert_eq!(result.reached, 10);
        assert_eq!(result.distance(3), Some(9));
        assert_eq!(result.metrics.levels, 10);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let buf = fixtures::ring(3);
        let view = GraphBytes::parse(&buf).unwrap().view();
        let result = view.parallel_bfs(0, &eager(0));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_supplied_pool_is_used() {
        let buf = fixtures::ring(64);
        let view = GraphBytes::parse(&buf).unwrap().view();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(3)
            .build()
            .unwrap();
        let pool = Arc::new(pool);

        // Zero workers is fine when a pool is provided
        let options = ParallelOptions {
            pool: Some(Arc::clone(&pool)),
            ..eager(0)
        };
        for _ in 0..3 {
            let result = view.parallel_bfs(0, &options).unwrap();
            assert_eq!(result.reached, 64);
            assert_eq!(result.distance(63), Some(63));
        }
    }

    #[test]
    fn test_cancel_flag() {
        let buf = fixtures::ring(3);
        let view = GraphBytes::parse(&buf).unwrap().view();
        let cancel = Arc::new(AtomicBool::new(true));
        let options = ParallelOptions {
            cancel: Some(Arc::clone(&cancel)),
            ..eager(2)
        };
        assert!(matches!(view.parallel_bfs(0, &options), Err(Error::Cancelled)));

        cancel.store(false, Ordering::Release);
        assert_eq!(view.parallel_bfs(0, &options).unwrap().reached, 3);
    }

    #[test]
    fn test_out_of_range_start() {
        let buf = fixtures::ring(3);
        let view = GraphBytes::parse(&buf).unwrap().view();
        let err = view.parallel_bfs(9, &eager(2)).unwrap_err();
        assert!(err.is_out_of_range());
    }
}
