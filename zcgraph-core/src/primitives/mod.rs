//! Fixed-capacity containers used by the traversal engine.

mod bitset;
mod disjoint;
mod queue;

pub use bitset::{AtomicBitSet, BitSet};
pub use disjoint::DisjointSet;
pub use queue::FrontierQueue;
