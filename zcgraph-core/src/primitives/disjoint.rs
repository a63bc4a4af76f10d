//! Disjoint-set forest for undirected (weak) component counting.

use crate::error::{Result, reserve_failed};

/// Union by size with path halving. Memory is two words per element.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<u32>,
    size: Vec<u32>,
    sets: usize,
}

impl DisjointSet {
    /// Creates `len` singleton sets
    pub fn new(len: u32) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len as usize],
            sets: len as usize,
        }
    }

    /// Like [`DisjointSet::new`], but reports an allocation failure instead
    /// of aborting.
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if either array cannot be reserved.
    pub fn try_new(len: u32) -> Result<Self> {
        let n = len as usize;
        let bytes = n.saturating_mul(size_of::<u32>());
        let mut parent = Vec::new();
        parent.try_reserve_exact(n).map_err(reserve_failed(bytes))?;
        parent.extend(0..len);
        let mut size = Vec::new();
        size.try_reserve_exact(n).map_err(reserve_failed(bytes))?;
        size.resize(n, 1);
        Ok(Self {
            parent,
            size,
            sets: n,
        })
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether there are no elements
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Number of disjoint sets
    pub fn set_count(&self) -> usize {
        self.sets
    }

    /// Representative of the set containing `x`, or `None` if out of range
    pub fn find(&mut self, mut x: u32) -> Option<u32> {
        loop {
            let parent = *self.parent.get(x as usize)?;
            if parent == x {
                return Some(x);
            }
            let grandparent = *self.parent.get(parent as usize)?;
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
    }

    /// Merges the sets of `a` and `b`. Returns `true` if they were separate.
    pub fn union(&mut self, a: u32, b: u32) -> bool {
        let (Some(ra), Some(rb)) = (self.find(a), self.find(b)) else {
            return false;
        };
        if ra == rb {
            return false;
        }
        let (big, small) = if self.size[ra as usize] >= self.size[rb as usize] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small as usize] = big;
        self.size[big as usize] += self.size[small as usize];
        self.sets -= 1;
        true
    }
}
