//! Word-packed visited sets.
//!
//! [`BitSet`] is owned by a single traversal. [`AtomicBitSet`] is shared by
//! the workers of one parallel traversal and only mutated through
//! [`AtomicBitSet::test_and_set`].

use crate::error::{Result, reserve_failed};
use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = u64::BITS as usize;

#[inline(always)]
fn word_mask(bit: usize) -> (usize, u64) {
    (bit / WORD_BITS, 1u64 << (bit % WORD_BITS))
}

/// A fixed-capacity bit-set, zero-initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSet {
    bits: usize,
    words: Vec<u64>,
}

impl BitSet {
    /// Creates a bit-set holding `bits` bits, all cleared.
    ///
    /// Storage is rounded up to the next whole word.
    pub fn new(bits: usize) -> Self {
        Self {
            bits,
            words: vec![0; bits.div_ceil(WORD_BITS)],
        }
    }

    /// Like [`BitSet::new`], but reports an allocation failure instead of
    /// aborting.
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if the words cannot be reserved.
    pub fn try_new(bits: usize) -> Result<Self> {
        let len = bits.div_ceil(WORD_BITS);
        let mut words = Vec::new();
        words
            .try_reserve_exact(len)
            .map_err(reserve_failed(len.saturating_mul(size_of::<u64>())))?;
        words.resize(len, 0);
        Ok(Self { bits, words })
    }

    /// Number of addressable bits
    pub fn len_bits(&self) -> usize {
        self.bits
    }

    /// Sets `bit`. Out-of-range bits are ignored.
    #[inline]
    pub fn set(&mut self, bit: usize) {
        let (word, mask) = word_mask(bit);
        if bit < self.bits {
            if let Some(w) = self.words.get_mut(word) {
                *w |= mask;
            }
        }
    }

    /// Returns whether `bit` is set. Out-of-range bits read as clear.
    #[inline]
    pub fn test(&self, bit: usize) -> bool {
        let (word, mask) = word_mask(bit);
        bit < self.bits && self.words.get(word).is_some_and(|w| w & mask != 0)
    }

    /// Sets `bit` and returns `true` iff it was previously clear.
    #[inline]
    pub fn test_and_set(&mut self, bit: usize) -> bool {
        let (word, mask) = word_mask(bit);
        if bit >= self.bits {
            return false;
        }
        match self.words.get_mut(word) {
            Some(w) => {
                let was_clear = *w & mask == 0;
                *w |= mask;
                was_clear
            }
            None => false,
        }
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Clears every bit
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Index of the lowest clear bit at or after `from`
    pub fn next_clear(&self, from: usize) -> Option<usize> {
        (from..self.bits).find(|&bit| !self.test(bit))
    }

    /// Iterator over the indices of set bits, ascending
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.bits).filter(|&bit| self.test(bit))
    }
}

/// A word-packed bit-set whose bits can be claimed concurrently.
#[derive(Debug)]
pub struct AtomicBitSet {
    bits: usize,
    words: Vec<AtomicU64>,
}

impl AtomicBitSet {
    /// Creates an atomic bit-set with `bits` bits, all cleared.
    pub fn new(bits: usize) -> Self {
        let words = (0..bits.div_ceil(WORD_BITS))
            .map(|_| AtomicU64::new(0))
            .collect();
        Self { bits, words }
    }

    /// Number of addressable bits
    pub fn len_bits(&self) -> usize {
        self.bits
    }

    /// Returns whether `bit` is set.
    #[inline]
    pub fn test(&self, bit: usize) -> bool {
        if bit >= self.bits {
            return false;
        }
        let (word, mask) = word_mask(bit);
        self.words
            .get(word)
            .is_some_and(|w| w.load(Ordering::Acquire) & mask != 0)
    }

    /// Atomically sets `bit` and returns `true` iff this call observed it clear.
    ///
    /// Exactly one caller wins for each bit, however many race on it.
    #[inline]
    pub fn test_and_set(&self, bit: usize) -> bool {
        let (word, mask) = word_mask(bit);
        if bit >= self.bits {
            return false;
        }
        match self.words.get(word) {
            Some(w) => w.fetch_or(mask, Ordering::AcqRel) & mask == 0,
            None => false,
        }
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Acquire).count_ones() as usize)
            .sum()
    }

    /// Converts into a plain bit-set once every worker has finished.
    pub fn into_bitset(self) -> BitSet {
        BitSet {
            bits: self.bits,
            words: self.words.into_iter().map(AtomicU64::into_inner).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_starts_cleared() {
        let set = BitSet::new(130);
        assert_eq!(set.len_bits(), 130);
        assert_eq!(set.count_ones(), 0);
        assert!((0..130).all(|bit| !set.test(bit)));
    }

    #[test]
    fn test_try_new_reports_out_of_memory() {
        let set = BitSet::try_new(130).unwrap();
        assert_eq!(set, BitSet::new(130));

        let err = BitSet::try_new(usize::MAX).unwrap_err();
        assert!(matches!(err, crate::Error::OutOfMemory { .. }));
    }

    #[test]
    fn test_set_and_test() {
        let mut set = BitSet::new(100);
        set.set(0);
        set.set(63);
        set.set(64);
        set.set(99);

        assert!(set.test(0) && set.test(63) && set.test(64) && set.test(99));
        assert!(!set.test(1));
        assert_eq!(set.count_ones(), 4);
        assert_eq!(set.iter_ones().collect::<Vec<_>>(), vec![0, 63, 64, 99]);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut set = BitSet::new(10);
        set.set(10);
        set.set(1000);
        assert!(!set.test(10));
        assert!(!set.test_and_set(1000));
        assert_eq!(set.count_ones(), 0);
    }

    #[test]
    fn test_test_and_set_reports_first_claim() {
        let mut set = BitSet::new(8);
        assert!(set.test_and_set(3));
        assert!(!set.test_and_set(3));
        assert!(set.test(3));
    }

    #[test]
    fn test_next_clear() {
        let mut set = BitSet::new(5);
        set.set(0);
        set.set(1);
        set.set(3);
        assert_eq!(set.next_clear(0), Some(2));
        assert_eq!(set.next_clear(3), Some(4));
        set.set(4);
        assert_eq!(set.next_clear(3), None);
    }

    #[test]
    fn test_clear() {
        let mut set = BitSet::new(70);
        set.set(69);
        set.clear();
        assert_eq!(set.count_ones(), 0);
    }

    #[test]
    fn test_atomic_single_winner() {
        let set = Arc::new(AtomicBitSet::new(1024));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let set = Arc::clone(&set);
                thread::spawn(move || (0..1024).filter(|&bit| set.test_and_set(bit)).count())
            })
            .collect();

        let wins: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(wins, 1024, "each bit must be claimed exactly once");
        assert_eq!(set.count_ones(), 1024);
    }

    #[test]
    fn test_atomic_into_bitset() {
        let set = AtomicBitSet::new(65);
        assert!(set.test_and_set(64));
        assert!(!set.test_and_set(64));
        assert!(set.test(64));

        let plain = set.into_bitset();
        assert!(plain.test(64));
        assert_eq!(plain.count_ones(), 1);
        assert_eq!(plain.len_bits(), 65);
    }
}
