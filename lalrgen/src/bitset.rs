// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! Fixed-width terminal bitsets for the LALR engine (§4.E). Every bitset in a
//! computation has the same width (`ntokens`), so union is a plain word-wise
//! OR over same-length `Vec<u64>` buffers rather than a tree structure.

const BITS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBitSet {
    words: Vec<u64>,
    width: usize,
}

impl TokenBitSet {
    pub fn new(width: usize) -> Self {
        Self {
            words: vec![0u64; (width + BITS - 1) / BITS.max(1)],
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn insert(&mut self, index: usize) -> bool {
        debug_assert!(index < self.width);
        let word = index / BITS;
        let bit = 1u64 << (index % BITS);
        let was_set = self.words[word] & bit != 0;
        self.words[word] |= bit;
        !was_set
    }

    pub fn contains(&self, index: usize) -> bool {
        let word = index / BITS;
        let bit = 1u64 << (index % BITS);
        self.words[word] & bit != 0
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Word-parallel union; returns whether any new bit was set (used to drive
    /// the SCC fixed-point loops to quiescence).
    pub fn union_with(&mut self, other: &Self) -> bool {
        debug_assert_eq!(self.width, other.width);
        let mut changed = false;
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            let merged = *a | *b;
            if merged != *a {
                changed = true;
            }
            *a = merged;
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.width).filter(move |i| self.contains(*i))
    }
}

#[cfg(test)]
mod tests {
    use super::TokenBitSet;

    #[test]
    fn insert_reports_novelty() {
        let mut set = TokenBitSet::new(10);
        assert!(set.insert(3));
        assert!(!set.insert(3));
        assert!(set.contains(3));
        assert!(!set.contains(4));
    }

    #[test]
    fn spans_multiple_words() {
        let mut set = TokenBitSet::new(130);
        assert!(set.insert(0));
        assert!(set.insert(63));
        assert!(set.insert(64));
        assert!(set.insert(129));
        let collected: Vec<usize> = set.iter().collect();
        assert_eq!(collected, vec![0, 63, 64, 129]);
    }

    #[test]
    fn union_with_reports_change_and_merges() {
        let mut a = TokenBitSet::new(5);
        let mut b = TokenBitSet::new(5);
        a.insert(1);
        b.insert(1);
        b.insert(2);
        assert!(a.union_with(&b));
        assert!(a.contains(2));
        assert!(!a.union_with(&b));
    }

    #[test]
    fn empty_set_is_empty() {
        let set = TokenBitSet::new(8);
        assert!(set.is_empty());
    }
}
