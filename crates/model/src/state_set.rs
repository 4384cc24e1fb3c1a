use bitvec::bitvec;
use bitvec::order::Lsb0;
use bitvec::vec::BitVec;

use crate::StateId;

/// A compact membership set over `[0, universe_size)`, backed by a bit vector.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StateSet {
    bits: BitVec<usize, Lsb0>,
}

impl StateSet {
    /// Returns the empty set over `[0, universe_size)`.
    pub fn empty(universe_size: usize) -> Self {
        StateSet {
            bits: bitvec![usize, Lsb0; 0; universe_size],
        }
    }

    /// Returns the full set `[0, universe_size)`.
    pub fn full(universe_size: usize) -> Self {
        StateSet {
            bits: bitvec![usize, Lsb0; 1; universe_size],
        }
    }

    /// Builds a set over `[0, universe_size)` containing exactly `states`.
    pub fn from_iter(universe_size: usize, states: impl IntoIterator<Item = StateId>) -> Self {
        let mut set = Self::empty(universe_size);
        for state in states {
            set.insert(state);
        }
        set
    }

    /// Returns the size of the universe this set is defined over.
    pub fn universe_size(&self) -> usize {
        self.bits.len()
    }

    pub fn insert(&mut self, state: StateId) {
        self.bits.set(state, true);
    }

    pub fn remove(&mut self, state: StateId) {
        self.bits.set(state, false);
    }

    pub fn contains(&self, state: StateId) -> bool {
        self.bits[state]
    }

    pub fn is_empty(&self) -> bool {
        !self.bits.any()
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    /// Removes every member of `other` from this set.
    pub fn difference_with(&mut self, other: &StateSet) {
        debug_assert_eq!(self.universe_size(), other.universe_size());

        for (mut bit, other_bit) in self.bits.iter_mut().zip(other.bits.iter()) {
            if *other_bit {
                *bit = false;
            }
        }
    }

    /// Adds every member of `other` to this set.
    pub fn union_with(&mut self, other: &StateSet) {
        debug_assert_eq!(self.universe_size(), other.universe_size());

        for (mut bit, other_bit) in self.bits.iter_mut().zip(other.bits.iter()) {
            if *other_bit {
                *bit = true;
            }
        }
    }

    /// Iterates the set members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.bits.iter_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_insert_contains_remove() {
        let mut set = StateSet::empty(4);
        assert!(set.is_empty());

        set.insert(1);
        set.insert(3);
        assert!(set.contains(1));
        assert!(!set.contains(2));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 3]);

        set.remove(1);
        assert!(!set.contains(1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_union_and_difference() {
        let mut a = StateSet::from_iter(5, [0, 1, 2]);
        let b = StateSet::from_iter(5, [2, 3]);

        let mut union = a.clone();
        union.union_with(&b);
        assert_eq!(union.iter().collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        a.difference_with(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_full_set() {
        let set = StateSet::full(3);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }
}
