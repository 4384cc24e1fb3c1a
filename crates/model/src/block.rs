use crate::StateId;
use crate::StateSet;

/// A set of states with fast membership testing, stable insertion-order
/// iteration, and bulk removal.
///
/// Used as the working representation of a single component — an SCC or an MEC
/// candidate block — during decomposition.
#[derive(Clone, Debug)]
pub struct Block {
    members: StateSet,
    order: Vec<StateId>,
}

impl Block {
    /// Returns an empty block over the universe `[0, universe_size)`.
    pub fn new(universe_size: usize) -> Self {
        Block {
            members: StateSet::empty(universe_size),
            order: Vec::new(),
        }
    }

    /// Builds a block from an existing state set, in ascending member order.
    pub fn from_state_set(set: StateSet) -> Self {
        let order = set.iter().collect();
        Block { members: set, order }
    }

    pub fn insert(&mut self, state: StateId) {
        if !self.members.contains(state) {
            self.members.insert(state);
            self.order.push(state);
        }
    }

    pub fn contains(&self, state: StateId) -> bool {
        self.members.contains(state)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates the block's members in insertion order.
    pub fn states(&self) -> &[StateId] {
        &self.order
    }

    pub fn as_state_set(&self) -> &StateSet {
        &self.members
    }

    /// Removes every member of `removed` from this block in one pass.
    pub fn erase(&mut self, removed: &StateSet) {
        self.members.difference_with(removed);
        self.order.retain(|state| !removed.contains(*state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_insert_is_idempotent_and_preserves_order() {
        let mut block = Block::new(5);
        block.insert(3);
        block.insert(1);
        block.insert(3);

        assert_eq!(block.states(), &[3, 1]);
        assert_eq!(block.len(), 2);
    }

    #[test]
    fn test_erase_removes_members_in_one_pass() {
        let mut block = Block::new(5);
        for state in [0, 1, 2, 3, 4] {
            block.insert(state);
        }

        let removed = StateSet::from_iter(5, [1, 3]);
        block.erase(&removed);

        assert_eq!(block.states(), &[0, 2, 4]);
        assert!(!block.contains(1));
        assert!(block.contains(2));
    }
}
