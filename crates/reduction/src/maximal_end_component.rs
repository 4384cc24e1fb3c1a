use rustc_hash::FxHashMap;

use pmchecker_model::Block;
use pmchecker_model::ChoiceId;
use pmchecker_model::StateId;

/// A maximal end component: a set of states together with, for each state, the
/// subset of its choices retained by the component.
///
/// Every retained choice at a state has all of its successors inside the
/// component's state set, and the induced subgraph under retained choices is
/// strongly connected.
#[derive(Clone, Debug)]
pub struct MaximalEndComponent {
    states: Block,
    choices: FxHashMap<StateId, Vec<ChoiceId>>,
}

impl MaximalEndComponent {
    /// Creates an empty component over the universe `[0, universe_size)`.
    pub fn new(universe_size: usize) -> Self {
        MaximalEndComponent {
            states: Block::new(universe_size),
            choices: FxHashMap::default(),
        }
    }

    /// Adds `state` to the component with the given retained choices.
    pub fn add_state(&mut self, state: StateId, retained_choices: Vec<ChoiceId>) {
        self.states.insert(state);
        self.choices.insert(state, retained_choices);
    }

    pub fn contains_state(&self, state: StateId) -> bool {
        self.states.contains(state)
    }

    /// Returns the retained choices of `state`, or an empty slice if `state` is
    /// not a member of this component.
    pub fn get_choices(&self, state: StateId) -> &[ChoiceId] {
        self.choices.get(&state).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates the component's member states.
    pub fn states(&self) -> &[StateId] {
        self.states.states()
    }

    /// Returns the total number of retained choices across all member states.
    pub fn choice_count(&self) -> usize {
        self.choices.values().map(Vec::len).sum()
    }
}
