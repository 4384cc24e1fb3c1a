use log::trace;

use crate::ChoiceIndex;
use crate::SparseMatrixView;
use crate::StateId;
use crate::Weight;

/// A backward view over a state graph: for each target state, the states that
/// have some choice reaching it.
///
/// Built once per engine invocation via the same two-pass counting-sort idiom
/// used to build a [`CsrMatrix`](crate::CsrMatrix), and reused for every
/// predecessor lookup afterwards instead of scanning the forward view. Entries
/// are not deduplicated: a state with several choices reaching the same
/// successor appears as its predecessor once per such choice, which is
/// harmless for the membership-style worklists that consume this index.
pub struct Predecessors {
    starts: Vec<usize>,
    entries: Vec<StateId>,
}

impl Predecessors {
    /// Builds the backward state-graph view of `matrix`/`choices`.
    pub fn new<W: Weight>(matrix: &impl SparseMatrixView<W>, choices: &ChoiceIndex) -> Self {
        let num_states = choices.num_states();
        trace!("Predecessors::new: building backward view over {num_states} states");

        let mut starts = vec![0usize; num_states + 1];
        for state in 0..num_states {
            for choice in choices.choices(state) {
                for (successor, _) in matrix.row(choice) {
                    starts[successor + 1] += 1;
                }
            }
        }

        for i in 1..starts.len() {
            starts[i] += starts[i - 1];
        }

        let mut cursors = starts.clone();
        let mut entries = vec![0usize; *starts.last().unwrap_or(&0)];
        for state in 0..num_states {
            for choice in choices.choices(state) {
                for (successor, _) in matrix.row(choice) {
                    entries[cursors[successor]] = state;
                    cursors[successor] += 1;
                }
            }
        }

        Predecessors { starts, entries }
    }

    /// Returns the predecessor states of `state`, in no particular order and
    /// possibly containing duplicates.
    pub fn predecessors(&self, state: StateId) -> impl Iterator<Item = StateId> + '_ {
        self.entries[self.starts[state]..self.starts[state + 1]]
            .iter()
            .copied()
    }
}
