use std::ops::Range;

use crate::ChoiceId;
use crate::DecompositionError;
use crate::StateId;

/// Maps a state to the half-open range of choice rows it owns in a
/// [`SparseMatrixView`](crate::SparseMatrixView).
///
/// For a deterministic model this is the identity mapping: one choice row per
/// state. For a nondeterministic model, state `s` owns rows
/// `[starts[s], starts[s + 1])`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceIndex {
    starts: Vec<ChoiceId>,
}

impl ChoiceIndex {
    /// Builds a choice index from an explicit list of per-state choice counts.
    pub fn from_choice_counts(choice_counts: &[usize]) -> Self {
        let mut starts = Vec::with_capacity(choice_counts.len() + 1);
        starts.push(0);
        for &count in choice_counts {
            starts.push(starts.last().unwrap() + count);
        }
        ChoiceIndex { starts }
    }

    /// Builds the identity choice index for a deterministic model with
    /// `num_states` states: state `s` owns exactly row `s`.
    pub fn identity(num_states: usize) -> Self {
        ChoiceIndex {
            starts: (0..=num_states).collect(),
        }
    }

    /// Builds a choice index directly from a raw `starts` vector, validating
    /// that it is a well-formed row-range boundary sequence.
    ///
    /// Unlike [`ChoiceIndex::from_choice_counts`] and
    /// [`ChoiceIndex::identity`], which always produce a monotonic index by
    /// construction, this constructor accepts row boundaries handed over
    /// directly (e.g. deserialized from another system) and so must check
    /// them: `starts` must begin at `0` and be nondecreasing.
    pub fn try_from_starts(starts: Vec<ChoiceId>) -> Result<Self, DecompositionError> {
        if starts.first() != Some(&0) {
            return Err(DecompositionError::NonMonotonicChoiceIndex);
        }
        if starts.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(DecompositionError::NonMonotonicChoiceIndex);
        }

        Ok(ChoiceIndex { starts })
    }

    /// Returns the number of states covered by this index.
    pub fn num_states(&self) -> usize {
        self.starts.len().saturating_sub(1)
    }

    /// Returns the total number of choice rows.
    pub fn num_choices(&self) -> usize {
        *self.starts.last().unwrap_or(&0)
    }

    /// Returns the half-open range of choice rows owned by the given state.
    pub fn choices(&self, state: StateId) -> Range<ChoiceId> {
        self.starts[state]..self.starts[state + 1]
    }

    /// Returns true iff `state` owns at least one choice row.
    pub fn has_choices(&self, state: StateId) -> bool {
        !self.choices(state).is_empty()
    }
}
