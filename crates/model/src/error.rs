use thiserror::Error;

/// Errors surfaced to callers of the decomposition engines.
///
/// Every input either produces a valid decomposition or one of these terminal
/// errors; there are no recoverable runtime errors inside the engines
/// themselves. Breaches of internal invariants (a Tarjan stack popped more
/// states than it holds, a block with zero retained choices surviving to the
/// final pass) are programming bugs rather than caller errors and are guarded
/// with `debug_assert!`/`unreachable!` instead of a variant here.
#[derive(Error, Debug)]
pub enum DecompositionError {
    #[error("choice index is not monotonically nondecreasing")]
    NonMonotonicChoiceIndex,

    #[error("subsystem references state {state} which is out of bounds for {num_states} states")]
    StateOutOfBounds { state: usize, num_states: usize },

    #[error("edge weight must be nonnegative")]
    NegativeWeight,

    #[error("allocation failed while building decomposition scratch state")]
    ResourceExhaustion,
}
