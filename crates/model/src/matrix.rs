use std::fmt;

use crate::ChoiceId;
use crate::DecompositionError;
use crate::StateId;

/// A nonnegative edge weight attached to a successor of a choice row.
///
/// Probabilities are the typical instantiation, but exact rationals or other
/// numeric representations are equally valid: the decomposition engines never
/// perform arithmetic on a weight, they only ever test whether one is positive.
pub trait Weight: Copy + Default {
    /// Returns true iff this weight denotes an edge that actually exists.
    fn is_positive(&self) -> bool;

    /// Returns true iff this weight is a well-formed (nonnegative) value.
    ///
    /// Opaque weight types (symbolic functions, etc.) that have no notion of
    /// sign may simply always return true here; only concrete numeric
    /// instantiations are expected to reject negative values.
    fn is_nonnegative(&self) -> bool {
        true
    }
}

impl Weight for f64 {
    fn is_positive(&self) -> bool {
        *self > 0.0
    }

    fn is_nonnegative(&self) -> bool {
        *self >= 0.0
    }
}

impl Weight for f32 {
    fn is_positive(&self) -> bool {
        *self > 0.0
    }

    fn is_nonnegative(&self) -> bool {
        *self >= 0.0
    }
}

/// Read-only, row-indexed access to a sparse matrix of `(successor, weight)`
/// pairs.
///
/// A row corresponds to a single choice: for a deterministic model there is one
/// row per state, for a nondeterministic model a state owns a contiguous range
/// of rows as described by a [`ChoiceIndex`](crate::ChoiceIndex).
pub trait SparseMatrixView<W: Weight> {
    /// Returns the number of rows in the matrix.
    fn num_rows(&self) -> usize;

    /// Returns the successors of the given row that have positive weight.
    fn row(&self, row: ChoiceId) -> impl Iterator<Item = (StateId, W)> + '_;
}

#[derive(Clone, Copy, Debug, Default)]
struct Entry<W> {
    successor: StateId,
    weight: W,
}

/// A matrix built once from an edge iterator and stored as a flat compressed
/// sparse row structure: a `starts` offset per row into a flat `entries` array.
#[derive(Clone)]
pub struct CsrMatrix<W> {
    starts: Vec<usize>,
    entries: Vec<Entry<W>>,
}

impl<W: Weight> CsrMatrix<W> {
    /// Builds a matrix with `num_rows` rows from the given edge iterator
    /// factory.
    ///
    /// `edges` is called twice: once to count the number of positive-weight
    /// entries per row, and once more to place them at their final offsets.
    /// This is the same two-pass counting-sort construction used elsewhere in
    /// this workspace to build transition tables.
    pub fn new<I, F>(num_rows: usize, edges: F) -> Self
    where
        F: Fn() -> I,
        I: Iterator<Item = (ChoiceId, StateId, W)>,
    {
        let mut starts = vec![0usize; num_rows + 1];
        let mut num_entries = 0;
        for (row, _, weight) in edges() {
            if weight.is_positive() {
                starts[row + 1] += 1;
                num_entries += 1;
            }
        }

        for i in 1..starts.len() {
            starts[i] += starts[i - 1];
        }

        let mut cursors = starts.clone();
        let mut entries = vec![Entry::default(); num_entries];
        for (row, successor, weight) in edges() {
            if weight.is_positive() {
                entries[cursors[row]] = Entry { successor, weight };
                cursors[row] += 1;
            }
        }

        CsrMatrix { starts, entries }
    }

    /// Like [`CsrMatrix::new`], but validates every weight as it is counted
    /// and fails fast with [`DecompositionError::NegativeWeight`] on the
    /// first negative one instead of silently admitting it.
    ///
    /// `new` stays infallible for callers (benchmarks, random-graph test
    /// generators) that already know their weights are well-formed and do
    /// not want to thread a `Result` through construction; `try_new` is for
    /// callers building a matrix from untrusted or externally supplied data.
    pub fn try_new<I, F>(num_rows: usize, edges: F) -> Result<Self, DecompositionError>
    where
        F: Fn() -> I,
        I: Iterator<Item = (ChoiceId, StateId, W)>,
    {
        for (_, _, weight) in edges() {
            if !weight.is_nonnegative() {
                return Err(DecompositionError::NegativeWeight);
            }
        }

        Ok(Self::new(num_rows, edges))
    }
}

impl<W: Weight> SparseMatrixView<W> for CsrMatrix<W> {
    fn num_rows(&self) -> usize {
        self.starts.len().saturating_sub(1)
    }

    fn row(&self, row: ChoiceId) -> impl Iterator<Item = (StateId, W)> + '_ {
        self.entries[self.starts[row]..self.starts[row + 1]]
            .iter()
            .map(|entry| (entry.successor, entry.weight))
    }
}

impl<W> fmt::Debug for CsrMatrix<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CsrMatrix {{ rows: {}, entries: {} }}",
            self.starts.len().saturating_sub(1),
            self.entries.len()
        )
    }
}
