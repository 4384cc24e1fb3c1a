use log::debug;
use log::trace;

use pmchecker_model::Block;
use pmchecker_model::ChoiceIndex;
use pmchecker_model::Decomposition;
use pmchecker_model::DecompositionError;
use pmchecker_model::SparseMatrixView;
use pmchecker_model::StateId;
use pmchecker_model::StateSet;
use pmchecker_model::Weight;

use crate::validate_subsystem;

/// Options controlling which components a [`SccEngine`] retains.
#[derive(Clone, Copy, Debug, Default)]
pub struct SccOptions {
    /// Omit singleton components without a self-loop.
    pub drop_trivial: bool,

    /// Retain only components with no outgoing edge to a state outside the
    /// component.
    pub bottom_only: bool,
}

/// One stack frame of the iterative depth-first traversal: the state under
/// examination, its flattened successor list (restricted to the subsystem, over
/// every choice it owns), and a cursor into that list.
struct Frame {
    state: StateId,
    successors: Vec<StateId>,
    cursor: usize,
}

/// Computes strongly connected components of the state graph induced by a
/// sparse matrix and choice index, restricted to a subsystem.
///
/// Uses an explicit two-stack (frame stack plus open-path stack) variant of
/// Tarjan's algorithm so that the traversal never recurses through the host
/// call stack, regardless of the size of the graph. Owns its scratch buffers
/// and reuses them across repeated calls via [`SccEngine::reset`], so that a
/// caller invoking this once per candidate block (as the MEC fixpoint does)
/// does not pay an allocation per invocation.
pub struct SccEngine {
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: StateSet,
    touched: Vec<StateId>,
    index_counter: usize,
    path: Vec<StateId>,
    frames: Vec<Frame>,
    membership_scratch: StateSet,
}

impl SccEngine {
    /// Creates an engine with scratch state sized for `num_states` states.
    pub fn new(num_states: usize) -> Self {
        SccEngine {
            index: vec![None; num_states],
            lowlink: vec![0; num_states],
            on_stack: StateSet::empty(num_states),
            touched: Vec::new(),
            index_counter: 0,
            path: Vec::new(),
            frames: Vec::new(),
            membership_scratch: StateSet::empty(num_states),
        }
    }

    /// Clears scratch state touched by the previous call, without
    /// reallocating. Safe to call even if the previous call already ran to
    /// completion (which already leaves `path`/`frames` empty).
    pub fn reset(&mut self) {
        for &state in &self.touched {
            self.index[state] = None;
        }
        self.touched.clear();
        self.index_counter = 0;
        self.path.clear();
        self.frames.clear();
    }

    /// Decomposes the subgraph of `subsystem` into strongly connected
    /// components, honoring `options`.
    pub fn decompose<W: Weight>(
        &mut self,
        matrix: &impl SparseMatrixView<W>,
        choices: &ChoiceIndex,
        subsystem: &StateSet,
        options: SccOptions,
    ) -> Decomposition<Block> {
        trace!(
            "SccEngine::decompose: |subsystem| = {}, options = {:?}",
            subsystem.len(),
            options
        );
        let num_states = choices.num_states();
        debug_assert_eq!(subsystem.universe_size(), num_states);

        let mut blocks = Vec::new();

        for start in subsystem.iter() {
            if self.index[start].is_some() {
                continue;
            }

            self.descend(start, matrix, choices, subsystem);

            while let Some(frame) = self.frames.last_mut() {
                if frame.cursor < frame.successors.len() {
                    let successor = frame.successors[frame.cursor];
                    frame.cursor += 1;
                    let current = frame.state;

                    if self.index[successor].is_none() {
                        self.descend(successor, matrix, choices, subsystem);
                    } else if self.on_stack.contains(successor) {
                        let successor_index = self.index[successor].expect("just checked Some");
                        self.lowlink[current] = self.lowlink[current].min(successor_index);
                    }
                } else {
                    let finished = self.frames.pop().expect("frame stack nonempty by loop guard");
                    let v = finished.state;

                    if let Some(parent) = self.frames.last() {
                        let parent_state = parent.state;
                        self.lowlink[parent_state] = self.lowlink[parent_state].min(self.lowlink[v]);
                    }

                    if self.lowlink[v] == self.index[v].expect("v was visited") {
                        let mut members = Vec::new();
                        loop {
                            let w = self.path.pop().expect("v is on the open path");
                            self.on_stack.remove(w);
                            members.push(w);
                            if w == v {
                                break;
                            }
                        }

                        if self.should_keep(&members, matrix, choices, subsystem, options) {
                            blocks.push(Block::from_state_set(StateSet::from_iter(
                                num_states,
                                members,
                            )));
                        }
                    }
                }
            }
        }

        debug!("SccEngine::decompose: found {} retained components", blocks.len());
        blocks.sort_by_key(|block| block.states().iter().copied().min().unwrap_or(0));
        Decomposition::from_blocks(blocks)
    }

    fn descend<W: Weight>(
        &mut self,
        state: StateId,
        matrix: &impl SparseMatrixView<W>,
        choices: &ChoiceIndex,
        subsystem: &StateSet,
    ) {
        let assigned_index = self.index_counter;
        self.index_counter += 1;

        self.index[state] = Some(assigned_index);
        self.lowlink[state] = assigned_index;
        self.path.push(state);
        self.on_stack.insert(state);
        self.touched.push(state);

        let successors = successors_of(state, matrix, choices, subsystem);
        self.frames.push(Frame {
            state,
            successors,
            cursor: 0,
        });
    }

    fn should_keep<W: Weight>(
        &mut self,
        members: &[StateId],
        matrix: &impl SparseMatrixView<W>,
        choices: &ChoiceIndex,
        subsystem: &StateSet,
        options: SccOptions,
    ) -> bool {
        if options.drop_trivial && members.len() == 1 {
            let only = members[0];
            let has_self_loop = successors_of(only, matrix, choices, subsystem)
                .into_iter()
                .any(|successor| successor == only);
            if !has_self_loop {
                return false;
            }
        }

        if options.bottom_only {
            for &member in members {
                self.membership_scratch.insert(member);
            }
            let is_bottom = members.iter().all(|&member| {
                successors_of(member, matrix, choices, subsystem)
                    .into_iter()
                    .all(|successor| self.membership_scratch.contains(successor))
            });
            for &member in members {
                self.membership_scratch.remove(member);
            }
            if !is_bottom {
                return false;
            }
        }

        true
    }
}

/// Validated, one-shot entry point for strongly connected component
/// decomposition.
///
/// Checks the §7 precondition that `subsystem` is defined over the same
/// universe as `choices` before building a fresh [`SccEngine`] and running
/// it once. Callers that invoke [`SccEngine::decompose`] repeatedly on
/// shrinking candidates of an already-validated universe (as [`MecEngine`]
/// does internally) should construct and reuse an [`SccEngine`] directly
/// instead, to avoid re-validating and reallocating scratch state on every
/// call.
///
/// [`MecEngine`]: crate::mec_decomposition
pub fn scc_decomposition<W: Weight>(
    matrix: &impl SparseMatrixView<W>,
    choices: &ChoiceIndex,
    subsystem: &StateSet,
    options: SccOptions,
) -> Result<Decomposition<Block>, DecompositionError> {
    validate_subsystem(subsystem, choices.num_states())?;

    let mut engine = SccEngine::new(choices.num_states());
    Ok(engine.decompose(matrix, choices, subsystem, options))
}

/// Flattens the successors of `state` over every choice it owns, restricted to
/// `subsystem`.
fn successors_of<W: Weight>(
    state: StateId,
    matrix: &impl SparseMatrixView<W>,
    choices: &ChoiceIndex,
    subsystem: &StateSet,
) -> Vec<StateId> {
    let mut successors = Vec::new();
    for choice in choices.choices(state) {
        for (successor, _) in matrix.row(choice) {
            if subsystem.contains(successor) {
                successors.push(successor);
            }
        }
    }
    successors
}
