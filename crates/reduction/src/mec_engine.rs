use log::debug;
use log::trace;

use pmchecker_model::Block;
use pmchecker_model::ChoiceId;
use pmchecker_model::ChoiceIndex;
use pmchecker_model::Decomposition;
use pmchecker_model::DecompositionError;
use pmchecker_model::Predecessors;
use pmchecker_model::SparseMatrixView;
use pmchecker_model::StateId;
use pmchecker_model::StateSet;
use pmchecker_model::Weight;

use crate::validate_subsystem;
use crate::MaximalEndComponent;
use crate::SccEngine;
use crate::SccOptions;

/// Decomposes `subsystem` into its maximal end components.
///
/// Repeatedly runs [`SccEngine`] over shrinking candidate blocks and prunes
/// states whose every choice leaks out of the candidate, until a full pass
/// leaves every candidate unchanged. Each surviving block is then turned into
/// a [`MaximalEndComponent`] by retaining, at each member state, exactly the
/// choices whose successors all lie inside the block.
///
/// Validates the §7 precondition that `subsystem` is defined over the same
/// universe as `choices` before doing any work; every other precondition
/// (choice index monotonicity, nonnegative weights) is the responsibility of
/// the `ChoiceIndex`/`SparseMatrixView` constructors the caller used to build
/// its inputs.
pub fn mec_decomposition<W: Weight>(
    matrix: &impl SparseMatrixView<W>,
    choices: &ChoiceIndex,
    subsystem: &StateSet,
) -> Result<Decomposition<MaximalEndComponent>, DecompositionError> {
    let num_states = choices.num_states();
    validate_subsystem(subsystem, num_states)?;
    debug!("mec_decomposition: |subsystem| = {}", subsystem.len());

    let mut scc_engine = SccEngine::new(num_states);
    let predecessors = Predecessors::new(matrix, choices);

    let mut worklist: Vec<Block> = Vec::new();
    if !subsystem.is_empty() {
        worklist.push(Block::from_state_set(subsystem.clone()));
    }

    let mut stable_blocks: Vec<Block> = Vec::new();

    while let Some(candidate) = worklist.pop() {
        scc_engine.reset();
        let sccs = scc_engine.decompose(matrix, choices, candidate.as_state_set(), SccOptions::default());

        let mut changed = sccs.len() > 1;
        let mut refined: Vec<Block> = Vec::new();

        for scc in sccs {
            let mut block = scc;
            let pruned_anything = inner_prune(&mut block, matrix, choices, &predecessors);
            changed = changed || pruned_anything;

            if block.is_empty() {
                changed = true;
            } else {
                refined.push(block);
            }
        }

        if changed {
            trace!("mec_decomposition: candidate refined into {} block(s)", refined.len());
            worklist.extend(refined);
        } else {
            debug_assert_eq!(refined.len(), 1, "an unchanged candidate must refine to exactly itself");
            stable_blocks.extend(refined);
        }
    }

    let mecs: Vec<MaximalEndComponent> = stable_blocks
        .into_iter()
        .map(|block| materialize(block, matrix, choices))
        .collect();

    debug!("mec_decomposition: found {} maximal end components", mecs.len());
    Ok(Decomposition::from_blocks(mecs))
}

/// Repeatedly removes, from `block`, every state all of whose choices have a
/// successor outside `block`, and every state newly exposed as such by a
/// previous round's removals — a backward worklist fixpoint over
/// predecessors, the same shape as an attractor computation.
///
/// Returns whether any state was removed.
fn inner_prune<W: Weight>(
    block: &mut Block,
    matrix: &impl SparseMatrixView<W>,
    choices: &ChoiceIndex,
    predecessors: &Predecessors,
) -> bool {
    let mut changed = false;
    let mut to_check: Vec<StateId> = block.states().to_vec();

    while !to_check.is_empty() {
        let to_remove: Vec<StateId> = to_check
            .iter()
            .copied()
            .filter(|&state| leaks_from_every_choice(state, block, matrix, choices))
            .collect();

        if to_remove.is_empty() {
            break;
        }

        changed = true;
        let removed_set = StateSet::from_iter(block.as_state_set().universe_size(), to_remove.iter().copied());
        block.erase(&removed_set);

        to_check = to_remove
            .iter()
            .flat_map(|&removed| predecessors.predecessors(removed))
            .filter(|&predecessor| block.contains(predecessor))
            .collect();
    }

    changed
}

/// True iff every choice of `state` has at least one successor outside
/// `block`. Vacuously true for a state with no choices.
fn leaks_from_every_choice<W: Weight>(
    state: StateId,
    block: &Block,
    matrix: &impl SparseMatrixView<W>,
    choices: &ChoiceIndex,
) -> bool {
    choices
        .choices(state)
        .all(|choice| matrix.row(choice).any(|(successor, _)| !block.contains(successor)))
}

/// Builds a [`MaximalEndComponent`] from a stable block by retaining, at each
/// member state, every choice whose successors all lie inside the block.
fn materialize<W: Weight>(
    block: Block,
    matrix: &impl SparseMatrixView<W>,
    choices: &ChoiceIndex,
) -> MaximalEndComponent {
    let mut mec = MaximalEndComponent::new(block.as_state_set().universe_size());

    for &state in block.states() {
        let retained: Vec<ChoiceId> = choices
            .choices(state)
            .filter(|&choice| matrix.row(choice).all(|(successor, _)| block.contains(successor)))
            .collect();

        debug_assert!(
            !retained.is_empty(),
            "a state surviving the inner prune must retain at least one choice"
        );
        mec.add_state(state, retained);
    }

    mec
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use pmchecker_model::CsrMatrix;

    #[test]
    fn test_mdp_with_leakage_s3() {
        // State 0: c0 -> {0: 1.0}, c1 -> {1: 1.0}. State 1: c2 -> {0: 0.5, 1: 0.5}.
        let edges = || {
            vec![
                (0usize, 0usize, 1.0f64), // c0
                (1, 1, 1.0),              // c1
                (2, 0, 0.5),              // c2
                (2, 1, 0.5),              // c2
            ]
            .into_iter()
        };
        let matrix = CsrMatrix::new(3, edges);
        let choices = ChoiceIndex::from_choice_counts(&[2, 1]);
        let subsystem = StateSet::full(2);

        let decomposition = mec_decomposition(&matrix, &choices, &subsystem).expect("subsystem matches model universe");

        assert_eq!(decomposition.len(), 1);
        let mec = &decomposition[0];
        assert_eq!(mec.states(), &[0, 1]);
        assert_eq!(mec.get_choices(0), &[0, 1]);
        assert_eq!(mec.get_choices(1), &[2]);
    }

    #[test]
    fn test_mdp_with_forced_exit_s4() {
        // State 0: c0 -> {1: 1.0}. State 1: c1 -> {0: 1.0}, c1b -> {2: 1.0}. State 2: c2 -> {2: 1.0}.
        let edges = || {
            vec![
                (0usize, 1usize, 1.0f64), // c0
                (1, 0, 1.0),              // c1
                (2, 2, 1.0),              // c1b
                (3, 2, 1.0),              // c2
            ]
            .into_iter()
        };
        let matrix = CsrMatrix::new(4, edges);
        let choices = ChoiceIndex::from_choice_counts(&[1, 2, 1]);
        let subsystem = StateSet::full(3);

        let decomposition = mec_decomposition(&matrix, &choices, &subsystem).expect("subsystem matches model universe");

        let mut by_first_state: Vec<&MaximalEndComponent> = decomposition.iter().collect();
        by_first_state.sort_by_key(|mec| mec.states()[0]);

        assert_eq!(by_first_state.len(), 2);
        assert_eq!(by_first_state[0].states(), &[0, 1]);
        assert_eq!(by_first_state[0].get_choices(0), &[0]);
        assert_eq!(by_first_state[0].get_choices(1), &[1]);
        assert_eq!(by_first_state[1].states(), &[2]);
        assert_eq!(by_first_state[1].get_choices(2), &[3]);
    }

    #[test]
    fn test_dead_end_s5() {
        // State 0: c0 -> {1: 1.0}. State 1: c1 -> {0: 1.0}, c1b -> {0: 1.0}.
        let edges = || {
            vec![
                (0usize, 1usize, 1.0f64), // c0
                (1, 0, 1.0),              // c1
                (2, 0, 1.0),              // c1b
            ]
            .into_iter()
        };
        let matrix = CsrMatrix::new(3, edges);
        let choices = ChoiceIndex::from_choice_counts(&[1, 2]);
        let subsystem = StateSet::full(2);

        let decomposition = mec_decomposition(&matrix, &choices, &subsystem).expect("subsystem matches model universe");

        assert_eq!(decomposition.len(), 1);
        let mec = &decomposition[0];
        assert_eq!(mec.states(), &[0, 1]);
        assert_eq!(mec.get_choices(0), &[0]);
        assert_eq!(mec.get_choices(1), &[1, 2]);
    }

    #[test]
    fn test_states_leaking_out_of_subsystem_are_dropped() {
        // State 0: c0 -> {1: 1.0}. State 1: c1 -> {2: 1.0}. State 2 is outside the subsystem.
        let edges = || {
            vec![
                (0usize, 1usize, 1.0f64), // c0
                (1, 2, 1.0),              // c1
                (2, 2, 1.0),              // c2, irrelevant: state 2 is excluded
            ]
            .into_iter()
        };
        let matrix = CsrMatrix::new(3, edges);
        let choices = ChoiceIndex::identity(3);
        let subsystem = StateSet::from_iter(3, [0, 1]);

        let decomposition = mec_decomposition(&matrix, &choices, &subsystem).expect("subsystem matches model universe");

        assert!(decomposition.is_empty());
    }

    #[test]
    fn test_empty_subsystem() {
        let edges = || std::iter::empty();
        let matrix: CsrMatrix<f64> = CsrMatrix::new(0, edges);
        let choices = ChoiceIndex::identity(0);
        let subsystem = StateSet::empty(0);

        let decomposition = mec_decomposition(&matrix, &choices, &subsystem).expect("subsystem matches model universe");

        assert!(decomposition.is_empty());
    }

    #[test]
    fn test_subsystem_universe_mismatch_is_a_precondition_violation() {
        let edges = || vec![(0usize, 1usize, 1.0f64), (1, 0, 1.0)].into_iter();
        let matrix = CsrMatrix::new(2, edges);
        let choices = ChoiceIndex::identity(2);
        let subsystem = StateSet::full(3);

        let result = mec_decomposition(&matrix, &choices, &subsystem);

        assert!(matches!(
            result,
            Err(pmchecker_model::DecompositionError::StateOutOfBounds { .. })
        ));
    }
}
