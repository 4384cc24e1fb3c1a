//!
//! Graph-structural decomposition algorithms: strongly connected component
//! decomposition and maximal end component decomposition, built on top of the
//! sparse matrix and set data structures of `pmchecker-model`.
//!

mod mec_engine;
mod maximal_end_component;
mod scc_engine;

pub use mec_engine::*;
pub use maximal_end_component::*;
pub use scc_engine::*;

use pmchecker_model::DecompositionError;
use pmchecker_model::StateSet;

/// Checks the §7 precondition that `subsystem` is defined over the same
/// universe as the model it is about to be analyzed against.
fn validate_subsystem(subsystem: &StateSet, num_states: usize) -> Result<(), DecompositionError> {
    if subsystem.universe_size() != num_states {
        return Err(DecompositionError::StateOutOfBounds {
            state: subsystem.universe_size(),
            num_states,
        });
    }
    Ok(())
}
