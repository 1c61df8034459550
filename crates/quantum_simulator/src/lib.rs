// =============================================================================
// MACROHARD Quantum Simulator - Simulator Core
// =============================================================================
// Table of Contents:
//   1. Module Declarations
//   2. Job-layer entry points
//   3. Prelude Module
// =============================================================================
// Purpose: Dense statevector simulation of n-qubit circuits: gate library,
//          typed circuit IR, shot execution with mid-circuit measurement,
//          and algorithm templates (Bell pair, QFT, Grover search).
// =============================================================================

pub mod algorithm_builder;
pub mod async_runtime;
pub mod circuit_program;
pub mod configuration;
pub mod error;
pub mod execution;
pub mod gate_applicator;
pub mod gate_library;
pub mod gate_operations;
pub mod gate_specification;
pub mod measurement;
pub mod state_vector;

pub use algorithm_builder::get_algorithm;
pub use circuit_program::build_circuit;
pub use execution::execute;

pub mod prelude {
    pub use crate::algorithm_builder::*;
    pub use crate::async_runtime::*;
    pub use crate::circuit_program::*;
    pub use crate::configuration::*;
    pub use crate::error::*;
    pub use crate::execution::*;
    pub use crate::gate_library::{UnitarySingleQubitMatrix, UnitaryTwoQubitMatrix};
    pub use crate::gate_operations::*;
    pub use crate::gate_specification::*;
    pub use crate::measurement::*;
    pub use crate::state_vector::*;
}
