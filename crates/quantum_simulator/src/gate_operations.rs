// =============================================================================
// MACROHARD Quantum Simulator - Gate Operations
// =============================================================================
// Table of Contents:
//   1. QuantumGate - Closed set of supported gates
//   2. Operand and parameter accessors
//   3. Inversion
//   4. Application to the full state vector
// =============================================================================
// Purpose: The finite gate set as one enum, matched exhaustively for
//          naming, operands, inversion and application. Adding a gate is a
//          compile-time checked change in every match below.
// =============================================================================

use crate::error::InvalidGateError;
use crate::gate_applicator::{
    apply_controlled_gate, apply_multi_controlled_gate, apply_single_qubit_gate,
    apply_two_qubit_gate,
};
use crate::gate_library::{self, UnitarySingleQubitMatrix, UnitaryTwoQubitMatrix};
use crate::state_vector::QuantumStateVector;
use serde::{Deserialize, Serialize};

// =============================================================================
// 1. QuantumGate - Closed set of supported gates
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum QuantumGate {
    Hadamard { target: usize },
    PauliX { target: usize },
    PauliY { target: usize },
    PauliZ { target: usize },
    S { target: usize },
    SDagger { target: usize },
    T { target: usize },
    TDagger { target: usize },
    RotationX { target: usize, theta: f64 },
    RotationY { target: usize, theta: f64 },
    RotationZ { target: usize, theta: f64 },
    Phase { target: usize, theta: f64 },
    ControlledNot { control: usize, target: usize },
    ControlledZ { control: usize, target: usize },
    ControlledPhase { control: usize, target: usize, theta: f64 },
    Swap { qubit_a: usize, qubit_b: usize },
    Toffoli { control_a: usize, control_b: usize, target: usize },
    /// Z on `target` conditioned on every control; with no controls it is a
    /// plain Z.
    MultiControlledZ { controls: Vec<usize>, target: usize },
    CustomSingleQubit {
        target: usize,
        matrix: UnitarySingleQubitMatrix,
    },
    CustomTwoQubit {
        qubit_a: usize,
        qubit_b: usize,
        matrix: UnitaryTwoQubitMatrix,
    },
}

impl QuantumGate {
    pub fn custom_single_qubit(
        target: usize,
        matrix: gate_library::SingleQubitMatrix,
    ) -> Result<Self, InvalidGateError> {
        Ok(QuantumGate::CustomSingleQubit {
            target,
            matrix: UnitarySingleQubitMatrix::new(matrix)?,
        })
    }

    pub fn custom_two_qubit(
        qubit_a: usize,
        qubit_b: usize,
        matrix: gate_library::TwoQubitMatrix,
    ) -> Result<Self, InvalidGateError> {
        Ok(QuantumGate::CustomTwoQubit {
            qubit_a,
            qubit_b,
            matrix: UnitaryTwoQubitMatrix::new(matrix)?,
        })
    }

    // =========================================================================
    // 2. Operand and parameter accessors
    // =========================================================================

    pub fn gate_name(&self) -> &'static str {
        match self {
            QuantumGate::Hadamard { .. } => "hadamard_gate",
            QuantumGate::PauliX { .. } => "pauli_x_gate",
            QuantumGate::PauliY { .. } => "pauli_y_gate",
            QuantumGate::PauliZ { .. } => "pauli_z_gate",
            QuantumGate::S { .. } => "s_gate",
            QuantumGate::SDagger { .. } => "s_dagger_gate",
            QuantumGate::T { .. } => "t_gate",
            QuantumGate::TDagger { .. } => "t_dagger_gate",
            QuantumGate::RotationX { .. } => "rotation_x_gate",
            QuantumGate::RotationY { .. } => "rotation_y_gate",
            QuantumGate::RotationZ { .. } => "rotation_z_gate",
            QuantumGate::Phase { .. } => "phase_gate",
            QuantumGate::ControlledNot { .. } => "controlled_not_gate",
            QuantumGate::ControlledZ { .. } => "controlled_z_gate",
            QuantumGate::ControlledPhase { .. } => "controlled_phase_gate",
            QuantumGate::Swap { .. } => "swap_gate",
            QuantumGate::Toffoli { .. } => "toffoli_gate",
            QuantumGate::MultiControlledZ { .. } => "multi_controlled_z_gate",
            QuantumGate::CustomSingleQubit { .. } => "custom_single_qubit_gate",
            QuantumGate::CustomTwoQubit { .. } => "custom_two_qubit_gate",
        }
    }

    /// Qubits the gate's matrix acts on, in operand order.
    pub fn target_quantum_bits(&self) -> Vec<usize> {
        match self {
            QuantumGate::Hadamard { target }
            | QuantumGate::PauliX { target }
            | QuantumGate::PauliY { target }
            | QuantumGate::PauliZ { target }
            | QuantumGate::S { target }
            | QuantumGate::SDagger { target }
            | QuantumGate::T { target }
            | QuantumGate::TDagger { target }
            | QuantumGate::RotationX { target, .. }
            | QuantumGate::RotationY { target, .. }
            | QuantumGate::RotationZ { target, .. }
            | QuantumGate::Phase { target, .. }
            | QuantumGate::ControlledNot { target, .. }
            | QuantumGate::ControlledZ { target, .. }
            | QuantumGate::ControlledPhase { target, .. }
            | QuantumGate::Toffoli { target, .. }
            | QuantumGate::MultiControlledZ { target, .. }
            | QuantumGate::CustomSingleQubit { target, .. } => vec![*target],
            QuantumGate::Swap { qubit_a, qubit_b }
            | QuantumGate::CustomTwoQubit {
                qubit_a, qubit_b, ..
            } => vec![*qubit_a, *qubit_b],
        }
    }

    pub fn control_quantum_bits(&self) -> Vec<usize> {
        match self {
            QuantumGate::ControlledNot { control, .. }
            | QuantumGate::ControlledZ { control, .. }
            | QuantumGate::ControlledPhase { control, .. } => vec![*control],
            QuantumGate::Toffoli {
                control_a,
                control_b,
                ..
            } => vec![*control_a, *control_b],
            QuantumGate::MultiControlledZ { controls, .. } => controls.clone(),
            QuantumGate::Hadamard { .. }
            | QuantumGate::PauliX { .. }
            | QuantumGate::PauliY { .. }
            | QuantumGate::PauliZ { .. }
            | QuantumGate::S { .. }
            | QuantumGate::SDagger { .. }
            | QuantumGate::T { .. }
            | QuantumGate::TDagger { .. }
            | QuantumGate::RotationX { .. }
            | QuantumGate::RotationY { .. }
            | QuantumGate::RotationZ { .. }
            | QuantumGate::Phase { .. }
            | QuantumGate::Swap { .. }
            | QuantumGate::CustomSingleQubit { .. }
            | QuantumGate::CustomTwoQubit { .. } => Vec::new(),
        }
    }

    /// Every qubit the gate touches, controls first.
    pub fn quantum_bits(&self) -> Vec<usize> {
        let mut qubits = self.control_quantum_bits();
        qubits.extend(self.target_quantum_bits());
        qubits
    }

    pub fn angle(&self) -> Option<f64> {
        match self {
            QuantumGate::RotationX { theta, .. }
            | QuantumGate::RotationY { theta, .. }
            | QuantumGate::RotationZ { theta, .. }
            | QuantumGate::Phase { theta, .. }
            | QuantumGate::ControlledPhase { theta, .. } => Some(*theta),
            QuantumGate::Hadamard { .. }
            | QuantumGate::PauliX { .. }
            | QuantumGate::PauliY { .. }
            | QuantumGate::PauliZ { .. }
            | QuantumGate::S { .. }
            | QuantumGate::SDagger { .. }
            | QuantumGate::T { .. }
            | QuantumGate::TDagger { .. }
            | QuantumGate::ControlledNot { .. }
            | QuantumGate::ControlledZ { .. }
            | QuantumGate::Swap { .. }
            | QuantumGate::Toffoli { .. }
            | QuantumGate::MultiControlledZ { .. }
            | QuantumGate::CustomSingleQubit { .. }
            | QuantumGate::CustomTwoQubit { .. } => None,
        }
    }

    pub fn validate_parameters(&self) -> Result<(), InvalidGateError> {
        match self.angle() {
            Some(theta) if !theta.is_finite() => Err(InvalidGateError::NonFiniteParameter {
                gate: self.gate_name().to_string(),
                value: theta,
            }),
            _ => Ok(()),
        }
    }

    // =========================================================================
    // 3. Inversion
    // =========================================================================

    /// The gate's adjoint, so that `inverse` followed by the gate is the
    /// identity.
    pub fn inverse(&self) -> QuantumGate {
        match self {
            QuantumGate::S { target } => QuantumGate::SDagger { target: *target },
            QuantumGate::SDagger { target } => QuantumGate::S { target: *target },
            QuantumGate::T { target } => QuantumGate::TDagger { target: *target },
            QuantumGate::TDagger { target } => QuantumGate::T { target: *target },
            QuantumGate::RotationX { target, theta } => QuantumGate::RotationX {
                target: *target,
                theta: -theta,
            },
            QuantumGate::RotationY { target, theta } => QuantumGate::RotationY {
                target: *target,
                theta: -theta,
            },
            QuantumGate::RotationZ { target, theta } => QuantumGate::RotationZ {
                target: *target,
                theta: -theta,
            },
            QuantumGate::Phase { target, theta } => QuantumGate::Phase {
                target: *target,
                theta: -theta,
            },
            QuantumGate::ControlledPhase {
                control,
                target,
                theta,
            } => QuantumGate::ControlledPhase {
                control: *control,
                target: *target,
                theta: -theta,
            },
            QuantumGate::CustomSingleQubit { target, matrix } => QuantumGate::CustomSingleQubit {
                target: *target,
                matrix: matrix.adjoint(),
            },
            QuantumGate::CustomTwoQubit {
                qubit_a,
                qubit_b,
                matrix,
            } => QuantumGate::CustomTwoQubit {
                qubit_a: *qubit_a,
                qubit_b: *qubit_b,
                matrix: matrix.adjoint(),
            },
            // Self-inverse gates.
            QuantumGate::Hadamard { .. }
            | QuantumGate::PauliX { .. }
            | QuantumGate::PauliY { .. }
            | QuantumGate::PauliZ { .. }
            | QuantumGate::ControlledNot { .. }
            | QuantumGate::ControlledZ { .. }
            | QuantumGate::Swap { .. }
            | QuantumGate::Toffoli { .. }
            | QuantumGate::MultiControlledZ { .. } => self.clone(),
        }
    }

    // =========================================================================
    // 4. Application to the full state vector
    // =========================================================================

    pub fn apply_to_full_state_vector(&self, state: &mut QuantumStateVector) {
        match self {
            QuantumGate::Hadamard { target } => {
                apply_single_qubit_gate(state, *target, &gate_library::hadamard())
            }
            QuantumGate::PauliX { target } => {
                apply_single_qubit_gate(state, *target, &gate_library::pauli_x())
            }
            QuantumGate::PauliY { target } => {
                apply_single_qubit_gate(state, *target, &gate_library::pauli_y())
            }
            QuantumGate::PauliZ { target } => {
                apply_single_qubit_gate(state, *target, &gate_library::pauli_z())
            }
            QuantumGate::S { target } => {
                apply_single_qubit_gate(state, *target, &gate_library::s_gate())
            }
            QuantumGate::SDagger { target } => apply_single_qubit_gate(
                state,
                *target,
                &gate_library::phase(-std::f64::consts::FRAC_PI_2),
            ),
            QuantumGate::T { target } => {
                apply_single_qubit_gate(state, *target, &gate_library::t_gate())
            }
            QuantumGate::TDagger { target } => apply_single_qubit_gate(
                state,
                *target,
                &gate_library::phase(-std::f64::consts::FRAC_PI_4),
            ),
            QuantumGate::RotationX { target, theta } => {
                apply_single_qubit_gate(state, *target, &gate_library::rotation_x(*theta))
            }
            QuantumGate::RotationY { target, theta } => {
                apply_single_qubit_gate(state, *target, &gate_library::rotation_y(*theta))
            }
            QuantumGate::RotationZ { target, theta } => {
                apply_single_qubit_gate(state, *target, &gate_library::rotation_z(*theta))
            }
            QuantumGate::Phase { target, theta } => {
                apply_single_qubit_gate(state, *target, &gate_library::phase(*theta))
            }
            QuantumGate::ControlledNot { control, target } => {
                apply_controlled_gate(state, *control, *target, &gate_library::pauli_x())
            }
            QuantumGate::ControlledZ { control, target } => {
                apply_controlled_gate(state, *control, *target, &gate_library::pauli_z())
            }
            QuantumGate::ControlledPhase {
                control,
                target,
                theta,
            } => apply_controlled_gate(state, *control, *target, &gate_library::phase(*theta)),
            QuantumGate::Swap { qubit_a, qubit_b } => {
                apply_two_qubit_gate(state, *qubit_a, *qubit_b, &gate_library::swap())
            }
            QuantumGate::Toffoli {
                control_a,
                control_b,
                target,
            } => apply_multi_controlled_gate(
                state,
                &[*control_a, *control_b],
                *target,
                &gate_library::pauli_x(),
            ),
            QuantumGate::MultiControlledZ { controls, target } => {
                apply_multi_controlled_gate(state, controls, *target, &gate_library::pauli_z())
            }
            QuantumGate::CustomSingleQubit { target, matrix } => {
                apply_single_qubit_gate(state, *target, matrix.matrix())
            }
            QuantumGate::CustomTwoQubit {
                qubit_a,
                qubit_b,
                matrix,
            } => apply_two_qubit_gate(state, *qubit_a, *qubit_b, matrix.matrix()),
        }
    }
}
