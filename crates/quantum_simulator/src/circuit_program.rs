// =============================================================================
// MACROHARD Quantum Simulator - Circuit Program IR
// =============================================================================
// Table of Contents:
//   1. CircuitInstruction - Gate application or measurement step
//   2. QuantumCircuitStructure - Validated instruction list
//   3. Fluent gate helpers
//   4. Composition (append, inverse)
//   5. build_circuit - Job-layer entry point
// =============================================================================
// Purpose: The circuit program that executions consume. Every instruction is
//          validated against the circuit width when it is added, so nothing
//          that reaches the executor can index outside the state.
// =============================================================================

use crate::error::{InvalidGateError, QuantumResult, QubitIndexError};
use crate::gate_operations::QuantumGate;
use crate::gate_specification::GateSpecification;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

// =============================================================================
// 1. CircuitInstruction - Gate application or measurement step
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CircuitInstruction {
    Gate(QuantumGate),
    /// Mid-circuit measurement: collapses `qubit` and execution continues on
    /// the collapsed state.
    Measure { qubit: usize },
}

impl CircuitInstruction {
    pub fn instruction_name(&self) -> &'static str {
        match self {
            CircuitInstruction::Gate(gate) => gate.gate_name(),
            CircuitInstruction::Measure { .. } => "measure",
        }
    }
}

impl From<QuantumGate> for CircuitInstruction {
    fn from(gate: QuantumGate) -> Self {
        CircuitInstruction::Gate(gate)
    }
}

// =============================================================================
// 2. QuantumCircuitStructure - Validated instruction list
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantumCircuitStructure {
    id: Uuid,
    number_of_quantum_bits: usize,
    instructions: Vec<CircuitInstruction>,
}

impl QuantumCircuitStructure {
    pub fn new(number_of_quantum_bits: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            number_of_quantum_bits,
            instructions: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn number_of_quantum_bits(&self) -> usize {
        self.number_of_quantum_bits
    }

    pub fn instructions(&self) -> &[CircuitInstruction] {
        &self.instructions
    }

    pub fn gates(&self) -> impl Iterator<Item = &QuantumGate> {
        self.instructions.iter().filter_map(|instruction| match instruction {
            CircuitInstruction::Gate(gate) => Some(gate),
            CircuitInstruction::Measure { .. } => None,
        })
    }

    pub fn gate_count(&self) -> usize {
        self.gates().count()
    }

    /// Sequential execution model: depth is the gate count.
    pub fn depth(&self) -> usize {
        self.gate_count()
    }

    pub fn contains_measurement(&self) -> bool {
        self.instructions
            .iter()
            .any(|instruction| matches!(instruction, CircuitInstruction::Measure { .. }))
    }

    pub fn add_gate(&mut self, gate: QuantumGate) -> QuantumResult<&mut Self> {
        self.validate_gate(&gate)?;
        self.instructions.push(CircuitInstruction::Gate(gate));
        Ok(self)
    }

    pub fn add_measurement(&mut self, qubit: usize) -> QuantumResult<&mut Self> {
        self.check_index(qubit)?;
        self.instructions.push(CircuitInstruction::Measure { qubit });
        Ok(self)
    }

    pub fn add_instruction(&mut self, instruction: CircuitInstruction) -> QuantumResult<&mut Self> {
        match instruction {
            CircuitInstruction::Gate(gate) => self.add_gate(gate),
            CircuitInstruction::Measure { qubit } => self.add_measurement(qubit),
        }
    }

    fn check_index(&self, index: usize) -> Result<(), QubitIndexError> {
        if index >= self.number_of_quantum_bits {
            return Err(QubitIndexError::OutOfRange {
                index,
                total: self.number_of_quantum_bits,
            });
        }
        Ok(())
    }

    fn validate_gate(&self, gate: &QuantumGate) -> QuantumResult<()> {
        gate.validate_parameters()?;

        let targets = gate.target_quantum_bits();
        let controls = gate.control_quantum_bits();
        for &index in controls.iter().chain(targets.iter()) {
            self.check_index(index)?;
        }

        let target_set: HashSet<usize> = targets.iter().copied().collect();
        if target_set.len() != targets.len() {
            let duplicate = first_duplicate(&targets).unwrap_or(targets[0]);
            return Err(QubitIndexError::DuplicateQubit(duplicate).into());
        }

        let mut control_set = HashSet::with_capacity(controls.len());
        for &control in &controls {
            if target_set.contains(&control) {
                return Err(QubitIndexError::ControlTargetOverlap(control).into());
            }
            if !control_set.insert(control) {
                return Err(QubitIndexError::DuplicateQubit(control).into());
            }
        }
        Ok(())
    }

    // =========================================================================
    // 3. Fluent gate helpers
    // =========================================================================

    pub fn apply_hadamard_gate(&mut self, qubit: usize) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::Hadamard { target: qubit })
    }

    pub fn apply_pauli_x_gate(&mut self, qubit: usize) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::PauliX { target: qubit })
    }

    pub fn apply_pauli_y_gate(&mut self, qubit: usize) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::PauliY { target: qubit })
    }

    pub fn apply_pauli_z_gate(&mut self, qubit: usize) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::PauliZ { target: qubit })
    }

    pub fn apply_rotation_x_gate(&mut self, qubit: usize, theta: f64) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::RotationX {
            target: qubit,
            theta,
        })
    }

    pub fn apply_rotation_y_gate(&mut self, qubit: usize, theta: f64) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::RotationY {
            target: qubit,
            theta,
        })
    }

    pub fn apply_rotation_z_gate(&mut self, qubit: usize, theta: f64) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::RotationZ {
            target: qubit,
            theta,
        })
    }

    pub fn apply_phase_gate(&mut self, qubit: usize, theta: f64) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::Phase {
            target: qubit,
            theta,
        })
    }

    pub fn apply_controlled_not_gate(
        &mut self,
        control: usize,
        target: usize,
    ) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::ControlledNot { control, target })
    }

    pub fn apply_controlled_z_gate(
        &mut self,
        control: usize,
        target: usize,
    ) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::ControlledZ { control, target })
    }

    pub fn apply_controlled_phase_gate(
        &mut self,
        control: usize,
        target: usize,
        theta: f64,
    ) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::ControlledPhase {
            control,
            target,
            theta,
        })
    }

    pub fn apply_swap_gate(&mut self, qubit_a: usize, qubit_b: usize) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::Swap { qubit_a, qubit_b })
    }

    pub fn apply_toffoli_gate(
        &mut self,
        control_a: usize,
        control_b: usize,
        target: usize,
    ) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::Toffoli {
            control_a,
            control_b,
            target,
        })
    }

    pub fn apply_multi_controlled_z_gate(
        &mut self,
        controls: Vec<usize>,
        target: usize,
    ) -> QuantumResult<&mut Self> {
        self.add_gate(QuantumGate::MultiControlledZ { controls, target })
    }

    // =========================================================================
    // 4. Composition (append, inverse)
    // =========================================================================

    /// Appends every instruction of `other`, which must have the same width.
    pub fn append(&mut self, other: &QuantumCircuitStructure) -> QuantumResult<&mut Self> {
        if other.number_of_quantum_bits != self.number_of_quantum_bits {
            return Err(QubitIndexError::WidthMismatch {
                expected: self.number_of_quantum_bits,
                actual: other.number_of_quantum_bits,
            }
            .into());
        }
        self.instructions.extend(other.instructions.iter().cloned());
        Ok(self)
    }

    /// A new circuit applying the adjoint of every gate in reverse order.
    pub fn inverse(&self) -> QuantumResult<QuantumCircuitStructure> {
        let mut inverse = QuantumCircuitStructure::new(self.number_of_quantum_bits);
        for instruction in self.instructions.iter().rev() {
            match instruction {
                CircuitInstruction::Gate(gate) => {
                    inverse.instructions.push(CircuitInstruction::Gate(gate.inverse()));
                }
                CircuitInstruction::Measure { .. } => {
                    return Err(InvalidGateError::NonInvertibleMeasurement.into());
                }
            }
        }
        Ok(inverse)
    }
}

fn first_duplicate(values: &[usize]) -> Option<usize> {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().copied().find(|value| !seen.insert(*value))
}

// =============================================================================
// 5. build_circuit - Job-layer entry point
// =============================================================================

pub fn build_circuit(
    number_of_quantum_bits: usize,
    gate_specifications: &[GateSpecification],
) -> QuantumResult<QuantumCircuitStructure> {
    let mut circuit = QuantumCircuitStructure::new(number_of_quantum_bits);
    for specification in gate_specifications {
        let instruction = CircuitInstruction::try_from(specification)?;
        circuit.add_instruction(instruction)?;
    }
    Ok(circuit)
}
