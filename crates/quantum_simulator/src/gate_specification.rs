// =============================================================================
// MACROHARD Quantum Simulator - Gate Specification
// =============================================================================
// Table of Contents:
//   1. GateSpecification - Job-layer gate representation
//   2. GateType - Recognized type strings
//   3. Conversion into circuit instructions
// =============================================================================
// Purpose: Accepts the loosely typed gate description the job layer sends
//          ({type, target_qubits, control_qubits?, parameters?}) and turns
//          it into a typed CircuitInstruction. Unknown types and malformed
//          operands are rejected here; index ranges are checked when the
//          instruction is added to a circuit.
// =============================================================================

use crate::circuit_program::CircuitInstruction;
use crate::error::InvalidGateError;
use crate::gate_operations::QuantumGate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// 1. GateSpecification - Job-layer gate representation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSpecification {
    #[serde(rename = "type")]
    pub gate_type: String,
    pub target_qubits: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_qubits: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<GateParameters>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
}

impl GateSpecification {
    pub fn new(gate_type: impl Into<String>, target_qubits: Vec<usize>) -> Self {
        Self {
            gate_type: gate_type.into(),
            target_qubits,
            control_qubits: None,
            parameters: None,
        }
    }

    pub fn with_controls(mut self, control_qubits: Vec<usize>) -> Self {
        self.control_qubits = Some(control_qubits);
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.parameters = Some(GateParameters { angle: Some(angle) });
        self
    }

    fn controls(&self) -> &[usize] {
        self.control_qubits.as_deref().unwrap_or(&[])
    }
}

// =============================================================================
// 2. GateType - Recognized type strings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateType {
    Hadamard,
    PauliX,
    PauliY,
    PauliZ,
    S,
    T,
    RotationX,
    RotationY,
    RotationZ,
    Phase,
    ControlledNot,
    ControlledZ,
    ControlledPhase,
    Swap,
    Toffoli,
    MultiControlledZ,
    Measure,
}

impl FromStr for GateType {
    type Err = InvalidGateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let gate_type = match value.to_ascii_lowercase().as_str() {
            "h" | "hadamard" => GateType::Hadamard,
            "x" | "pauli_x" => GateType::PauliX,
            "y" | "pauli_y" => GateType::PauliY,
            "z" | "pauli_z" => GateType::PauliZ,
            "s" => GateType::S,
            "t" => GateType::T,
            "rx" => GateType::RotationX,
            "ry" => GateType::RotationY,
            "rz" => GateType::RotationZ,
            "p" | "phase" => GateType::Phase,
            "cnot" | "cx" => GateType::ControlledNot,
            "cz" => GateType::ControlledZ,
            "cp" | "cphase" => GateType::ControlledPhase,
            "swap" => GateType::Swap,
            "toffoli" | "ccx" => GateType::Toffoli,
            "mcz" => GateType::MultiControlledZ,
            "measure" => GateType::Measure,
            _ => return Err(InvalidGateError::UnknownGateType(value.to_string())),
        };
        Ok(gate_type)
    }
}

impl GateType {
    pub fn takes_angle(self) -> bool {
        match self {
            GateType::RotationX
            | GateType::RotationY
            | GateType::RotationZ
            | GateType::Phase
            | GateType::ControlledPhase => true,
            GateType::Hadamard
            | GateType::PauliX
            | GateType::PauliY
            | GateType::PauliZ
            | GateType::S
            | GateType::T
            | GateType::ControlledNot
            | GateType::ControlledZ
            | GateType::Swap
            | GateType::Toffoli
            | GateType::MultiControlledZ
            | GateType::Measure => false,
        }
    }
}

// =============================================================================
// 3. Conversion into circuit instructions
// =============================================================================

impl TryFrom<&GateSpecification> for CircuitInstruction {
    type Error = InvalidGateError;

    fn try_from(specification: &GateSpecification) -> Result<Self, Self::Error> {
        let gate_type: GateType = specification.gate_type.parse()?;
        let supplied_angle = specification
            .parameters
            .as_ref()
            .and_then(|parameters| parameters.angle);
        if supplied_angle.is_some() && !gate_type.takes_angle() {
            return Err(InvalidGateError::UnexpectedParameter {
                gate: specification.gate_type.clone(),
                parameter: "angle".to_string(),
            });
        }
        let targets = &specification.target_qubits;
        let controls = specification.controls();

        let expect_operands = |target_count: usize, control_count: usize| {
            if targets.len() != target_count {
                return Err(InvalidGateError::TargetCountMismatch {
                    gate: specification.gate_type.clone(),
                    required: target_count,
                    provided: targets.len(),
                });
            }
            if controls.len() != control_count {
                return Err(InvalidGateError::ControlCountMismatch {
                    gate: specification.gate_type.clone(),
                    required: control_count,
                    provided: controls.len(),
                });
            }
            Ok(())
        };

        let angle = || -> Result<f64, InvalidGateError> {
            let angle = supplied_angle.ok_or_else(|| InvalidGateError::MissingParameter {
                gate: specification.gate_type.clone(),
                parameter: "angle".to_string(),
            })?;
            if !angle.is_finite() {
                return Err(InvalidGateError::NonFiniteParameter {
                    gate: specification.gate_type.clone(),
                    value: angle,
                });
            }
            Ok(angle)
        };

        let gate = match gate_type {
            GateType::Measure => {
                expect_operands(1, 0)?;
                return Ok(CircuitInstruction::Measure { qubit: targets[0] });
            }
            GateType::Hadamard => {
                expect_operands(1, 0)?;
                QuantumGate::Hadamard { target: targets[0] }
            }
            GateType::PauliX => {
                expect_operands(1, 0)?;
                QuantumGate::PauliX { target: targets[0] }
            }
            GateType::PauliY => {
                expect_operands(1, 0)?;
                QuantumGate::PauliY { target: targets[0] }
            }
            GateType::PauliZ => {
                expect_operands(1, 0)?;
                QuantumGate::PauliZ { target: targets[0] }
            }
            GateType::S => {
                expect_operands(1, 0)?;
                QuantumGate::S { target: targets[0] }
            }
            GateType::T => {
                expect_operands(1, 0)?;
                QuantumGate::T { target: targets[0] }
            }
            GateType::RotationX => {
                expect_operands(1, 0)?;
                QuantumGate::RotationX {
                    target: targets[0],
                    theta: angle()?,
                }
            }
            GateType::RotationY => {
                expect_operands(1, 0)?;
                QuantumGate::RotationY {
                    target: targets[0],
                    theta: angle()?,
                }
            }
            GateType::RotationZ => {
                expect_operands(1, 0)?;
                QuantumGate::RotationZ {
                    target: targets[0],
                    theta: angle()?,
                }
            }
            GateType::Phase => {
                expect_operands(1, 0)?;
                QuantumGate::Phase {
                    target: targets[0],
                    theta: angle()?,
                }
            }
            GateType::ControlledNot => {
                expect_operands(1, 1)?;
                QuantumGate::ControlledNot {
                    control: controls[0],
                    target: targets[0],
                }
            }
            GateType::ControlledZ => {
                expect_operands(1, 1)?;
                QuantumGate::ControlledZ {
                    control: controls[0],
                    target: targets[0],
                }
            }
            GateType::ControlledPhase => {
                expect_operands(1, 1)?;
                QuantumGate::ControlledPhase {
                    control: controls[0],
                    target: targets[0],
                    theta: angle()?,
                }
            }
            GateType::Swap => {
                expect_operands(2, 0)?;
                QuantumGate::Swap {
                    qubit_a: targets[0],
                    qubit_b: targets[1],
                }
            }
            GateType::Toffoli => {
                expect_operands(1, 2)?;
                QuantumGate::Toffoli {
                    control_a: controls[0],
                    control_b: controls[1],
                    target: targets[0],
                }
            }
            GateType::MultiControlledZ => {
                expect_operands(1, controls.len())?;
                QuantumGate::MultiControlledZ {
                    controls: controls.to_vec(),
                    target: targets[0],
                }
            }
        };

        Ok(CircuitInstruction::Gate(gate))
    }
}
