// =============================================================================
// MACROHARD Quantum Simulator - Unified Error Types
// =============================================================================
// Table of Contents:
//   1. QuantumSimulatorError - Main error enum
//   2. QubitIndexError - Circuit construction index errors
//   3. InvalidGateError - Gate construction errors
//   4. ResourceLimitError - Pre-allocation limits
//   5. NumericalDriftError - Normalization invariant violations
//   6. ExecutionError - Execution-time errors
//   7. MeasurementError - Measurement errors
// =============================================================================
// Purpose: Unified error handling across the simulator core. Every error is
//          scoped to a single circuit or run; no variant carries shared state.
// =============================================================================

use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// 1. QuantumSimulatorError - Main error enum
// =============================================================================

#[derive(Debug, Error)]
pub enum QuantumSimulatorError {
    #[error("Qubit index error: {0}")]
    QubitIndex(#[from] QubitIndexError),

    #[error("Invalid gate: {0}")]
    InvalidGate(#[from] InvalidGateError),

    #[error("Resource limit: {0}")]
    ResourceLimit(#[from] ResourceLimitError),

    #[error("Numerical drift: {0}")]
    NumericalDrift(#[from] NumericalDriftError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Measurement error: {0}")]
    Measurement(#[from] MeasurementError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timeout after {0} milliseconds")]
    Timeout(u64),
}

impl From<toml::de::Error> for QuantumSimulatorError {
    fn from(err: toml::de::Error) -> Self {
        QuantumSimulatorError::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for QuantumSimulatorError {
    fn from(err: std::io::Error) -> Self {
        QuantumSimulatorError::Configuration(err.to_string())
    }
}

// =============================================================================
// 2. QubitIndexError - Circuit construction index errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QubitIndexError {
    #[error("Invalid qubit index {index}: circuit has {total} qubits")]
    OutOfRange { index: usize, total: usize },

    #[error("Duplicate qubit in gate operands: qubit {0}")]
    DuplicateQubit(usize),

    #[error("Qubit {0} is used as both control and target")]
    ControlTargetOverlap(usize),

    #[error("Circuit width mismatch: expected {expected} qubits, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },
}

// =============================================================================
// 3. InvalidGateError - Gate construction errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidGateError {
    #[error("Matrix is not unitary: max |U^dagger U - I| = {deviation:e}")]
    NonUnitaryMatrix { deviation: f64 },

    #[error("Matrix must be {expected}x{expected}, got {rows}x{columns}")]
    MatrixDimension {
        expected: usize,
        rows: usize,
        columns: usize,
    },

    #[error("Unknown gate type: {0}")]
    UnknownGateType(String),

    #[error("Gate {gate} requires {required} target qubits, but {provided} were provided")]
    TargetCountMismatch {
        gate: String,
        required: usize,
        provided: usize,
    },

    #[error("Gate {gate} requires {required} control qubits, but {provided} were provided")]
    ControlCountMismatch {
        gate: String,
        required: usize,
        provided: usize,
    },

    #[error("Gate {gate} requires parameter '{parameter}'")]
    MissingParameter { gate: String, parameter: String },

    #[error("Gate {gate} does not take parameter '{parameter}'")]
    UnexpectedParameter { gate: String, parameter: String },

    #[error("Gate {gate} has non-finite parameter {value}")]
    NonFiniteParameter { gate: String, value: f64 },

    #[error("Measurement steps cannot be inverted")]
    NonInvertibleMeasurement,
}

// =============================================================================
// 4. ResourceLimitError - Pre-allocation limits
// =============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceLimitError {
    #[error("Circuit too large: {qubits} qubits exceeds maximum {max}")]
    TooManyQubits { qubits: usize, max: usize },
}

// =============================================================================
// 5. NumericalDriftError - Normalization invariant violations
// =============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "Normalization drifted to {norm_squared} after instruction {instruction_index} ({gate_name}), tolerance {tolerance:e}"
)]
pub struct NumericalDriftError {
    pub instruction_index: usize,
    pub gate_name: String,
    pub norm_squared: f64,
    pub tolerance: f64,
}

// =============================================================================
// 6. ExecutionError - Execution-time errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Invalid shot count: {0} (must be > 0)")]
    InvalidShotCount(usize),

    #[error("Execution of circuit {circuit_id} cancelled after {completed}/{total} shots")]
    Cancelled {
        circuit_id: Uuid,
        completed: usize,
        total: usize,
    },

    #[error("Worker failure: {0}")]
    WorkerFailed(String),
}

// =============================================================================
// 7. MeasurementError - Measurement errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeasurementError {
    #[error("Cannot measure qubit {index}: state has {total} qubits")]
    QubitOutOfRange { index: usize, total: usize },

    #[error("Sampled outcome {outcome} on qubit {qubit} has zero probability")]
    ZeroProbabilityOutcome { qubit: usize, outcome: u8 },

    #[error("Invalid amplitude vector: {0}")]
    InvalidAmplitudes(String),
}

// =============================================================================
// Result type alias
// =============================================================================

pub type QuantumResult<T> = Result<T, QuantumSimulatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubit_index_error() {
        let err = QubitIndexError::OutOfRange { index: 5, total: 3 };
        assert!(err.to_string().contains("5"));
        assert!(err.to_string().contains("3"));
    }

    #[test]
    fn test_error_conversion() {
        let limit_err = ResourceLimitError::TooManyQubits { qubits: 30, max: 24 };
        let simulator_err: QuantumSimulatorError = limit_err.into();
        assert!(matches!(
            simulator_err,
            QuantumSimulatorError::ResourceLimit(ResourceLimitError::TooManyQubits {
                qubits: 30,
                ..
            })
        ));
    }

    #[test]
    fn test_drift_error_message() {
        let err = NumericalDriftError {
            instruction_index: 2,
            gate_name: "hadamard_gate".to_string(),
            norm_squared: 1.1,
            tolerance: 1e-9,
        };
        let message = err.to_string();
        assert!(message.contains("hadamard_gate"));
        assert!(message.contains("1.1"));
    }

    #[test]
    fn test_toml_error_becomes_configuration_error() {
        let parsed: Result<toml::Value, _> = toml::from_str("maximum_quantum_bits = ");
        let err: QuantumSimulatorError = parsed.unwrap_err().into();
        assert!(matches!(err, QuantumSimulatorError::Configuration(_)));
    }
}
