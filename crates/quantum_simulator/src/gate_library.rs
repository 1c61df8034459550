// =============================================================================
// MACROHARD Quantum Simulator - Gate Library
// =============================================================================
// Table of Contents:
//   1. Matrix type aliases and constants
//   2. Single-qubit gate matrices (H, X, Y, Z, S, T, rotations, phase)
//   3. Two-qubit gate matrices (CNOT, CZ, CPhase, SWAP)
//   4. Unitarity validation
//   5. Validated unitary wrappers for custom gates
// =============================================================================
// Purpose: Canonical unitary matrices for the supported gate set and the
//          matrix-level validation applied to user-supplied gates.
//          Two-qubit matrices use the local basis |q_a q_b>, i.e. local
//          index = 2 * bit_a + bit_b.
// =============================================================================

use crate::error::InvalidGateError;
use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;

// =============================================================================
// 1. Matrix type aliases and constants
// =============================================================================

pub type SingleQubitMatrix = [[Complex64; 2]; 2];
pub type TwoQubitMatrix = [[Complex64; 4]; 4];

/// Maximum element-wise deviation of `U^dagger U` from the identity that
/// still counts as unitary.
pub const UNITARITY_TOLERANCE: f64 = 1e-10;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

// =============================================================================
// 2. Single-qubit gate matrices
// =============================================================================

pub fn hadamard() -> SingleQubitMatrix {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    [[h, h], [h, -h]]
}

pub fn pauli_x() -> SingleQubitMatrix {
    [[ZERO, ONE], [ONE, ZERO]]
}

pub fn pauli_y() -> SingleQubitMatrix {
    [
        [ZERO, Complex64::new(0.0, -1.0)],
        [Complex64::new(0.0, 1.0), ZERO],
    ]
}

pub fn pauli_z() -> SingleQubitMatrix {
    [[ONE, ZERO], [ZERO, -ONE]]
}

/// S = diag(1, i).
pub fn s_gate() -> SingleQubitMatrix {
    phase(std::f64::consts::FRAC_PI_2)
}

/// T = diag(1, e^{i pi/4}).
pub fn t_gate() -> SingleQubitMatrix {
    phase(std::f64::consts::FRAC_PI_4)
}

pub fn rotation_x(theta: f64) -> SingleQubitMatrix {
    let cos_half = Complex64::new((theta / 2.0).cos(), 0.0);
    let minus_i_sin_half = Complex64::new(0.0, -(theta / 2.0).sin());
    [[cos_half, minus_i_sin_half], [minus_i_sin_half, cos_half]]
}

pub fn rotation_y(theta: f64) -> SingleQubitMatrix {
    let cos_half = (theta / 2.0).cos();
    let sin_half = (theta / 2.0).sin();
    [
        [Complex64::new(cos_half, 0.0), Complex64::new(-sin_half, 0.0)],
        [Complex64::new(sin_half, 0.0), Complex64::new(cos_half, 0.0)],
    ]
}

pub fn rotation_z(theta: f64) -> SingleQubitMatrix {
    [
        [Complex64::from_polar(1.0, -theta / 2.0), ZERO],
        [ZERO, Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

/// Phase gate diag(1, e^{i theta}).
pub fn phase(theta: f64) -> SingleQubitMatrix {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, theta)]]
}

// =============================================================================
// 3. Two-qubit gate matrices
// =============================================================================

/// CNOT with qubit_a as control and qubit_b as target.
pub fn controlled_not() -> TwoQubitMatrix {
    [
        [ONE, ZERO, ZERO, ZERO],
        [ZERO, ONE, ZERO, ZERO],
        [ZERO, ZERO, ZERO, ONE],
        [ZERO, ZERO, ONE, ZERO],
    ]
}

pub fn controlled_z() -> TwoQubitMatrix {
    controlled_phase(std::f64::consts::PI)
}

pub fn controlled_phase(theta: f64) -> TwoQubitMatrix {
    [
        [ONE, ZERO, ZERO, ZERO],
        [ZERO, ONE, ZERO, ZERO],
        [ZERO, ZERO, ONE, ZERO],
        [ZERO, ZERO, ZERO, Complex64::from_polar(1.0, theta)],
    ]
}

pub fn swap() -> TwoQubitMatrix {
    [
        [ONE, ZERO, ZERO, ZERO],
        [ZERO, ZERO, ONE, ZERO],
        [ZERO, ONE, ZERO, ZERO],
        [ZERO, ZERO, ZERO, ONE],
    ]
}

/// Embeds a single-qubit matrix acting on qubit_b under a control on
/// qubit_a.
pub fn controlled(matrix: &SingleQubitMatrix) -> TwoQubitMatrix {
    [
        [ONE, ZERO, ZERO, ZERO],
        [ZERO, ONE, ZERO, ZERO],
        [ZERO, ZERO, matrix[0][0], matrix[0][1]],
        [ZERO, ZERO, matrix[1][0], matrix[1][1]],
    ]
}

// =============================================================================
// 4. Unitarity validation
// =============================================================================

pub fn single_qubit_to_array(matrix: &SingleQubitMatrix) -> Array2<Complex64> {
    Array2::from_shape_fn((2, 2), |(row, column)| matrix[row][column])
}

pub fn two_qubit_to_array(matrix: &TwoQubitMatrix) -> Array2<Complex64> {
    Array2::from_shape_fn((4, 4), |(row, column)| matrix[row][column])
}

/// Largest element-wise magnitude of `U^dagger U - I`.
pub fn unitarity_deviation(matrix: &Array2<Complex64>) -> f64 {
    let adjoint = matrix.t().mapv(|value| value.conj());
    let product = adjoint.dot(matrix);
    let identity = Array2::<Complex64>::eye(matrix.nrows());
    (&product - &identity)
        .iter()
        .map(|value| value.norm())
        .fold(0.0, f64::max)
}

pub fn validate_unitary(matrix: &Array2<Complex64>) -> Result<(), InvalidGateError> {
    let (rows, columns) = matrix.dim();
    if rows == 0 || rows != columns || !rows.is_power_of_two() {
        return Err(InvalidGateError::MatrixDimension {
            expected: rows.max(1).next_power_of_two(),
            rows,
            columns,
        });
    }
    if matrix.iter().any(|value| !value.re.is_finite() || !value.im.is_finite()) {
        return Err(InvalidGateError::NonUnitaryMatrix {
            deviation: f64::INFINITY,
        });
    }

    let deviation = unitarity_deviation(matrix);
    if deviation > UNITARITY_TOLERANCE {
        return Err(InvalidGateError::NonUnitaryMatrix { deviation });
    }
    Ok(())
}

pub fn adjoint_single_qubit(matrix: &SingleQubitMatrix) -> SingleQubitMatrix {
    [
        [matrix[0][0].conj(), matrix[1][0].conj()],
        [matrix[0][1].conj(), matrix[1][1].conj()],
    ]
}

pub fn adjoint_two_qubit(matrix: &TwoQubitMatrix) -> TwoQubitMatrix {
    let mut adjoint = [[ZERO; 4]; 4];
    for (row, values) in matrix.iter().enumerate() {
        for (column, value) in values.iter().enumerate() {
            adjoint[column][row] = value.conj();
        }
    }
    adjoint
}

// =============================================================================
// 5. Validated unitary wrappers for custom gates
// =============================================================================

/// A 2x2 matrix that passed unitarity validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitarySingleQubitMatrix(SingleQubitMatrix);

impl UnitarySingleQubitMatrix {
    pub fn new(matrix: SingleQubitMatrix) -> Result<Self, InvalidGateError> {
        validate_unitary(&single_qubit_to_array(&matrix))?;
        Ok(Self(matrix))
    }

    pub fn from_array(matrix: &Array2<Complex64>) -> Result<Self, InvalidGateError> {
        if matrix.dim() != (2, 2) {
            return Err(InvalidGateError::MatrixDimension {
                expected: 2,
                rows: matrix.nrows(),
                columns: matrix.ncols(),
            });
        }
        Self::new([
            [matrix[[0, 0]], matrix[[0, 1]]],
            [matrix[[1, 0]], matrix[[1, 1]]],
        ])
    }

    pub fn matrix(&self) -> &SingleQubitMatrix {
        &self.0
    }

    pub fn adjoint(&self) -> Self {
        Self(adjoint_single_qubit(&self.0))
    }
}

/// A 4x4 matrix that passed unitarity validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitaryTwoQubitMatrix(TwoQubitMatrix);

impl UnitaryTwoQubitMatrix {
    pub fn new(matrix: TwoQubitMatrix) -> Result<Self, InvalidGateError> {
        validate_unitary(&two_qubit_to_array(&matrix))?;
        Ok(Self(matrix))
    }

    pub fn from_array(matrix: &Array2<Complex64>) -> Result<Self, InvalidGateError> {
        if matrix.dim() != (4, 4) {
            return Err(InvalidGateError::MatrixDimension {
                expected: 4,
                rows: matrix.nrows(),
                columns: matrix.ncols(),
            });
        }
        let mut values = [[ZERO; 4]; 4];
        for ((row, column), value) in matrix.indexed_iter() {
            values[row][column] = *value;
        }
        Self::new(values)
    }

    pub fn matrix(&self) -> &TwoQubitMatrix {
        &self.0
    }

    pub fn adjoint(&self) -> Self {
        Self(adjoint_two_qubit(&self.0))
    }
}

// Deserialization re-runs validation so a payload cannot smuggle in a
// non-unitary matrix.
impl<'de> Deserialize<'de> for UnitarySingleQubitMatrix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let matrix = SingleQubitMatrix::deserialize(deserializer)?;
        Self::new(matrix).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for UnitaryTwoQubitMatrix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let matrix = TwoQubitMatrix::deserialize(deserializer)?;
        Self::new(matrix).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_canonical_gates_are_unitary() {
        let singles = [
            hadamard(),
            pauli_x(),
            pauli_y(),
            pauli_z(),
            s_gate(),
            t_gate(),
            rotation_x(0.3),
            rotation_y(1.7),
            rotation_z(-2.2),
            phase(PI / 8.0),
        ];
        for matrix in &singles {
            assert!(validate_unitary(&single_qubit_to_array(matrix)).is_ok());
        }

        let doubles = [controlled_not(), controlled_z(), controlled_phase(0.4), swap()];
        for matrix in &doubles {
            assert!(validate_unitary(&two_qubit_to_array(matrix)).is_ok());
        }
    }

    #[test]
    fn test_non_unitary_matrix_rejected() {
        let matrix = [[ONE, ONE], [ZERO, ONE]];
        let result = UnitarySingleQubitMatrix::new(matrix);
        assert!(matches!(result, Err(InvalidGateError::NonUnitaryMatrix { .. })));
    }

    #[test]
    fn test_non_square_matrix_rejected() {
        let matrix = Array2::from_elem((2, 3), ONE);
        assert!(matches!(
            validate_unitary(&matrix),
            Err(InvalidGateError::MatrixDimension { rows: 2, columns: 3, .. })
        ));
    }

    #[test]
    fn test_wrong_size_for_single_qubit_wrapper() {
        let identity = Array2::<Complex64>::eye(4);
        assert!(matches!(
            UnitarySingleQubitMatrix::from_array(&identity),
            Err(InvalidGateError::MatrixDimension { expected: 2, .. })
        ));
        assert!(UnitaryTwoQubitMatrix::from_array(&identity).is_ok());
    }

    #[test]
    fn test_nan_entries_rejected() {
        let matrix = [[Complex64::new(f64::NAN, 0.0), ZERO], [ZERO, ONE]];
        assert!(UnitarySingleQubitMatrix::new(matrix).is_err());
    }

    #[test]
    fn test_adjoint_inverts_phase() {
        let s = UnitarySingleQubitMatrix::new(s_gate()).unwrap();
        let s_dagger = s.adjoint();
        assert!((s_dagger.matrix()[1][1] - Complex64::new(0.0, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_controlled_embedding_matches_cnot() {
        assert_eq!(controlled(&pauli_x()), controlled_not());
    }

    #[test]
    fn test_deserialize_rejects_non_unitary() {
        let payload = "[[[1.0,0.0],[1.0,0.0]],[[0.0,0.0],[1.0,0.0]]]";
        let parsed: Result<UnitarySingleQubitMatrix, _> = serde_json::from_str(payload);
        assert!(parsed.is_err());
    }
}
