// =============================================================================
// MACROHARD Quantum Simulator - Gate Applicator
// =============================================================================
// Table of Contents:
//   1. Single-qubit butterfly update
//   2. Controlled and multi-controlled butterfly update
//   3. Two-qubit quadruple update
// =============================================================================
// Purpose: Applies gate matrices in place on a QuantumStateVector without
//          materializing the 2^n x 2^n operator. Every kernel touches the
//          full state in O(2^n). Qubit indices are validated by the circuit
//          before execution; the kernels only debug-assert them.
// =============================================================================

use crate::gate_library::{SingleQubitMatrix, TwoQubitMatrix};
use crate::state_vector::{QuantumStateVector, qubit_mask};
use num_complex::Complex64;

// =============================================================================
// 1. Single-qubit butterfly update
// =============================================================================

pub fn apply_single_qubit_gate(
    state: &mut QuantumStateVector,
    qubit: usize,
    matrix: &SingleQubitMatrix,
) {
    apply_multi_controlled_gate(state, &[], qubit, matrix);
}

// =============================================================================
// 2. Controlled and multi-controlled butterfly update
// =============================================================================

pub fn apply_controlled_gate(
    state: &mut QuantumStateVector,
    control: usize,
    target: usize,
    matrix: &SingleQubitMatrix,
) {
    apply_multi_controlled_gate(state, &[control], target, matrix);
}

/// Applies `matrix` to `target` on every basis state whose control bits are
/// all 1. With no controls this is the plain single-qubit update.
pub fn apply_multi_controlled_gate(
    state: &mut QuantumStateVector,
    controls: &[usize],
    target: usize,
    matrix: &SingleQubitMatrix,
) {
    let n = state.number_of_quantum_bits();
    debug_assert!(target < n);
    debug_assert!(controls.iter().all(|&c| c < n && c != target));

    let target_mask = qubit_mask(n, target);
    let control_mask = controls
        .iter()
        .fold(0usize, |mask, &control| mask | qubit_mask(n, control));

    let [[m00, m01], [m10, m11]] = *matrix;
    let amplitudes = state.amplitudes_mut();
    for i in 0..amplitudes.len() {
        if (i & target_mask) == 0 && (i & control_mask) == control_mask {
            let j = i | target_mask;
            let a = amplitudes[i];
            let b = amplitudes[j];
            amplitudes[i] = m00 * a + m01 * b;
            amplitudes[j] = m10 * a + m11 * b;
        }
    }
}

// =============================================================================
// 3. Two-qubit quadruple update
// =============================================================================

/// Applies a 4x4 matrix in the local basis |q_a q_b> to every quadruple of
/// basis states that agree on all other qubits.
pub fn apply_two_qubit_gate(
    state: &mut QuantumStateVector,
    qubit_a: usize,
    qubit_b: usize,
    matrix: &TwoQubitMatrix,
) {
    let n = state.number_of_quantum_bits();
    debug_assert!(qubit_a < n && qubit_b < n && qubit_a != qubit_b);

    let mask_a = qubit_mask(n, qubit_a);
    let mask_b = qubit_mask(n, qubit_b);
    let pair_mask = mask_a | mask_b;

    let amplitudes = state.amplitudes_mut();
    for base in 0..amplitudes.len() {
        if base & pair_mask != 0 {
            continue;
        }
        let indices = [base, base | mask_b, base | mask_a, base | pair_mask];
        let input = indices.map(|index| amplitudes[index]);

        for (row, &index) in indices.iter().enumerate() {
            amplitudes[index] = matrix[row]
                .iter()
                .zip(input.iter())
                .map(|(element, amplitude)| element * amplitude)
                .sum::<Complex64>();
        }
    }
}
