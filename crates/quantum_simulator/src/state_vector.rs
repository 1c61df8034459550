// =============================================================================
// MACROHARD Quantum Simulator - State Vector
// =============================================================================
// Table of Contents:
//   1. Resource estimation helpers
//   2. QuantumStateVector - Dense amplitude buffer
//   3. Inspection (norm, inner product, fidelity, expectation values)
// =============================================================================
// Purpose: The 2^n complex amplitude buffer owned exclusively by one run.
//          Qubit 0 is the most significant bit of the basis index, so the
//          bitstring of index i reads qubit 0 first.
// =============================================================================

use crate::error::MeasurementError;
use num_complex::Complex64;

/// Tolerance used when accepting caller-supplied amplitude vectors.
pub const NORMALIZATION_TOLERANCE: f64 = 1e-9;

// =============================================================================
// 1. Resource estimation helpers
// =============================================================================

/// Bytes needed for a dense state of `number_of_quantum_bits` qubits, or
/// `None` when the size does not fit in `usize`.
pub fn estimated_state_bytes(number_of_quantum_bits: usize) -> Option<usize> {
    let dimension = 1usize.checked_shl(u32::try_from(number_of_quantum_bits).ok()?)?;
    dimension.checked_mul(std::mem::size_of::<Complex64>())
}

/// Bit mask selecting `qubit` inside a basis index of an `n`-qubit register.
#[inline]
pub fn qubit_mask(number_of_quantum_bits: usize, qubit: usize) -> usize {
    1usize << (number_of_quantum_bits - 1 - qubit)
}

pub fn index_to_bitstring(index: usize, number_of_quantum_bits: usize) -> String {
    (0..number_of_quantum_bits)
        .map(|qubit| {
            if index & qubit_mask(number_of_quantum_bits, qubit) != 0 {
                '1'
            } else {
                '0'
            }
        })
        .collect()
}

// =============================================================================
// 2. QuantumStateVector - Dense amplitude buffer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct QuantumStateVector {
    amplitudes: Vec<Complex64>,
    number_of_quantum_bits: usize,
}

impl QuantumStateVector {
    /// |0...0>. Callers are responsible for resource limits; the executor
    /// checks them before reaching this point.
    ///
    /// # Panics
    ///
    /// Panics when `2^number_of_quantum_bits` does not fit in `usize`. Use
    /// [`estimated_state_bytes`] or [`QuantumStateVector::basis_state`] for
    /// untrusted widths.
    pub fn zero_state(number_of_quantum_bits: usize) -> Self {
        let Some(dimension) = u32::try_from(number_of_quantum_bits)
            .ok()
            .and_then(|shift| 1usize.checked_shl(shift))
        else {
            panic!("{number_of_quantum_bits} qubits exceed the addressable state size");
        };
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); dimension];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            number_of_quantum_bits,
        }
    }

    /// Computational basis state |index>.
    pub fn basis_state(
        number_of_quantum_bits: usize,
        index: usize,
    ) -> Result<Self, MeasurementError> {
        if estimated_state_bytes(number_of_quantum_bits).is_none() {
            return Err(MeasurementError::InvalidAmplitudes(format!(
                "{} qubits exceed the addressable state size",
                number_of_quantum_bits
            )));
        }
        let mut state = Self::zero_state(number_of_quantum_bits);
        if index >= state.dimension() {
            return Err(MeasurementError::InvalidAmplitudes(format!(
                "basis index {} out of range for {} qubits",
                index, number_of_quantum_bits
            )));
        }
        state.amplitudes[0] = Complex64::new(0.0, 0.0);
        state.amplitudes[index] = Complex64::new(1.0, 0.0);
        Ok(state)
    }

    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> Result<Self, MeasurementError> {
        let dimension = amplitudes.len();
        if dimension < 2 || !dimension.is_power_of_two() {
            return Err(MeasurementError::InvalidAmplitudes(format!(
                "length {} is not a power of two >= 2",
                dimension
            )));
        }
        let norm_squared: f64 = amplitudes.iter().map(|a| a.norm_sqr()).sum();
        if (norm_squared - 1.0).abs() > NORMALIZATION_TOLERANCE {
            return Err(MeasurementError::InvalidAmplitudes(format!(
                "squared norm {} is not 1",
                norm_squared
            )));
        }
        Ok(Self {
            number_of_quantum_bits: dimension.trailing_zeros() as usize,
            amplitudes,
        })
    }

    pub fn number_of_quantum_bits(&self) -> usize {
        self.number_of_quantum_bits
    }

    pub fn dimension(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn amplitude(&self, index: usize) -> Complex64 {
        self.amplitudes[index]
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    pub fn amplitudes_mut(&mut self) -> &mut [Complex64] {
        &mut self.amplitudes
    }

    pub fn reset_to_zero_state(&mut self) {
        self.amplitudes.fill(Complex64::new(0.0, 0.0));
        self.amplitudes[0] = Complex64::new(1.0, 0.0);
    }

    /// Rescales to unit norm. Only measurement collapse calls this; gate
    /// application never renormalizes.
    pub fn normalize(&mut self) {
        let norm = self.norm_squared().sqrt();
        if norm > 1e-15 {
            for amp in &mut self.amplitudes {
                *amp /= norm;
            }
        }
    }

    pub fn probability_distribution(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    pub fn probability_of_bitstring(&self, bitstring: &str) -> Option<f64> {
        if bitstring.len() != self.number_of_quantum_bits {
            return None;
        }
        let index = bitstring.chars().try_fold(0usize, |acc, bit| match bit {
            '0' => Some(acc << 1),
            '1' => Some((acc << 1) | 1),
            _ => None,
        })?;
        Some(self.amplitudes[index].norm_sqr())
    }

    // =========================================================================
    // 3. Inspection
    // =========================================================================

    pub fn norm_squared(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    pub fn is_normalized(&self, tolerance: f64) -> bool {
        (self.norm_squared() - 1.0).abs() <= tolerance
    }

    pub fn inner_product(&self, other: &Self) -> Complex64 {
        assert_eq!(self.dimension(), other.dimension());
        self.amplitudes
            .iter()
            .zip(other.amplitudes.iter())
            .map(|(a, b)| a.conj() * b)
            .sum()
    }

    /// |<self|other>|^2; equals 1 for states that differ only by a global
    /// phase.
    pub fn fidelity(&self, other: &Self) -> f64 {
        self.inner_product(other).norm_sqr()
    }

    pub fn expectation_value_pauli_z(&self, qubit: usize) -> Result<f64, MeasurementError> {
        if qubit >= self.number_of_quantum_bits {
            return Err(MeasurementError::QubitOutOfRange {
                index: qubit,
                total: self.number_of_quantum_bits,
            });
        }
        let mask = qubit_mask(self.number_of_quantum_bits, qubit);

        let mut expectation = 0.0;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            let prob = amp.norm_sqr();
            if (i & mask) == 0 {
                expectation += prob;
            } else {
                expectation -= prob;
            }
        }
        Ok(expectation)
    }
}
