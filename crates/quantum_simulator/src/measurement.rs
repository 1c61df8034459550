// =============================================================================
// MACROHARD Quantum Simulator - Measurement Module
// =============================================================================
// Table of Contents:
//   1. MeasurementOutcome / RegisterMeasurement - Collapse records
//   2. MeasurementEngine - Born rule sampling, collapse, renormalization
//   3. MeasurementEvent - Per-shot record
//   4. MeasurementStatistics - Aggregated statistics
// =============================================================================
// Purpose: Probabilistic measurement in the computational basis. Sampling
//          always draws from a caller-supplied RNG so runs are reproducible
//          under a fixed seed.
// =============================================================================

use crate::error::MeasurementError;
use crate::state_vector::{QuantumStateVector, index_to_bitstring, qubit_mask};
use num_complex::Complex64;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Probabilities below this are omitted from sparse distributions.
pub const DEFAULT_PROBABILITY_THRESHOLD: f64 = 1e-12;

// =============================================================================
// 1. MeasurementOutcome / RegisterMeasurement - Collapse records
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementOutcome {
    pub qubit_index: usize,
    pub outcome: u8,
    /// Probability of `outcome` at the moment this qubit was measured.
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterMeasurement {
    pub bitstring: String,
    pub outcomes: Vec<MeasurementOutcome>,
}

// =============================================================================
// 2. MeasurementEngine - Born rule sampling, collapse, renormalization
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct MeasurementEngine;

impl MeasurementEngine {
    /// Probability that `qubit` reads 0.
    pub fn probability_of_zero(
        state: &QuantumStateVector,
        qubit: usize,
    ) -> Result<f64, MeasurementError> {
        let (probability_zero, probability_one) = Self::branch_probabilities(state, qubit)?;
        Ok(probability_zero / (probability_zero + probability_one))
    }

    /// Unnormalized mass of the 0 and 1 branches of `qubit`.
    fn branch_probabilities(
        state: &QuantumStateVector,
        qubit: usize,
    ) -> Result<(f64, f64), MeasurementError> {
        let n = state.number_of_quantum_bits();
        if qubit >= n {
            return Err(MeasurementError::QubitOutOfRange {
                index: qubit,
                total: n,
            });
        }
        let mask = qubit_mask(n, qubit);
        let (probability_zero, probability_one) = state.amplitudes().iter().enumerate().fold(
            (0.0, 0.0),
            |(zero, one), (index, amplitude)| {
                if index & mask == 0 {
                    (zero + amplitude.norm_sqr(), one)
                } else {
                    (zero, one + amplitude.norm_sqr())
                }
            },
        );
        if probability_zero + probability_one <= f64::EPSILON {
            return Err(MeasurementError::InvalidAmplitudes(
                "state has zero norm".to_string(),
            ));
        }
        Ok((probability_zero, probability_one))
    }

    /// Measures one qubit with a single uniform draw over the mass actually
    /// present, zeroes the amplitudes inconsistent with the outcome and
    /// renormalizes the survivors by their own norm.
    pub fn measure<R: Rng + ?Sized>(
        state: &mut QuantumStateVector,
        qubit: usize,
        rng: &mut R,
    ) -> Result<MeasurementOutcome, MeasurementError> {
        let (probability_zero, probability_one) = Self::branch_probabilities(state, qubit)?;
        let total = probability_zero + probability_one;
        let draw: f64 = rng.gen_range(0.0..1.0) * total;
        // An empty branch is never selected, even when the draw rounds up to
        // the full mass.
        let outcome =
            if probability_one == 0.0 || (probability_zero > 0.0 && draw < probability_zero) {
                0u8
            } else {
                1u8
            };
        let surviving_mass = if outcome == 0 {
            probability_zero
        } else {
            probability_one
        };
        Self::collapse(state, qubit, outcome, surviving_mass)?;

        Ok(MeasurementOutcome {
            qubit_index: qubit,
            outcome,
            probability: surviving_mass / total,
        })
    }

    fn collapse(
        state: &mut QuantumStateVector,
        qubit: usize,
        outcome: u8,
        surviving_mass: f64,
    ) -> Result<(), MeasurementError> {
        if surviving_mass <= f64::EPSILON {
            return Err(MeasurementError::ZeroProbabilityOutcome { qubit, outcome });
        }
        let mask = qubit_mask(state.number_of_quantum_bits(), qubit);
        let keep_set_bit = outcome == 1;
        let scale = 1.0 / surviving_mass.sqrt();

        for (index, amplitude) in state.amplitudes_mut().iter_mut().enumerate() {
            if ((index & mask) != 0) == keep_set_bit {
                *amplitude *= scale;
            } else {
                *amplitude = Complex64::new(0.0, 0.0);
            }
        }
        Ok(())
    }

    /// Measures qubits 0..n-1 in order, collapsing after each.
    pub fn measure_all<R: Rng + ?Sized>(
        state: &mut QuantumStateVector,
        rng: &mut R,
    ) -> Result<RegisterMeasurement, MeasurementError> {
        let n = state.number_of_quantum_bits();
        let mut outcomes = Vec::with_capacity(n);
        for qubit in 0..n {
            outcomes.push(Self::measure(state, qubit, rng)?);
        }
        let bitstring = outcomes
            .iter()
            .map(|outcome| if outcome.outcome == 0 { '0' } else { '1' })
            .collect();
        Ok(RegisterMeasurement {
            bitstring,
            outcomes,
        })
    }

    /// Non-destructive sparse Born distribution over full bitstrings.
    pub fn get_probabilities(state: &QuantumStateVector) -> BTreeMap<String, f64> {
        Self::get_probabilities_above(state, DEFAULT_PROBABILITY_THRESHOLD)
    }

    pub fn get_probabilities_above(
        state: &QuantumStateVector,
        threshold: f64,
    ) -> BTreeMap<String, f64> {
        let n = state.number_of_quantum_bits();
        state
            .amplitudes()
            .iter()
            .enumerate()
            .map(|(index, amplitude)| (index, amplitude.norm_sqr()))
            .filter(|&(_, probability)| probability > threshold)
            .map(|(index, probability)| (index_to_bitstring(index, n), probability))
            .collect()
    }
}

// =============================================================================
// 3. MeasurementEvent - Per-shot record
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementEvent {
    pub shot_index: usize,
    /// Final full-register readout.
    pub measurement_bitstring: String,
    /// Outcomes of explicit measurement steps, in program order.
    pub mid_circuit_outcomes: Vec<MeasurementOutcome>,
    /// Per-qubit outcomes of the final readout.
    pub readout_outcomes: Vec<MeasurementOutcome>,
}

impl MeasurementEvent {
    pub fn new(
        shot_index: usize,
        mid_circuit_outcomes: Vec<MeasurementOutcome>,
        readout: RegisterMeasurement,
    ) -> Self {
        Self {
            shot_index,
            measurement_bitstring: readout.bitstring,
            mid_circuit_outcomes,
            readout_outcomes: readout.outcomes,
        }
    }

    pub fn bitstring_as_integer(&self) -> u64 {
        self.measurement_bitstring
            .chars()
            .fold(0u64, |acc, bit| (acc << 1) | u64::from(bit == '1'))
    }
}

// =============================================================================
// 4. MeasurementStatistics - Aggregated statistics
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementStatistics {
    pub total_shots: usize,
    pub bitstring_counts: BTreeMap<String, usize>,
    pub probabilities: BTreeMap<String, f64>,
    pub entropy: f64,
}

impl MeasurementStatistics {
    pub fn from_events(events: &[MeasurementEvent]) -> Self {
        let mut bitstring_counts: BTreeMap<String, usize> = BTreeMap::new();
        for event in events {
            *bitstring_counts
                .entry(event.measurement_bitstring.clone())
                .or_insert(0) += 1;
        }
        Self::from_counts(bitstring_counts)
    }

    pub fn from_counts(bitstring_counts: BTreeMap<String, usize>) -> Self {
        let total_shots: usize = bitstring_counts.values().sum();
        let probabilities: BTreeMap<String, f64> = if total_shots == 0 {
            BTreeMap::new()
        } else {
            bitstring_counts
                .iter()
                .map(|(k, &v)| (k.clone(), v as f64 / total_shots as f64))
                .collect()
        };
        let entropy = Self::compute_entropy(&probabilities);

        Self {
            total_shots,
            bitstring_counts,
            probabilities,
            entropy,
        }
    }

    fn compute_entropy(probabilities: &BTreeMap<String, f64>) -> f64 {
        probabilities
            .values()
            .filter(|&&p| p > 0.0)
            .map(|&p| -p * p.log2())
            .sum()
    }

    pub fn most_probable_bitstring(&self) -> Option<(&String, f64)> {
        self.probabilities
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(k, &v)| (k, v))
    }

    pub fn probability_of(&self, bitstring: &str) -> f64 {
        self.probabilities.get(bitstring).copied().unwrap_or(0.0)
    }

    pub fn count_of(&self, bitstring: &str) -> usize {
        self.bitstring_counts.get(bitstring).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate_applicator::{apply_controlled_gate, apply_single_qubit_gate};
    use crate::gate_library;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn bell_state() -> QuantumStateVector {
        let mut state = QuantumStateVector::zero_state(2);
        apply_single_qubit_gate(&mut state, 0, &gate_library::hadamard());
        apply_controlled_gate(&mut state, 0, 1, &gate_library::pauli_x());
        state
    }

    #[test]
    fn test_measure_collapses_and_renormalizes() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = QuantumStateVector::zero_state(1);
        apply_single_qubit_gate(&mut state, 0, &gate_library::hadamard());

        let outcome = MeasurementEngine::measure(&mut state, 0, &mut rng).unwrap();
        assert_abs_diff_eq!(outcome.probability, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(
            state.amplitude(outcome.outcome as usize).norm_sqr(),
            1.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(state.norm_squared(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_measure_deterministic_states() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut zero = QuantumStateVector::zero_state(2);
        let outcome = MeasurementEngine::measure(&mut zero, 1, &mut rng).unwrap();
        assert_eq!(outcome.outcome, 0);
        assert_abs_diff_eq!(outcome.probability, 1.0, epsilon = 1e-12);

        let mut one = QuantumStateVector::basis_state(2, 0b01).unwrap();
        let outcome = MeasurementEngine::measure(&mut one, 1, &mut rng).unwrap();
        assert_eq!(outcome.outcome, 1);
    }

    #[test]
    fn test_measure_all_on_bell_state_is_correlated() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let mut state = bell_state();
            let readout = MeasurementEngine::measure_all(&mut state, &mut rng).unwrap();
            assert!(readout.bitstring == "00" || readout.bitstring == "11");
            // First qubit is a coin flip, second is then certain.
            assert_abs_diff_eq!(readout.outcomes[0].probability, 0.5, epsilon = 1e-12);
            assert_abs_diff_eq!(readout.outcomes[1].probability, 1.0, epsilon = 1e-12);
        }
    }

    /// Always returns the largest possible draw.
    struct HighDrawRng;

    impl rand::RngCore for HighDrawRng {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }

        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0xFF);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn test_measure_never_selects_empty_branch_of_drifted_state() {
        // Squared norm 1 - 5e-10: inside the accepted tolerance, but a draw
        // against 1 - p0 would land on the empty |1> branch.
        let amplitudes = vec![
            Complex64::new((1.0f64 - 5e-10).sqrt(), 0.0),
            Complex64::new(0.0, 0.0),
        ];
        let mut state = QuantumStateVector::from_amplitudes(amplitudes).unwrap();

        let outcome = MeasurementEngine::measure(&mut state, 0, &mut HighDrawRng).unwrap();
        assert_eq!(outcome.outcome, 0);
        assert_abs_diff_eq!(outcome.probability, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(state.norm_squared(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_collapse_renormalizes_by_surviving_mass() {
        // 0.6|0> + 0.79|1>, squared norm 0.9841.
        let mut state = QuantumStateVector::zero_state(1);
        state.amplitudes_mut()[0] = Complex64::new(0.6, 0.0);
        state.amplitudes_mut()[1] = Complex64::new(0.79, 0.0);

        let outcome = MeasurementEngine::measure(&mut state, 0, &mut HighDrawRng).unwrap();
        assert_eq!(outcome.outcome, 1);
        assert_abs_diff_eq!(outcome.probability, 0.6241 / 0.9841, epsilon = 1e-12);
        assert_abs_diff_eq!(state.norm_squared(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_measure_out_of_range_qubit() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = QuantumStateVector::zero_state(2);
        assert_eq!(
            MeasurementEngine::measure(&mut state, 2, &mut rng),
            Err(MeasurementError::QubitOutOfRange { index: 2, total: 2 })
        );
    }

    #[test]
    fn test_get_probabilities_is_sparse_and_non_destructive() {
        let state = bell_state();
        let before = state.clone();
        let probabilities = MeasurementEngine::get_probabilities(&state);

        assert_eq!(probabilities.len(), 2);
        assert_abs_diff_eq!(probabilities["00"], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(probabilities["11"], 0.5, epsilon = 1e-12);
        assert!(!probabilities.contains_key("01"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_measurement_statistics() {
        let readout = |bits: &str| RegisterMeasurement {
            bitstring: bits.to_string(),
            outcomes: Vec::new(),
        };
        let events = vec![
            MeasurementEvent::new(0, Vec::new(), readout("00")),
            MeasurementEvent::new(1, Vec::new(), readout("00")),
            MeasurementEvent::new(2, Vec::new(), readout("11")),
            MeasurementEvent::new(3, Vec::new(), readout("11")),
        ];

        let stats = MeasurementStatistics::from_events(&events);
        assert_eq!(stats.total_shots, 4);
        assert_eq!(stats.count_of("11"), 2);
        assert_abs_diff_eq!(stats.probability_of("00"), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.probability_of("01"), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.entropy, 1.0, epsilon = 1e-12);
        assert_eq!(events[2].bitstring_as_integer(), 3);
    }
}
