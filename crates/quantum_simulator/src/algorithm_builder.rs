// =============================================================================
// MACROHARD Quantum Simulator - Algorithm Builder
// =============================================================================
// Table of Contents:
//   1. QuantumAlgorithm - Circuit template with expected outcomes
//   2. QuantumAlgorithmBuilder - Bell pair, QFT, Grover search
//   3. get_algorithm - Lookup by name
// =============================================================================
// Purpose: Composes well-known algorithms from the circuit API. Templates
//          only build circuits; running them is the executor's job.
// =============================================================================

use crate::circuit_program::QuantumCircuitStructure;
use crate::configuration::DEFAULT_MAXIMUM_QUANTUM_BITS;
use crate::error::{QuantumResult, QuantumSimulatorError};
use crate::state_vector::index_to_bitstring;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Caller-chosen Grover counts may overshoot the optimum by at most this
/// factor.
const MAXIMUM_GROVER_ITERATION_FACTOR: usize = 4;

// =============================================================================
// 1. QuantumAlgorithm - Circuit template with expected outcomes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpectedDistribution {
    /// Every listed bitstring with its probability; the rest are zero.
    Sparse(BTreeMap<String, f64>),
    /// Equal weight on all 2^n outcomes.
    Uniform { number_of_quantum_bits: usize },
    /// One marked outcome; the remainder is split evenly over the others.
    Marked {
        bitstring: String,
        probability: f64,
        number_of_quantum_bits: usize,
    },
}

impl ExpectedDistribution {
    pub fn probability_of(&self, bitstring: &str) -> f64 {
        match self {
            ExpectedDistribution::Sparse(probabilities) => {
                probabilities.get(bitstring).copied().unwrap_or(0.0)
            }
            ExpectedDistribution::Uniform {
                number_of_quantum_bits,
            } => {
                if bitstring.len() == *number_of_quantum_bits {
                    1.0 / outcome_count(*number_of_quantum_bits)
                } else {
                    0.0
                }
            }
            ExpectedDistribution::Marked {
                bitstring: marked,
                probability,
                number_of_quantum_bits,
            } => {
                if bitstring == marked {
                    *probability
                } else if bitstring.len() == *number_of_quantum_bits {
                    (1.0 - probability) / (outcome_count(*number_of_quantum_bits) - 1.0)
                } else {
                    0.0
                }
            }
        }
    }
}

fn outcome_count(number_of_quantum_bits: usize) -> f64 {
    2f64.powi(number_of_quantum_bits as i32)
}

#[derive(Debug, Clone, Serialize)]
pub struct QuantumAlgorithm {
    pub name: String,
    pub circuit: QuantumCircuitStructure,
    /// Distribution of the final readout when run from |0...0>.
    pub expected_distribution: ExpectedDistribution,
    pub grover_iterations: Option<usize>,
    pub success_probability: Option<f64>,
}

// =============================================================================
// 2. QuantumAlgorithmBuilder - Bell pair, QFT, Grover search
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct QuantumAlgorithmBuilder;

impl QuantumAlgorithmBuilder {
    pub fn bell_pair() -> QuantumResult<QuantumAlgorithm> {
        let mut circuit = QuantumCircuitStructure::new(2);
        circuit.apply_hadamard_gate(0)?.apply_controlled_not_gate(0, 1)?;

        let expected = BTreeMap::from([("00".to_string(), 0.5), ("11".to_string(), 0.5)]);
        Ok(QuantumAlgorithm {
            name: "bell_pair".to_string(),
            circuit,
            expected_distribution: ExpectedDistribution::Sparse(expected),
            grover_iterations: None,
            success_probability: None,
        })
    }

    pub fn quantum_fourier_transform(
        number_of_quantum_bits: usize,
    ) -> QuantumResult<QuantumAlgorithm> {
        let circuit = Self::quantum_fourier_transform_circuit(number_of_quantum_bits)?;
        Ok(QuantumAlgorithm {
            name: "quantum_fourier_transform".to_string(),
            circuit,
            expected_distribution: ExpectedDistribution::Uniform {
                number_of_quantum_bits,
            },
            grover_iterations: None,
            success_probability: None,
        })
    }

    pub fn inverse_quantum_fourier_transform(
        number_of_quantum_bits: usize,
    ) -> QuantumResult<QuantumAlgorithm> {
        let circuit = Self::quantum_fourier_transform_circuit(number_of_quantum_bits)?.inverse()?;
        Ok(QuantumAlgorithm {
            name: "inverse_quantum_fourier_transform".to_string(),
            circuit,
            expected_distribution: ExpectedDistribution::Uniform {
                number_of_quantum_bits,
            },
            grover_iterations: None,
            success_probability: None,
        })
    }

    /// H(i) and CP(i -> j, pi / 2^(j-i)) for every j > i, then swaps that
    /// reverse the qubit order.
    pub fn quantum_fourier_transform_circuit(
        number_of_quantum_bits: usize,
    ) -> QuantumResult<QuantumCircuitStructure> {
        check_template_width(number_of_quantum_bits)?;
        let n = number_of_quantum_bits;
        let mut circuit = QuantumCircuitStructure::new(n);

        for i in 0..n {
            circuit.apply_hadamard_gate(i)?;
            for j in (i + 1)..n {
                let angle = PI / 2f64.powi((j - i) as i32);
                circuit.apply_controlled_phase_gate(i, j, angle)?;
            }
        }
        for i in 0..n / 2 {
            circuit.apply_swap_gate(i, n - 1 - i)?;
        }

        tracing::debug!("Built {}-qubit QFT with {} gates", n, circuit.gate_count());
        Ok(circuit)
    }

    /// floor(pi/4 * sqrt(2^n))
    pub fn optimal_grover_iterations(number_of_quantum_bits: usize) -> usize {
        (PI / 4.0 * outcome_count(number_of_quantum_bits).sqrt()).floor() as usize
    }

    /// sin^2((2k + 1) * asin(1 / sqrt(2^n))) for a single marked item.
    pub fn grover_success_probability(number_of_quantum_bits: usize, iterations: usize) -> f64 {
        let theta = (1.0 / outcome_count(number_of_quantum_bits).sqrt()).asin();
        ((2.0 * iterations as f64 + 1.0) * theta).sin().powi(2)
    }

    /// Upper bound on caller-chosen Grover iteration counts.
    pub fn maximum_grover_iterations(number_of_quantum_bits: usize) -> usize {
        Self::optimal_grover_iterations(number_of_quantum_bits)
            .max(1)
            .saturating_mul(MAXIMUM_GROVER_ITERATION_FACTOR)
    }

    pub fn grover_iteration(
        number_of_quantum_bits: usize,
        target_bitstring: &str,
    ) -> QuantumResult<QuantumAlgorithm> {
        Self::grover_with_iterations(
            number_of_quantum_bits,
            target_bitstring,
            Self::optimal_grover_iterations(number_of_quantum_bits),
        )
    }

    pub fn grover_with_iterations(
        number_of_quantum_bits: usize,
        target_bitstring: &str,
        iterations: usize,
    ) -> QuantumResult<QuantumAlgorithm> {
        check_template_width(number_of_quantum_bits)?;
        let n = number_of_quantum_bits;
        if target_bitstring.len() != n || !target_bitstring.chars().all(|c| c == '0' || c == '1') {
            return Err(QuantumSimulatorError::InvalidParameter(format!(
                "target bitstring {:?} is not a {}-bit binary string",
                target_bitstring, n
            )));
        }
        let maximum_iterations = Self::maximum_grover_iterations(n);
        if iterations > maximum_iterations {
            return Err(QuantumSimulatorError::InvalidParameter(format!(
                "{} Grover iterations exceeds the maximum of {} for {} qubits",
                iterations, maximum_iterations, n
            )));
        }

        let zero_positions: Vec<usize> = target_bitstring
            .char_indices()
            .filter(|&(_, bit)| bit == '0')
            .map(|(qubit, _)| qubit)
            .collect();
        let all_qubits: Vec<usize> = (0..n).collect();

        let mut circuit = QuantumCircuitStructure::new(n);
        for &qubit in &all_qubits {
            circuit.apply_hadamard_gate(qubit)?;
        }
        for _ in 0..iterations {
            // Oracle: map the target onto |1...1>, flip its phase, map back.
            apply_pauli_x_layer(&mut circuit, &zero_positions)?;
            apply_phase_flip_on_all_ones(&mut circuit)?;
            apply_pauli_x_layer(&mut circuit, &zero_positions)?;

            // Diffusion: reflect about the uniform superposition.
            for &qubit in &all_qubits {
                circuit.apply_hadamard_gate(qubit)?;
            }
            apply_pauli_x_layer(&mut circuit, &all_qubits)?;
            apply_phase_flip_on_all_ones(&mut circuit)?;
            apply_pauli_x_layer(&mut circuit, &all_qubits)?;
            for &qubit in &all_qubits {
                circuit.apply_hadamard_gate(qubit)?;
            }
        }

        let success_probability = Self::grover_success_probability(n, iterations);
        tracing::debug!(
            "Built Grover search for {} with {} iterations (p = {:.4})",
            target_bitstring,
            iterations,
            success_probability
        );

        Ok(QuantumAlgorithm {
            name: "grover_search".to_string(),
            circuit,
            expected_distribution: ExpectedDistribution::Marked {
                bitstring: target_bitstring.to_string(),
                probability: success_probability,
                number_of_quantum_bits: n,
            },
            grover_iterations: Some(iterations),
            success_probability: Some(success_probability),
        })
    }
}

fn check_template_width(number_of_quantum_bits: usize) -> QuantumResult<()> {
    if number_of_quantum_bits == 0 || number_of_quantum_bits > DEFAULT_MAXIMUM_QUANTUM_BITS {
        return Err(QuantumSimulatorError::InvalidParameter(format!(
            "number_of_quantum_bits must be in 1..={}, got {}",
            DEFAULT_MAXIMUM_QUANTUM_BITS, number_of_quantum_bits
        )));
    }
    Ok(())
}

fn apply_pauli_x_layer(
    circuit: &mut QuantumCircuitStructure,
    qubits: &[usize],
) -> QuantumResult<()> {
    for &qubit in qubits {
        circuit.apply_pauli_x_gate(qubit)?;
    }
    Ok(())
}

fn apply_phase_flip_on_all_ones(circuit: &mut QuantumCircuitStructure) -> QuantumResult<()> {
    let last = circuit.number_of_quantum_bits() - 1;
    circuit.apply_multi_controlled_z_gate((0..last).collect(), last)?;
    Ok(())
}

// =============================================================================
// 3. get_algorithm - Lookup by name
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmParameters {
    pub number_of_quantum_bits: Option<usize>,
    pub target_bitstring: Option<String>,
    /// Overrides the optimal Grover count.
    pub iterations: Option<usize>,
    /// Build the inverse QFT.
    pub inverse: bool,
}

impl AlgorithmParameters {
    pub fn with_quantum_bits(mut self, number_of_quantum_bits: usize) -> Self {
        self.number_of_quantum_bits = Some(number_of_quantum_bits);
        self
    }

    pub fn with_target(mut self, target_bitstring: impl Into<String>) -> Self {
        self.target_bitstring = Some(target_bitstring.into());
        self
    }
}

pub fn get_algorithm(
    name: &str,
    parameters: &AlgorithmParameters,
) -> QuantumResult<QuantumAlgorithm> {
    match name.to_ascii_lowercase().as_str() {
        "bell_pair" | "bell" => QuantumAlgorithmBuilder::bell_pair(),
        "quantum_fourier_transform" | "qft" => {
            let n = parameters.number_of_quantum_bits.ok_or_else(|| {
                QuantumSimulatorError::InvalidParameter(
                    "qft requires number_of_quantum_bits".to_string(),
                )
            })?;
            if parameters.inverse {
                QuantumAlgorithmBuilder::inverse_quantum_fourier_transform(n)
            } else {
                QuantumAlgorithmBuilder::quantum_fourier_transform(n)
            }
        }
        "grover_search" | "grover" => {
            let target = parameters.target_bitstring.as_deref().ok_or_else(|| {
                QuantumSimulatorError::InvalidParameter(
                    "grover requires target_bitstring".to_string(),
                )
            })?;
            let n = parameters.number_of_quantum_bits.unwrap_or(target.len());
            let iterations = parameters
                .iterations
                .unwrap_or_else(|| QuantumAlgorithmBuilder::optimal_grover_iterations(n));
            QuantumAlgorithmBuilder::grover_with_iterations(n, target, iterations)
        }
        _ => Err(QuantumSimulatorError::UnknownAlgorithm(name.to_string())),
    }
}

/// Every bitstring of width `n` with its expected probability. Widths
/// outside the template range are rejected.
pub fn enumerate_expected_distribution(
    distribution: &ExpectedDistribution,
    number_of_quantum_bits: usize,
) -> QuantumResult<BTreeMap<String, f64>> {
    check_template_width(number_of_quantum_bits)?;
    Ok((0..1usize << number_of_quantum_bits)
        .map(|index| index_to_bitstring(index, number_of_quantum_bits))
        .map(|bitstring| {
            let probability = distribution.probability_of(&bitstring);
            (bitstring, probability)
        })
        .filter(|(_, probability)| *probability > 0.0)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::QuantumExecutionEngine;
    use crate::state_vector::QuantumStateVector;
    use approx::assert_abs_diff_eq;
    use num_complex::Complex64;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_state(n: usize, rng: &mut StdRng) -> QuantumStateVector {
        let mut amplitudes: Vec<Complex64> = (0..1usize << n)
            .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect();
        let norm = amplitudes.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt();
        for amplitude in &mut amplitudes {
            *amplitude /= norm;
        }
        QuantumStateVector::from_amplitudes(amplitudes).unwrap()
    }

    fn apply_circuit(circuit: &QuantumCircuitStructure, state: &mut QuantumStateVector) {
        for gate in circuit.gates() {
            gate.apply_to_full_state_vector(state);
        }
    }

    #[test]
    fn test_bell_pair_matches_expected_distribution() {
        let algorithm = QuantumAlgorithmBuilder::bell_pair().unwrap();
        let result = QuantumExecutionEngine::new().run(&algorithm.circuit).unwrap();
        for bitstring in ["00", "01", "10", "11"] {
            assert_abs_diff_eq!(
                result.probability_of(bitstring),
                algorithm.expected_distribution.probability_of(bitstring),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_qft_gate_count() {
        let circuit = QuantumAlgorithmBuilder::quantum_fourier_transform_circuit(5).unwrap();
        // 5 H + 10 CP + 2 SWAP
        assert_eq!(circuit.gate_count(), 17);
    }

    #[test]
    fn test_qft_then_inverse_restores_random_state() {
        let mut rng = StdRng::seed_from_u64(314);
        for n in 1..=5 {
            let qft = QuantumAlgorithmBuilder::quantum_fourier_transform(n).unwrap();
            let inverse = QuantumAlgorithmBuilder::inverse_quantum_fourier_transform(n).unwrap();

            let original = random_state(n, &mut rng);
            let mut state = original.clone();
            apply_circuit(&qft.circuit, &mut state);
            apply_circuit(&inverse.circuit, &mut state);

            assert_abs_diff_eq!(state.fidelity(&original), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_qft_of_basis_state_has_fourier_phases() {
        let n = 3;
        let x = 5usize;
        let dimension = 1usize << n;
        let circuit = QuantumAlgorithmBuilder::quantum_fourier_transform_circuit(n).unwrap();
        let mut state = QuantumStateVector::basis_state(n, x).unwrap();
        apply_circuit(&circuit, &mut state);

        let scale = 1.0 / (dimension as f64).sqrt();
        for k in 0..dimension {
            let phase = 2.0 * PI * (x * k) as f64 / dimension as f64;
            let expected = Complex64::from_polar(scale, phase);
            assert_abs_diff_eq!(state.amplitude(k).re, expected.re, epsilon = 1e-10);
            assert_abs_diff_eq!(state.amplitude(k).im, expected.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_optimal_grover_iterations() {
        assert_eq!(QuantumAlgorithmBuilder::optimal_grover_iterations(2), 1);
        assert_eq!(QuantumAlgorithmBuilder::optimal_grover_iterations(3), 2);
        assert_eq!(QuantumAlgorithmBuilder::optimal_grover_iterations(4), 3);
    }

    #[test]
    fn test_grover_finds_marked_bitstring() {
        let algorithm = QuantumAlgorithmBuilder::grover_iteration(3, "101").unwrap();
        assert_eq!(algorithm.grover_iterations, Some(2));

        let result = QuantumExecutionEngine::new().run(&algorithm.circuit).unwrap();
        let observed = result.probability_of("101");
        assert!(observed > 0.9, "P(101) = {observed}");
        assert_abs_diff_eq!(observed, algorithm.success_probability.unwrap(), epsilon = 1e-9);
        assert_abs_diff_eq!(
            result.probability_of("000"),
            algorithm.expected_distribution.probability_of("000"),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_grover_two_qubits_is_exact() {
        let algorithm = QuantumAlgorithmBuilder::grover_iteration(2, "01").unwrap();
        let result = QuantumExecutionEngine::new().run(&algorithm.circuit).unwrap();
        assert_abs_diff_eq!(result.probability_of("01"), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_grover_rejects_bad_target() {
        for target in ["10", "1a1", ""] {
            assert!(matches!(
                QuantumAlgorithmBuilder::grover_iteration(3, target),
                Err(QuantumSimulatorError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_get_algorithm_by_name() {
        let qft_parameters = AlgorithmParameters::default().with_quantum_bits(3);
        let qft = get_algorithm("QFT", &qft_parameters).unwrap();
        assert_eq!(qft.name, "quantum_fourier_transform");

        let grover_parameters = AlgorithmParameters::default().with_target("0110");
        let grover = get_algorithm("grover", &grover_parameters).unwrap();
        assert_eq!(grover.circuit.number_of_quantum_bits(), 4);
        assert_eq!(grover.grover_iterations, Some(3));

        let parameters: AlgorithmParameters =
            serde_json::from_str(r#"{"number_of_quantum_bits": 2, "inverse": true}"#).unwrap();
        assert_eq!(
            get_algorithm("quantum_fourier_transform", &parameters).unwrap().name,
            "inverse_quantum_fourier_transform"
        );

        assert!(matches!(
            get_algorithm("shor", &AlgorithmParameters::default()),
            Err(QuantumSimulatorError::UnknownAlgorithm(name)) if name == "shor"
        ));
        assert!(matches!(
            get_algorithm("qft", &AlgorithmParameters::default()),
            Err(QuantumSimulatorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_enumerated_distributions_sum_to_one() {
        let grover = QuantumAlgorithmBuilder::grover_iteration(3, "110").unwrap();
        let qft = QuantumAlgorithmBuilder::quantum_fourier_transform(3).unwrap();
        for distribution in [&grover.expected_distribution, &qft.expected_distribution] {
            let total: f64 = enumerate_expected_distribution(distribution, 3)
                .unwrap()
                .values()
                .sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        }
        assert!(matches!(
            enumerate_expected_distribution(&qft.expected_distribution, 64),
            Err(QuantumSimulatorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_grover_iteration_count_is_bounded() {
        // n = 3: optimal 2, so at most 8 caller-chosen iterations.
        assert_eq!(QuantumAlgorithmBuilder::maximum_grover_iterations(3), 8);
        assert!(QuantumAlgorithmBuilder::grover_with_iterations(3, "101", 8).is_ok());
        assert!(matches!(
            QuantumAlgorithmBuilder::grover_with_iterations(3, "101", 9),
            Err(QuantumSimulatorError::InvalidParameter(_))
        ));

        let parameters = AlgorithmParameters {
            iterations: Some(usize::MAX),
            ..AlgorithmParameters::default().with_target("101")
        };
        assert!(matches!(
            get_algorithm("grover", &parameters),
            Err(QuantumSimulatorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_success_probability_handles_large_iteration_counts() {
        let probability = QuantumAlgorithmBuilder::grover_success_probability(3, usize::MAX);
        assert!((0.0..=1.0).contains(&probability));
        assert_abs_diff_eq!(
            QuantumAlgorithmBuilder::grover_success_probability(2, 1),
            1.0,
            epsilon = 1e-12
        );
    }
}
