// =============================================================================
// MACROHARD Quantum Simulator - Execution Engine
// =============================================================================
// Table of Contents:
//   1. QuantumExecutionEngine - Configuration and resource checks
//   2. State evolution - Gate application and mid-circuit measurement
//   3. Single run
//   4. Independent multi-shot statistics
//   5. SimulationResult - Result container
//   6. execute - Default-engine entry point
// =============================================================================
// Purpose: Runs circuits against fresh state vectors. The engine holds no
//          per-run state: a run is a function of (circuit, shot count,
//          random source) and every shot owns its own state vector.
// =============================================================================

use crate::async_runtime::CancellationToken;
use crate::circuit_program::{CircuitInstruction, QuantumCircuitStructure};
use crate::configuration::SimulatorConfiguration;
use crate::error::{
    ExecutionError, NumericalDriftError, QuantumResult, QuantumSimulatorError, ResourceLimitError,
};
use crate::measurement::{
    MeasurementEngine, MeasurementEvent, MeasurementOutcome, MeasurementStatistics,
};
use crate::state_vector::{QuantumStateVector, estimated_state_bytes};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use uuid::Uuid;

/// Above this width shots run one at a time so that at most one dense state
/// is alive.
const PARALLEL_SHOT_QUBIT_LIMIT: usize = 20;

// =============================================================================
// 1. QuantumExecutionEngine - Configuration and resource checks
// =============================================================================

#[derive(Debug, Clone)]
pub struct QuantumExecutionEngine {
    engine_id: Uuid,
    configuration: SimulatorConfiguration,
}

impl Default for QuantumExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl QuantumExecutionEngine {
    pub fn new() -> Self {
        Self::with_configuration(SimulatorConfiguration::default())
    }

    pub fn with_configuration(configuration: SimulatorConfiguration) -> Self {
        Self {
            engine_id: Uuid::new_v4(),
            configuration,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.configuration.seed = Some(seed);
        self
    }

    pub fn engine_id(&self) -> Uuid {
        self.engine_id
    }

    pub fn configuration(&self) -> &SimulatorConfiguration {
        &self.configuration
    }

    /// Rejects circuits wider than the configured cap. Runs before any
    /// state is allocated.
    pub fn check_resource_limit(
        &self,
        circuit: &QuantumCircuitStructure,
    ) -> Result<(), ResourceLimitError> {
        let qubits = circuit.number_of_quantum_bits();
        let max = self.configuration.maximum_quantum_bits;
        if qubits > max || estimated_state_bytes(qubits).is_none() {
            tracing::warn!(
                "Rejecting circuit {}: {} qubits exceeds maximum {}",
                circuit.id(),
                qubits,
                max
            );
            return Err(ResourceLimitError::TooManyQubits { qubits, max });
        }
        Ok(())
    }

    fn master_rng(&self) -> StdRng {
        match self.configuration.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    // =========================================================================
    // 2. State evolution - Gate application and mid-circuit measurement
    // =========================================================================

    /// Applies every instruction in program order to a fresh |0...0>.
    /// Returns the final state and the outcomes of explicit measurement
    /// steps.
    pub fn evolve<R: Rng + ?Sized>(
        &self,
        circuit: &QuantumCircuitStructure,
        rng: &mut R,
    ) -> QuantumResult<(QuantumStateVector, Vec<MeasurementOutcome>)> {
        self.check_resource_limit(circuit)?;

        let mut state = QuantumStateVector::zero_state(circuit.number_of_quantum_bits());
        let mut mid_circuit_outcomes = Vec::new();

        for (instruction_index, instruction) in circuit.instructions().iter().enumerate() {
            match instruction {
                CircuitInstruction::Gate(gate) => {
                    gate.apply_to_full_state_vector(&mut state);
                    if self.configuration.verify_normalization {
                        check_normalization(
                            &state,
                            instruction_index,
                            gate.gate_name(),
                            self.configuration.normalization_tolerance,
                        )
                        .inspect_err(|err| tracing::error!("{}", err))?;
                    }
                }
                CircuitInstruction::Measure { qubit } => {
                    mid_circuit_outcomes.push(MeasurementEngine::measure(&mut state, *qubit, rng)?);
                }
            }
        }

        Ok((state, mid_circuit_outcomes))
    }

    /// Final state of one run. Circuits with measurement steps yield one
    /// sampled branch.
    pub fn execute_statevector_only(
        &self,
        circuit: &QuantumCircuitStructure,
    ) -> QuantumResult<QuantumStateVector> {
        let mut rng = self.master_rng();
        let (state, _) = self.evolve(circuit, &mut rng)?;
        Ok(state)
    }

    fn execute_shot<R: Rng + ?Sized>(
        &self,
        circuit: &QuantumCircuitStructure,
        shot_index: usize,
        rng: &mut R,
    ) -> QuantumResult<MeasurementEvent> {
        let (mut state, mid_circuit_outcomes) = self.evolve(circuit, rng)?;
        let readout = MeasurementEngine::measure_all(&mut state, rng)?;
        Ok(MeasurementEvent::new(shot_index, mid_circuit_outcomes, readout))
    }

    // =========================================================================
    // 3. Single run
    // =========================================================================

    pub fn run(&self, circuit: &QuantumCircuitStructure) -> QuantumResult<SimulationResult> {
        let mut rng = self.master_rng();
        self.run_with_rng(circuit, &mut rng)
    }

    /// One shot drawing from `rng`. The probability map is the exact Born
    /// distribution of the state just before the final readout.
    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        circuit: &QuantumCircuitStructure,
        rng: &mut R,
    ) -> QuantumResult<SimulationResult> {
        let start_time = Instant::now();
        tracing::debug!(
            "Engine {} running circuit {} ({} qubits, depth {})",
            self.engine_id,
            circuit.id(),
            circuit.number_of_quantum_bits(),
            circuit.depth()
        );

        let (mut state, mid_circuit_outcomes) = self.evolve(circuit, rng)?;
        let probabilities = MeasurementEngine::get_probabilities_above(
            &state,
            self.configuration.probability_threshold,
        );
        let readout = MeasurementEngine::measure_all(&mut state, rng)?;
        let measurements = vec![MeasurementEvent::new(0, mid_circuit_outcomes, readout)];
        let statistics = MeasurementStatistics::from_events(&measurements);

        Ok(SimulationResult {
            circuit_id: circuit.id(),
            measurements,
            probabilities,
            distribution_kind: DistributionKind::BornRule,
            statistics,
            shot_count: 1,
            execution_time_microseconds: elapsed_microseconds(start_time),
        })
    }

    // =========================================================================
    // 4. Independent multi-shot statistics
    // =========================================================================

    pub fn run_statistics(
        &self,
        circuit: &QuantumCircuitStructure,
        shots: usize,
    ) -> QuantumResult<SimulationResult> {
        self.run_statistics_with_cancellation(circuit, shots, &CancellationToken::new())
    }

    /// Runs `shots` independent simulations, each on its own fresh state
    /// and its own RNG stream derived from the master seed. Cancellation is
    /// observed between shots only.
    pub fn run_statistics_with_cancellation(
        &self,
        circuit: &QuantumCircuitStructure,
        shots: usize,
        cancellation: &CancellationToken,
    ) -> QuantumResult<SimulationResult> {
        if shots == 0 {
            return Err(ExecutionError::InvalidShotCount(shots).into());
        }
        self.check_resource_limit(circuit)?;

        let start_time = Instant::now();
        let mut master = self.master_rng();
        let shot_seeds: Vec<u64> = (0..shots).map(|_| master.next_u64()).collect();
        let completed = AtomicUsize::new(0);

        let run_one = |shot_index: usize, seed: u64| -> QuantumResult<MeasurementEvent> {
            if cancellation.is_cancelled() {
                return Err(ExecutionError::Cancelled {
                    circuit_id: circuit.id(),
                    completed: completed.load(Ordering::SeqCst),
                    total: shots,
                }
                .into());
            }
            let mut rng = StdRng::seed_from_u64(seed);
            let event = self.execute_shot(circuit, shot_index, &mut rng)?;
            completed.fetch_add(1, Ordering::SeqCst);
            Ok(event)
        };

        let parallel = self.configuration.parallel_shots
            && circuit.number_of_quantum_bits() <= PARALLEL_SHOT_QUBIT_LIMIT;
        tracing::debug!(
            "Engine {} running {} shots of circuit {} (parallel: {})",
            self.engine_id,
            shots,
            circuit.id(),
            parallel
        );

        let measurements = run_shots(&shot_seeds, parallel, run_one).inspect_err(|err| {
            if matches!(err, QuantumSimulatorError::Execution(ExecutionError::Cancelled { .. })) {
                tracing::info!("Shot batch for circuit {} cancelled", circuit.id());
            }
        })?;

        let statistics = MeasurementStatistics::from_events(&measurements);
        let execution_time_microseconds = elapsed_microseconds(start_time);
        tracing::info!(
            "Circuit {} completed {} shots in {} us (entropy {:.4} bits)",
            circuit.id(),
            shots,
            execution_time_microseconds,
            statistics.entropy
        );

        Ok(SimulationResult {
            circuit_id: circuit.id(),
            probabilities: statistics.probabilities.clone(),
            measurements,
            distribution_kind: DistributionKind::Empirical,
            statistics,
            shot_count: shots,
            execution_time_microseconds,
        })
    }

    /// One shot runs once with the exact distribution; more shots build an
    /// empirical one.
    pub fn execute(
        &self,
        circuit: &QuantumCircuitStructure,
        shots: usize,
    ) -> QuantumResult<SimulationResult> {
        self.execute_with_cancellation(circuit, shots, &CancellationToken::new())
    }

    pub fn execute_with_cancellation(
        &self,
        circuit: &QuantumCircuitStructure,
        shots: usize,
        cancellation: &CancellationToken,
    ) -> QuantumResult<SimulationResult> {
        match shots {
            0 => Err(ExecutionError::InvalidShotCount(0).into()),
            1 => self.run(circuit),
            _ => self.run_statistics_with_cancellation(circuit, shots, cancellation),
        }
    }
}

#[cfg(feature = "parallel_shots")]
fn run_shots<F>(
    shot_seeds: &[u64],
    parallel: bool,
    run_one: F,
) -> QuantumResult<Vec<MeasurementEvent>>
where
    F: Fn(usize, u64) -> QuantumResult<MeasurementEvent> + Sync,
{
    use rayon::prelude::*;

    if parallel {
        shot_seeds
            .par_iter()
            .enumerate()
            .map(|(shot_index, &seed)| run_one(shot_index, seed))
            .collect()
    } else {
        run_shots_sequentially(shot_seeds, run_one)
    }
}

#[cfg(not(feature = "parallel_shots"))]
fn run_shots<F>(
    shot_seeds: &[u64],
    _parallel: bool,
    run_one: F,
) -> QuantumResult<Vec<MeasurementEvent>>
where
    F: Fn(usize, u64) -> QuantumResult<MeasurementEvent> + Sync,
{
    run_shots_sequentially(shot_seeds, run_one)
}

fn run_shots_sequentially<F>(
    shot_seeds: &[u64],
    run_one: F,
) -> QuantumResult<Vec<MeasurementEvent>>
where
    F: Fn(usize, u64) -> QuantumResult<MeasurementEvent>,
{
    shot_seeds
        .iter()
        .enumerate()
        .map(|(shot_index, &seed)| run_one(shot_index, seed))
        .collect()
}

pub(crate) fn check_normalization(
    state: &QuantumStateVector,
    instruction_index: usize,
    gate_name: &str,
    tolerance: f64,
) -> Result<(), NumericalDriftError> {
    let norm_squared = state.norm_squared();
    if (norm_squared - 1.0).abs() > tolerance {
        return Err(NumericalDriftError {
            instruction_index,
            gate_name: gate_name.to_string(),
            norm_squared,
            tolerance,
        });
    }
    Ok(())
}

fn elapsed_microseconds(start_time: Instant) -> u64 {
    u64::try_from(start_time.elapsed().as_micros()).unwrap_or(u64::MAX)
}

// =============================================================================
// 5. SimulationResult - Result container
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionKind {
    /// |amplitude|^2 of the final state of a single run.
    BornRule,
    /// Observed frequencies over independent shots.
    Empirical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub circuit_id: Uuid,
    pub measurements: Vec<MeasurementEvent>,
    pub probabilities: BTreeMap<String, f64>,
    pub distribution_kind: DistributionKind,
    pub statistics: MeasurementStatistics,
    pub shot_count: usize,
    pub execution_time_microseconds: u64,
}

impl SimulationResult {
    pub fn total_shots(&self) -> usize {
        self.measurements.len()
    }

    /// Mid-circuit and readout outcomes of the first shot.
    pub fn measurement_outcomes(&self) -> Vec<MeasurementOutcome> {
        self.measurements
            .first()
            .map(|event| {
                event
                    .mid_circuit_outcomes
                    .iter()
                    .chain(event.readout_outcomes.iter())
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn probability_of(&self, bitstring: &str) -> f64 {
        self.probabilities.get(bitstring).copied().unwrap_or(0.0)
    }
}

// =============================================================================
// 6. execute - Default-engine entry point
// =============================================================================

pub fn execute(circuit: &QuantumCircuitStructure, shots: usize) -> QuantumResult<SimulationResult> {
    QuantumExecutionEngine::new().execute(circuit, shots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate_operations::QuantumGate;
    use approx::assert_abs_diff_eq;
    use num_complex::Complex64;

    fn bell_circuit() -> QuantumCircuitStructure {
        let mut circuit = QuantumCircuitStructure::new(2);
        circuit.apply_hadamard_gate(0).unwrap();
        circuit.apply_controlled_not_gate(0, 1).unwrap();
        circuit
    }

    #[test]
    fn test_circuit_execution() {
        let engine = QuantumExecutionEngine::new().with_seed(11);
        let result = engine.execute(&bell_circuit(), 100).unwrap();
        assert_eq!(result.total_shots(), 100);
        assert_eq!(result.shot_count, 100);
        assert_eq!(result.distribution_kind, DistributionKind::Empirical);
    }

    #[test]
    fn test_bell_pair_ten_thousand_shots() {
        let engine = QuantumExecutionEngine::new().with_seed(42);
        let result = engine.execute(&bell_circuit(), 10_000).unwrap();

        assert_eq!(result.statistics.total_shots, 10_000);
        assert_eq!(result.probabilities.len(), 2);
        for bitstring in ["00", "11"] {
            let observed = result.probability_of(bitstring);
            assert!((observed - 0.5).abs() < 0.05, "P({bitstring}) = {observed}");
        }
    }

    #[test]
    fn test_single_run_reports_born_distribution() {
        let engine = QuantumExecutionEngine::new().with_seed(3);
        let result = engine.run(&bell_circuit()).unwrap();

        assert_eq!(result.distribution_kind, DistributionKind::BornRule);
        assert_eq!(result.shot_count, 1);
        assert_abs_diff_eq!(result.probability_of("00"), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(result.probability_of("11"), 0.5, epsilon = 1e-12);
        let outcomes = result.measurement_outcomes();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].outcome, outcomes[1].outcome);
    }

    #[test]
    fn test_zero_shots_rejected() {
        let engine = QuantumExecutionEngine::new();
        let err = engine.execute(&bell_circuit(), 0).unwrap_err();
        assert!(matches!(
            err,
            QuantumSimulatorError::Execution(ExecutionError::InvalidShotCount(0))
        ));
    }

    #[test]
    fn test_resource_limit_checked_before_allocation() {
        // 30 qubits would need 16 GiB; the check must fire first.
        let mut circuit = QuantumCircuitStructure::new(30);
        circuit.apply_hadamard_gate(29).unwrap();
        let engine = QuantumExecutionEngine::new();

        for shots in [1, 100] {
            let err = engine.execute(&circuit, shots).unwrap_err();
            assert!(matches!(
                err,
                QuantumSimulatorError::ResourceLimit(ResourceLimitError::TooManyQubits {
                    qubits: 30,
                    max: 24
                })
            ));
        }
    }

    #[test]
    fn test_mid_circuit_measurement_continues_on_collapsed_state() {
        // H, measure, then X: the final readout is always the flipped
        // mid-circuit outcome.
        let mut circuit = QuantumCircuitStructure::new(1);
        circuit.apply_hadamard_gate(0).unwrap();
        circuit.add_measurement(0).unwrap();
        circuit.apply_pauli_x_gate(0).unwrap();

        let engine = QuantumExecutionEngine::new().with_seed(99);
        let result = engine.run_statistics(&circuit, 200).unwrap();
        for event in &result.measurements {
            assert_eq!(event.mid_circuit_outcomes.len(), 1);
            let mid = event.mid_circuit_outcomes[0].outcome;
            assert_eq!(event.measurement_bitstring, if mid == 0 { "1" } else { "0" });
            assert_abs_diff_eq!(event.readout_outcomes[0].probability, 1.0, epsilon = 1e-12);
        }
        assert!(result.statistics.count_of("0") > 0);
        assert!(result.statistics.count_of("1") > 0);
    }

    #[test]
    fn test_shots_are_independent_fresh_runs() {
        let mut circuit = QuantumCircuitStructure::new(1);
        circuit.apply_hadamard_gate(0).unwrap();

        let engine = QuantumExecutionEngine::new().with_seed(5);
        let result = engine.run_statistics(&circuit, 100).unwrap();

        assert_eq!(result.measurements.len(), 100);
        for (index, event) in result.measurements.iter().enumerate() {
            assert_eq!(event.shot_index, index);
            // Each shot measured a fresh superposition, never a collapsed
            // state left over from an earlier shot.
            assert_abs_diff_eq!(event.readout_outcomes[0].probability, 0.5, epsilon = 1e-12);
        }
        assert!(result.statistics.count_of("0") > 0);
        assert!(result.statistics.count_of("1") > 0);
    }

    #[test]
    fn test_seeded_runs_are_reproducible_across_worker_modes() {
        let circuit = bell_circuit();
        let parallel = QuantumExecutionEngine::with_configuration(
            SimulatorConfiguration::default().with_seed(2024).with_parallel_shots(true),
        );
        let sequential = QuantumExecutionEngine::with_configuration(
            SimulatorConfiguration::default().with_seed(2024).with_parallel_shots(false),
        );

        let a = parallel.run_statistics(&circuit, 64).unwrap();
        let b = sequential.run_statistics(&circuit, 64).unwrap();
        assert_eq!(a.measurements, b.measurements);
    }

    #[test]
    fn test_cancelled_batch_stops() {
        let token = CancellationToken::new();
        token.cancel();
        let engine = QuantumExecutionEngine::new();
        let err = engine
            .run_statistics_with_cancellation(&bell_circuit(), 10, &token)
            .unwrap_err();
        assert!(matches!(
            err,
            QuantumSimulatorError::Execution(ExecutionError::Cancelled { total: 10, .. })
        ));
    }

    #[test]
    fn test_normalization_check_detects_drift() {
        let mut state = QuantumStateVector::zero_state(1);
        state.amplitudes_mut()[0] = Complex64::new(1.1, 0.0);
        let err = check_normalization(&state, 4, "pauli_x_gate", 1e-9).unwrap_err();
        assert_eq!(err.instruction_index, 4);
        assert!(check_normalization(&QuantumStateVector::zero_state(2), 0, "h", 1e-9).is_ok());
    }

    #[test]
    fn test_evolve_stops_at_first_drifting_instruction() {
        let mut configuration = SimulatorConfiguration::default().with_normalization_check(true);
        configuration.normalization_tolerance = 1e-12;
        let engine = QuantumExecutionEngine::with_configuration(configuration);

        // Within the unitarity tolerance but inflates |0> by 2e-11.
        let zero = Complex64::new(0.0, 0.0);
        let leaky = [[Complex64::new(1.0 + 1e-11, 0.0), zero], [zero, Complex64::new(1.0, 0.0)]];
        let mut circuit = QuantumCircuitStructure::new(1);
        circuit.apply_hadamard_gate(0).unwrap();
        circuit.add_gate(QuantumGate::custom_single_qubit(0, leaky).unwrap()).unwrap();
        circuit.apply_pauli_x_gate(0).unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        match engine.evolve(&circuit, &mut rng) {
            Err(QuantumSimulatorError::NumericalDrift(err)) => {
                assert_eq!(err.instruction_index, 1);
                assert_eq!(err.gate_name, "custom_single_qubit_gate");
                assert!(err.norm_squared > 1.0);
            }
            other => panic!("expected drift at instruction 1, got {other:?}"),
        }
        assert!(matches!(engine.run(&circuit), Err(QuantumSimulatorError::NumericalDrift(_))));

        let relaxed = QuantumExecutionEngine::with_configuration(
            SimulatorConfiguration::default().with_normalization_check(true),
        );
        assert!(relaxed.evolve(&circuit, &mut rng).is_ok());
    }

    #[test]
    fn test_statevector_only() {
        let engine = QuantumExecutionEngine::new();
        let state = engine.execute_statevector_only(&bell_circuit()).unwrap();
        let expected = std::f64::consts::FRAC_1_SQRT_2;
        assert_abs_diff_eq!(state.amplitude(0).re, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(state.amplitude(3).re, expected, epsilon = 1e-12);
    }
}
