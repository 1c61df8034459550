// =============================================================================
// MACROHARD Quantum Simulator - Async Execution Runtime
// =============================================================================
// Table of Contents:
//   1. AsyncQuantumExecutionEngine - Non-blocking circuit execution
//   2. CancellationToken - Shot batch cancellation
// =============================================================================
// Purpose: Lets async callers submit circuits without blocking the Tokio
//          reactor. Simulation runs on the blocking pool, bounded by a
//          semaphore sized to the CPU count.
// =============================================================================

use crate::circuit_program::QuantumCircuitStructure;
use crate::configuration::SimulatorConfiguration;
use crate::error::{ExecutionError, QuantumResult, QuantumSimulatorError};
use crate::execution::{QuantumExecutionEngine, SimulationResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

// =============================================================================
// 1. AsyncQuantumExecutionEngine - Non-blocking circuit execution
// =============================================================================

#[derive(Debug)]
pub struct AsyncQuantumExecutionEngine {
    engine_id: Uuid,
    engine: Arc<QuantumExecutionEngine>,
    max_concurrent_jobs: usize,
    job_semaphore: Arc<tokio::sync::Semaphore>,
}

impl Default for AsyncQuantumExecutionEngine {
    fn default() -> Self {
        Self::new(SimulatorConfiguration::default(), num_cpus::get())
    }
}

impl AsyncQuantumExecutionEngine {
    pub fn new(configuration: SimulatorConfiguration, max_concurrent_jobs: usize) -> Self {
        let max_concurrent_jobs = max_concurrent_jobs.max(1);
        Self {
            engine_id: Uuid::new_v4(),
            engine: Arc::new(QuantumExecutionEngine::with_configuration(configuration)),
            max_concurrent_jobs,
            job_semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent_jobs)),
        }
    }

    pub fn engine_id(&self) -> Uuid {
        self.engine_id
    }

    pub fn max_concurrent_jobs(&self) -> usize {
        self.max_concurrent_jobs
    }

    pub fn available_permits(&self) -> usize {
        self.job_semaphore.available_permits()
    }

    pub async fn execute_circuit_async(
        &self,
        circuit: QuantumCircuitStructure,
        shots: usize,
    ) -> QuantumResult<SimulationResult> {
        self.execute_with_cancellation(circuit, shots, CancellationToken::new())
            .await
    }

    pub async fn execute_with_cancellation(
        &self,
        circuit: QuantumCircuitStructure,
        shots: usize,
        cancellation: CancellationToken,
    ) -> QuantumResult<SimulationResult> {
        let permit = self
            .job_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ExecutionError::WorkerFailed("job semaphore closed".to_string()))?;

        if cancellation.is_cancelled() {
            return Err(ExecutionError::Cancelled {
                circuit_id: circuit.id(),
                completed: 0,
                total: shots,
            }
            .into());
        }

        let engine = self.engine.clone();
        tracing::debug!(
            "Async engine {} dispatching circuit {} ({} shots)",
            self.engine_id,
            circuit.id(),
            shots
        );

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            engine.execute_with_cancellation(&circuit, shots, &cancellation)
        })
        .await
        .map_err(|e| ExecutionError::WorkerFailed(e.to_string()))?
    }

    /// On expiry the batch token is cancelled so the blocking worker stops at
    /// its next shot boundary.
    pub async fn execute_with_timeout(
        &self,
        circuit: QuantumCircuitStructure,
        shots: usize,
        timeout_duration: Duration,
    ) -> QuantumResult<SimulationResult> {
        let cancellation = CancellationToken::new();
        let circuit_id = circuit.id();
        match timeout(
            timeout_duration,
            self.execute_with_cancellation(circuit, shots, cancellation.child_token()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                cancellation.cancel();
                tracing::warn!(
                    "Circuit {} timed out after {:?}",
                    circuit_id,
                    timeout_duration
                );
                Err(QuantumSimulatorError::Timeout(
                    u64::try_from(timeout_duration.as_millis()).unwrap_or(u64::MAX),
                ))
            }
        }
    }

    /// Runs every circuit concurrently; results keep input order.
    pub async fn execute_batch(
        self: &Arc<Self>,
        circuits: Vec<(QuantumCircuitStructure, usize)>,
    ) -> Vec<QuantumResult<SimulationResult>> {
        let mut handles = Vec::with_capacity(circuits.len());
        for (circuit, shots) in circuits {
            let engine = self.clone();
            handles.push(tokio::spawn(async move {
                engine.execute_circuit_async(circuit, shots).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(
                handle
                    .await
                    .unwrap_or_else(|e| Err(ExecutionError::WorkerFailed(e.to_string()).into())),
            );
        }
        results
    }
}

// =============================================================================
// 2. CancellationToken - Shot batch cancellation
// =============================================================================

#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<tokio::sync::Notify>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(tokio::sync::Notify::new()),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub async fn cancelled(&self) {
        let notified = self.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Shares the flag: cancelling either handle cancels both.
    pub fn child_token(&self) -> CancellationToken {
        CancellationToken {
            cancelled: self.cancelled.clone(),
            notify: self.notify.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bell_circuit() -> QuantumCircuitStructure {
        let mut circuit = QuantumCircuitStructure::new(2);
        circuit.apply_hadamard_gate(0).unwrap();
        circuit.apply_controlled_not_gate(0, 1).unwrap();
        circuit
    }

    #[tokio::test]
    async fn test_cancellation_token() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        let token2 = token.child_token();
        token.cancel();

        assert!(token.is_cancelled());
        assert!(token2.is_cancelled());
        token2.cancelled().await;
    }

    #[tokio::test]
    async fn test_execute_circuit_async() {
        let engine =
            AsyncQuantumExecutionEngine::new(SimulatorConfiguration::default().with_seed(8), 2);
        let result = engine.execute_circuit_async(bell_circuit(), 500).await.unwrap();

        assert_eq!(result.total_shots(), 500);
        let correlated = result.statistics.count_of("00") + result.statistics.count_of("11");
        assert_eq!(correlated, 500);
        assert_eq!(engine.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_pre_cancelled_job_is_rejected() {
        let engine = AsyncQuantumExecutionEngine::default();
        let token = CancellationToken::new();
        token.cancel();

        let err = engine
            .execute_with_cancellation(bell_circuit(), 10, token)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QuantumSimulatorError::Execution(ExecutionError::Cancelled { completed: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_execute_with_timeout_expires() {
        let mut circuit = QuantumCircuitStructure::new(18);
        for qubit in 0..18 {
            circuit.apply_hadamard_gate(qubit).unwrap();
        }
        let engine = AsyncQuantumExecutionEngine::new(SimulatorConfiguration::default(), 1);

        let err = engine
            .execute_with_timeout(circuit, 5_000, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(matches!(err, QuantumSimulatorError::Timeout(1)));
    }

    #[tokio::test]
    async fn test_execute_batch_preserves_order() {
        let engine = Arc::new(AsyncQuantumExecutionEngine::new(
            SimulatorConfiguration::default().with_seed(1),
            2,
        ));
        let results = engine
            .execute_batch(vec![
                (bell_circuit(), 20),
                (QuantumCircuitStructure::new(3), 1),
                (bell_circuit(), 0),
            ])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().shot_count, 20);
        assert_eq!(results[1].as_ref().unwrap().probability_of("000"), 1.0);
        assert!(results[2].is_err());
    }
}
