// =============================================================================
// MACROHARD Quantum Simulator - Simulator Configuration
// =============================================================================
// Table of Contents:
//   1. SimulatorConfiguration - Limits, tolerances, sampling options
//   2. Loading from TOML
// =============================================================================
// Purpose: Runtime knobs for the executor. Every field has a default so a
//          partial TOML document is enough.
// =============================================================================

use crate::error::{QuantumResult, QuantumSimulatorError};
use crate::measurement::DEFAULT_PROBABILITY_THRESHOLD;
use crate::state_vector::NORMALIZATION_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 2^24 complex128 amplitudes occupy 256 MiB.
pub const DEFAULT_MAXIMUM_QUANTUM_BITS: usize = 24;

// =============================================================================
// 1. SimulatorConfiguration - Limits, tolerances, sampling options
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfiguration {
    pub maximum_quantum_bits: usize,
    pub normalization_tolerance: f64,
    /// Check the norm after every gate and fail with a drift error.
    pub verify_normalization: bool,
    pub probability_threshold: f64,
    /// Spread independent shots over the rayon pool when available.
    pub parallel_shots: bool,
    /// Master seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulatorConfiguration {
    fn default() -> Self {
        Self {
            maximum_quantum_bits: DEFAULT_MAXIMUM_QUANTUM_BITS,
            normalization_tolerance: NORMALIZATION_TOLERANCE,
            verify_normalization: cfg!(debug_assertions),
            probability_threshold: DEFAULT_PROBABILITY_THRESHOLD,
            parallel_shots: true,
            seed: None,
        }
    }
}

impl SimulatorConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_maximum_quantum_bits(mut self, maximum_quantum_bits: usize) -> Self {
        self.maximum_quantum_bits = maximum_quantum_bits;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_normalization_check(mut self, verify_normalization: bool) -> Self {
        self.verify_normalization = verify_normalization;
        self
    }

    pub fn with_parallel_shots(mut self, parallel_shots: bool) -> Self {
        self.parallel_shots = parallel_shots;
        self
    }

    pub fn validate(&self) -> QuantumResult<()> {
        if self.maximum_quantum_bits == 0 || self.maximum_quantum_bits >= usize::BITS as usize - 4 {
            return Err(QuantumSimulatorError::Configuration(format!(
                "maximum_quantum_bits must be in 1..{}, got {}",
                usize::BITS - 4,
                self.maximum_quantum_bits
            )));
        }
        if !(self.normalization_tolerance.is_finite() && self.normalization_tolerance > 0.0) {
            return Err(QuantumSimulatorError::Configuration(format!(
                "normalization_tolerance must be positive, got {}",
                self.normalization_tolerance
            )));
        }
        if !(self.probability_threshold.is_finite() && self.probability_threshold >= 0.0) {
            return Err(QuantumSimulatorError::Configuration(format!(
                "probability_threshold must be non-negative, got {}",
                self.probability_threshold
            )));
        }
        Ok(())
    }

    // =========================================================================
    // 2. Loading from TOML
    // =========================================================================

    pub fn from_toml_str(text: &str) -> QuantumResult<Self> {
        let configuration: Self = toml::from_str(text)?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> QuantumResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("Loaded simulator configuration from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let configuration = SimulatorConfiguration::default();
        assert_eq!(configuration.maximum_quantum_bits, 24);
        assert_eq!(configuration.normalization_tolerance, 1e-9);
        assert!(configuration.seed.is_none());
        assert!(configuration.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let configuration = SimulatorConfiguration::from_toml_str(
            r#"
            maximum_quantum_bits = 16
            seed = 1234
            "#,
        )
        .unwrap();
        assert_eq!(configuration.maximum_quantum_bits, 16);
        assert_eq!(configuration.seed, Some(1234));
        assert!(configuration.parallel_shots);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(SimulatorConfiguration::from_toml_str("maximum_quantum_bits = 0").is_err());
        assert!(SimulatorConfiguration::from_toml_str("normalization_tolerance = -1.0").is_err());
        assert!(SimulatorConfiguration::from_toml_str("maximum_quantum_bits = \"many\"").is_err());
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err =
            SimulatorConfiguration::from_toml_file("/nonexistent/simulator.toml").unwrap_err();
        assert!(matches!(err, QuantumSimulatorError::Configuration(_)));
    }
}
