// =============================================================================
// MACROHARD Quantum Simulator - Bell State Demo
// =============================================================================
// Table of Contents:
//   1. Circuit construction from job-layer gate specifications
//   2. Single run with the exact Born distribution
//   3. Independent shots and empirical statistics
//   4. Algorithm templates
// =============================================================================
// Purpose: End-to-end walk through the simulator API. Set RUST_LOG=debug to
//          see engine tracing output.
// =============================================================================

use anyhow::Context;
use quantum_simulator::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // =========================================================================
    // 1. Circuit construction from job-layer gate specifications
    // =========================================================================
    let payload = r#"[
        {"type": "h", "target_qubits": [0]},
        {"type": "cnot", "target_qubits": [1], "control_qubits": [0]}
    ]"#;
    let specifications: Vec<GateSpecification> =
        serde_json::from_str(payload).context("parsing gate payload")?;
    let circuit = build_circuit(2, &specifications)?;

    println!("Circuit ID: {}", circuit.id());
    println!("Number of quantum bits: {}", circuit.number_of_quantum_bits());
    println!("Depth: {}", circuit.depth());
    println!();

    // =========================================================================
    // 2. Single run with the exact Born distribution
    // =========================================================================
    let engine = QuantumExecutionEngine::with_configuration(
        SimulatorConfiguration::default().with_seed(2024),
    );
    let single = engine.run(&circuit)?;
    println!("Single run ({:?}):", single.distribution_kind);
    for (bitstring, probability) in &single.probabilities {
        println!("  |{}>: {:.4}", bitstring, probability);
    }
    println!("  readout: {}", single.measurements[0].measurement_bitstring);
    println!();

    // =========================================================================
    // 3. Independent shots and empirical statistics
    // =========================================================================
    let shots = engine.execute(&circuit, 1000)?;
    println!(
        "1000 shots in {} us, entropy {:.4} bits:",
        shots.execution_time_microseconds, shots.statistics.entropy
    );
    for (bitstring, probability) in &shots.probabilities {
        let bar = "#".repeat((probability * 50.0) as usize);
        println!("  |{}>: {:.2}% {}", bitstring, probability * 100.0, bar);
    }
    println!();

    // =========================================================================
    // 4. Algorithm templates
    // =========================================================================
    let grover = get_algorithm(
        "grover",
        &AlgorithmParameters::default().with_target("101"),
    )?;
    let grover_run = engine.run(&grover.circuit)?;
    println!(
        "Grover search for 101: {} iterations, analytic p = {:.4}, simulated p = {:.4}",
        grover.grover_iterations.unwrap_or_default(),
        grover.success_probability.unwrap_or_default(),
        grover_run.probability_of("101")
    );

    let qft = get_algorithm("qft", &AlgorithmParameters::default().with_quantum_bits(3))?;
    let qft_run = engine.run(&qft.circuit)?;
    println!(
        "QFT on |000>: {} outcomes, each with p = {:.4}",
        qft_run.probabilities.len(),
        qft.expected_distribution.probability_of("000")
    );

    Ok(())
}
