//! Property-based tests for the SMA engine.

mod common;

use cudafinance::{CpuBackend, SerialBackend, SmaEngine};
use proptest::prelude::*;

use common::{clamped_reference, cumulative_mean};

fn finite_sample() -> impl Strategy<Value = f32> {
    -1.0e4f32..1.0e4f32
}

fn series(max_len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(finite_sample(), 0..=max_len)
}

fn compute(engine: &SmaEngine, input: &[f32], window: usize) -> Vec<f32> {
    let mut output = vec![f32::NAN; input.len()];
    engine.compute_sma(input, &mut output, window as i64).unwrap();
    output
}

fn close(a: f32, e: f64) -> bool {
    (f64::from(a) - e).abs() <= 1e-3 + 1e-5 * e.abs()
}

proptest! {
    /// Output length always equals input length.
    #[test]
    fn sma_preserves_length(input in series(300), window in 1usize..=400) {
        let output = compute(&SmaEngine::default(), &input, window);
        prop_assert_eq!(output.len(), input.len());
    }

    /// Every element is the mean of the clamped trailing window.
    #[test]
    fn sma_matches_clamped_definition(input in series(300), window in 1usize..=64) {
        let output = compute(&SmaEngine::default(), &input, window);
        let expected = clamped_reference(&input, window);
        for (i, (&a, &e)) in output.iter().zip(expected.iter()).enumerate() {
            prop_assert!(close(a, e), "index {}: {} vs {}", i, a, e);
        }
    }

    /// Parallel CPU path agrees bit-for-bit with the serial loop.
    #[test]
    fn sma_cpu_equals_serial(input in series(2000), window in 1usize..=128, min_len in 1usize..=256) {
        let cpu = SmaEngine::with_backend(CpuBackend::new().with_min_task_len(min_len));
        let serial = SmaEngine::with_backend(SerialBackend);
        prop_assert_eq!(compute(&cpu, &input, window), compute(&serial, &input, window));
    }

    /// Window of one reproduces the input.
    #[test]
    fn sma_window_one_identity(input in series(300)) {
        let output = compute(&SmaEngine::default(), &input, 1);
        prop_assert_eq!(output, input);
    }

    /// A constant series stays constant for any window.
    #[test]
    fn sma_constant_equals_input(c in finite_sample(), len in 0usize..=200, window in 1usize..=64) {
        let input = vec![c; len];
        let output = compute(&SmaEngine::default(), &input, window);
        for (i, &v) in output.iter().enumerate() {
            prop_assert!(close(v, f64::from(c)), "index {}: {} vs {}", i, v, c);
        }
    }

    /// A window at least as long as the series yields the cumulative mean.
    #[test]
    fn sma_wide_window_is_cumulative_mean(input in series(200), extra in 0usize..=50) {
        let window = input.len().max(1) + extra;
        let output = compute(&SmaEngine::default(), &input, window);
        let expected = cumulative_mean(&input);
        for (i, (&a, &e)) in output.iter().zip(expected.iter()).enumerate() {
            prop_assert!(close(a, e), "index {}: {} vs {}", i, a, e);
        }
    }
}
