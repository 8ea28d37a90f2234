//! Shared helpers for the integration tests.

#![allow(dead_code)]

/// Deterministic standard-normal samples (splitmix64 + Box-Muller).
pub fn randn(len: usize, seed: u64) -> Vec<f32> {
    let mut state = seed;
    let mut next_unit = move || {
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        // (0, 1], never zero so ln() stays finite.
        ((z >> 11) as f64 + 1.0) / (1u64 << 53) as f64
    };
    (0..len)
        .map(|_| {
            let u1 = next_unit();
            let u2 = next_unit();
            let r = (-2.0 * u1.ln()).sqrt();
            (r * (2.0 * std::f64::consts::PI * u2).cos()) as f32
        })
        .collect()
}

/// Strict `window`-wide trailing means, one per full window
/// (numpy `convolve(data, ones(window), 'valid') / window`).
pub fn strict_trailing_mean(data: &[f32], window: usize) -> Vec<f64> {
    if window == 0 || window > data.len() {
        return Vec::new();
    }
    data.windows(window)
        .map(|w| w.iter().map(|&v| f64::from(v)).sum::<f64>() / window as f64)
        .collect()
}

/// Mean of `data[0..=i]` for every `i`.
pub fn cumulative_mean(data: &[f32]) -> Vec<f64> {
    let mut sum = 0.0f64;
    data.iter()
        .enumerate()
        .map(|(i, &v)| {
            sum += f64::from(v);
            sum / (i + 1) as f64
        })
        .collect()
}

/// Direct transcription of `mean(input[max(0, i-W+1) ..= i])`.
pub fn clamped_reference(data: &[f32], window: usize) -> Vec<f64> {
    (0..data.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &data[start..=i];
            slice.iter().map(|&v| f64::from(v)).sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// `|actual - expected| <= atol + rtol * |expected|`, element-wise.
pub fn assert_series_close(actual: &[f32], expected: &[f64], rtol: f64, atol: f64, name: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{}: Length mismatch: {} vs {}",
        name,
        actual.len(),
        expected.len()
    );
    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (f64::from(a) - e).abs();
        assert!(
            diff <= atol + rtol * e.abs(),
            "{}[{}]: Expected {} but got {} (diff: {:.2e})",
            name,
            i,
            e,
            a,
            diff
        );
    }
}
