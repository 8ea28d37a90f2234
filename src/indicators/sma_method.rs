//! Clamped trailing-window mean.
//!
//! `out[i]` averages `data[i + 1 - k ..= i]` where `k = min(window, i + 1)`, so
//! the first `window - 1` positions use whatever history exists instead of
//! being padded or left undefined.

use crate::error::{Result, SmaError};

/// Number of samples averaged at `index`.
#[inline]
pub fn effective_window(index: usize, window: usize) -> usize {
    window.min(index + 1)
}

/// Mean of the window ending at `index`.
///
/// Sums in `f64` and narrows once, so long windows do not drift the way an
/// `f32` accumulator would. `window` must be at least 1 and `index` in bounds.
#[inline]
pub fn sma_at(data: &[f32], index: usize, window: usize) -> f32 {
    let k = effective_window(index, window);
    let start = index + 1 - k;
    let sum: f64 = data[start..=index].iter().map(|&v| f64::from(v)).sum();
    (sum / k as f64) as f32
}

/// Checks the call contract and returns the window as `usize`.
///
/// Runs before any backend sees the buffers, so a rejected call never
/// writes to `output`.
pub fn validate_args(input_len: usize, output_len: usize, window: i64) -> Result<usize> {
    if window <= 0 {
        return Err(SmaError::InvalidWindow(window));
    }
    if input_len != output_len {
        return Err(SmaError::LengthMismatch {
            input: input_len,
            output: output_len,
        });
    }
    // Saturates on 32-bit targets; such a window already spans any series.
    let window = usize::try_from(window).unwrap_or(usize::MAX);
    Ok(window)
}

/// Single-threaded reference loop. Lengths must already be validated.
pub fn sma_serial(data: &[f32], out: &mut [f32], window: usize) {
    debug_assert_eq!(data.len(), out.len());
    debug_assert!(window > 0);
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = sma_at(data, i, window);
    }
}
