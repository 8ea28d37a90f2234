//! Rayon-backed CPU path: one task per output index.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::EngineConfig;
use crate::error::{Result, SmaError};
use crate::indicators::sma_at;

use super::SmaBackend;

/// Default lower bound on indices handed to a single rayon task.
pub const DEFAULT_MIN_TASK_LEN: usize = 1024;

pub struct CpuBackend {
    pool: Option<ThreadPool>,
    min_task_len: usize,
}

impl CpuBackend {
    /// Runs on rayon's global pool.
    pub fn new() -> Self {
        Self {
            pool: None,
            min_task_len: DEFAULT_MIN_TASK_LEN,
        }
    }

    /// Runs on a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(SmaError::Config("thread count must be > 0".into()));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("cudafinance-sma-{i}"))
            .build()
            .map_err(|e| SmaError::ResourceUnavailable(format!("rayon pool: {e}")))?;
        Ok(Self {
            pool: Some(pool),
            min_task_len: DEFAULT_MIN_TASK_LEN,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let backend = match config.threads {
            Some(threads) => Self::with_threads(threads)?,
            None => Self::new(),
        };
        Ok(backend.with_min_task_len(config.min_task_len))
    }

    pub fn with_min_task_len(mut self, min_task_len: usize) -> Self {
        self.min_task_len = min_task_len.max(1);
        self
    }

    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn run(&self, input: &[f32], output: &mut [f32], window: usize) {
        output
            .par_iter_mut()
            .with_min_len(self.min_task_len)
            .enumerate()
            .for_each(|(i, slot)| *slot = sma_at(input, i, window));
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SmaBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn launch(&self, input: &[f32], output: &mut [f32], window: usize) -> Result<()> {
        match &self.pool {
            Some(pool) => pool.install(|| self.run(input, output, window)),
            None => self.run(input, output, window),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::sma_serial;
    use approx::assert_relative_eq;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i % 97) as f32 * 0.5 - 10.0).collect()
    }

    #[test]
    fn test_cpu_matches_serial() {
        let input = ramp(5_000);
        let mut expected = vec![0.0f32; input.len()];
        sma_serial(&input, &mut expected, 37);

        let mut got = vec![f32::NAN; input.len()];
        CpuBackend::new()
            .with_min_task_len(64)
            .launch(&input, &mut got, 37)
            .unwrap();

        for (g, e) in got.iter().zip(expected.iter()) {
            assert_relative_eq!(*g, *e);
        }
    }

    #[test]
    fn test_dedicated_pool() {
        let backend = CpuBackend::with_threads(2).unwrap();
        assert_eq!(backend.threads(), 2);

        let input = [1.0f32, 2.0, 3.0, 4.0, 5.0];
        let mut out = [0.0f32; 5];
        backend.launch(&input, &mut out, 3).unwrap();
        assert_relative_eq!(out[1], 1.5);
        assert_relative_eq!(out[4], 4.0);
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(matches!(
            CpuBackend::with_threads(0),
            Err(SmaError::Config(_))
        ));
    }

    #[test]
    fn test_min_task_len_floor() {
        let backend = CpuBackend::new().with_min_task_len(0);
        assert_eq!(backend.min_task_len, 1);
    }
}
