//! The SMA engine: argument checks, backend dispatch and CPU fallback.

use std::sync::OnceLock;

use ndarray::Array1;
use tracing::{debug, info, warn};

use crate::backend::{BackendKind, CpuBackend, SerialBackend, SmaBackend};
use crate::config::EngineConfig;
use crate::error::{Result, SmaError};
use crate::indicators::validate_args;

/// Computes the clamped trailing-window mean on a chosen backend.
///
/// # Example
///
/// ```
/// use cudafinance::SmaEngine;
///
/// let engine = SmaEngine::default();
/// let input = [1.0f32, 2.0, 3.0, 4.0, 5.0];
/// let mut output = [0.0f32; 5];
/// engine.compute_sma(&input, &mut output, 3).unwrap();
/// assert_eq!(output, [1.0, 1.5, 2.0, 3.0, 4.0]);
/// ```
pub struct SmaEngine {
    backend: Box<dyn SmaBackend>,
    fallback: Option<Box<dyn SmaBackend>>,
}

impl SmaEngine {
    /// Wraps a backend with no fallback.
    pub fn with_backend<B: SmaBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Box::new(backend),
            fallback: None,
        }
    }

    /// Serves calls on `fallback` whenever the primary backend reports
    /// [`SmaError::ResourceUnavailable`].
    pub fn with_fallback<B: SmaBackend + 'static>(mut self, fallback: B) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Builds the engine described by `config`.
    ///
    /// `Auto` always degrades to the CPU when CUDA cannot be acquired. An
    /// explicit `Cuda` request only does so when `allow_cpu_fallback` is set.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let engine = match config.backend {
            BackendKind::Serial => Self::with_backend(SerialBackend),
            BackendKind::Cpu => Self::with_backend(CpuBackend::from_config(config)?),
            BackendKind::Cuda | BackendKind::Auto => match cuda_backend(config) {
                Ok(backend) => {
                    let engine = Self {
                        backend,
                        fallback: None,
                    };
                    if config.allow_cpu_fallback {
                        engine.with_fallback(CpuBackend::from_config(config)?)
                    } else {
                        engine
                    }
                }
                Err(err)
                    if err.is_resource_unavailable()
                        && (config.backend == BackendKind::Auto || config.allow_cpu_fallback) =>
                {
                    warn!(error = %err, requested = %config.backend, "CUDA unavailable, using CPU backend");
                    Self::with_backend(CpuBackend::from_config(config)?)
                }
                Err(err) => return Err(err),
            },
        };
        info!(
            backend = engine.backend_name(),
            accelerated = engine.is_accelerated(),
            "SMA engine ready"
        );
        Ok(engine)
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn is_accelerated(&self) -> bool {
        self.backend.is_accelerated()
    }

    /// Accelerator name, `None` when running on the host.
    pub fn device_name(&self) -> Option<&str> {
        self.backend.device_name()
    }

    /// Writes the moving average of `input` into `output`.
    ///
    /// `output[i]` is the mean of the last `min(window, i + 1)` samples ending
    /// at `i`. Arguments are checked before any work is dispatched; on an
    /// argument error `output` is left untouched. An empty series is a no-op.
    pub fn compute_sma(&self, input: &[f32], output: &mut [f32], window: i64) -> Result<()> {
        let window = validate_args(input.len(), output.len(), window)?;
        if input.is_empty() {
            return Ok(());
        }

        debug!(backend = self.backend.name(), len = input.len(), window, "dispatching SMA");
        match self.backend.launch(input, output, window) {
            Err(err) if err.is_resource_unavailable() => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        error = %err,
                        backend = self.backend.name(),
                        fallback = fallback.name(),
                        "retrying SMA on fallback backend"
                    );
                    fallback.launch(input, output, window)
                }
                None => Err(err),
            },
            other => other,
        }
    }

    /// Allocating variant over an `ndarray` series.
    pub fn sma(&self, data: &Array1<f32>, window: i64) -> Result<Array1<f32>> {
        let mut out = Array1::<f32>::zeros(data.len());
        let out_slice = out
            .as_slice_mut()
            .ok_or_else(|| SmaError::Launch("freshly allocated array is not contiguous".into()))?;
        match data.as_slice() {
            Some(input) => self.compute_sma(input, out_slice, window)?,
            None => {
                let input: Vec<f32> = data.iter().copied().collect();
                self.compute_sma(&input, out_slice, window)?;
            }
        }
        Ok(out)
    }
}

impl Default for SmaEngine {
    /// CPU engine on rayon's global pool.
    fn default() -> Self {
        Self::with_backend(CpuBackend::new())
    }
}

#[cfg(feature = "cuda")]
fn cuda_backend(config: &EngineConfig) -> Result<Box<dyn SmaBackend>> {
    Ok(Box::new(crate::backend::CudaBackend::from_config(config)?))
}

#[cfg(not(feature = "cuda"))]
fn cuda_backend(_config: &EngineConfig) -> Result<Box<dyn SmaBackend>> {
    Err(SmaError::ResourceUnavailable(
        "built without the `cuda` feature".into(),
    ))
}

static DEFAULT_ENGINE: OnceLock<SmaEngine> = OnceLock::new();

/// Process-wide engine configured from the `CUDAFINANCE_*` environment.
pub fn default_engine() -> Result<&'static SmaEngine> {
    if let Some(engine) = DEFAULT_ENGINE.get() {
        return Ok(engine);
    }
    let engine = SmaEngine::from_config(&EngineConfig::from_env()?)?;
    Ok(DEFAULT_ENGINE.get_or_init(|| engine))
}

/// [`SmaEngine::compute_sma`] on the [`default_engine`].
pub fn compute_sma(input: &[f32], output: &mut [f32], window: i64) -> Result<()> {
    default_engine()?.compute_sma(input, output, window)
}

/// [`SmaEngine::sma`] on the [`default_engine`].
pub fn sma(data: &Array1<f32>, window: i64) -> Result<Array1<f32>> {
    default_engine()?.sma(data, window)
}
