//! Python bindings (feature `python`).
//!
//! `launchSMA(input, output, window_size)` keeps the calling convention of
//! the original extension module: `output` is a `float32` numpy array written
//! in place, `input` is converted to `float32` when needed. The GIL is
//! released while the kernel runs.

use numpy::{BorrowError, IntoPyArray, PyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::backend::{available_backends, BackendKind};
use crate::config::EngineConfig;
use crate::engine::{default_engine, SmaEngine};

#[pyclass(name = "Backend")]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PyBackend {
    Auto,
    Cuda,
    Cpu,
    Serial,
}

impl From<PyBackend> for BackendKind {
    fn from(b: PyBackend) -> Self {
        match b {
            PyBackend::Auto => BackendKind::Auto,
            PyBackend::Cuda => BackendKind::Cuda,
            PyBackend::Cpu => BackendKind::Cpu,
            PyBackend::Serial => BackendKind::Serial,
        }
    }
}

#[pyclass(name = "SmaEngine")]
pub struct PySmaEngine {
    inner: SmaEngine,
}

#[pymethods]
impl PySmaEngine {
    #[new]
    #[pyo3(signature = (backend = PyBackend::Auto, device_id = 0, threads = None, allow_cpu_fallback = true))]
    fn new(
        backend: PyBackend,
        device_id: usize,
        threads: Option<usize>,
        allow_cpu_fallback: bool,
    ) -> PyResult<Self> {
        let config = EngineConfig {
            backend: backend.into(),
            device_id,
            threads,
            allow_cpu_fallback,
            ..EngineConfig::default()
        };
        Ok(Self {
            inner: SmaEngine::from_config(&config)?,
        })
    }

    #[getter]
    fn backend_name(&self) -> String {
        self.inner.backend_name().to_string()
    }

    #[getter]
    fn is_accelerated(&self) -> bool {
        self.inner.is_accelerated()
    }

    #[getter]
    fn device_name(&self) -> Option<String> {
        self.inner.device_name().map(str::to_string)
    }

    fn compute<'py>(
        &self,
        py: Python<'py>,
        input: &'py PyAny,
        output: &'py PyArray1<f32>,
        window_size: i64,
    ) -> PyResult<()> {
        launch_with(py, &self.inner, input, output, window_size)
    }
}

/// Launches the Simple Moving Average (SMA) computation, writing into `output`.
///
/// `input` may be any 1-D array-like; it is converted to `float32` first.
#[pyfunction]
#[pyo3(name = "launchSMA")]
pub fn launch_sma<'py>(
    py: Python<'py>,
    input: &'py PyAny,
    output: &'py PyArray1<f32>,
    window_size: i64,
) -> PyResult<()> {
    launch_with(py, default_engine()?, input, output, window_size)
}

/// Returns a new array holding the SMA of `input`.
#[pyfunction]
#[pyo3(name = "sma")]
pub fn sma_py<'py>(
    py: Python<'py>,
    input: &'py PyAny,
    window_size: i64,
) -> PyResult<&'py PyArray1<f32>> {
    let engine = default_engine()?;
    let data = as_f32_array(py, input)?
        .try_readonly()
        .map_err(borrow_err)?
        .as_array()
        .to_owned();
    let out = py.allow_threads(|| engine.sma(&data, window_size))?;
    Ok(out.into_pyarray(py))
}

#[pyfunction]
#[pyo3(name = "available_backends")]
pub fn available_backends_py() -> Vec<&'static str> {
    available_backends()
}

/// `float32` arrays pass through untouched; anything else goes through
/// `numpy.ascontiguousarray(obj, dtype=numpy.float32)`.
fn as_f32_array<'py>(py: Python<'py>, obj: &'py PyAny) -> PyResult<&'py PyArray1<f32>> {
    if let Ok(arr) = obj.downcast::<PyArray1<f32>>() {
        return Ok(arr);
    }
    let numpy = py.import("numpy")?;
    let kwargs = PyDict::new(py);
    kwargs.set_item("dtype", numpy.getattr("float32")?)?;
    let converted = numpy.call_method("ascontiguousarray", (obj,), Some(kwargs))?;
    Ok(converted.downcast::<PyArray1<f32>>()?)
}

fn borrow_err(e: BorrowError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn launch_with<'py>(
    py: Python<'py>,
    engine: &SmaEngine,
    input: &'py PyAny,
    output: &'py PyArray1<f32>,
    window_size: i64,
) -> PyResult<()> {
    let not_contiguous = |_| PyValueError::new_err("output array must be C-contiguous");
    let input = as_f32_array(py, input)?;

    {
        let input_ro = input.try_readonly().map_err(borrow_err)?;
        // Fails when output is the input or overlaps it; handled below.
        if let Ok(mut out) = output.try_readwrite() {
            let owned;
            let data: &[f32] = match input_ro.as_slice() {
                Ok(s) => s,
                Err(_) => {
                    owned = input_ro.as_array().to_vec();
                    &owned
                }
            };
            let out_slice = out.as_slice_mut().map_err(not_contiguous)?;
            py.allow_threads(|| engine.compute_sma(data, out_slice, window_size))?;
            return Ok(());
        }
    }

    // Shared memory: snapshot the input, then borrow the output alone.
    let data = input
        .try_readonly()
        .map_err(borrow_err)?
        .as_array()
        .to_vec();
    let mut out = output.try_readwrite().map_err(borrow_err)?;
    let out_slice = out.as_slice_mut().map_err(not_contiguous)?;
    py.allow_threads(|| engine.compute_sma(&data, out_slice, window_size))?;
    Ok(())
}
