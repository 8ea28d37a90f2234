//! Simple moving average over `f32` series, dispatched to CUDA or a CPU
//! thread pool, with optional Python bindings.
//!
//! `output[i]` is the mean of the trailing `min(window, i + 1)` samples, so
//! the start of the series averages over whatever history is available.

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod indicators;
#[cfg(feature = "python")]
mod python;

pub use backend::{available_backends, BackendKind, CpuBackend, SerialBackend, SmaBackend};
#[cfg(feature = "cuda")]
pub use backend::CudaBackend;
pub use config::EngineConfig;
pub use engine::{compute_sma, default_engine, sma, SmaEngine};
pub use error::{Result, SmaError};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn cudafinance(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_class::<python::PyBackend>()?;
    m.add_class::<python::PySmaEngine>()?;
    m.add_function(wrap_pyfunction!(python::launch_sma, m)?)?;
    m.add_function(wrap_pyfunction!(python::sma_py, m)?)?;
    m.add_function(wrap_pyfunction!(python::available_backends_py, m)?)?;

    Ok(())
}
