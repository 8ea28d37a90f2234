//! Execution backends for the SMA kernel.
//!
//! Every backend receives buffers that already passed argument validation,
//! so implementations only have to fill `output`.

pub mod cpu;
#[cfg(feature = "cuda")]
pub mod cuda;
pub mod serial;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SmaError};

pub use cpu::CpuBackend;
#[cfg(feature = "cuda")]
pub use cuda::CudaBackend;
pub use serial::SerialBackend;

/// A parallel (or not) executor of the clamped-window mean.
pub trait SmaBackend: Send + Sync {
    /// Short identifier used in logs and by the Python `backend_name` getter.
    fn name(&self) -> &str;

    /// Whether work leaves the host CPU.
    fn is_accelerated(&self) -> bool {
        false
    }

    /// Human-readable device the work runs on, if it is not the host.
    fn device_name(&self) -> Option<&str> {
        None
    }

    /// Writes `output[i]` for every index. `input.len() == output.len()`,
    /// `input` is non-empty and `window >= 1`.
    fn launch(&self, input: &[f32], output: &mut [f32], window: usize) -> Result<()>;
}

/// Which backend an engine should be built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// CUDA when a device is present, CPU otherwise.
    #[default]
    Auto,
    Cuda,
    Cpu,
    Serial,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cuda => "cuda",
            Self::Cpu => "cpu",
            Self::Serial => "serial",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = SmaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cuda" | "gpu" => Ok(Self::Cuda),
            "cpu" | "rayon" => Ok(Self::Cpu),
            "serial" => Ok(Self::Serial),
            other => Err(SmaError::Config(format!("unknown backend '{other}'"))),
        }
    }
}

/// Backends compiled into this build, in preference order.
pub fn available_backends() -> Vec<&'static str> {
    let mut names = Vec::with_capacity(3);
    if cfg!(feature = "cuda") {
        names.push(BackendKind::Cuda.as_str());
    }
    names.push(BackendKind::Cpu.as_str());
    names.push(BackendKind::Serial.as_str());
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("auto".parse::<BackendKind>().unwrap(), BackendKind::Auto);
        assert_eq!(" CUDA ".parse::<BackendKind>().unwrap(), BackendKind::Cuda);
        assert_eq!("gpu".parse::<BackendKind>().unwrap(), BackendKind::Cuda);
        assert_eq!("rayon".parse::<BackendKind>().unwrap(), BackendKind::Cpu);
        assert_eq!("serial".parse::<BackendKind>().unwrap(), BackendKind::Serial);
        assert!(matches!(
            "metal".parse::<BackendKind>(),
            Err(SmaError::Config(_))
        ));
    }

    #[test]
    fn test_backend_kind_round_trips_display() {
        for kind in [
            BackendKind::Auto,
            BackendKind::Cuda,
            BackendKind::Cpu,
            BackendKind::Serial,
        ] {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_available_backends_always_has_cpu() {
        let names = available_backends();
        assert!(names.contains(&"cpu"));
        assert!(names.contains(&"serial"));
        assert_eq!(names.contains(&"cuda"), cfg!(feature = "cuda"));
    }
}
