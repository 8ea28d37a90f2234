//! Engine configuration.
//!
//! Read from JSON (`serde_json`) or from `CUDAFINANCE_*` environment
//! variables. Unset fields keep their defaults.

use std::env;

use serde::{Deserialize, Serialize};

use crate::backend::cpu::DEFAULT_MIN_TASK_LEN;
use crate::backend::BackendKind;
use crate::error::{Result, SmaError};

pub const ENV_BACKEND: &str = "CUDAFINANCE_BACKEND";
pub const ENV_DEVICE: &str = "CUDAFINANCE_DEVICE";
pub const ENV_THREADS: &str = "CUDAFINANCE_THREADS";
pub const ENV_BLOCK_SIZE: &str = "CUDAFINANCE_BLOCK_SIZE";
pub const ENV_FALLBACK: &str = "CUDAFINANCE_FALLBACK";

/// Largest CUDA block the kernel is launched with.
pub const MAX_BLOCK_SIZE: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub backend: BackendKind,
    /// CUDA ordinal.
    pub device_id: usize,
    /// Dedicated CPU pool size; `None` uses rayon's global pool.
    pub threads: Option<usize>,
    pub min_task_len: usize,
    /// CUDA threads per block.
    pub block_size: u32,
    /// Serve calls on the CPU when the accelerator cannot be acquired.
    pub allow_cpu_fallback: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            device_id: 0,
            threads: None,
            min_task_len: DEFAULT_MIN_TASK_LEN,
            block_size: 256,
            allow_cpu_fallback: true,
        }
    }
}

impl EngineConfig {
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_cpu_fallback(mut self, allow: bool) -> Self {
        self.allow_cpu_fallback = allow;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads the `CUDAFINANCE_*` variables of the current process.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_BACKEND) {
            config.backend = v.parse()?;
        }
        if let Some(v) = lookup(ENV_DEVICE) {
            config.device_id = parse_var(ENV_DEVICE, &v)?;
        }
        if let Some(v) = lookup(ENV_THREADS) {
            config.threads = Some(parse_var(ENV_THREADS, &v)?);
        }
        if let Some(v) = lookup(ENV_BLOCK_SIZE) {
            config.block_size = parse_var(ENV_BLOCK_SIZE, &v)?;
        }
        if let Some(v) = lookup(ENV_FALLBACK) {
            config.allow_cpu_fallback = parse_flag(ENV_FALLBACK, &v)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(SmaError::Config("threads must be > 0".into()));
        }
        if self.min_task_len == 0 {
            return Err(SmaError::Config("min_task_len must be > 0".into()));
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(SmaError::Config(format!(
                "block_size must be in 1..={MAX_BLOCK_SIZE}, got {}",
                self.block_size
            )));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SmaError::Config(format!("{name}: cannot parse '{value}'")))
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(SmaError::Config(format!(
            "{name}: expected 0, 1, true or false, got '{value}'"
        ))),
    }
}
