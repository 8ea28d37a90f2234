//! CUDA path built on `cust`.
//!
//! The PTX for `kernels/cuda/sma_kernel.cu` is produced by `build.rs` and
//! JIT-loaded here. Every call uploads the input, launches one thread per
//! output index on a private non-blocking stream, synchronizes, and copies the
//! result back, so the host sees a plain blocking call.

#![cfg(feature = "cuda")]

use std::sync::{Arc, Mutex};

use cust::context::{Context, CurrentContext};
use cust::device::Device;
use cust::error::CudaError;
use cust::launch;
use cust::memory::{CopyDestination, DeviceBuffer};
use cust::module::{Module, ModuleJitOption};
use cust::prelude::*;
use cust::stream::{Stream, StreamFlags};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{Result, SmaError};

use super::SmaBackend;

const KERNEL_NAME: &str = "sma_f32";
const MAX_GRID_X: u32 = 65_535;

struct DeviceState {
    module: Module,
    stream: Stream,
}

pub struct CudaBackend {
    state: Mutex<DeviceState>,
    context: Arc<Context>,
    device_name: String,
    block_size: u32,
}

impl CudaBackend {
    /// Acquires `device_id` and loads the kernel module.
    ///
    /// Any failure up to and including context creation means the device is
    /// not usable and is reported as [`SmaError::ResourceUnavailable`].
    pub fn new(device_id: usize, block_size: u32) -> Result<Self> {
        let unavailable = |e: CudaError| SmaError::ResourceUnavailable(e.to_string());

        cust::init(CudaFlags::empty()).map_err(unavailable)?;
        let count = Device::num_devices().map_err(unavailable)?;
        if count == 0 {
            return Err(SmaError::ResourceUnavailable("no CUDA device present".into()));
        }
        let device_id = u32::try_from(device_id).unwrap_or(u32::MAX);
        if device_id >= count {
            return Err(SmaError::ResourceUnavailable(format!(
                "CUDA device {device_id} requested, {count} present"
            )));
        }
        let device = Device::get_device(device_id).map_err(unavailable)?;
        let device_name = device.name().unwrap_or_else(|_| format!("cuda:{device_id}"));
        let context = Arc::new(Context::new(device).map_err(unavailable)?);

        let ptx: &str = include_str!(concat!(env!("OUT_DIR"), "/sma_kernel.ptx"));
        let module = match Module::from_ptx(ptx, &[ModuleJitOption::DetermineTargetFromContext]) {
            Ok(m) => m,
            Err(_) => Module::from_ptx(ptx, &[]).map_err(unavailable)?,
        };
        let stream = Stream::new(StreamFlags::NON_BLOCKING, None).map_err(unavailable)?;

        debug!(device_id, device = %device_name, block_size, "CUDA backend ready");

        Ok(Self {
            state: Mutex::new(DeviceState { module, stream }),
            context,
            device_name,
            block_size: block_size.clamp(32, 1024),
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(config.device_id, config.block_size)
    }

    fn grid_for(&self, len: u32) -> u32 {
        len.div_ceil(self.block_size).clamp(1, MAX_GRID_X)
    }
}

impl SmaBackend for CudaBackend {
    fn name(&self) -> &str {
        "cuda"
    }

    fn is_accelerated(&self) -> bool {
        true
    }

    fn device_name(&self) -> Option<&str> {
        Some(&self.device_name)
    }

    fn launch(&self, input: &[f32], output: &mut [f32], window: usize) -> Result<()> {
        let n = i32::try_from(input.len())
            .map_err(|_| SmaError::Launch(format!("series too long for one launch: {}", input.len())))?;
        // A window wider than the series is the same as one spanning it.
        let window = window.min(input.len()) as i32;

        let state = self
            .state
            .lock()
            .map_err(|_| SmaError::Launch("CUDA state poisoned by an earlier panic".into()))?;
        CurrentContext::set_current(&*self.context)?;

        let d_input = DeviceBuffer::from_slice(input).map_err(classify)?;
        let d_output: DeviceBuffer<f32> =
            unsafe { DeviceBuffer::uninitialized(input.len()) }.map_err(classify)?;

        let func = state
            .module
            .get_function(KERNEL_NAME)
            .map_err(|_| SmaError::Launch(format!("missing kernel symbol: {KERNEL_NAME}")))?;
        let block = self.block_size;
        let grid = self.grid_for(n as u32);
        let stream = &state.stream;
        unsafe {
            launch!(func<<<(grid, 1, 1), (block, 1, 1), 0, stream>>>(
                d_input.as_device_ptr(),
                d_output.as_device_ptr(),
                n,
                window
            ))?;
        }
        stream.synchronize()?;

        d_output.copy_to(output)?;
        Ok(())
    }
}

/// Splits driver errors into "device not usable" and "this launch failed".
///
/// Only the first kind lets the engine retry the call on its CPU fallback.
pub(crate) fn classify(err: CudaError) -> SmaError {
    match err {
        CudaError::OutOfMemory
        | CudaError::NoDevice
        | CudaError::InvalidDevice
        | CudaError::NotInitialized
        | CudaError::Deinitialized
        | CudaError::InvalidPtx
        | CudaError::NoBinaryForGpu => SmaError::ResourceUnavailable(err.to_string()),
        other => SmaError::Launch(other.to_string()),
    }
}
