use crate::error::Result;
use crate::indicators::sma_serial;

use super::SmaBackend;

/// Plain loop on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialBackend;

impl SmaBackend for SerialBackend {
    fn name(&self) -> &str {
        "serial"
    }

    fn launch(&self, input: &[f32], output: &mut [f32], window: usize) -> Result<()> {
        sma_serial(input, output, window);
        Ok(())
    }
}
