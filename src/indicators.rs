pub mod sma_method;

pub use sma_method::{effective_window, sma_at, sma_serial, validate_args};
