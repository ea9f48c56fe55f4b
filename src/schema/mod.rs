//! Schema module - Configuration and reporting types for the compression search.

mod config;
mod evolution;

pub use config::*;
pub use evolution::*;
