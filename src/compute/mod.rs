//! Compute module - Compression oracle and the evolutionary search engine.

mod compressor;

pub mod evolution;

pub use compressor::*;
