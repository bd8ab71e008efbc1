//! Result output.

pub mod export;
