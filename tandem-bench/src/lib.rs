//! Tandem Benchmark Library
//!
//! Provides data generators and store fixtures for measuring transaction
//! recording, undo/redo and patch throughput.

pub mod data_gen;
pub mod fixtures;
