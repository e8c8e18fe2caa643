//! Shared test utilities used across plexus crates.

pub mod ci;
pub mod graphs;
pub mod tracing;
