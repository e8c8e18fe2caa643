//! Benchmark support crate for plexus.
//!
//! Provides seeded synthetic graphs and point sets plus parameter labels used
//! by the Criterion benchmarks for the similarity fill, the agglomerative
//! engine and the link-clustering density sweep.

pub mod error;
pub mod params;
pub mod source;
