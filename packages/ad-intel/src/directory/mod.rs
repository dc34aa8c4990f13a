//! Page directory implementations.

pub mod graph;

pub use graph::GraphPageDirectory;
