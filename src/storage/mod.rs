//! Storage of the complete metadata record produced by the splitting pipeline

pub mod error;
pub mod operations;
