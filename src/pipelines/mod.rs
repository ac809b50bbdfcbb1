//! # Pipeline Module
//!
//! High-level orchestration of the per-window counting workflow.
//! Coordinates I/O, windowing, and the counting kernels.

pub mod two_locus;

pub use two_locus::TwoLocusPipeline;
