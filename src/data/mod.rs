//! # Data Module
//!
//! In-memory inputs: the recombination map with its distance bins, and
//! per-sample genotype dosages.

pub mod genetic_map;
pub mod genotype;

pub use genetic_map::{edges_to_distance, DistanceBinCache, DistanceBins, RecombinationMap};
pub use genotype::{Dosage, GenotypeTable, GenotypeVector};
