//! # Twolocus Library Root
//!
//! Binned counts of locus pairs by genetic distance, and the two-locus
//! heterozygosity statistics (H2, H2xy) built on them.
//!
//! ## Module Structure
//! ```text
//! twolocus
//! ├── data        # Recombination map, distance bins, genotype dosages
//! ├── io          # Text/gzip input, windows file, count tables
//! ├── model       # Bounds, pair counting, heterozygosity weighting, rates
//! ├── pipelines   # Per-window orchestration
//! └── utils       # Thread pool helpers
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod model;
pub mod pipelines;
pub mod utils;

pub use error::{Result, TwoLocusError};
