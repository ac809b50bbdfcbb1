//! # Model Module
//!
//! Counting algorithms and the statistics built on them.
//!
//! ## Sub-modules
//! - `bounds`: Window bounds, right extents and minimum-separation starts
//! - `pair_count`: Binned pair counting (batched and streaming)
//! - `heterozygosity`: H2 and H2xy weighting on top of the pair counter
//! - `rates`: Normalising heterozygous pair counts into H2 rates

pub mod bounds;
pub mod heterozygosity;
pub mod pair_count;
pub mod rates;

pub use bounds::{PairThreshold, Window, WindowSpec};
pub use pair_count::{PairCounter, Strategy};
