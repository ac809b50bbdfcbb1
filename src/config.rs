//! # Configuration
//!
//! CLI argument parsing and validation for the window aggregation driver.
//!
//! ## Example CLI
//! ```bash
//! twolocus --chrom 22 --windows windows.json --map chr22_map.txt.gz \
//!     --genotypes chr22_dosages.tsv.gz --out-dir counts/ --bp-thresh 0
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::data::genetic_map::{DEFAULT_MAP_COL, DEFAULT_R_EDGES};
use crate::error::{Result, TwoLocusError};
use crate::model::bounds::PairThreshold;
use crate::model::pair_count::Strategy;

/// Two-locus heterozygosity pair counts per window
#[derive(Parser, Debug, Clone)]
#[command(name = "twolocus", version, about)]
pub struct Config {
    /// Chromosome id, as used in the windows file
    #[arg(long)]
    pub chrom: String,

    /// JSON file mapping chromosome -> window id -> window record
    #[arg(long)]
    pub windows: PathBuf,

    /// Output directory for count tables
    #[arg(long)]
    pub out_dir: PathBuf,

    /// Recombination map (tab-delimited, optionally gzipped)
    #[arg(long)]
    pub map: PathBuf,

    /// Map value column in the recombination map
    #[arg(long, default_value = DEFAULT_MAP_COL)]
    pub map_col: String,

    /// Dosage table (Position(bp) then one column per sample)
    #[arg(long)]
    pub genotypes: PathBuf,

    /// Comma-separated recombination-rate bin edges
    #[arg(long, value_delimiter = ',')]
    pub r_edges: Option<Vec<f64>>,

    /// Exclude pairs at most this many bp apart (0 = off)
    #[arg(long, default_value_t = 0)]
    pub bp_thresh: u32,

    /// Counting strategy
    #[arg(long, value_enum, default_value_t = Strategy::Streaming)]
    pub strategy: Strategy,

    /// Only count pairs with both loci inside each window
    #[arg(long, default_value_t = false)]
    pub truncate_right: bool,

    /// Number of worker threads (default: all cores)
    #[arg(long)]
    pub nthreads: Option<usize>,

    /// Debug-level logging
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    /// Log span timings
    #[arg(long, default_value_t = false)]
    pub profile: bool,
}

impl Config {
    /// Parse command-line arguments and validate them
    pub fn parse_and_validate() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check inputs exist and numeric options are usable
    pub fn validate(&self) -> Result<()> {
        for path in [&self.windows, &self.map, &self.genotypes] {
            if !path.exists() {
                return Err(TwoLocusError::FileNotFound { path: path.clone() });
            }
        }
        if self.nthreads == Some(0) {
            return Err(TwoLocusError::config("--nthreads must be at least 1"));
        }
        let edges = self.r_edges();
        if edges.len() < 2 {
            return Err(TwoLocusError::config("At least two --r-edges are required"));
        }
        if edges.windows(2).any(|w| w[1] < w[0]) {
            return Err(TwoLocusError::config("--r-edges must be increasing"));
        }
        Ok(())
    }

    /// Rate bin edges, defaulting to the built-in ladder
    pub fn r_edges(&self) -> Vec<f64> {
        self.r_edges
            .clone()
            .unwrap_or_else(|| DEFAULT_R_EDGES.to_vec())
    }

    pub fn threshold(&self) -> PairThreshold {
        PairThreshold::from_bp(self.bp_thresh)
    }

    /// Thread count (user-specified or all cores)
    pub fn nthreads(&self) -> usize {
        self.nthreads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
