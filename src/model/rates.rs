//! # H2 Rates
//!
//! Normalises heterozygous pair counts by site pair counts. Bins without any
//! site pairs give 0/0; those entries are set to zero, counted, and logged.

use tracing::warn;

use crate::error::{Result, TwoLocusError};

/// Per-bin H2 estimates for one sample or sample pair
#[derive(Clone, Debug, PartialEq)]
pub struct RateCurve {
    pub rates: Vec<f64>,
    /// Bins whose ratio was undefined and set to zero
    pub n_nan: usize,
}

/// Divide `het_counts` by `pair_counts` bin by bin
pub fn h2_rates(het_counts: &[f64], pair_counts: &[u64]) -> Result<RateCurve> {
    if het_counts.len() != pair_counts.len() {
        return Err(TwoLocusError::invalid_data(format!(
            "{} het bins for {} pair bins",
            het_counts.len(),
            pair_counts.len()
        )));
    }
    let mut n_nan = 0;
    let rates = het_counts
        .iter()
        .zip(pair_counts)
        .map(|(&het, &pairs)| {
            let rate = het / pairs as f64;
            if rate.is_nan() {
                n_nan += 1;
                0.0
            } else {
                rate
            }
        })
        .collect();
    if n_nan > 0 {
        warn!(n_bins = n_nan, "setting NaN to zero in H2 rates");
    }
    Ok(RateCurve { rates, n_nan })
}

/// Heterozygosity of one sample: het sites over all sites of the window
///
/// `n_sites` counts every site in the window, including sites where the
/// sample's genotype is missing.
pub fn h_rate(n_het: u64, n_sites: u64) -> f64 {
    if n_sites == 0 {
        warn!("no sites for H rate; setting to zero");
        return 0.0;
    }
    n_het as f64 / n_sites as f64
}
