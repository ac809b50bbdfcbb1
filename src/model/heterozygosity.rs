//! # Heterozygosity Weighting
//!
//! Turns genotype dosages into what the pair counter needs for H2 statistics.
//!
//! ## Single sample (H2)
//! Pairs of heterozygous sites: the site arrays are restricted to the sample's
//! het sites and counted unweighted. No separate algorithm is involved.
//!
//! ## Two samples (H2xy)
//! For unphased samples `x` and `y` with within-individual alt frequencies
//! `p = dosage / 2`, the probability that an allele drawn from `x` differs from
//! one drawn from `y` at a site is
//!
//! ```text
//! w = p_x (1 - p_y) + p_y (1 - p_x)
//! ```
//!
//! Treating the two sites of a pair as independent within each individual, the
//! joint heterozygosity of the pair
//!
//! ```text
//! sum over haplotypes h of P_x(h) * P_y(complement(h))
//! ```
//!
//! factorises into `w_i * w_j`. Each left locus therefore reads a cumulative
//! curve of `level * w` selected by its own weight level, and the counting loop
//! is the unweighted one with real-valued increments. Missing genotypes in
//! either sample give weight 0 and drop out of every pair.

use crate::data::genotype::{Dosage, GenotypeVector};
use crate::error::{Result, TwoLocusError};
use crate::model::bounds::{bounds, WindowSpec};
use crate::model::pair_count::{Contribution, PairCounter};

/// Nonzero cross-heterozygosity weight levels
pub const WEIGHT_LEVELS: [f64; 4] = [0.25, 0.5, 0.75, 1.0];

/// Indices of the heterozygous sites of one sample
pub fn heterozygous_subset(genotypes: &GenotypeVector) -> Vec<usize> {
    genotypes
        .as_slice()
        .iter()
        .enumerate()
        .filter_map(|(i, d)| d.is_het().then_some(i))
        .collect()
}

/// Probability that alleles drawn from `x` and `y` differ; 0 when either is missing
#[inline]
pub fn cross_het_weight(x: Dosage, y: Dosage) -> f64 {
    match (x.alt_freq(), y.alt_freq()) {
        (Some(px), Some(py)) => px * (1.0 - py) + py * (1.0 - px),
        _ => 0.0,
    }
}

/// Per-site cross-heterozygosity weights for a pair of samples
pub fn cross_het_weights(x: &GenotypeVector, y: &GenotypeVector) -> Result<Vec<f64>> {
    if x.len() != y.len() {
        return Err(TwoLocusError::invalid_data(format!(
            "Sample genotype lengths differ: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    Ok(x
        .as_slice()
        .iter()
        .zip(y.as_slice())
        .map(|(&dx, &dy)| cross_het_weight(dx, dy))
        .collect())
}

/// Haplotype probabilities `[AB, Ab, aB, ab]` of one unphased individual at two sites
fn haplotype_probs(first: f64, second: f64) -> [f64; 4] {
    let (a_alt, a_ref) = (first, 1.0 - first);
    let (b_alt, b_ref) = (second, 1.0 - second);
    [a_alt * b_alt, a_alt * b_ref, a_ref * b_alt, a_ref * b_ref]
}

/// Joint heterozygosity of samples `x` and `y` at a pair of sites
///
/// `x[0]`/`y[0]` are the dosages at the first site, `x[1]`/`y[1]` at the
/// second. Zero when any dosage is missing.
pub fn joint_heterozygosity(x: [Dosage; 2], y: [Dosage; 2]) -> f64 {
    let freqs = (x[0].alt_freq(), x[1].alt_freq(), y[0].alt_freq(), y[1].alt_freq());
    let (Some(x0), Some(x1), Some(y0), Some(y1)) = freqs else {
        return 0.0;
    };
    let probs_x = haplotype_probs(x0, x1);
    let probs_y = haplotype_probs(y0, y1);
    // complement of AB is ab, of Ab is aB, and so on: reverse y
    probs_x
        .iter()
        .zip(probs_y.iter().rev())
        .map(|(px, py)| px * py)
        .sum()
}

fn level_index(weight: f64) -> Result<Option<u8>> {
    if weight == 0.0 {
        return Ok(None);
    }
    WEIGHT_LEVELS
        .iter()
        .position(|&level| level == weight)
        .map(|idx| Some(idx as u8))
        .ok_or_else(|| {
            TwoLocusError::domain(format!(
                "Cross-heterozygosity weight {} is not one of 0, 0.25, 0.5, 0.75, 1",
                weight
            ))
        })
}

/// Precomputed cumulative weight curves, one per weight level
///
/// Covers sites `offset..offset + weights.len()`; indices passed through
/// `Contribution` are full-array indices.
#[derive(Clone, Debug)]
pub struct WeightCurves {
    offset: usize,
    levels: Vec<Option<u8>>,
    /// curves[l][m] = sum of WEIGHT_LEVELS[l] * weights[..m]
    curves: [Vec<f64>; 4],
}

impl WeightCurves {
    pub fn new(weights: &[f64], offset: usize) -> Result<Self> {
        let levels = weights
            .iter()
            .map(|&w| level_index(w))
            .collect::<Result<Vec<_>>>()?;

        let curves = WEIGHT_LEVELS.map(|level| {
            let mut curve = Vec::with_capacity(weights.len() + 1);
            let mut acc = 0.0;
            curve.push(acc);
            for &w in weights {
                acc += level * w;
                curve.push(acc);
            }
            curve
        });

        Ok(Self {
            offset,
            levels,
            curves,
        })
    }

    /// Weight level of site `i`, `None` for weight 0
    pub fn level(&self, i: usize) -> Option<usize> {
        self.levels[i - self.offset].map(usize::from)
    }
}

impl Contribution for WeightCurves {
    type Value = f64;

    #[inline]
    fn is_active(&self, i: usize) -> bool {
        self.levels[i - self.offset].is_some()
    }

    #[inline]
    fn cumulative(&self, i: usize, j: usize, count: usize) -> f64 {
        let Some(level) = self.level(i) else {
            return 0.0;
        };
        let curve = &self.curves[level];
        let start = j - self.offset;
        curve[start + count] - curve[start]
    }
}

/// Heterozygous sites of one sample inside the window (one-locus H count)
pub fn count_heterozygous(
    genotypes: &GenotypeVector,
    positions: &[u32],
    window: WindowSpec,
) -> Result<u64> {
    if genotypes.len() != positions.len() {
        return Err(TwoLocusError::invalid_data(format!(
            "{} genotypes for {} positions",
            genotypes.len(),
            positions.len()
        )));
    }
    let (start, stop) = match window {
        WindowSpec::WholeChromosome => (0, positions.len()),
        WindowSpec::Windowed { bounds: w, .. } => bounds(w, positions),
    };
    Ok(genotypes.as_slice()[start..stop]
        .iter()
        .filter(|d| d.is_het())
        .count() as u64)
}

impl<'b> PairCounter<'b> {
    /// Count pairs of heterozygous sites of one sample (H2 numerator)
    pub fn count_h2(
        &self,
        genotypes: &GenotypeVector,
        distances: &[f64],
        positions: Option<&[u32]>,
    ) -> Result<Vec<u64>> {
        if genotypes.len() != distances.len() {
            return Err(TwoLocusError::invalid_data(format!(
                "{} genotypes for {} distances",
                genotypes.len(),
                distances.len()
            )));
        }
        let het_idx = heterozygous_subset(genotypes);
        let het_distances: Vec<f64> = het_idx.iter().map(|&i| distances[i]).collect();
        let het_positions: Option<Vec<u32>> = match positions {
            Some(positions) => {
                if positions.len() != distances.len() {
                    return Err(TwoLocusError::invalid_data(format!(
                        "{} positions for {} distances",
                        positions.len(),
                        distances.len()
                    )));
                }
                Some(het_idx.iter().map(|&i| positions[i]).collect())
            }
            None => None,
        };
        self.count_site_pairs(&het_distances, het_positions.as_deref())
    }

    /// Sum of joint cross-heterozygosity of samples `x` and `y` over pairs (H2xy numerator)
    pub fn count_h2xy(
        &self,
        genotypes_x: &GenotypeVector,
        genotypes_y: &GenotypeVector,
        distances: &[f64],
        positions: Option<&[u32]>,
    ) -> Result<Vec<f64>> {
        let weights = cross_het_weights(genotypes_x, genotypes_y)?;
        if weights.len() != distances.len() {
            return Err(TwoLocusError::invalid_data(format!(
                "{} genotypes for {} distances",
                weights.len(),
                distances.len()
            )));
        }
        self.count_with(distances, positions, |range| {
            WeightCurves::new(&weights[range.l_start..range.r_stop], range.l_start)
        })
    }
}
