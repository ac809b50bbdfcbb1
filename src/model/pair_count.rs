//! # Pair Counting Engine
//!
//! Counts locus pairs per genetic-distance bin with one binary search per
//! (left locus, bin edge).
//!
//! ## Algorithm
//! For each left locus `i` in `[l_start, l_stop)`:
//! 1. Find its first right partner `j` (`i + 1`, or the first site beyond the
//!    physical threshold).
//! 2. Shift every bin edge by `distances[i]`.
//! 3. Count the right loci in `distances[j..r_stop]` strictly below each
//!    shifted edge (lower-bound search).
//! 4. Add the (possibly weighted) cumulative counts into a running total of
//!    length `n_bins + 1`.
//!
//! After all left loci, `counts[k] = total[k + 1] - total[k]`, so bin `k`
//! holds pairs with `edges[k] <= d_j - d_i < edges[k + 1]`. The difference is
//! taken once, after accumulation.
//!
//! ## Strategies
//! - `Batched`: one `(n_left x n_edges)` threshold matrix searched in one pass
//!   against the full right range, each row then offset to its own start.
//!   Memory grows with `n_left * n_edges`.
//! - `Streaming`: one left locus at a time against the shrinking slice
//!   `distances[j..r_stop]`. Memory is `O(n_edges)`.
//!
//! Both add contributions in left-locus order, so they agree exactly, for
//! integer and real-valued contributions alike.

use std::ops::{AddAssign, Sub};

use ndarray::{Array1, Array2, ArrayView1, Axis};
use tracing::debug;

use crate::data::genetic_map::DistanceBins;
use crate::error::{Result, TwoLocusError};
use crate::model::bounds::{CountRange, PairThreshold, RightStart, WindowSpec};

/// Left loci between progress events in the streaming strategy
const PROGRESS_INTERVAL: usize = 1_000_000;

/// Execution strategy of the counting loop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Strategy {
    /// Threshold matrix over all left loci, searched in one pass
    Batched,
    /// Per-locus loop over the shrinking right-hand slice
    #[default]
    Streaming,
}

/// Value accumulated per bin
pub trait CountValue: Copy + Default + AddAssign + Sub<Output = Self> + Send + Sync {}

impl CountValue for u64 {}
impl CountValue for f64 {}

/// What a left locus adds for its right partners below a threshold
pub trait Contribution: Sync {
    type Value: CountValue;

    /// Whether left locus `i` contributes at all
    #[inline]
    fn is_active(&self, _i: usize) -> bool {
        true
    }

    /// Contribution of left locus `i` paired with right loci `j..j + count`
    fn cumulative(&self, i: usize, j: usize, count: usize) -> Self::Value;
}

/// Every pair counts once
#[derive(Clone, Copy, Debug, Default)]
pub struct UnitContribution;

impl Contribution for UnitContribution {
    type Value = u64;

    #[inline]
    fn cumulative(&self, _i: usize, _j: usize, count: usize) -> u64 {
        count as u64
    }
}

/// Count pairs per bin over `range`
///
/// `distances` is the full, non-decreasing site array; `range` and
/// `right_start` are expressed in its coordinates. Returns `edges.len() - 1`
/// values, all zero when the range holds at most one left locus.
///
/// `range` must lie inside `distances` (`l_start <= l_stop <= r_stop <=
/// distances.len()`), as `CountRange::resolve` guarantees.
pub(crate) fn count_pairs<C: Contribution>(
    distances: &[f64],
    edges: &[f64],
    range: CountRange,
    right_start: RightStart<'_>,
    contribution: &C,
    strategy: Strategy,
) -> Vec<C::Value> {
    let n_bins = edges.len().saturating_sub(1);
    if range.n_left() <= 1 || n_bins == 0 {
        return vec![C::Value::default(); n_bins];
    }

    let cumulative = match strategy {
        Strategy::Batched => accumulate_batched(distances, edges, range, right_start, contribution),
        Strategy::Streaming => {
            accumulate_streaming(distances, edges, range, right_start, contribution)
        }
    };

    cumulative.windows(2).map(|w| w[1] - w[0]).collect()
}

fn accumulate_streaming<C: Contribution>(
    distances: &[f64],
    edges: &[f64],
    range: CountRange,
    right_start: RightStart<'_>,
    contribution: &C,
) -> Vec<C::Value> {
    let mut cumulative = vec![C::Value::default(); edges.len()];
    let n_left = range.n_left();

    for i in range.l_start..range.l_stop {
        let done = i - range.l_start;
        if done % PROGRESS_INTERVAL == 0 && done > 0 {
            debug!(locus = done, n_left, "pair counting progress");
        }
        if !contribution.is_active(i) {
            continue;
        }
        let j = right_start.start(i, range.r_stop);
        let right = &distances[j..range.r_stop];
        let d_i = distances[i];
        for (acc, &edge) in cumulative.iter_mut().zip(edges) {
            let threshold = d_i + edge;
            let count = right.partition_point(|&d| d < threshold);
            *acc += contribution.cumulative(i, j, count);
        }
    }

    cumulative
}

fn accumulate_batched<C: Contribution>(
    distances: &[f64],
    edges: &[f64],
    range: CountRange,
    right_start: RightStart<'_>,
    contribution: &C,
) -> Vec<C::Value> {
    let left: Vec<usize> = (range.l_start..range.l_stop)
        .filter(|&i| contribution.is_active(i))
        .collect();

    // thresholds[[row, k]] = distances[left[row]] + edges[k]
    let left_d: Array1<f64> = left.iter().map(|&i| distances[i]).collect();
    let thresholds: Array2<f64> =
        &left_d.insert_axis(Axis(1)) + &ArrayView1::from(edges).insert_axis(Axis(0));

    let right = &distances[..range.r_stop];
    let found = thresholds.mapv(|t| right.partition_point(|&d| d < t));

    // Sites below a row's start are a prefix of the found range, so the
    // count within [j, r_stop) is found - j.
    let mut contributions = Array2::from_elem(found.raw_dim(), C::Value::default());
    for ((&i, found_row), mut out_row) in left
        .iter()
        .zip(found.rows())
        .zip(contributions.rows_mut())
    {
        let j = right_start.start(i, range.r_stop);
        for (out, &n_below) in out_row.iter_mut().zip(found_row) {
            *out = contribution.cumulative(i, j, n_below.saturating_sub(j));
        }
    }

    let mut cumulative = vec![C::Value::default(); edges.len()];
    for row in contributions.rows() {
        for (acc, &value) in cumulative.iter_mut().zip(row) {
            *acc += value;
        }
    }
    cumulative
}

/// Checks shared by every counting entry point
pub(crate) fn validate_sites(distances: &[f64], positions: Option<&[u32]>) -> Result<()> {
    if let Some(positions) = positions {
        if positions.len() != distances.len() {
            return Err(TwoLocusError::invalid_data(format!(
                "{} positions for {} distances",
                positions.len(),
                distances.len()
            )));
        }
        if let Some(w) = positions.windows(2).find(|w| w[1] <= w[0]) {
            return Err(TwoLocusError::invalid_data(format!(
                "Positions not strictly increasing: {} follows {}",
                w[1], w[0]
            )));
        }
    }
    if distances.iter().any(|d| !d.is_finite()) {
        return Err(TwoLocusError::invalid_data("Genetic distances must be finite"));
    }
    if let Some(w) = distances.windows(2).find(|w| w[1] < w[0]) {
        return Err(TwoLocusError::invalid_data(format!(
            "Genetic distances decrease: {} follows {}",
            w[1], w[0]
        )));
    }
    Ok(())
}

/// Configured pair counter
///
/// Holds only borrowed bins and `Copy` configuration, so one counter can be
/// shared across worker threads.
#[derive(Clone, Copy, Debug)]
pub struct PairCounter<'b> {
    bins: &'b DistanceBins,
    window: WindowSpec,
    threshold: PairThreshold,
    strategy: Strategy,
}

impl<'b> PairCounter<'b> {
    /// Count over the whole chromosome, no threshold, streaming
    pub fn new(bins: &'b DistanceBins) -> Self {
        Self {
            bins,
            window: WindowSpec::WholeChromosome,
            threshold: PairThreshold::NoThreshold,
            strategy: Strategy::Streaming,
        }
    }

    /// Restrict left loci to a window
    pub fn window(mut self, window: WindowSpec) -> Self {
        self.window = window;
        self
    }

    /// Set the physical-distance exclusion threshold
    pub fn threshold(mut self, threshold: PairThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the execution strategy
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn bins(&self) -> &'b DistanceBins {
        self.bins
    }

    pub fn n_bins(&self) -> usize {
        self.bins.n_bins()
    }

    /// Count site pairs per bin
    pub fn count_site_pairs(
        &self,
        distances: &[f64],
        positions: Option<&[u32]>,
    ) -> Result<Vec<u64>> {
        self.count_with(distances, positions, |_| Ok(UnitContribution))
    }

    /// Count pairs with a contribution built for the resolved range
    ///
    /// Window and threshold are resolved before `make_contribution` runs and
    /// before the counting loop starts.
    pub fn count_with<C, F>(
        &self,
        distances: &[f64],
        positions: Option<&[u32]>,
        make_contribution: F,
    ) -> Result<Vec<C::Value>>
    where
        C: Contribution,
        F: FnOnce(&CountRange) -> Result<C>,
    {
        validate_sites(distances, positions)?;
        let right_start = RightStart::resolve(self.threshold, positions)?;
        let range = CountRange::resolve(
            self.window,
            distances,
            positions,
            self.bins.max_distance(),
        )?;
        let contribution = make_contribution(&range)?;
        Ok(count_pairs(
            distances,
            self.bins.edges(),
            range,
            right_start,
            &contribution,
            self.strategy,
        ))
    }
}
