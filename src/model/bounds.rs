//! # Window Bounding
//!
//! Resolves a physical window into the index ranges the pair counter walks:
//! - left loci `[l_start, l_stop)`: every site inside the window
//! - right loci `[l_start, r_stop)`: left loci plus, unless truncated, the
//!   sites past the window edge that are still within the widest bin of some
//!   left locus
//!
//! Without the right extension, left loci close to the window's right edge
//! lose partners and the longest-range bin is biased low at every window edge.
//! Truncating at the window is still offered for window-exact counts (e.g. the
//! last window of a chromosome).
//!
//! Both the window and the physical-distance threshold are resolved here once,
//! before the counting loop starts.

use crate::error::{Result, TwoLocusError};

/// Closed physical interval `[start, stop]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub start: u32,
    pub stop: u32,
}

impl Window {
    pub fn new(start: u32, stop: u32) -> Self {
        Self { start, stop }
    }

    /// Whether `pos` lies inside the window
    pub fn contains(&self, pos: u32) -> bool {
        pos >= self.start && pos <= self.stop
    }
}

/// Which loci may act as the left member of a pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WindowSpec {
    /// Every site of the chromosome
    #[default]
    WholeChromosome,
    /// Sites inside `bounds`; right partners stop at the window when `truncate_right`
    Windowed { bounds: Window, truncate_right: bool },
}

/// Minimum physical separation of counted pairs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PairThreshold {
    /// Count every pair (right partners start at the adjacent site)
    #[default]
    NoThreshold,
    /// Drop pairs whose physical separation is `<= bp`
    PhysicalThreshold(u32),
}

impl PairThreshold {
    /// Map the CLI convention (0 = off) onto a threshold
    pub fn from_bp(bp: u32) -> Self {
        if bp == 0 {
            PairThreshold::NoThreshold
        } else {
            PairThreshold::PhysicalThreshold(bp)
        }
    }
}

/// Half-open index range of the sites inside `window`
///
/// `l_start` is the first index with `position >= window.start`, `l_stop` the
/// first index with `position > window.stop`.
pub fn bounds(window: Window, positions: &[u32]) -> (usize, usize) {
    let l_start = positions.partition_point(|&p| p < window.start);
    let l_stop = positions.partition_point(|&p| p <= window.stop);
    (l_start, l_stop.max(l_start))
}

/// Exclusive end of the right-locus range for left loci ending at `l_stop`
///
/// With `truncate_at_window` the range ends at `l_stop`. Otherwise it extends
/// to the first site whose distance exceeds `distances[l_stop - 1] + max_bin_distance`.
pub fn right_extent(
    distances: &[f64],
    l_stop: usize,
    max_bin_distance: f64,
    truncate_at_window: bool,
) -> usize {
    if truncate_at_window || l_stop == 0 {
        return l_stop;
    }
    let max_d = distances[l_stop - 1] + max_bin_distance;
    distances.partition_point(|&d| d <= max_d).max(l_stop)
}

/// Index ranges for one counting call, in full-array coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountRange {
    /// First left locus
    pub l_start: usize,
    /// One past the last left locus
    pub l_stop: usize,
    /// One past the last right locus
    pub r_stop: usize,
}

impl CountRange {
    /// Resolve a window specification against the site arrays
    pub fn resolve(
        spec: WindowSpec,
        distances: &[f64],
        positions: Option<&[u32]>,
        max_bin_distance: f64,
    ) -> Result<Self> {
        match spec {
            WindowSpec::WholeChromosome => Ok(Self {
                l_start: 0,
                l_stop: distances.len(),
                r_stop: distances.len(),
            }),
            WindowSpec::Windowed {
                bounds: window,
                truncate_right,
            } => {
                let positions = positions.ok_or_else(|| {
                    TwoLocusError::config("Positions are required to count within a window")
                })?;
                let (l_start, l_stop) = bounds(window, positions);
                let r_stop = right_extent(distances, l_stop, max_bin_distance, truncate_right);
                Ok(Self {
                    l_start,
                    l_stop,
                    r_stop,
                })
            }
        }
    }

    /// Number of left loci
    pub fn n_left(&self) -> usize {
        self.l_stop - self.l_start
    }
}

/// First right partner of each left locus, resolved once per call
#[derive(Clone, Copy, Debug)]
pub enum RightStart<'a> {
    /// `i + 1`
    Adjacent,
    /// First index whose position exceeds `positions[i] + bp`
    Physical { positions: &'a [u32], bp: u32 },
}

impl<'a> RightStart<'a> {
    pub fn resolve(threshold: PairThreshold, positions: Option<&'a [u32]>) -> Result<Self> {
        match threshold {
            PairThreshold::NoThreshold => Ok(RightStart::Adjacent),
            PairThreshold::PhysicalThreshold(bp) => {
                let positions = positions.ok_or_else(|| {
                    TwoLocusError::config("Positions are required to use a bp threshold")
                })?;
                Ok(RightStart::Physical { positions, bp })
            }
        }
    }

    /// Right start for left locus `i`, never beyond `r_stop`
    #[inline]
    pub fn start(&self, i: usize, r_stop: usize) -> usize {
        let j = match *self {
            RightStart::Adjacent => i + 1,
            RightStart::Physical { positions, bp } => {
                let limit = positions[i] as u64 + bp as u64;
                // Sites before i cannot exceed the limit, so search from i
                i + positions[i..].partition_point(|&p| p as u64 <= limit)
            }
        };
        j.min(r_stop)
    }
}
