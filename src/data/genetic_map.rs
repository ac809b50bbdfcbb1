//! # Genetic Map
//!
//! Physical-to-genetic distance interpolation and recombination-rate bins.
//! This module provides:
//! - `RecombinationMap`: sparse `Position(bp)` / map-value table
//! - `MappedDistances`: per-site genetic distances plus out-of-map counts
//! - `DistanceBins`: rate bin edges transformed into distance space
//! - `DistanceBinCache`: caller-owned memo of transformed bin edges
//!
//! Positions outside the map are clamped to the first/last map value. This is
//! a data-quality signal, so it is logged and counted, never raised.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use tracing::{info_span, warn};

use crate::error::{Result, TwoLocusError};
use crate::io::open_text;

/// Header of the physical position column in map files
pub const POSITION_COL: &str = "Position(bp)";

/// Default map-value column
pub const DEFAULT_MAP_COL: &str = "Map(cM)";

/// Default recombination-rate bin edges (1-2-5 ladder from 1e-7 to 1e-1)
pub const DEFAULT_R_EDGES: [f64; 20] = [
    0.0, 1e-7, 2e-7, 5e-7, 1e-6, 2e-6, 5e-6, 1e-5, 2e-5, 5e-5, 1e-4, 2e-4, 5e-4, 1e-3, 2e-3,
    5e-3, 1e-2, 2e-2, 5e-2, 1e-1,
];

/// Haldane map function: recombination fraction `r` to distance (cM)
#[inline]
pub fn map_function(r: f64) -> f64 {
    -50.0 * (1.0 - 2.0 * r).ln()
}

/// Inverse Haldane map function: distance (cM) to recombination fraction
#[inline]
pub fn inverse_map_function(d: f64) -> f64 {
    (1.0 - (-d / 50.0).exp()) / 2.0
}

/// A sparse recombination map for a single chromosome
#[derive(Clone, Debug)]
pub struct RecombinationMap {
    /// Physical positions (bp), strictly increasing
    positions: Vec<u32>,

    /// Map values (cM) at `positions`, non-decreasing
    values: Vec<f64>,
}

impl RecombinationMap {
    /// Build a map from parallel position/value arrays
    pub fn new(positions: Vec<u32>, values: Vec<f64>) -> Result<Self> {
        if positions.is_empty() {
            return Err(TwoLocusError::invalid_data("Recombination map is empty"));
        }
        if positions.len() != values.len() {
            return Err(TwoLocusError::invalid_data(format!(
                "Map has {} positions but {} values",
                positions.len(),
                values.len()
            )));
        }
        for i in 1..positions.len() {
            if positions[i] <= positions[i - 1] {
                return Err(TwoLocusError::invalid_data(format!(
                    "Map positions not in ascending order at position {}",
                    positions[i]
                )));
            }
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(TwoLocusError::invalid_data(format!(
                "Map value {} is negative or not finite",
                v
            )));
        }
        if values.windows(2).any(|w| w[1] < w[0]) {
            return Err(TwoLocusError::invalid_data(
                "Map values decrease along the chromosome",
            ));
        }
        Ok(Self { positions, values })
    }

    /// Load a tab-delimited map file (optionally gzipped)
    ///
    /// The header must name a `Position(bp)` column and `map_col`.
    pub fn from_file(path: &Path, map_col: &str) -> Result<Self> {
        info_span!("recombination_map_from_file", path = ?path).in_scope(|| {
            let reader = open_text(path)?;
            Self::from_reader(reader, map_col)
        })
    }

    /// Parse a map table from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R, map_col: &str) -> Result<Self> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(TwoLocusError::parse(1, "Map file is empty")),
        };
        let cols: Vec<&str> = header.trim_end().split('\t').map(str::trim).collect();
        let pos_idx = cols
            .iter()
            .position(|c| *c == POSITION_COL)
            .ok_or_else(|| {
                TwoLocusError::parse(1, format!("There must be a '{}' column", POSITION_COL))
            })?;
        let map_idx = cols.iter().position(|c| *c == map_col).ok_or_else(|| {
            TwoLocusError::parse(1, format!("There must be a '{}' column", map_col))
        })?;

        let mut positions = Vec::new();
        let mut values = Vec::new();
        for (line_num, line) in lines.enumerate() {
            let line = line?;
            let line_num = line_num + 2;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.trim_end().split('\t').collect();
            let (Some(pos), Some(val)) = (fields.get(pos_idx), fields.get(map_idx)) else {
                return Err(TwoLocusError::parse(
                    line_num,
                    format!("Expected at least {} columns, got {}", cols.len(), fields.len()),
                ));
            };
            let pos: u32 = pos
                .trim()
                .parse()
                .map_err(|_| TwoLocusError::parse(line_num, "Invalid position"))?;
            let val: f64 = val
                .trim()
                .parse()
                .map_err(|_| TwoLocusError::parse(line_num, "Invalid map value"))?;
            positions.push(pos);
            values.push(val);
        }

        Self::new(positions, values)
    }

    /// Number of map points
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Physical positions of the map points
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    /// Map values of the map points
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Interpolate the map value at a physical position, clamping outside the map
    pub fn interpolate(&self, phys_pos: u32) -> f64 {
        match self.positions.binary_search(&phys_pos) {
            Ok(idx) => self.values[idx],
            Err(0) => self.values[0],
            Err(idx) if idx == self.positions.len() => self.values[idx - 1],
            Err(idx) => {
                let p0 = self.positions[idx - 1] as f64;
                let p1 = self.positions[idx] as f64;
                let g0 = self.values[idx - 1];
                let g1 = self.values[idx];
                let t = (phys_pos as f64 - p0) / (p1 - p0);
                g0 + t * (g1 - g0)
            }
        }
    }

    /// Map every site position to a genetic distance
    ///
    /// Sites below the first or above the last map point take the edge value;
    /// how many did so is reported in the result and logged.
    pub fn map_distances(&self, positions: &[u32]) -> MappedDistances {
        let first = self.positions[0];
        let last = self.positions[self.positions.len() - 1];
        let below_map = positions.partition_point(|&p| p < first);
        let above_map = positions.len() - positions.partition_point(|&p| p <= last);
        if below_map > 0 {
            warn!(n_sites = below_map, map_start = first, "positions below map start");
        }
        if above_map > 0 {
            warn!(n_sites = above_map, map_end = last, "positions beyond map end");
        }

        let distances = positions.iter().map(|&p| self.interpolate(p)).collect();
        MappedDistances {
            distances,
            below_map,
            above_map,
        }
    }
}

/// Per-site genetic distances produced by a `RecombinationMap`
#[derive(Clone, Debug, PartialEq)]
pub struct MappedDistances {
    /// Genetic distance (cM) of each site, non-decreasing for sorted positions
    pub distances: Vec<f64>,
    /// Sites clamped to the first map value
    pub below_map: usize,
    /// Sites clamped to the last map value
    pub above_map: usize,
}

impl MappedDistances {
    /// Number of sites that fell outside the map
    pub fn n_clamped(&self) -> usize {
        self.below_map + self.above_map
    }
}

/// Interpolate `map_values` at `positions` without building a map first
pub fn map_distances(
    positions: &[u32],
    map_positions: &[u32],
    map_values: &[f64],
) -> Result<MappedDistances> {
    let map = RecombinationMap::new(map_positions.to_vec(), map_values.to_vec())?;
    Ok(map.map_distances(positions))
}

/// Bin edges in both rate (`r`) and distance (cM) space
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceBins {
    r_edges: Vec<f64>,
    edges: Vec<f64>,
}

impl DistanceBins {
    /// Use distance-space edges directly (no rate transform)
    pub fn from_distance_edges(edges: Vec<f64>) -> Result<Self> {
        validate_edges(&edges)?;
        let r_edges = edges.iter().map(|&d| inverse_map_function(d)).collect();
        Ok(Self { r_edges, edges })
    }

    /// Number of bins (`edges - 1`)
    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Distance-space edges
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Rate-space edges
    pub fn r_edges(&self) -> &[f64] {
        &self.r_edges
    }

    /// Largest distance a counted pair may span
    pub fn max_distance(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }
}

fn validate_edges(edges: &[f64]) -> Result<()> {
    if edges.len() < 2 {
        return Err(TwoLocusError::config(format!(
            "At least two bin edges are required, got {}",
            edges.len()
        )));
    }
    if let Some(e) = edges.iter().find(|e| !e.is_finite()) {
        return Err(TwoLocusError::config(format!("Bin edge {} is not finite", e)));
    }
    if let Some(w) = edges.windows(2).find(|w| w[1] < w[0]) {
        return Err(TwoLocusError::config(format!(
            "Bin edges must be increasing, found {} after {}",
            w[1], w[0]
        )));
    }
    Ok(())
}

/// Transform rate bin edges into distance bin edges with the Haldane map function
///
/// Rates must lie in `[0, 0.5)`; the transform is singular at 0.5.
pub fn edges_to_distance(r_edges: &[f64]) -> Result<DistanceBins> {
    if let Some(r) = r_edges.iter().find(|r| !(**r >= 0.0 && **r < 0.5)) {
        return Err(TwoLocusError::domain(format!(
            "Recombination rate edge {} is outside [0, 0.5)",
            r
        )));
    }
    let edges: Vec<f64> = r_edges.iter().map(|&r| map_function(r)).collect();
    validate_edges(&edges)?;
    Ok(DistanceBins {
        r_edges: r_edges.to_vec(),
        edges,
    })
}

/// Memo of transformed bin edges, keyed by the exact rate edges
///
/// Owned by the caller and passed where needed, so counting stays free of
/// process-wide state.
#[derive(Debug, Default)]
pub struct DistanceBinCache {
    entries: HashMap<Vec<u64>, Arc<DistanceBins>>,
}

impl DistanceBinCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return cached bins for `r_edges`, transforming them on first use
    pub fn get_or_insert(&mut self, r_edges: &[f64]) -> Result<Arc<DistanceBins>> {
        let key: Vec<u64> = r_edges.iter().map(|r| r.to_bits()).collect();
        if let Some(bins) = self.entries.get(&key) {
            return Ok(Arc::clone(bins));
        }
        let bins = Arc::new(edges_to_distance(r_edges)?);
        self.entries.insert(key, Arc::clone(&bins));
        Ok(bins)
    }

    /// Number of cached edge sets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
