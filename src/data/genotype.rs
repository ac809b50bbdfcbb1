//! # Genotype Dosages
//!
//! Per-sample diploid dosage codes aligned with a position array.
//!
//! Codes follow the usual unphased encoding: `0` hom-ref, `1` het, `2` hom-alt,
//! `-1` missing. Anything else is a domain error.
//!
//! The dosage table read here is a pre-extracted, tab-delimited matrix
//! (sites x samples); decoding VCF genotypes into it happens upstream.

use std::io::BufRead;
use std::path::Path;

use tracing::info_span;

use crate::data::genetic_map::POSITION_COL;
use crate::error::{Result, TwoLocusError};
use crate::io::open_text;

/// Diploid genotype at one site
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dosage {
    Missing,
    HomRef,
    Het,
    HomAlt,
}

impl Dosage {
    /// Decode an integer dosage code
    pub fn from_code(code: i8) -> Result<Self> {
        match code {
            -1 => Ok(Dosage::Missing),
            0 => Ok(Dosage::HomRef),
            1 => Ok(Dosage::Het),
            2 => Ok(Dosage::HomAlt),
            other => Err(TwoLocusError::domain(format!(
                "Genotype dosage {} is not one of -1, 0, 1, 2",
                other
            ))),
        }
    }

    /// Integer code of this dosage
    pub fn code(self) -> i8 {
        match self {
            Dosage::Missing => -1,
            Dosage::HomRef => 0,
            Dosage::Het => 1,
            Dosage::HomAlt => 2,
        }
    }

    /// Alternate allele frequency within the individual (`dosage / 2`)
    #[inline]
    pub fn alt_freq(self) -> Option<f64> {
        match self {
            Dosage::Missing => None,
            Dosage::HomRef => Some(0.0),
            Dosage::Het => Some(0.5),
            Dosage::HomAlt => Some(1.0),
        }
    }

    #[inline]
    pub fn is_het(self) -> bool {
        self == Dosage::Het
    }

    #[inline]
    pub fn is_missing(self) -> bool {
        self == Dosage::Missing
    }
}

/// Dosages of one sample across all sites of a chromosome
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct GenotypeVector {
    dosages: Vec<Dosage>,
}

impl GenotypeVector {
    /// Validate and wrap integer dosage codes
    pub fn from_codes(codes: &[i8]) -> Result<Self> {
        let dosages = codes
            .iter()
            .map(|&c| Dosage::from_code(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { dosages })
    }

    pub fn from_dosages(dosages: Vec<Dosage>) -> Self {
        Self { dosages }
    }

    pub fn len(&self) -> usize {
        self.dosages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dosages.is_empty()
    }

    pub fn as_slice(&self) -> &[Dosage] {
        &self.dosages
    }

    /// Number of heterozygous sites
    pub fn n_het(&self) -> usize {
        self.dosages.iter().filter(|d| d.is_het()).count()
    }

    /// Number of sites with a called genotype
    pub fn n_called(&self) -> usize {
        self.dosages.iter().filter(|d| !d.is_missing()).count()
    }
}

/// Sites x samples dosage table for one chromosome
#[derive(Clone, Debug)]
pub struct GenotypeTable {
    positions: Vec<u32>,
    sample_ids: Vec<String>,
    /// One vector per sample, each aligned with `positions`
    samples: Vec<GenotypeVector>,
}

impl GenotypeTable {
    /// Assemble a table from per-sample vectors
    pub fn new(
        positions: Vec<u32>,
        sample_ids: Vec<String>,
        samples: Vec<GenotypeVector>,
    ) -> Result<Self> {
        if sample_ids.len() != samples.len() {
            return Err(TwoLocusError::invalid_data(format!(
                "{} sample ids for {} genotype vectors",
                sample_ids.len(),
                samples.len()
            )));
        }
        if let Some((id, gt)) = sample_ids
            .iter()
            .zip(&samples)
            .find(|(_, gt)| gt.len() != positions.len())
        {
            return Err(TwoLocusError::invalid_data(format!(
                "Sample {} has {} genotypes for {} positions",
                id,
                gt.len(),
                positions.len()
            )));
        }
        if let Some(w) = positions.windows(2).find(|w| w[1] <= w[0]) {
            return Err(TwoLocusError::invalid_data(format!(
                "Positions not strictly increasing: {} follows {}",
                w[1], w[0]
            )));
        }
        Ok(Self {
            positions,
            sample_ids,
            samples,
        })
    }

    /// Load a tab-delimited dosage table (optionally gzipped)
    ///
    /// Format: header `Position(bp)<TAB>sample_1<TAB>...`, then one row per site.
    pub fn from_file(path: &Path) -> Result<Self> {
        info_span!("genotype_table_from_file", path = ?path).in_scope(|| {
            let reader = open_text(path)?;
            Self::from_reader(reader)
        })
    }

    /// Parse a dosage table from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(TwoLocusError::parse(1, "Genotype table is empty")),
        };
        let mut cols = header.trim_end().split('\t');
        if cols.next().map(str::trim) != Some(POSITION_COL) {
            return Err(TwoLocusError::parse(
                1,
                format!("First column must be '{}'", POSITION_COL),
            ));
        }
        let sample_ids: Vec<String> = cols.map(|c| c.trim().to_string()).collect();
        let n_samples = sample_ids.len();

        let mut positions = Vec::new();
        let mut columns: Vec<Vec<Dosage>> = vec![Vec::new(); n_samples];
        for (line_num, line) in lines.enumerate() {
            let line = line?;
            let line_num = line_num + 2;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.trim_end().split('\t').collect();
            if fields.len() != n_samples + 1 {
                return Err(TwoLocusError::parse(
                    line_num,
                    format!("Expected {} columns, got {}", n_samples + 1, fields.len()),
                ));
            }
            let pos: u32 = fields[0]
                .trim()
                .parse()
                .map_err(|_| TwoLocusError::parse(line_num, "Invalid position"))?;
            positions.push(pos);

            for (column, field) in columns.iter_mut().zip(&fields[1..]) {
                let code: i8 = field.trim().parse().map_err(|_| {
                    TwoLocusError::parse(line_num, format!("Invalid dosage '{}'", field))
                })?;
                column.push(Dosage::from_code(code)?);
            }
        }

        let samples = columns.into_iter().map(GenotypeVector::from_dosages).collect();
        Self::new(positions, sample_ids, samples)
    }

    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn n_sites(&self) -> usize {
        self.positions.len()
    }

    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Genotypes of the sample at `idx`
    pub fn sample(&self, idx: usize) -> &GenotypeVector {
        &self.samples[idx]
    }

    /// Genotypes of the sample named `id`
    pub fn sample_by_id(&self, id: &str) -> Option<&GenotypeVector> {
        self.sample_ids
            .iter()
            .position(|s| s == id)
            .map(|idx| &self.samples[idx])
    }
}

/// All unordered sample index pairs `(i, j)` with `i < j`, in sample order
pub fn sample_pairs(n_samples: usize) -> Vec<(usize, usize)> {
    (0..n_samples)
        .flat_map(|i| (i + 1..n_samples).map(move |j| (i, j)))
        .collect()
}
