//! # Two-Locus Pipeline
//!
//! Orchestrates the per-window counting workflow for one chromosome:
//! 1. Load the windows file, the recombination map and the dosage table
//! 2. Map site positions to genetic distances
//! 3. Convert the rate bin edges to distance bins (cached per edge set)
//! 4. For each window, in window order:
//!    - site pair counts (`pair_counts`)
//!    - H2 numerators per sample (`H2_counts`) and their rates (`H2_rates`)
//!    - heterozygous site counts per sample (`H_counts`)
//!    - H2xy numerators per sample pair (`H2_2_counts`)
//!
//! Samples and sample pairs of a window are counted in parallel; windows are
//! processed one after another.

use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{info, info_span, instrument, warn};

use crate::config::Config;
use crate::data::genetic_map::{DistanceBinCache, DistanceBins, RecombinationMap};
use crate::data::genotype::{sample_pairs, GenotypeTable};
use crate::io::output::{count_table_path, write_count_table, TableHeader};
use crate::io::window::{WindowRecord, WindowsFile};
use crate::model::bounds::bounds;
use crate::model::heterozygosity::count_heterozygous;
use crate::model::pair_count::PairCounter;
use crate::model::rates::{h2_rates, h_rate};
use crate::utils::threading::build_thread_pool;

/// Per-window outcome of a pipeline run
#[derive(Clone, Debug, PartialEq)]
pub struct WindowSummary {
    pub window_id: String,
    /// Sites inside the window limits
    pub n_left: usize,
    /// Site pairs counted over all bins
    pub n_pairs: u64,
    /// H2 rate bins with no site pairs, over all samples
    pub n_nan_rates: usize,
}

/// Outcome of a whole pipeline run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub windows: Vec<WindowSummary>,
    /// Sites outside the recombination map
    pub n_clamped: usize,
}

/// Sites of one chromosome with their genetic distances
struct ChromData {
    table: GenotypeTable,
    distances: Vec<f64>,
}

/// Window-by-window two-locus counting pipeline
pub struct TwoLocusPipeline {
    config: Config,
    bin_cache: DistanceBinCache,
    pool: rayon::ThreadPool,
}

impl TwoLocusPipeline {
    /// Create a pipeline with its own worker pool
    pub fn new(config: Config) -> Result<Self> {
        let pool = build_thread_pool(config.nthreads())?;
        Ok(Self {
            config,
            bin_cache: DistanceBinCache::new(),
            pool,
        })
    }

    /// Run every window of the configured chromosome
    pub fn run(&mut self) -> Result<RunSummary> {
        let config = &self.config;
        let windows = WindowsFile::from_file(&config.windows).with_context(|| {
            format!("Failed to read windows file {}", config.windows.display())
        })?;
        let records = windows.windows(&config.chrom)?;

        let (data, n_clamped) = info_span!("load_inputs").in_scope(|| -> Result<_> {
            let map = RecombinationMap::from_file(&config.map, &config.map_col)
                .with_context(|| format!("Failed to read map {}", config.map.display()))?;
            let table = GenotypeTable::from_file(&config.genotypes).with_context(|| {
                format!("Failed to read genotypes {}", config.genotypes.display())
            })?;
            let mapped = map.map_distances(table.positions());
            info!(
                n_sites = table.n_sites(),
                n_samples = table.n_samples(),
                n_map_points = map.len(),
                "loaded inputs"
            );
            let n_clamped = mapped.n_clamped();
            Ok((
                ChromData {
                    table,
                    distances: mapped.distances,
                },
                n_clamped,
            ))
        })?;

        let bins = self.bin_cache.get_or_insert(&config.r_edges())?;
        std::fs::create_dir_all(&config.out_dir).with_context(|| {
            format!("Failed to create output directory {}", config.out_dir.display())
        })?;

        let mut summary = RunSummary {
            windows: Vec::with_capacity(records.len()),
            n_clamped,
        };
        for (id, record) in records {
            summary
                .windows
                .push(self.process_window(&data, &bins, id, record)?);
        }
        info!(n_windows = summary.windows.len(), "all windows done");
        Ok(summary)
    }

    #[instrument(skip_all, fields(window = %window_id))]
    fn process_window(
        &self,
        data: &ChromData,
        bins: &DistanceBins,
        window_id: &str,
        record: &WindowRecord,
    ) -> Result<WindowSummary> {
        let config = &self.config;
        let table = &data.table;
        let positions = table.positions();
        let distances = data.distances.as_slice();
        let spec = record.spec(config.truncate_right);
        let counter = PairCounter::new(bins)
            .window(spec)
            .threshold(config.threshold())
            .strategy(config.strategy);

        let (l_start, l_stop) = bounds(record.window(), positions);
        let n_left = l_stop - l_start;
        if record.n_sites != 0 && record.n_sites != n_left as u64 {
            warn!(
                expected = record.n_sites,
                found = n_left,
                "window site count differs from windows file"
            );
        }

        let header = |statistic: &str, rows: Vec<String>| TableHeader {
            chrom: config.chrom.clone(),
            statistic: statistic.to_string(),
            window_id: window_id.to_string(),
            limits: record.limits,
            bounds: record.bounds.clone(),
            span: record.span,
            n_sites: n_left as u64,
            coverage: record.coverage,
            r_edges: bins.r_edges().to_vec(),
            rows,
        };
        let out = |tag: &str| count_table_path(&config.out_dir, &config.chrom, window_id, tag);
        let sample_ids = table.sample_ids().to_vec();

        let pair_counts = info_span!("pair_counts")
            .in_scope(|| counter.count_site_pairs(distances, Some(positions)))?;
        write_table(
            &out("pair_counts"),
            &header("pair_counts", vec!["sites".to_string()]),
            &[pair_counts.clone()],
        )?;

        let h2_counts: Vec<Vec<u64>> = info_span!("h2_counts").in_scope(|| {
            self.pool.install(|| {
                (0..table.n_samples())
                    .into_par_iter()
                    .map(|s| counter.count_h2(table.sample(s), distances, Some(positions)))
                    .collect::<crate::error::Result<Vec<_>>>()
            })
        })?;
        write_table(
            &out("H2_counts"),
            &header("H2_counts", sample_ids.clone()),
            &h2_counts,
        )?;

        let mut n_nan_rates = 0;
        let mut h2_rate_rows = Vec::with_capacity(h2_counts.len());
        for counts in &h2_counts {
            let het: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
            let curve = h2_rates(&het, &pair_counts)?;
            n_nan_rates += curve.n_nan;
            h2_rate_rows.push(curve.rates);
        }
        write_table(
            &out("H2_rates"),
            &header("H2_rates", sample_ids.clone()),
            &h2_rate_rows,
        )?;

        let h_rows: Vec<Vec<f64>> = (0..table.n_samples())
            .map(|s| -> crate::error::Result<Vec<f64>> {
                let n_het = count_heterozygous(table.sample(s), positions, spec)?;
                Ok(vec![n_het as f64, h_rate(n_het, n_left as u64)])
            })
            .collect::<crate::error::Result<_>>()?;
        write_table(&out("H_counts"), &header("H_counts", sample_ids.clone()), &h_rows)?;

        let pairs = sample_pairs(table.n_samples());
        let h2xy_counts: Vec<Vec<f64>> = info_span!("h2xy_counts", n_pairs = pairs.len())
            .in_scope(|| {
                self.pool.install(|| {
                    pairs
                        .par_iter()
                        .map(|&(x, y)| {
                            counter.count_h2xy(
                                table.sample(x),
                                table.sample(y),
                                distances,
                                Some(positions),
                            )
                        })
                        .collect::<crate::error::Result<Vec<_>>>()
                })
            })?;
        let pair_labels = pairs
            .iter()
            .map(|&(x, y)| format!("{}:{}", sample_ids[x], sample_ids[y]))
            .collect();
        write_table(
            &out("H2_2_counts"),
            &header("H2_2_counts", pair_labels),
            &h2xy_counts,
        )?;

        let n_pairs: u64 = pair_counts.iter().sum();
        info!(n_left, n_pairs, n_samples = table.n_samples(), "window done");
        Ok(WindowSummary {
            window_id: window_id.to_string(),
            n_left,
            n_pairs,
            n_nan_rates,
        })
    }
}

fn write_table<T: std::fmt::Display>(
    path: &Path,
    header: &TableHeader,
    rows: &[Vec<T>],
) -> Result<()> {
    write_count_table(path, header, rows)
        .with_context(|| format!("Failed to write {}", path.display()))
}
