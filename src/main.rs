//! # Twolocus: Binned Two-Locus Heterozygosity Counts
//!
//! Counts site pairs, heterozygous site pairs (H2) and cross-sample
//! heterozygous pairs (H2xy) per genetic distance bin, window by window.
//!
//! ## Usage
//! ```bash
//! twolocus --chrom 22 --windows windows.json --map chr22_map.txt.gz \
//!     --genotypes chr22_dosages.tsv.gz --out-dir counts/
//!
//! # Window-exact counting, 50 bp minimum separation
//! twolocus ... --truncate-right --bp-thresh 50
//! ```

use std::time::Instant;

use twolocus::config::Config;
use twolocus::pipelines::TwoLocusPipeline;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Install the tracing subscriber
///
/// `--profile` adds span-close events with uptime stamps.
fn init_logging(verbose: bool, profile: bool) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(fmt::time::uptime());
    let layer = if profile {
        layer.with_span_events(FmtSpan::CLOSE)
    } else {
        layer.with_span_events(FmtSpan::NONE)
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
}

fn run() -> anyhow::Result<()> {
    let start = Instant::now();

    // Parse and validate configuration
    let config = Config::parse_and_validate()?;
    init_logging(config.verbose, config.profile);

    eprintln!("Twolocus v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Threads: {}", config.nthreads());
    eprintln!("Chromosome: {}", config.chrom);
    eprintln!("Strategy: {:?}", config.strategy);

    let mut pipeline = TwoLocusPipeline::new(config)?;
    let summary = pipeline.run()?;

    let n_nan: usize = summary.windows.iter().map(|w| w.n_nan_rates).sum();
    eprintln!(
        "Windows: {}  Sites outside map: {}  Empty rate bins: {}",
        summary.windows.len(),
        summary.n_clamped,
        n_nan
    );
    eprintln!("Completed in {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}
