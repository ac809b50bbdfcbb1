//! # Threading Configuration
//!
//! Rayon thread pool construction for the window driver.

use crate::error::{Result, TwoLocusError};

/// Create a configured thread pool
pub fn build_thread_pool(n_threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .thread_name(|i| format!("twolocus-worker-{}", i))
        .build()
        .map_err(|e| TwoLocusError::config(format!("Failed to create thread pool: {}", e)))
}
