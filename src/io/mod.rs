//! # I/O Module
//!
//! File reading/writing boundaries: text tables (optionally gzipped), the
//! windows description file, and per-window count tables.

pub mod output;
pub mod window;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::{Result, TwoLocusError};

/// Open a text file for line-oriented reading, decompressing `.gz` files
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    if !path.exists() {
        return Err(TwoLocusError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path)?;

    let is_gzipped = path
        .extension()
        .map(|e| e == "gz" || e == "bgz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead + Send> = if is_gzipped {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}
