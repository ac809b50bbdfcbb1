//! # Count Tables
//!
//! Plain numeric tables, one row per sample (or sample pair, or a single row
//! for site pairs) and one column per bin, preceded by a `# ` header line
//! holding the window metadata as JSON.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TwoLocusError};
use crate::io::open_text;

/// Metadata written above each table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableHeader {
    pub chrom: String,
    pub statistic: String,
    pub window_id: String,
    pub limits: [u32; 2],
    pub bounds: Vec<u32>,
    pub span: u64,
    pub n_sites: u64,
    pub coverage: f64,
    pub r_edges: Vec<f64>,
    /// Label of each row, in row order
    pub rows: Vec<String>,
}

/// `<out_dir>/chr<chrom>_win<window_id>_<tag>.txt`
pub fn count_table_path(out_dir: &Path, chrom: &str, window_id: &str, tag: &str) -> PathBuf {
    out_dir.join(format!("chr{}_win{}_{}.txt", chrom, window_id, tag))
}

/// Write a header line followed by whitespace-separated rows
pub fn write_count_table<T: Display>(
    path: &Path,
    header: &TableHeader,
    rows: &[Vec<T>],
) -> Result<()> {
    if rows.len() != header.rows.len() {
        return Err(TwoLocusError::invalid_data(format!(
            "{} rows for {} row labels",
            rows.len(),
            header.rows.len()
        )));
    }
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "# {}", serde_json::to_string(header)?)?;
    for row in rows {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()?;
    Ok(())
}

/// Read a table written by `write_count_table`
pub fn read_count_table(path: &Path) -> Result<(TableHeader, Vec<Vec<f64>>)> {
    let mut lines = open_text(path)?.lines();
    let first = match lines.next() {
        Some(line) => line?,
        None => return Err(TwoLocusError::parse(1, "Count table is empty")),
    };
    let json = first
        .strip_prefix("# ")
        .ok_or_else(|| TwoLocusError::parse(1, "Missing header line"))?;
    let header: TableHeader = serde_json::from_str(json)?;

    let mut rows = Vec::new();
    for (line_num, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| TwoLocusError::parse(line_num + 2, format!("Invalid value '{}'", v)))
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }
    Ok((header, rows))
}
