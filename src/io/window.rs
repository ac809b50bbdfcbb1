//! # Windows File
//!
//! JSON description of the genomic windows of each chromosome:
//!
//! ```json
//! {
//!   "22": {
//!     "0": {"limits": [16000000, 21000000], "bounds": [16000000, 21000000],
//!           "span": 5000000, "n_sites": 41235, "coverage": 0.82},
//!     "1": {"limits": [21000001, 26000000], "truncate_right": true, ...}
//!   }
//! }
//! ```
//!
//! `limits` is the closed physical interval whose sites act as left loci.
//! The remaining fields are carried into output headers unchanged.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TwoLocusError};
use crate::io::open_text;
use crate::model::bounds::{Window, WindowSpec};

/// One window entry of the windows file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    /// Closed physical interval `[start, stop]`
    pub limits: [u32; 2],
    #[serde(default)]
    pub bounds: Vec<u32>,
    #[serde(default)]
    pub span: u64,
    #[serde(default)]
    pub n_sites: u64,
    #[serde(default)]
    pub coverage: f64,
    /// Only count pairs with both loci inside `limits`
    #[serde(default)]
    pub truncate_right: bool,
}

impl WindowRecord {
    pub fn window(&self) -> Window {
        Window::new(self.limits[0], self.limits[1])
    }

    /// Window specification, truncating when either the record or the caller asks
    pub fn spec(&self, truncate_right: bool) -> WindowSpec {
        WindowSpec::Windowed {
            bounds: self.window(),
            truncate_right: truncate_right || self.truncate_right,
        }
    }
}

/// Windows of every chromosome, keyed by chromosome then window id
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct WindowsFile {
    chroms: BTreeMap<String, BTreeMap<String, WindowRecord>>,
}

impl WindowsFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let reader = open_text(path)?;
        let windows: Self = serde_json::from_reader(reader)?;
        windows.validate()?;
        Ok(windows)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let windows: Self = serde_json::from_str(json)?;
        windows.validate()?;
        Ok(windows)
    }

    fn validate(&self) -> Result<()> {
        for (chrom, windows) in &self.chroms {
            for (id, record) in windows {
                if record.limits[1] < record.limits[0] {
                    return Err(TwoLocusError::config(format!(
                        "Window {} of chromosome {} ends before it starts",
                        id, chrom
                    )));
                }
            }
        }
        Ok(())
    }

    /// Windows of `chrom`, numeric ids first in numeric order
    pub fn windows(&self, chrom: &str) -> Result<Vec<(&str, &WindowRecord)>> {
        let windows = self.chroms.get(chrom).ok_or_else(|| {
            TwoLocusError::config(format!(
                "Wrong windows file: chromosome {} not represented",
                chrom
            ))
        })?;
        let mut entries: Vec<(&str, &WindowRecord)> =
            windows.iter().map(|(id, r)| (id.as_str(), r)).collect();
        entries.sort_by_key(|(id, _)| (id.parse::<u64>().unwrap_or(u64::MAX), id.to_string()));
        Ok(entries)
    }

    pub fn chroms(&self) -> impl Iterator<Item = &str> {
        self.chroms.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "22": {
            "10": {"limits": [300, 400], "truncate_right": true},
            "2": {"limits": [100, 200], "bounds": [100, 200], "span": 101,
                  "n_sites": 5, "coverage": 0.5}
        }
    }"#;

    #[test]
    fn test_parse_and_order() {
        let file = WindowsFile::from_json(JSON).expect("valid windows JSON");
        let windows = file.windows("22").expect("chromosome present");

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].0, "2");
        assert_eq!(windows[1].0, "10");
        assert_eq!(windows[0].1.window(), Window::new(100, 200));
        assert_eq!(windows[0].1.n_sites, 5);
        assert_eq!(windows[1].1.n_sites, 0);
        assert_eq!(file.chroms().collect::<Vec<_>>(), vec!["22"]);
    }

    #[test]
    fn test_spec_truncation() {
        let file = WindowsFile::from_json(JSON).expect("valid windows JSON");
        let windows = file.windows("22").expect("chromosome present");

        let spec = windows[0].1.spec(false);
        assert_eq!(
            spec,
            WindowSpec::Windowed {
                bounds: Window::new(100, 200),
                truncate_right: false
            }
        );
        assert!(matches!(
            windows[0].1.spec(true),
            WindowSpec::Windowed { truncate_right: true, .. }
        ));
        assert!(matches!(
            windows[1].1.spec(false),
            WindowSpec::Windowed { truncate_right: true, .. }
        ));
    }

    #[test]
    fn test_missing_chrom() {
        let file = WindowsFile::from_json(JSON).expect("valid windows JSON");
        assert!(matches!(file.windows("1"), Err(TwoLocusError::Config { .. })));
    }

    #[test]
    fn test_inverted_limits_rejected() {
        let json = r#"{"1": {"0": {"limits": [10, 5]}}}"#;
        assert!(WindowsFile::from_json(json).is_err());
    }
}
