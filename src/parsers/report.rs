// ==============================================================================
// parsers/report.rs - Mykrobe JSON Report Loader
// ==============================================================================
// Description: Discovers and loads Mykrobe predict/genotype JSON reports
// Author: Mykrobe Summary Contributors
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Format: one JSON object per file, keyed by a single sample identifier
// Example:
//   {
//     "sample1": {
//       "susceptibility": { "Isoniazid": { "predict": "R", "called_by": {...} } },
//       "phylogenetics": { "species": { "Mycobacterium_tuberculosis": {...} } },
//       "version": { "mykrobe-predictor": "v0.10.0" }
//     }
//   }
// ==============================================================================

use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// One sample's report, as loaded from disk
#[derive(Debug, Clone, PartialEq)]
pub struct SampleReport {
    /// File the report was read from
    pub path: PathBuf,

    /// Top-level sample key ("" when the file could not be loaded)
    pub sample_id: String,

    /// Categories under the sample key (`susceptibility`, `phylogenetics`, ...)
    pub body: Map<String, Value>,

    /// True when loading failed and the report was replaced by an empty one
    pub degraded: bool,
}

impl SampleReport {
    /// Empty stand-in for a report that failed to load
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sample_id: String::new(),
            body: Map::new(),
            degraded: true,
        }
    }

    /// Build a report directly from a parsed document
    pub fn from_document(path: impl Into<PathBuf>, document: Value) -> Result<Self, ReportLoadError> {
        let path = path.into();
        let Value::Object(top) = document else {
            return Err(ReportLoadError::NotAnObject(path));
        };

        if top.len() > 1 {
            return Err(ReportLoadError::MultipleSamples {
                path,
                samples: top.keys().cloned().collect(),
            });
        }

        let Some((sample_id, body)) = top.into_iter().next() else {
            return Err(ReportLoadError::NoSample(path));
        };

        let body = match body {
            Value::Object(body) => body,
            Value::Null => Map::new(),
            _ => return Err(ReportLoadError::NotAnObject(path)),
        };

        Ok(Self {
            path,
            sample_id,
            body,
            degraded: false,
        })
    }

    /// Look up a category under the sample key
    pub fn category(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// File name including extension (e.g. `A.json`)
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name up to the first '.' (e.g. `A` for `A.predict.json`)
    pub fn file_stem(&self) -> String {
        let name = self.file_name();
        match name.find('.') {
            Some(idx) => name[..idx].to_string(),
            None => name,
        }
    }

    /// Plate directory: the third path component counted from the end
    ///
    /// `runs/plate7/sample3/sample3.json` gives `plate7`; shallower paths give "".
    /// Segments are split on '/', so the root of `/x/a.json` is the empty segment.
    pub fn plate_name(&self) -> String {
        let path = self.path.to_string_lossy();
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() >= 3 {
            parts[parts.len() - 3].to_string()
        } else {
            String::new()
        }
    }
}

/// Errors that can occur while loading a report
#[derive(Error, Debug)]
pub enum ReportLoadError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Report {} is not a JSON object keyed by sample", .0.display())]
    NotAnObject(PathBuf),

    #[error("Report {} has no top-level sample key", .0.display())]
    NoSample(PathBuf),

    #[error("Report {} holds {} samples ({}); expected exactly one", path.display(), samples.len(), samples.join(", "))]
    MultipleSamples { path: PathBuf, samples: Vec<String> },
}

/// Errors that stop report discovery
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Input directory does not exist or is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Loader for a directory of Mykrobe JSON reports
#[derive(Debug, Clone)]
pub struct ReportParser {
    /// File suffix that marks a report
    pub suffix: String,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportParser {
    pub fn new() -> Self {
        Self {
            suffix: ".json".to_string(),
        }
    }

    /// Find every report under `dir`, recursively
    ///
    /// # Arguments
    /// * `dir` - Root of the directory walk
    ///
    /// # Returns
    /// * `Ok(Vec<PathBuf>)` - Report paths, ordered by file name within each directory
    /// * `Err(DiscoveryError)` - `dir` is not a directory
    ///
    /// Unreadable entries below the root are logged and skipped.
    pub fn discover(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, DiscoveryError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DiscoveryError::NotADirectory(dir.to_path_buf()));
        }

        let mut paths = Vec::new();
        for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };

            // Linked files count; linked directories are not descended into
            if entry.path().is_file()
                && entry.file_name().to_string_lossy().ends_with(&self.suffix)
            {
                paths.push(entry.into_path());
            }
        }

        debug!("Discovered {} report files under {:?}", paths.len(), dir);
        Ok(paths)
    }

    /// Load one report
    ///
    /// # Arguments
    /// * `path` - Path to a report JSON file
    ///
    /// # Returns
    /// * `Ok(SampleReport)` - The single sample and its categories
    /// * `Err(ReportLoadError)` - Unreadable file, invalid JSON, or not exactly one sample
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SampleReport, ReportLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReportLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let document: Value = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            ReportLoadError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;

        SampleReport::from_document(path, document)
    }

    /// Load one report, degrading any failure to an empty report
    ///
    /// The empty report still produces a row, so the output keeps one line per file.
    pub fn load_or_empty(&self, path: impl AsRef<Path>) -> SampleReport {
        let path = path.as_ref();
        match self.load(path) {
            Ok(report) => report,
            Err(e) => {
                warn!("{} -- summarizing as an empty report", e);
                SampleReport::empty(path)
            }
        }
    }
}
