// ==============================================================================
// config.rs - Summary Run Configuration
// ==============================================================================
// Description: Table mode, pipeline selection and thresholds for one run
// Author: Mykrobe Summary Contributors
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::CoverageThreshold;

/// Layout of the predict summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TableMode {
    /// One row per sample, one column per drug/gene/variant in the corpus
    #[default]
    Wide,
    /// One row per sample and drug, calls listed inline
    Long,
}

impl TableMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableMode::Wide => "wide",
            TableMode::Long => "long",
        }
    }
}

/// Which report family a run summarizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "pipeline")]
pub enum Pipeline {
    /// `mykrobe predict` resistance reports
    Predict {
        mode: TableMode,
        /// Reserved: write copy number instead of coverage (no effect yet)
        copy_number: bool,
    },
    /// `mykrobe genotype` sequence reports
    Genotype,
}

impl Pipeline {
    pub fn name(&self) -> &'static str {
        match self {
            Pipeline::Predict { .. } => "predict",
            Pipeline::Genotype => "genotype",
        }
    }
}

/// Everything one summary run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Directory searched (recursively) for `*.json` reports
    pub input_dir: PathBuf,

    /// Output file name, resolved against `input_dir`
    pub output_file: PathBuf,

    pub pipeline: Pipeline,

    /// Minimum coverage/depth (depth is only used by the genotype pipeline)
    pub threshold: CoverageThreshold,

    /// Log per-sample detail to stderr
    pub verbose: bool,

    /// Optional JSON run report destination
    pub report_path: Option<PathBuf>,
}

impl SummaryConfig {
    pub fn new(input_dir: impl Into<PathBuf>, pipeline: Pipeline) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_file: PathBuf::from("summary.tsv"),
            pipeline,
            threshold: CoverageThreshold::default(),
            verbose: false,
            report_path: None,
        }
    }

    pub fn with_output_file(mut self, output_file: impl Into<PathBuf>) -> Self {
        self.output_file = output_file.into();
        self
    }

    pub fn with_threshold(mut self, threshold: CoverageThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_report_path(mut self, report_path: Option<PathBuf>) -> Self {
        self.report_path = report_path;
        self
    }

    /// Where the table is written: the output file inside the input directory
    /// (an absolute output file is used as-is)
    pub fn output_path(&self) -> PathBuf {
        self.input_dir.join(&self.output_file)
    }
}
