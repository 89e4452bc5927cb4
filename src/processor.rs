// ==============================================================================
// processor.rs - Two-Pass Summary Processing
// ==============================================================================
// Description: Loads every report once, unifies the column schema over the
//              whole corpus, then builds and writes one row per report
// Author: Mykrobe Summary Contributors
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{Pipeline, SummaryConfig, TableMode};
use crate::models::CoverageThreshold;
use crate::output::{Table, TsvWriter};
use crate::parsers::{ReportParser, SampleReport};
use crate::rows;
use crate::schema::{GenotypeSchema, PredictSchema};

/// Outcome of one summary run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// `predict` or `genotype`
    pub pipeline: String,
    /// `wide` or `long` (genotype tables are always wide)
    pub mode: String,
    pub documents: usize,
    /// Reports that failed to load and were summarized as empty
    pub degraded_documents: usize,
    pub rows: usize,
    pub columns: usize,
    pub output_path: PathBuf,
}

pub struct SummaryProcessor {
    run_id: Uuid,
    config: SummaryConfig,
    parser: ReportParser,
}

impl SummaryProcessor {
    pub fn new(config: SummaryConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            config,
            parser: ReportParser::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Main processing pipeline
    ///
    /// # Returns
    /// * `Ok(SummaryReport)` - The table was written
    /// * `Err` - The input directory or the output destination is unusable
    pub fn process(&self) -> Result<SummaryReport> {
        info!(
            "Starting {} summary {} of {:?}",
            self.config.pipeline.name(),
            self.run_id,
            self.config.input_dir
        );

        // 1. Locate reports
        let paths = self
            .parser
            .discover(&self.config.input_dir)
            .context("Failed to locate input reports")?;
        info!("Found {} .json files", paths.len());
        for path in &paths {
            debug!("  {:?}", path);
        }

        // 2. Load every report once; both passes read this corpus
        let reports: Vec<SampleReport> = paths
            .iter()
            .map(|path| self.parser.load_or_empty(path))
            .collect();
        let degraded = reports.iter().filter(|r| r.degraded).count();

        // 3. Unify the schema, then build rows
        let (table, mode) = match self.config.pipeline {
            Pipeline::Predict { mode, copy_number } => {
                if copy_number {
                    info!("--copy-number is reserved and currently has no effect");
                }
                (build_predict_table(&reports, mode)?, mode)
            }
            Pipeline::Genotype => {
                if self.config.verbose {
                    for report in &reports {
                        rows::log_genotype_details(report, &self.config.threshold);
                    }
                }
                (
                    build_genotype_table(&reports, &self.config.threshold)?,
                    TableMode::Wide,
                )
            }
        };

        // 4. Write the table
        let output_path = TsvWriter::write(self.config.output_path(), &table)
            .context("Failed to write summary table")?;

        let report = SummaryReport {
            run_id: self.run_id,
            generated_at: Utc::now(),
            pipeline: self.config.pipeline.name().to_string(),
            mode: mode.as_str().to_string(),
            documents: reports.len(),
            degraded_documents: degraded,
            rows: table.rows().len(),
            columns: table.header().len(),
            output_path,
        };

        // 5. Optional run report
        if let Some(path) = &self.config.report_path {
            write_summary_report(path, &report)?;
        }

        info!(
            "Summary complete: {} documents ({} degraded), {} rows, {} columns",
            report.documents, report.degraded_documents, report.rows, report.columns
        );
        Ok(report)
    }
}

/// Build the predict table in wide or long layout
pub fn build_predict_table(reports: &[SampleReport], mode: TableMode) -> Result<Table> {
    let table = match mode {
        TableMode::Wide => {
            let schema = PredictSchema::unify(reports);
            info!(
                "Unified {} drugs, {} genes, {} variants",
                schema.drugs.len(),
                schema.genes.len(),
                schema.variants.len()
            );
            let mut table = Table::new(rows::wide_header(&schema)).with_legend(&rows::PREDICT_LEGEND);
            for report in reports {
                table.push_row(rows::wide_row(report, &schema))?;
            }
            table
        }
        TableMode::Long => {
            let mut table = Table::new(rows::LONG_HEADER.iter().map(|c| c.to_string()).collect());
            for report in reports {
                for row in rows::long_rows(report) {
                    table.push_row(row)?;
                }
            }
            table
        }
    };

    if table.rows().is_empty() {
        debug!("No reports found; writing header only");
    }
    Ok(table)
}

/// Build the genotype table
pub fn build_genotype_table(
    reports: &[SampleReport],
    threshold: &CoverageThreshold,
) -> Result<Table> {
    let schema = GenotypeSchema::unify(reports, threshold);
    info!(
        "Unified {} sequences (coverage >= {}, depth >= {})",
        schema.sequences.len(),
        threshold.min_coverage,
        threshold.min_depth
    );

    let mut table = Table::new(rows::genotype_header(&schema)).with_legend(&rows::GENOTYPE_LEGEND);
    for report in reports {
        table.push_row(rows::genotype_row(report, &schema, threshold))?;
    }
    Ok(table)
}

/// Write the run report as pretty JSON
pub fn write_summary_report(path: &Path, report: &SummaryReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write run report to {:?}", path))?;
    info!("Run report written to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    fn predict(mode: TableMode) -> Pipeline {
        Pipeline::Predict {
            mode,
            copy_number: false,
        }
    }

    #[test]
    fn test_wide_summary_end_to_end() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "A.json",
            r#"{"sampleA": {"susceptibility": {"INH": {"predict": "R"}, "RIF": {"predict": "S"}}}}"#,
        );
        write(
            dir.path(),
            "nested/B.json",
            r#"{"sampleB": {"susceptibility": {"RIF": {"predict": "R", "called_by": {
                "katG": {"_cls": "Call.SequenceCall",
                         "info": {"coverage": {"percent_coverage": 95, "median_depth": 40}}}
            }}}}}"#,
        );

        let config = SummaryConfig::new(dir.path(), predict(TableMode::Wide));
        let report = SummaryProcessor::new(config).process().unwrap();

        assert_eq!(report.documents, 2);
        assert_eq!(report.degraded_documents, 0);
        assert_eq!(report.rows, 2);
        assert_eq!(report.columns, 5);
        assert_eq!(report.output_path, dir.path().join("summary.tsv"));

        let out = lines(&report.output_path);
        assert_eq!(out[0], "file\tsample\tS_INH\tS_RIF\tG_katG");
        assert_eq!(out[1], "A.json\tsampleA\tR\tS\t");
        assert_eq!(out[2], "B.json\tsampleB\t\tR\t95_40");
        assert!(out[3].starts_with("Legend:"));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_broken_report_keeps_its_row() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "A.json",
            r#"{"sampleA": {"susceptibility": {"INH": {"predict": "R"}}}}"#,
        );
        write(dir.path(), "broken.json", "{ truncated");
        write(dir.path(), "multi.json", r#"{"s1": {}, "s2": {}}"#);

        let config = SummaryConfig::new(dir.path(), predict(TableMode::Wide));
        let report = SummaryProcessor::new(config).process().unwrap();

        assert_eq!(report.documents, 3);
        assert_eq!(report.degraded_documents, 2);

        let out = lines(&report.output_path);
        assert_eq!(out[0], "file\tsample\tS_INH\tS_NA");
        assert_eq!(out[1], "A.json\tsampleA\tR\t");
        assert_eq!(out[2], "broken.json\t\t\tN");
        assert_eq!(out[3], "multi.json\t\t\tN");
    }

    #[test]
    fn test_long_summary_end_to_end() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "plate1/s1/s1.json",
            r#"{"s1": {"susceptibility": {"RIF": {"predict": "R"}, "INH": {"predict": "S"}}}}"#,
        );

        let config = SummaryConfig::new(dir.path(), predict(TableMode::Long))
            .with_output_file("long.tsv");
        let report = SummaryProcessor::new(config).process().unwrap();

        assert_eq!(report.mode, "long");
        assert_eq!(report.rows, 2);
        assert_eq!(report.columns, rows::LONG_HEADER.len());

        let out = lines(&dir.path().join("long.tsv"));
        assert_eq!(out.len(), 3);
        assert!(out[0].starts_with("mykrobe_version\tfile\tplate_name\tsample\tdrug"));
        let inh: Vec<&str> = out[1].split('\t').collect();
        assert_eq!(inh[4], "INH");
        assert_eq!(inh[14], "S");
        assert_eq!(inh.len(), rows::LONG_HEADER.len());
    }

    #[test]
    fn test_genotype_summary_end_to_end() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "g1.json",
            r#"{"run/g1": {"files": ["g1.fq.gz"], "sequence_calls": {
                "mecA": [{"info": {"coverage": {"percent_coverage": 100, "median_depth": 60}, "copy_number": 1}}],
                "blaZ": [{"info": {"coverage": {"percent_coverage": 70, "median_depth": 50}, "copy_number": 1}}]
            }}}"#,
        );
        write(dir.path(), "g2.json", r#"{"g2": {"sequence_calls": {}}}"#);

        let config = SummaryConfig::new(dir.path(), Pipeline::Genotype)
            .with_threshold(CoverageThreshold::new(80, 10))
            .with_verbose(true);
        let report = SummaryProcessor::new(config).process().unwrap();

        let out = lines(&report.output_path);
        assert_eq!(out[0], "file\tsample\tSq_mecA");
        assert_eq!(out[1], "g1.json\tg1\tc100_d60_cn1_v0");
        assert_eq!(out[2], "g2.json\tg2\t");
        assert!(out[3].starts_with("Legend:\t\t\tSq_: gene (variant) tested"));
    }

    #[test]
    fn test_run_report_written() {
        let dir = tempdir().unwrap();
        write(dir.path(), "A.json", r#"{"A": {}}"#);
        let report_path = dir.path().join("run.json");

        let config = SummaryConfig::new(dir.path(), predict(TableMode::Wide))
            .with_report_path(Some(report_path.clone()));
        let processor = SummaryProcessor::new(config);
        let report = processor.process().unwrap();

        let saved: SummaryReport =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(saved.run_id, processor.run_id());
        assert_eq!(saved.rows, report.rows);
        assert_eq!(saved.pipeline, "predict");
    }

    #[test]
    fn test_missing_input_directory_fails() {
        let dir = tempdir().unwrap();
        let config = SummaryConfig::new(dir.path().join("absent"), Pipeline::Genotype);
        assert!(SummaryProcessor::new(config).process().is_err());
    }

    #[test]
    fn test_empty_corpus_writes_header_only() {
        let reports: Vec<SampleReport> = Vec::new();
        let table = build_predict_table(&reports, TableMode::Wide).unwrap();
        assert_eq!(table.header(), &["file".to_string(), "sample".to_string()]);
        assert!(table.rows().is_empty());
    }
}
