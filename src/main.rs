// ==============================================================================
// main.rs - Mykrobe Summary Entry Point
// ==============================================================================
// Description: Collects Mykrobe predict/genotype JSON reports from a folder
//              into a single tab-separated summary
// Author: Mykrobe Summary Contributors
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mykrobe_summary::config::{Pipeline, SummaryConfig, TableMode};
use mykrobe_summary::models::CoverageThreshold;
use mykrobe_summary::processor::SummaryProcessor;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize "mykrobe predict" outputs (resistance calls)
    Predict {
        #[command(flatten)]
        common: CommonArgs,

        /// Table layout: one row per sample (wide) or per sample and drug (long)
        #[arg(long, value_enum, default_value_t = TableMode::Wide, env = "MYKROBE_SUMMARY_FORMAT")]
        format: TableMode,

        /// Write copy number instead of coverage (reserved, no effect yet)
        #[arg(long = "copy-number")]
        copy_number: bool,
    },

    /// Summarize "mykrobe genotype" outputs (sequence calls)
    Genotype {
        #[command(flatten)]
        common: CommonArgs,

        /// Minimum depth per gene
        #[arg(short = 'd', long, default_value_t = 10, env = "MYKROBE_SUMMARY_MIN_DEPTH")]
        min_depth: i64,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Input directory (searched recursively for *.json)
    #[arg(short, long, default_value = "./", env = "MYKROBE_SUMMARY_INPUT_DIR")]
    input_dir: PathBuf,

    /// Name of the output file (written inside the input directory)
    #[arg(short, long, default_value = "summary.tsv", env = "MYKROBE_SUMMARY_OUTPUT_FILE")]
    output_file: PathBuf,

    /// Minimum coverage per gene
    #[arg(short = 'c', long, default_value_t = 80, env = "MYKROBE_SUMMARY_MIN_COVERAGE")]
    min_coverage: i64,

    /// Write per-sample details to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Also write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> SummaryConfig {
        let (common, pipeline, min_depth) = match self.command {
            Command::Predict {
                common,
                format,
                copy_number,
            } => (
                common,
                Pipeline::Predict {
                    mode: format,
                    copy_number,
                },
                CoverageThreshold::default().min_depth,
            ),
            Command::Genotype { common, min_depth } => (common, Pipeline::Genotype, min_depth),
        };

        SummaryConfig::new(common.input_dir, pipeline)
            .with_output_file(common.output_file)
            .with_threshold(CoverageThreshold::new(common.min_coverage, min_depth))
            .with_verbose(common.verbose)
            .with_report_path(common.report)
    }
}

fn main() -> Result<()> {
    let config = Cli::parse().into_config();

    // Initialize tracing (stderr, so diagnostics never mix with table output)
    let default_filter = if config.verbose {
        "mykrobe_summary=debug"
    } else {
        "mykrobe_summary=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Mykrobe Summary starting...");

    match SummaryProcessor::new(config).process() {
        Ok(report) => {
            info!("Summary written: {:?}", report.output_path);
            Ok(())
        }
        Err(e) => {
            error!("Summary failed: {:#}", e);
            Err(e)
        }
    }
}
