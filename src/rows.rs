// ==============================================================================
// rows.rs - Summary Row Construction
// ==============================================================================
// Description: Turns one report plus the unified schema into output cells for
//              the predict (wide/long) and genotype tables
// Author: Mykrobe Summary Contributors
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use tracing::{debug, warn};

use crate::extractor::{self, FactMap};
use crate::models::{CoverageThreshold, DEFAULT_PREDICTION};
use crate::parsers::SampleReport;
use crate::schema::{GenotypeSchema, PredictSchema};

/// Leading columns of the wide predict and genotype tables
pub const SAMPLE_COLUMNS: [&str; 2] = ["file", "sample"];

/// Fixed header of the long predict table
pub const LONG_HEADER: [&str; 17] = [
    "mykrobe_version",
    "file",
    "plate_name",
    "sample",
    "drug",
    "phylo_group",
    "species",
    "lineage",
    "phylo_group_per_covg",
    "species_per_covg",
    "lineage_per_covg",
    "phylo_group_depth",
    "species_depth",
    "lineage_depth",
    "susceptibility",
    "variants (gene:alt_depth:wt_depth:conf)",
    "genes (prot_mut-ref_mut:percent_covg:depth)",
];

/// Trailing legend row of the wide predict table
pub const PREDICT_LEGEND: [&str; 12] = [
    "Legend:",
    "",
    "",
    "S_: Susceptibility (S, r, R)",
    "",
    "",
    "",
    "G_: Tested genes (percent coverage _ depth)",
    "",
    "",
    "",
    "V_: variants (alt depth _ wt depth _ conf)",
];

/// Trailing legend row of the genotype table
pub const GENOTYPE_LEGEND: [&str; 20] = [
    "Legend:",
    "",
    "",
    "Sq_: gene (variant) tested",
    "",
    "",
    "",
    "c: percent coverage",
    "",
    "",
    "",
    "d: depth",
    "",
    "",
    "",
    "cn: estimated copy number",
    "",
    "",
    "",
    "v: gene variant",
];

const PHYLO_LEVELS: [&str; 3] = ["phylo_group", "species", "lineage"];

/// Header of the wide predict table
pub fn wide_header(schema: &PredictSchema) -> Vec<String> {
    SAMPLE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(schema.columns())
        .collect()
}

/// Look up one key's cell, logging facts that could not be extracted
fn fact_cell<T>(
    report: &SampleReport,
    facts: &FactMap<T>,
    key: &str,
    cell: impl Fn(&T) -> String,
) -> String {
    match facts.get(key) {
        Some(Ok(fact)) => cell(fact),
        Some(Err(e)) => {
            warn!("{}: {} left empty: {}", report.file_name(), key, e);
            String::new()
        }
        None => String::new(),
    }
}

/// One wide row: file, sample, then a cell per unified column
///
/// # Arguments
/// * `report` - The report to flatten (re-extracted here, independent of the schema pass)
/// * `schema` - Unified columns for the whole run
///
/// # Returns
/// * Cells in header order. Susceptibility is the `predict` string, `N` for a
///   drug the report declares without a prediction, and empty for a drug it
///   does not declare. Gene/variant cells are empty when absent.
pub fn wide_row(report: &SampleReport, schema: &PredictSchema) -> Vec<String> {
    let mut row = Vec::with_capacity(SAMPLE_COLUMNS.len() + schema.width());
    row.push(report.file_name());
    row.push(report.sample_id.clone());

    let declared = extractor::drug_names(report);
    for drug in &schema.drugs {
        let cell = if declared.contains(drug) {
            extractor::prediction(report, drug).unwrap_or_else(|| DEFAULT_PREDICTION.to_string())
        } else {
            String::new()
        };
        row.push(cell);
    }

    let genes = extractor::report_gene_facts(report);
    for gene in &schema.genes {
        row.push(fact_cell(report, &genes, gene, |f| f.cell()));
    }

    let variants = extractor::report_variant_facts(report);
    for variant in &schema.variants {
        row.push(fact_cell(report, &variants, variant, |f| f.cell()));
    }

    row
}

/// Long rows: one per drug the report declares, with inline call lists
///
/// Calls whose facts cannot be extracted are left out of the list.
pub fn long_rows(report: &SampleReport) -> Vec<Vec<String>> {
    let version = extractor::predictor_version(report);
    let file = report.file_stem();
    let plate = report.plate_name();
    let phylo: Vec<_> = PHYLO_LEVELS
        .iter()
        .map(|level| extractor::phylogenetics(report, level))
        .collect();

    extractor::drug_names(report)
        .into_iter()
        .map(|drug| {
            let (variants, genes) = match extractor::called_by(report, &drug) {
                Some(calls) => (
                    join_entries(report, extractor::variant_calls(calls), |n, f| f.entry(n)),
                    join_entries(report, extractor::gene_calls(calls), |n, f| f.entry(n)),
                ),
                None => (String::new(), String::new()),
            };
            let susceptibility = extractor::prediction(report, &drug)
                .unwrap_or_else(|| DEFAULT_PREDICTION.to_string());

            let mut row = vec![
                version.clone(),
                file.clone(),
                plate.clone(),
                report.sample_id.clone(),
                drug,
            ];
            row.extend(phylo.iter().map(|p| p.names.clone()));
            row.extend(phylo.iter().map(|p| p.percent_coverage.clone()));
            row.extend(phylo.iter().map(|p| p.median_depth.clone()));
            row.push(susceptibility);
            row.push(variants);
            row.push(genes);
            row
        })
        .collect()
}

fn join_entries<T>(
    report: &SampleReport,
    facts: FactMap<T>,
    entry: impl Fn(&str, &T) -> String,
) -> String {
    facts
        .iter()
        .filter_map(|(name, fact)| match fact {
            Ok(fact) => Some(entry(name, fact)),
            Err(e) => {
                warn!("{}: {} omitted: {}", report.file_name(), name, e);
                None
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Header of the genotype table
pub fn genotype_header(schema: &GenotypeSchema) -> Vec<String> {
    SAMPLE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(schema.columns())
        .collect()
}

/// Sample name shown in the genotype table: the last `/` segment of the sample key
pub fn genotype_sample_name(report: &SampleReport) -> String {
    report
        .sample_id
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// One genotype row: file, sample, then a cell per unified sequence
///
/// A cell is filled when the report's own call reaches the minimum coverage;
/// the depth minimum only gates admission into the schema.
pub fn genotype_row(
    report: &SampleReport,
    schema: &GenotypeSchema,
    threshold: &CoverageThreshold,
) -> Vec<String> {
    let mut row = Vec::with_capacity(SAMPLE_COLUMNS.len() + schema.sequences.len());
    row.push(report.file_name());
    row.push(genotype_sample_name(report));

    let calls = extractor::sequence_calls(report);
    for sequence in &schema.sequences {
        let cell = match calls.get(sequence).map(|call| extractor::sequence_fact(call)) {
            Some(Ok(fact)) if threshold.passes_coverage(fact.percent_coverage) => fact.cell(),
            Some(Ok(_)) | None => String::new(),
            Some(Err(e)) => {
                warn!("{}: {} left empty: {}", report.file_name(), sequence, e);
                String::new()
            }
        };
        row.push(cell);
    }

    row
}

/// Per-sample genotype detail for verbose runs
pub fn log_genotype_details(report: &SampleReport, threshold: &CoverageThreshold) {
    debug!("+++++ {} +++++", report.sample_id);
    debug!("files: {}", extractor::scalar_text(report.category("files")));
    debug!("Sequences with coverage above {}:", threshold.min_coverage);

    for (name, call) in extractor::sequence_calls(report) {
        match extractor::sequence_coverage(call) {
            Ok((coverage, depth)) if threshold.passes(coverage, depth) => {
                match extractor::sequence_fact(call) {
                    Ok(fact) => debug!(
                        "{}: copy number {}, version {}",
                        name, fact.copy_number, fact.version
                    ),
                    Err(e) => debug!("{}: {}", name, e),
                }
            }
            Ok((coverage, depth)) => {
                debug!("Cov. {} or Depth {} (below min!): {}", coverage, depth, name)
            }
            Err(e) => debug!("{}: {}", name, e),
        }
    }
}
