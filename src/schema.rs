// ==============================================================================
// schema.rs - Corpus-Wide Column Unification
// ==============================================================================
// Description: Builds the sorted union of drug, gene, variant and sequence keys
//              over every report in a run
// Author: Mykrobe Summary Contributors
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// The schema is computed once, after all reports are seen, and never revised.
// It only records key presence; facts are re-extracted per row.
// ==============================================================================

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, trace};

use crate::extractor::{self, sequence_coverage};
use crate::models::{CoverageThreshold, EntityFamily};
use crate::parsers::SampleReport;

/// Unified columns for the predict pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PredictSchema {
    /// Sorted drug names (may include the `NA` sentinel)
    pub drugs: Vec<String>,
    /// Sorted gene call names
    pub genes: Vec<String>,
    /// Sorted variant call names
    pub variants: Vec<String>,
}

impl PredictSchema {
    /// Union drug, gene and variant keys over all reports
    ///
    /// # Arguments
    /// * `reports` - Every report in the run (degraded reports contribute the `NA` drug only)
    ///
    /// # Returns
    /// * `PredictSchema` - Keys per family, sorted lexicographically
    pub fn unify<'a>(reports: impl IntoIterator<Item = &'a SampleReport>) -> Self {
        let mut drugs = BTreeSet::new();
        let mut genes = BTreeSet::new();
        let mut variants = BTreeSet::new();

        for report in reports {
            for drug in extractor::drug_names(report) {
                if let Some(calls) = extractor::called_by(report, &drug) {
                    for (name, call) in calls {
                        if extractor::is_sequence_call(call) {
                            genes.insert(name.clone());
                        } else {
                            variants.insert(name.clone());
                        }
                    }
                }
                drugs.insert(drug);
            }
        }

        let schema = Self {
            drugs: drugs.into_iter().collect(),
            genes: genes.into_iter().collect(),
            variants: variants.into_iter().collect(),
        };
        debug!(
            "Unified predict schema: {} drugs, {} genes, {} variants",
            schema.drugs.len(),
            schema.genes.len(),
            schema.variants.len()
        );
        schema
    }

    /// Dynamic column names in output order: `S_*`, then `G_*`, then `V_*`
    pub fn columns(&self) -> Vec<String> {
        let drugs = self.drugs.iter().map(|k| EntityFamily::Drug.column_name(k));
        let genes = self.genes.iter().map(|k| EntityFamily::Gene.column_name(k));
        let variants = self
            .variants
            .iter()
            .map(|k| EntityFamily::Variant.column_name(k));
        drugs.chain(genes).chain(variants).collect()
    }

    /// Number of dynamic columns
    pub fn width(&self) -> usize {
        self.drugs.len() + self.genes.len() + self.variants.len()
    }
}

/// Unified columns for the genotype pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenotypeSchema {
    /// Sorted sequence names that passed the threshold in at least one report
    pub sequences: Vec<String>,
}

impl GenotypeSchema {
    /// Union the sequence calls that pass `threshold` (coverage AND depth)
    ///
    /// Calls whose coverage or depth cannot be read are never admitted.
    pub fn unify<'a>(
        reports: impl IntoIterator<Item = &'a SampleReport>,
        threshold: &CoverageThreshold,
    ) -> Self {
        let mut sequences = BTreeSet::new();

        for report in reports {
            for (name, call) in extractor::sequence_calls(report) {
                match sequence_coverage(call) {
                    Ok((coverage, depth)) if threshold.passes(coverage, depth) => {
                        sequences.insert(name);
                    }
                    Ok((coverage, depth)) => {
                        trace!(
                            "{}: {} below minimum (coverage {}, depth {})",
                            report.sample_id, name, coverage, depth
                        );
                    }
                    Err(e) => {
                        trace!("{}: {} not admitted: {}", report.sample_id, name, e);
                    }
                }
            }
        }

        Self {
            sequences: sequences.into_iter().collect(),
        }
    }

    pub fn columns(&self) -> Vec<String> {
        self.sequences
            .iter()
            .map(|k| EntityFamily::Sequence.column_name(k))
            .collect()
    }
}
