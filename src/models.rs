// ==============================================================================
// models.rs - Report Entity Models
// ==============================================================================
// Description: Entity families, fact records and coverage thresholds for
//              Mykrobe predict/genotype report summaries
// Author: Mykrobe Summary Contributors
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};

/// `_cls` tag that marks a gene (sequence) call inside a drug's `called_by` block
pub const SEQUENCE_CALL_CLS: &str = "Call.SequenceCall";

/// Drug key used when a report declares no susceptibility at all
pub const SENTINEL_DRUG: &str = "NA";

/// Susceptibility written for a declared drug that carries no prediction
pub const DEFAULT_PREDICTION: &str = "N";

/// Confidence assumed for a variant call without `info.conf`
pub const DEFAULT_CONFIDENCE: i64 = 1;

/// Class of dynamic keys that become output columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityFamily {
    /// Drug names from the `susceptibility` block
    Drug,
    /// Gene calls (`_cls == "Call.SequenceCall"`) under a drug
    Gene,
    /// Variant calls (any other `_cls`) under a drug
    Variant,
    /// Sequence calls from a genotype report
    Sequence,
}

impl EntityFamily {
    /// Column prefix used in the summary header
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityFamily::Drug => "S",
            EntityFamily::Gene => "G",
            EntityFamily::Variant => "V",
            EntityFamily::Sequence => "Sq",
        }
    }

    /// Header name for one key of this family (e.g. `G_katG`)
    pub fn column_name(&self, key: &str) -> String {
        format!("{}_{}", self.prefix(), key)
    }
}

/// Coverage facts for one gene call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneFact {
    /// Percent of the gene covered by reads (truncated)
    pub percent_coverage: i64,
    /// Median read depth over the gene (truncated)
    pub median_depth: i64,
}

impl GeneFact {
    /// Wide-table cell: `{coverage}_{depth}`
    pub fn cell(&self) -> String {
        format!("{}_{}", self.percent_coverage, self.median_depth)
    }

    /// Long-table list entry: `{name}:{coverage}:{depth}`
    pub fn entry(&self, name: &str) -> String {
        format!("{}:{}:{}", name, self.percent_coverage, self.median_depth)
    }
}

/// Depth facts for one variant call, after coverage gating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFact {
    /// Median depth on the alternate allele (0 unless fully covered)
    pub alt_depth: i64,
    /// Median depth on the reference allele (0 unless fully covered)
    pub wt_depth: i64,
    /// Genotype confidence
    pub confidence: i64,
}

impl VariantFact {
    /// Wide-table cell: `{alt}_{wt}_{conf}`
    pub fn cell(&self) -> String {
        format!("{}_{}_{}", self.alt_depth, self.wt_depth, self.confidence)
    }

    /// Long-table list entry: `{name}:{alt}:{wt}:{conf}`
    pub fn entry(&self, name: &str) -> String {
        format!(
            "{}:{}:{}:{}",
            name, self.alt_depth, self.wt_depth, self.confidence
        )
    }
}

/// Facts for one genotype sequence call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceFact {
    pub percent_coverage: i64,
    pub median_depth: i64,
    /// Estimated copy number
    pub copy_number: i64,
    /// Gene variant number (0 when the report has none)
    pub version: i64,
}

impl SequenceFact {
    /// Genotype cell: `c{coverage}_d{depth}_cn{copy_number}_v{version}`
    pub fn cell(&self) -> String {
        format!(
            "c{}_d{}_cn{}_v{}",
            self.percent_coverage, self.median_depth, self.copy_number, self.version
        )
    }
}

/// Minimum coverage/depth a genotype sequence call needs to be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageThreshold {
    /// Minimum percent coverage
    pub min_coverage: i64,
    /// Minimum median depth
    pub min_depth: i64,
}

impl Default for CoverageThreshold {
    fn default() -> Self {
        Self {
            min_coverage: 80,
            min_depth: 10,
        }
    }
}

impl CoverageThreshold {
    pub fn new(min_coverage: i64, min_depth: i64) -> Self {
        Self {
            min_coverage,
            min_depth,
        }
    }

    /// Schema admission: coverage AND depth must both reach their minimum
    pub fn passes(&self, percent_coverage: i64, median_depth: i64) -> bool {
        self.passes_coverage(percent_coverage) && median_depth >= self.min_depth
    }

    /// Cell admission only looks at coverage
    pub fn passes_coverage(&self, percent_coverage: i64) -> bool {
        percent_coverage >= self.min_coverage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        assert_eq!(EntityFamily::Drug.column_name("INH"), "S_INH");
        assert_eq!(EntityFamily::Gene.column_name("katG"), "G_katG");
        assert_eq!(EntityFamily::Variant.column_name("rpoB_S450L"), "V_rpoB_S450L");
        assert_eq!(EntityFamily::Sequence.column_name("mecA"), "Sq_mecA");
    }

    #[test]
    fn test_fact_formatting() {
        let gene = GeneFact {
            percent_coverage: 95,
            median_depth: 40,
        };
        assert_eq!(gene.cell(), "95_40");
        assert_eq!(gene.entry("katG"), "katG:95:40");

        let variant = VariantFact {
            alt_depth: 0,
            wt_depth: 33,
            confidence: 120,
        };
        assert_eq!(variant.cell(), "0_33_120");
        assert_eq!(variant.entry("katG_S315T"), "katG_S315T:0:33:120");

        let seq = SequenceFact {
            percent_coverage: 100,
            median_depth: 52,
            copy_number: 2,
            version: 0,
        };
        assert_eq!(seq.cell(), "c100_d52_cn2_v0");
    }

    #[test]
    fn test_threshold_is_a_conjunction() {
        let threshold = CoverageThreshold::default();
        assert!(threshold.passes(80, 10));
        assert!(!threshold.passes(70, 50)); // coverage too low
        assert!(!threshold.passes(95, 9)); // depth too low
        assert!(threshold.passes_coverage(95));
        assert!(!threshold.passes_coverage(79));
    }

    #[test]
    fn test_entity_family_serde() {
        let json = serde_json::to_string(&EntityFamily::Sequence).unwrap();
        assert_eq!(json, "\"sequence\"");
    }
}
