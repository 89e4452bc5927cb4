// ==============================================================================
// extractor.rs - Report Field Extraction
// ==============================================================================
// Description: Pulls drugs, gene calls, variant calls, sequence calls and
//              phylogenetics out of a loaded report into normalized facts
// Author: Mykrobe Summary Contributors
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Paths read (relative to the sample key):
//   susceptibility.<drug>.predict
//   susceptibility.<drug>.called_by.<name>._cls
//   susceptibility.<drug>.called_by.<name>.info.coverage.{percent_coverage,median_depth}
//   susceptibility.<drug>.called_by.<name>.info.coverage.{alternate,reference}.*
//   susceptibility.<drug>.called_by.<name>.info.conf
//   sequence_calls.<name>[0].info.{coverage.*,copy_number,version}
//   phylogenetics.<level>.<name>.{percent_coverage,median_depth}
// ==============================================================================

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{
    GeneFact, SequenceFact, VariantFact, DEFAULT_CONFIDENCE, SENTINEL_DRUG, SEQUENCE_CALL_CLS,
};
use crate::parsers::SampleReport;

/// Facts per key; a failed extraction is kept so the cell can be left empty
pub type FactMap<T> = BTreeMap<String, Result<T, ExtractError>>;

/// Errors for a single document/key pair
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Field {field} is not numeric: {value}")]
    NotNumeric { field: String, value: String },
}

/// Truncate a number or numeric string to an integer
///
/// # Examples
/// ```
/// use mykrobe_summary::extractor::truncate_to_int;
/// use serde_json::json;
///
/// assert_eq!(truncate_to_int(&json!(95.7), "cov").unwrap(), 95);
/// assert_eq!(truncate_to_int(&json!("40"), "depth").unwrap(), 40);
/// assert!(truncate_to_int(&json!(null), "depth").is_err());
/// ```
pub fn truncate_to_int(value: &Value, field: &str) -> Result<i64, ExtractError> {
    let not_numeric = || ExtractError::NotNumeric {
        field: field.to_string(),
        value: value.to_string(),
    };

    let number = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            n.as_f64().ok_or_else(not_numeric)?
        }
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| not_numeric())?,
        _ => return Err(not_numeric()),
    };

    if !number.is_finite() {
        return Err(not_numeric());
    }
    Ok(number.trunc() as i64)
}

/// Resolve a JSON pointer and coerce it to an integer
fn int_at(value: &Value, pointer: &str) -> Result<i64, ExtractError> {
    let field = value
        .pointer(pointer)
        .ok_or_else(|| ExtractError::MissingField(pointer.to_string()))?;
    truncate_to_int(field, pointer)
}

/// Render a scalar the way it appears in the report ("" for missing/null)
pub fn scalar_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Drugs declared by the report, sorted; `["NA"]` when there are none
pub fn drug_names(report: &SampleReport) -> Vec<String> {
    let mut drugs: Vec<String> = report
        .category("susceptibility")
        .and_then(Value::as_object)
        .map(|s| s.keys().cloned().collect())
        .unwrap_or_default();

    if drugs.is_empty() {
        return vec![SENTINEL_DRUG.to_string()];
    }
    drugs.sort();
    drugs
}

/// The `susceptibility.<drug>` block, if the report has one
pub fn drug_call<'a>(report: &'a SampleReport, drug: &str) -> Option<&'a Value> {
    report.category("susceptibility")?.get(drug)
}

/// Predicted susceptibility string (`R`, `S`, `r`, ...) for a drug
pub fn prediction(report: &SampleReport, drug: &str) -> Option<String> {
    drug_call(report, drug)?
        .get("predict")
        .filter(|p| !p.is_null())
        .map(|p| scalar_text(Some(p)))
}

/// The `called_by` map of a drug block
pub fn called_by<'a>(report: &'a SampleReport, drug: &str) -> Option<&'a Map<String, Value>> {
    drug_call(report, drug)?.get("called_by")?.as_object()
}

pub fn is_sequence_call(call: &Value) -> bool {
    call.get("_cls").and_then(Value::as_str) == Some(SEQUENCE_CALL_CLS)
}

/// Gene (sequence) call facts: truncated percent coverage and median depth
pub fn gene_fact(call: &Value) -> Result<GeneFact, ExtractError> {
    Ok(GeneFact {
        percent_coverage: int_at(call, "/info/coverage/percent_coverage")?,
        median_depth: int_at(call, "/info/coverage/median_depth")?,
    })
}

/// Depth of one allele side, forced to 0 unless that side is fully covered
fn gated_depth(call: &Value, side: &str) -> Result<i64, ExtractError> {
    let coverage = int_at(call, &format!("/info/coverage/{}/percent_coverage", side))?;
    if coverage < 100 {
        return Ok(0);
    }
    int_at(call, &format!("/info/coverage/{}/median_depth", side))
}

/// Variant call facts with coverage-gated depths
pub fn variant_fact(call: &Value) -> Result<VariantFact, ExtractError> {
    let alt_depth = gated_depth(call, "alternate")?;
    let wt_depth = gated_depth(call, "reference")?;
    let confidence = match call.pointer("/info/conf") {
        Some(conf) => truncate_to_int(conf, "/info/conf")?,
        None => DEFAULT_CONFIDENCE,
    };

    Ok(VariantFact {
        alt_depth,
        wt_depth,
        confidence,
    })
}

/// Gene calls under one drug
pub fn gene_calls(called_by: &Map<String, Value>) -> FactMap<GeneFact> {
    called_by
        .iter()
        .filter(|(_, call)| is_sequence_call(call))
        .map(|(name, call)| (name.clone(), gene_fact(call)))
        .collect()
}

/// Variant calls under one drug
pub fn variant_calls(called_by: &Map<String, Value>) -> FactMap<VariantFact> {
    called_by
        .iter()
        .filter(|(_, call)| !is_sequence_call(call))
        .map(|(name, call)| (name.clone(), variant_fact(call)))
        .collect()
}

/// Gene facts for the whole report
///
/// Drugs are visited in sorted order and a gene seen under several drugs keeps
/// the facts from the last one (last-write-wins).
pub fn report_gene_facts(report: &SampleReport) -> FactMap<GeneFact> {
    let mut facts = FactMap::new();
    for drug in drug_names(report) {
        if let Some(calls) = called_by(report, &drug) {
            facts.extend(gene_calls(calls));
        }
    }
    facts
}

/// Variant facts for the whole report, last-write-wins across sorted drugs
pub fn report_variant_facts(report: &SampleReport) -> FactMap<VariantFact> {
    let mut facts = FactMap::new();
    for drug in drug_names(report) {
        if let Some(calls) = called_by(report, &drug) {
            facts.extend(variant_calls(calls));
        }
    }
    facts
}

/// Raw genotype sequence calls: the first entry of each `sequence_calls.<name>` list
pub fn sequence_calls(report: &SampleReport) -> BTreeMap<String, &Value> {
    let Some(calls) = report.category("sequence_calls").and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    calls
        .iter()
        .filter_map(|(name, entries)| {
            let call = match entries {
                Value::Array(list) => list.first()?,
                other => other,
            };
            Some((name.clone(), call))
        })
        .collect()
}

/// Coverage and depth of a sequence call, used for schema admission
pub fn sequence_coverage(call: &Value) -> Result<(i64, i64), ExtractError> {
    Ok((
        int_at(call, "/info/coverage/percent_coverage")?,
        int_at(call, "/info/coverage/median_depth")?,
    ))
}

/// Full sequence call facts; version defaults to 0
pub fn sequence_fact(call: &Value) -> Result<SequenceFact, ExtractError> {
    let (percent_coverage, median_depth) = sequence_coverage(call)?;
    let version = match call.pointer("/info/version") {
        Some(v) => truncate_to_int(v, "/info/version")?,
        None => 0,
    };

    Ok(SequenceFact {
        percent_coverage,
        median_depth,
        copy_number: int_at(call, "/info/copy_number")?,
        version,
    })
}

/// Phylogenetic calls at one level (`phylo_group`, `species`, `lineage`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhyloSummary {
    /// Call names joined by ';'
    pub names: String,
    /// Percent coverage per call, joined by ';'
    pub percent_coverage: String,
    /// Median depth per call, joined by ';'
    pub median_depth: String,
}

pub fn phylogenetics(report: &SampleReport, level: &str) -> PhyloSummary {
    let Some(calls) = report
        .category("phylogenetics")
        .and_then(|p| p.get(level))
        .and_then(Value::as_object)
    else {
        return PhyloSummary::default();
    };

    let mut names = Vec::new();
    let mut coverage = Vec::new();
    let mut depth = Vec::new();
    for (name, call) in calls {
        names.push(name.clone());
        coverage.push(scalar_text(call.get("percent_coverage")));
        depth.push(scalar_text(call.get("median_depth")));
    }

    PhyloSummary {
        names: names.join(";"),
        percent_coverage: coverage.join(";"),
        median_depth: depth.join(";"),
    }
}

/// Predictor version string, `-1` when the report does not record it
pub fn predictor_version(report: &SampleReport) -> String {
    match report.category("version").and_then(|v| v.get("mykrobe-predictor")) {
        Some(v) if !v.is_null() => scalar_text(Some(v)),
        _ => "-1".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(body: Value) -> SampleReport {
        SampleReport::from_document("s.json", json!({ "s": body })).unwrap()
    }

    fn gene(cov: Value, depth: Value) -> Value {
        json!({
            "_cls": "Call.SequenceCall",
            "info": {"coverage": {"percent_coverage": cov, "median_depth": depth}}
        })
    }

    fn variant(alt_cov: i64, alt_depth: i64, ref_cov: i64, ref_depth: i64) -> Value {
        json!({
            "_cls": "Call.VariantCall",
            "info": {
                "coverage": {
                    "alternate": {"percent_coverage": alt_cov, "median_depth": alt_depth},
                    "reference": {"percent_coverage": ref_cov, "median_depth": ref_depth}
                },
                "conf": 250
            }
        })
    }

    #[test]
    fn test_truncation() {
        assert_eq!(truncate_to_int(&json!(99.99), "x").unwrap(), 99);
        assert_eq!(truncate_to_int(&json!("12.9"), "x").unwrap(), 12);
        assert_eq!(truncate_to_int(&json!(-3.5), "x").unwrap(), -3);
        assert!(matches!(
            truncate_to_int(&json!("abc"), "x"),
            Err(ExtractError::NotNumeric { .. })
        ));
        assert!(truncate_to_int(&json!({"a": 1}), "x").is_err());
    }

    #[test]
    fn test_drug_names_sorted_with_sentinel() {
        let r = report(json!({"susceptibility": {"RIF": {}, "INH": {}}}));
        assert_eq!(drug_names(&r), vec!["INH", "RIF"]);

        let none = report(json!({"phylogenetics": {}}));
        assert_eq!(drug_names(&none), vec!["NA"]);

        let empty = SampleReport::empty("x.json");
        assert_eq!(drug_names(&empty), vec!["NA"]);
    }

    #[test]
    fn test_gene_and_variant_split_by_cls() {
        let called_by = json!({
            "katG": gene(json!(95.5), json!(40.2)),
            "katG_S315T": variant(100, 30, 100, 2)
        });
        let called_by = called_by.as_object().unwrap();

        let genes = gene_calls(called_by);
        assert_eq!(genes.len(), 1);
        assert_eq!(
            genes["katG"],
            Ok(GeneFact {
                percent_coverage: 95,
                median_depth: 40
            })
        );

        let variants = variant_calls(called_by);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants["katG_S315T"].as_ref().unwrap().cell(), "30_2_250");
    }

    #[test]
    fn test_reference_coverage_below_100_zeroes_wt_depth() {
        let fact = variant_fact(&variant(100, 45, 99, 60)).unwrap();
        assert_eq!(fact.alt_depth, 45);
        assert_eq!(fact.wt_depth, 0);
    }

    #[test]
    fn test_alternate_coverage_below_100_zeroes_alt_depth() {
        let fact = variant_fact(&variant(50, 45, 100, 60)).unwrap();
        assert_eq!(fact.alt_depth, 0);
        assert_eq!(fact.wt_depth, 60);
    }

    #[test]
    fn test_confidence_defaults_to_one() {
        let call = json!({
            "_cls": "Call.VariantCall",
            "info": {"coverage": {
                "alternate": {"percent_coverage": 100, "median_depth": 7},
                "reference": {"percent_coverage": 0}
            }}
        });
        let fact = variant_fact(&call).unwrap();
        assert_eq!(fact.cell(), "7_0_1");
    }

    #[test]
    fn test_missing_depth_is_a_key_level_failure() {
        let called_by = json!({"katG": gene(json!(95), Value::Null), "inhA": gene(json!(100), json!(8))});
        let genes = gene_calls(called_by.as_object().unwrap());
        assert!(genes["katG"].is_err());
        assert!(genes["inhA"].is_ok());
    }

    #[test]
    fn test_last_drug_wins_for_shared_gene() {
        let r = report(json!({"susceptibility": {
            "RIF": {"called_by": {"katG": gene(json!(100), json!(20))}},
            "INH": {"called_by": {"katG": gene(json!(90), json!(10))}}
        }}));
        // INH < RIF, so RIF is visited last
        let genes = report_gene_facts(&r);
        assert_eq!(genes["katG"].as_ref().unwrap().cell(), "100_20");
    }

    #[test]
    fn test_prediction() {
        let r = report(json!({"susceptibility": {"INH": {"predict": "R"}, "RIF": {}}}));
        assert_eq!(prediction(&r, "INH").as_deref(), Some("R"));
        assert_eq!(prediction(&r, "RIF"), None);
        assert_eq!(prediction(&r, "EMB"), None);
    }

    #[test]
    fn test_sequence_fact_defaults_version() {
        let r = report(json!({"sequence_calls": {
            "mecA": [{"info": {"coverage": {"percent_coverage": 100.0, "median_depth": 52}, "copy_number": 1.8}}],
            "blaZ": [{"info": {"coverage": {"percent_coverage": 90, "median_depth": 20}, "copy_number": 1, "version": "3"}}]
        }}));
        let calls = sequence_calls(&r);
        assert_eq!(sequence_fact(calls["mecA"]).unwrap().cell(), "c100_d52_cn1_v0");
        assert_eq!(sequence_fact(calls["blaZ"]).unwrap().cell(), "c90_d20_cn1_v3");
    }

    #[test]
    fn test_phylogenetics_and_version() {
        let r = report(json!({
            "phylogenetics": {"species": {
                "Mycobacterium_tuberculosis": {"percent_coverage": 98.5, "median_depth": 61}
            }},
            "version": {"mykrobe-predictor": "v0.10.0"}
        }));
        let species = phylogenetics(&r, "species");
        assert_eq!(species.names, "Mycobacterium_tuberculosis");
        assert_eq!(species.percent_coverage, "98.5");
        assert_eq!(species.median_depth, "61");
        assert_eq!(phylogenetics(&r, "lineage"), PhyloSummary::default());
        assert_eq!(predictor_version(&r), "v0.10.0");
        assert_eq!(predictor_version(&SampleReport::empty("x.json")), "-1");
    }
}
