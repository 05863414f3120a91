//! JSON output of analysis results.

use crate::error::InconsistentInventory;
use crate::processing::{ClassifiedAddress, FragmentationReport, SubnetAnalysis, SubnetOutcome};
use serde::Serialize;
use std::error::Error;

/// `{ips, summary}` view of one analysis, warnings when present.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJson<'a> {
    pub subnet_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ips: Option<&'a [ClassifiedAddress]>,
    pub summary: &'a FragmentationReport,
    #[serde(skip_serializing_if = "no_warnings")]
    pub warnings: &'a [InconsistentInventory],
}

impl<'a> AnalysisJson<'a> {
    pub fn new(analysis: &'a SubnetAnalysis, with_ips: bool) -> AnalysisJson<'a> {
        AnalysisJson {
            subnet_id: &analysis.subnet_id,
            ips: with_ips.then_some(analysis.ips.as_slice()),
            summary: &analysis.summary,
            warnings: &analysis.warnings,
        }
    }
}

fn no_warnings(warnings: &&[InconsistentInventory]) -> bool {
    warnings.is_empty()
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum OutcomeJson<'a> {
    Analysed(AnalysisJson<'a>),
    #[serde(rename_all = "camelCase")]
    Failed {
        subnet_id: &'a str,
        cidr: &'a str,
        error: String,
    },
}

/// Pretty JSON array with one entry per subnet outcome.
pub fn outcomes_json(outcomes: &[SubnetOutcome], with_ips: bool) -> Result<String, Box<dyn Error>> {
    let entries: Vec<OutcomeJson> = outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(analysis) => OutcomeJson::Analysed(AnalysisJson::new(analysis, with_ips)),
            Err(e) => OutcomeJson::Failed {
                subnet_id: &outcome.subnet_id,
                cidr: &outcome.cidr,
                error: e.to_string(),
            },
        })
        .collect();
    serde_json::to_string_pretty(&entries).map_err(|e| format!("Error serializing JSON: {e}").into())
}
