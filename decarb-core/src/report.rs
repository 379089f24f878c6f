//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs

use crate::bulk::BulkRunReport;
use crate::funding::{Coverage, FundingMatch};
use crate::risk::RiskAssessment;
use crate::selector::Selection;
use serde::{Deserialize, Serialize};

/// Substitution candidate reference for a critical supplier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AlternativeRef {
    pub id: String,
    pub name: String,
}

/// Complete recommendation for one supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecommendationReport {
    pub supplier_id: String,
    pub supplier_name: String,
    pub assessment: RiskAssessment,
    pub selection: Selection,
    pub funding: Vec<FundingMatch>,
    pub coverage: Coverage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative: Option<AlternativeRef>,
}

/// Sort reports deterministically
pub fn sort_reports(mut reports: Vec<RecommendationReport>) -> Vec<RecommendationReport> {
    reports.sort_by(|a, b| {
        // 1. Percent above sector average, descending
        b.assessment
            .percent_above
            .partial_cmp(&a.assessment.percent_above)
            .unwrap_or(std::cmp::Ordering::Equal)
            // 2. Supplier id ascending
            .then_with(|| a.supplier_id.cmp(&b.supplier_id))
    });
    reports
}

/// Render recommendation reports as a text table
pub fn render_text(reports: &[RecommendationReport]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<12} {:<24} {:<10} {:<8} {:<9} {:<8} {:<12} {:<12} {}\n",
        "SUPPLIER", "NAME", "TIER", "ABOVE%", "MEASURES", "TARGET", "INVESTMENT", "COVERED", "ALTERNATIVE"
    ));

    for report in reports {
        let above = if report.assessment.multiplier.is_none() {
            "n/a".to_string()
        } else {
            format!("{:.0}", report.assessment.percent_above)
        };
        output.push_str(&format!(
            "{:<12} {:<24} {:<10} {:<8} {:<9} {:<8} {:<12.0} {:<12.0} {}\n",
            truncate_or_pad(&report.supplier_id, 12),
            truncate_or_pad(&report.supplier_name, 24),
            report.assessment.tier.as_str(),
            above,
            report.selection.measure_ids.len(),
            if report.selection.reached_target { "yes" } else { "no" },
            report.selection.total_investment,
            report.coverage.total_coverage,
            report
                .alternative
                .as_ref()
                .map(|a| a.id.as_str())
                .unwrap_or("-"),
        ));
    }

    output
}

/// Render recommendation reports as JSON output
pub fn render_json(reports: &[RecommendationReport]) -> String {
    serde_json::to_string_pretty(reports).unwrap_or_else(|_| "[]".to_string())
}

/// Render a bulk run summary as text
pub fn render_bulk_summary(run: &BulkRunReport) -> String {
    let s = &run.summary;
    let mut output = String::new();
    output.push_str(&format!("Suppliers planned:  {}\n", s.suppliers_planned));
    output.push_str(&format!("Reached target:     {}\n", s.reached_target));
    output.push_str(&format!("Missed target:      {}\n", s.missed_target));
    output.push_str(&format!("Total reduction:    {:.1} t CO2e/yr\n", s.total_reduction));
    output.push_str(&format!("Total investment:   {:.2}\n", s.total_investment));
    output.push_str(&format!("Total coverage:     {:.2}\n", s.total_coverage));
    output
}

/// Truncate or pad string to fixed width. Counts and cuts by chars, not
/// bytes: supplier names are user data and may hold multi-byte UTF-8.
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}
