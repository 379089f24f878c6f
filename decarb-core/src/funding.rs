//! Funding eligibility and coverage allocation
//!
//! Global invariants enforced:
//! - Coverage never exceeds 100% of the investment, regardless of how
//!   far the raw sum of fund caps overshoots
//! - Funds are not checked against each other for category overlap; a
//!   deliberate simplification of the eligibility rule set

use crate::model::{CompanySize, FundingSource, Measure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Eligibility verdict for one funding source. Ineligible entries carry
/// the first failing check as a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FundingMatch {
    pub fund_id: String,
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Financial coverage of an investment by the chosen funds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Coverage {
    pub total_coverage: f64,
    /// Investment left after coverage, >= 0 by construction
    pub remaining: f64,
}

fn check_fund(
    fund: &FundingSource,
    categories: &BTreeSet<&str>,
    company_size: CompanySize,
    sector: &str,
) -> Result<(), String> {
    if !fund.currently_open {
        return Err("fund is currently closed".to_string());
    }
    if let Some(budget) = fund.remaining_budget {
        if budget <= 0.0 {
            return Err("fund budget is exhausted".to_string());
        }
    }
    if !categories.iter().any(|c| fund.eligibility.accepts_category(c)) {
        return Err("no selected measure falls in an accepted category".to_string());
    }
    if !fund.eligibility.accepts_size(company_size) {
        return Err(format!(
            "company size '{}' is not eligible",
            company_size.as_str()
        ));
    }
    if !fund.eligibility.accepts_sector(sector) {
        return Err(format!("sector '{}' is not eligible", sector));
    }
    Ok(())
}

/// Evaluate every funding source against the selected measures' categories
/// and the supplier's size and sector. One match per fund, catalog order.
///
/// With an empty measure selection no fund is category-eligible (there is
/// nothing to co-finance).
pub fn eligible_funding(
    selected_measures: &[&Measure],
    company_size: CompanySize,
    sector: &str,
    funds: &[FundingSource],
) -> Vec<FundingMatch> {
    let categories: BTreeSet<&str> = selected_measures
        .iter()
        .map(|m| m.category.as_str())
        .collect();

    funds
        .iter()
        .map(|fund| match check_fund(fund, &categories, company_size, sector) {
            Ok(()) => FundingMatch {
                fund_id: fund.id.clone(),
                eligible: true,
                reason: None,
            },
            Err(reason) => FundingMatch {
                fund_id: fund.id.clone(),
                eligible: false,
                reason: Some(reason),
            },
        })
        .collect()
}

/// What one fund contributes toward an investment: the percentage share
/// capped at max_amount, or the flat max_amount when no percentage is set.
pub fn fund_coverage(fund: &FundingSource, total_investment: f64) -> f64 {
    match fund.percentage {
        Some(p) => fund.max_amount.min(total_investment * p / 100.0),
        None => fund.max_amount,
    }
}

/// Sum the chosen funds' contributions and cap the total at 100% of the
/// investment. Coverage can never exceed the investment, even when the
/// raw sum of fund caps would.
pub fn compute_coverage(selected_funds: &[&FundingSource], total_investment: f64) -> Coverage {
    let raw: f64 = selected_funds
        .iter()
        .map(|f| fund_coverage(f, total_investment))
        .sum();
    let total_coverage = raw.min(total_investment);
    Coverage {
        total_coverage,
        remaining: total_investment - total_coverage,
    }
}
