//! Decarb core library - decarbonization recommendation engine

#![deny(warnings)]

// Global invariants enforced in this crate:
// - The engine is pure computation over its inputs
// - No global mutable state, no I/O outside catalog/portfolio loading
// - Numeric guards return safe defaults, never panic
// - Deterministic ordering must be explicit
// - Identical input yields byte-for-byte identical output

pub mod bulk;
pub mod catalog;
pub mod funding;
pub mod intensity;
pub mod measures;
pub mod model;
pub mod plan;
pub mod report;
pub mod risk;
pub mod selector;
pub mod substitution;

pub use bulk::{BulkContext, BulkRunReport, CommitStrategy, SectorAverages, SelectionCriterion};
pub use catalog::Catalog;
pub use model::{FundingSource, Measure, RegionFacts, Supplier};
pub use plan::{ActionPlan, MemoryStore, PlanState, PlanStore};
pub use report::{render_json, render_text, sort_reports, RecommendationReport};
pub use risk::{RiskAssessment, RiskTier};

/// Assess every supplier in a portfolio against its sector average
pub fn assess_portfolio(
    suppliers: &[Supplier],
    averages: &SectorAverages,
) -> Vec<RiskAssessment> {
    suppliers
        .iter()
        .map(|s| risk::assess(s, averages.get(&s.sector)))
        .collect()
}

/// Full recommendation for a single supplier: classification, greedy
/// measure selection, funding matching, and (when critical) a
/// substitution candidate.
pub fn recommend(supplier: &Supplier, ctx: &BulkContext) -> RecommendationReport {
    bulk::plan_for(supplier, ctx)
}
