//! Bulk planning across a filtered supplier set
//!
//! Global invariants enforced:
//! - Exactly one selection criterion is active per run
//! - Suppliers are planned independently: no cross-entity optimization,
//!   funding pools treated as unlimited per supplier
//! - Per-entity work is a rayon parallel map; aggregation happens after
//!   all results return, and output order is deterministic (supplier id)

use crate::catalog::Catalog;
use crate::model::{Measure, RegionFacts, Supplier};
use crate::plan::{ActionPlan, PlanStatus};
use crate::report::{AlternativeRef, RecommendationReport};
use crate::{funding, measures, risk, selector, substitution};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Average carbon intensity per sector, built once from a portfolio or
/// loaded as configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectorAverages(pub HashMap<String, f64>);

impl SectorAverages {
    /// Mean intensity of each sector's suppliers
    pub fn from_portfolio(suppliers: &[Supplier]) -> Self {
        let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
        for supplier in suppliers {
            let entry = sums.entry(supplier.sector.clone()).or_insert((0.0, 0));
            entry.0 += supplier.emissions_per_revenue();
            entry.1 += 1;
        }
        SectorAverages(
            sums.into_iter()
                .map(|(sector, (sum, count))| (sector, sum / count as f64))
                .collect(),
        )
    }

    /// Average for a sector; 0.0 (the "no data" sentinel) when unknown
    pub fn get(&self, sector: &str) -> f64 {
        self.0.get(sector).copied().unwrap_or(0.0)
    }
}

/// Which suppliers a bulk run operates on. Exactly one criterion is
/// active; the variants are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SelectionCriterion {
    /// Suppliers without a stored plan
    NoPlanYet { planned_ids: HashSet<String> },
    /// Suppliers whose intensity exceeds their sector average
    AboveSectorAverage,
    /// Suppliers classified High or Critical
    HighRisk,
    /// Custom filter on emissions magnitude and sectors (empty = any)
    Custom {
        min_emissions: Option<f64>,
        sectors: Vec<String>,
    },
    /// Manually picked supplier ids
    Manual { ids: HashSet<String> },
}

/// Evaluate the active criterion over a supplier set. Single dispatcher,
/// one arm per variant; input order is preserved.
pub fn filter_suppliers<'a>(
    criterion: &SelectionCriterion,
    suppliers: &'a [Supplier],
    averages: &SectorAverages,
) -> Vec<&'a Supplier> {
    suppliers
        .iter()
        .filter(|s| match criterion {
            SelectionCriterion::NoPlanYet { planned_ids } => !planned_ids.contains(&s.id),
            SelectionCriterion::AboveSectorAverage => {
                let avg = averages.get(&s.sector);
                avg > 0.0 && s.emissions_per_revenue() > avg
            }
            SelectionCriterion::HighRisk => {
                risk::classify(s.emissions_per_revenue(), averages.get(&s.sector))
                    .tier
                    .is_high_plus()
            }
            SelectionCriterion::Custom {
                min_emissions,
                sectors,
            } => {
                min_emissions.map_or(true, |min| s.total_emissions >= min)
                    && (sectors.is_empty() || sectors.contains(&s.sector))
            }
            SelectionCriterion::Manual { ids } => ids.contains(&s.id),
        })
        .collect()
}

/// Shared read-only inputs for a bulk run
#[derive(Debug, Clone, Copy)]
pub struct BulkContext<'a> {
    pub catalog: &'a Catalog,
    pub averages: &'a SectorAverages,
    pub facts: &'a RegionFacts,
    /// Full portfolio, used for substitution matching
    pub all_suppliers: &'a [Supplier],
}

/// Aggregate statistics over one bulk run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BulkSummary {
    pub suppliers_planned: usize,
    pub reached_target: usize,
    pub missed_target: usize,
    pub total_investment: f64,
    pub total_reduction: f64,
    pub total_coverage: f64,
}

/// Result of a bulk run: one report per planned supplier plus aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRunReport {
    pub reports: Vec<RecommendationReport>,
    pub summary: BulkSummary,
}

/// Which planned suppliers get committed into action plans
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStrategy {
    All,
    ReachedTargetOnly,
    /// Manually reviewed subset
    Subset(HashSet<String>),
}

/// Plan one supplier: classify, select measures, match funding, and (for
/// critical suppliers) look up a substitution candidate. Pure function of
/// its inputs; safe to fan out across threads.
pub fn plan_for(supplier: &Supplier, ctx: &BulkContext) -> RecommendationReport {
    let sector_avg = ctx.averages.get(&supplier.sector);
    let assessment = risk::assess(supplier, sector_avg);

    let candidates = measures::applicable_measures(supplier, &ctx.catalog.measures);
    let selection = selector::select_measures(
        supplier,
        &candidates,
        sector_avg,
        ctx.facts,
        &ctx.catalog.funding_sources,
    );

    let selected: Vec<&Measure> = selection
        .measure_ids
        .iter()
        .filter_map(|id| ctx.catalog.measure(id))
        .collect();
    let funding_matches = funding::eligible_funding(
        &selected,
        supplier.company_size,
        &supplier.sector,
        &ctx.catalog.funding_sources,
    );
    let chosen_funds: Vec<_> = funding_matches
        .iter()
        .filter(|m| m.eligible)
        .filter_map(|m| ctx.catalog.fund(&m.fund_id))
        .collect();
    let coverage = funding::compute_coverage(&chosen_funds, selection.total_investment);

    let alternative = if assessment.tier == risk::RiskTier::Critical {
        substitution::find_best_alternative(supplier, ctx.all_suppliers).map(|s| AlternativeRef {
            id: s.id.clone(),
            name: s.name.clone(),
        })
    } else {
        None
    };

    RecommendationReport {
        supplier_id: supplier.id.clone(),
        supplier_name: supplier.name.clone(),
        assessment,
        selection,
        funding: funding_matches,
        coverage,
        alternative,
    }
}

/// Run the full pipeline over the filtered supplier set.
///
/// Map-then-reduce: the per-supplier map runs in parallel, the summary is
/// folded sequentially afterwards. Reports are sorted by supplier id so a
/// run is byte-for-byte reproducible.
pub fn run_bulk(criterion: &SelectionCriterion, ctx: &BulkContext) -> BulkRunReport {
    let filtered = filter_suppliers(criterion, ctx.all_suppliers, ctx.averages);

    let mut reports: Vec<RecommendationReport> =
        filtered.par_iter().map(|s| plan_for(s, ctx)).collect();
    reports.sort_by(|a, b| a.supplier_id.cmp(&b.supplier_id));

    let mut summary = BulkSummary {
        suppliers_planned: reports.len(),
        ..Default::default()
    };
    for report in &reports {
        if report.selection.reached_target {
            summary.reached_target += 1;
        } else {
            summary.missed_target += 1;
        }
        summary.total_investment += report.selection.total_investment;
        summary.total_reduction += report.selection.total_reduction;
        summary.total_coverage += report.coverage.total_coverage;
    }

    BulkRunReport { reports, summary }
}

/// Materialize action plans for the committed subset of a bulk run.
/// Committed plans start in preparation; persisting them is the caller's
/// job via the plan store.
pub fn commit_plans(report: &BulkRunReport, strategy: &CommitStrategy) -> Vec<ActionPlan> {
    report
        .reports
        .iter()
        .filter(|r| match strategy {
            CommitStrategy::All => true,
            CommitStrategy::ReachedTargetOnly => r.selection.reached_target,
            CommitStrategy::Subset(ids) => ids.contains(&r.supplier_id),
        })
        .map(|r| ActionPlan {
            supplier_id: r.supplier_id.clone(),
            selected_measure_ids: r.selection.measure_ids.clone(),
            selected_funding_ids: r
                .funding
                .iter()
                .filter(|m| m.eligible)
                .map(|m| m.fund_id.clone())
                .collect(),
            total_reduction: r.selection.total_reduction,
            total_investment: r.selection.total_investment,
            new_intensity: r.selection.new_intensity,
            reached_target: r.selection.reached_target,
            status: PlanStatus::InPreparation,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Applicability, CompanySize, FundingEligibility, FundingSource, FundingType,
        InterventionLevel, Scope,
    };

    fn make_supplier(id: &str, sector: &str, emissions: f64, revenue: f64) -> Supplier {
        Supplier {
            id: id.to_string(),
            name: format!("Supplier {}", id),
            sector: sector.to_string(),
            subsector: None,
            company_size: CompanySize::Small,
            total_emissions: emissions,
            scope1: emissions,
            scope2: 0.0,
            scope3: 0.0,
            revenue,
        }
    }

    fn make_catalog() -> Catalog {
        Catalog {
            measures: vec![Measure {
                id: "m1".to_string(),
                name: "LED retrofit".to_string(),
                scope: Scope::Two,
                category: "energy".to_string(),
                intervention_level: InterventionLevel::Soft,
                emission_reduction: 5000.0,
                investment: 10_000.0,
                timeline: String::new(),
                applicability: Applicability::default(),
                prerequisite: None,
            }],
            funding_sources: vec![FundingSource {
                id: "f1".to_string(),
                name: "Energy subsidy".to_string(),
                funding_type: FundingType::Subsidy,
                max_amount: 4000.0,
                percentage: None,
                interest_rate: None,
                remaining_budget: None,
                currently_open: true,
                deadline: "continuous".to_string(),
                eligibility: FundingEligibility::default(),
                requirements: vec![],
            }],
        }
    }

    // Sector average fixed at 10.0 regardless of portfolio
    fn fixed_averages() -> SectorAverages {
        SectorAverages(HashMap::from([("food".to_string(), 10.0)]))
    }

    #[test]
    fn test_sector_averages_from_portfolio() {
        let suppliers = vec![
            make_supplier("a", "food", 10_000.0, 1_000_000.0), // intensity 10
            make_supplier("b", "food", 20_000.0, 1_000_000.0), // intensity 20
            make_supplier("c", "textile", 5_000.0, 1_000_000.0), // intensity 5
        ];
        let averages = SectorAverages::from_portfolio(&suppliers);
        assert_eq!(averages.get("food"), 15.0);
        assert_eq!(averages.get("textile"), 5.0);
        assert_eq!(averages.get("unknown"), 0.0);
    }

    #[test]
    fn test_filter_criteria_are_exclusive_dispatches() {
        let suppliers = vec![
            make_supplier("low", "food", 5_000.0, 1_000_000.0), // intensity 5
            make_supplier("high", "food", 16_000.0, 1_000_000.0), // intensity 16, +60%
            make_supplier("crit", "food", 25_000.0, 1_000_000.0), // intensity 25, +150%
        ];
        let averages = fixed_averages();

        let above =
            filter_suppliers(&SelectionCriterion::AboveSectorAverage, &suppliers, &averages);
        assert_eq!(above.len(), 2);

        let high_risk = filter_suppliers(&SelectionCriterion::HighRisk, &suppliers, &averages);
        let ids: Vec<&str> = high_risk.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "crit"]);

        let no_plan = filter_suppliers(
            &SelectionCriterion::NoPlanYet {
                planned_ids: HashSet::from(["low".to_string()]),
            },
            &suppliers,
            &averages,
        );
        assert_eq!(no_plan.len(), 2);

        let manual = filter_suppliers(
            &SelectionCriterion::Manual {
                ids: HashSet::from(["crit".to_string()]),
            },
            &suppliers,
            &averages,
        );
        assert_eq!(manual.len(), 1);

        let custom = filter_suppliers(
            &SelectionCriterion::Custom {
                min_emissions: Some(20_000.0),
                sectors: vec!["food".to_string()],
            },
            &suppliers,
            &averages,
        );
        assert_eq!(custom.len(), 1);
    }

    #[test]
    fn test_run_bulk_aggregates_and_orders_deterministically() {
        let suppliers = vec![
            make_supplier("b", "food", 16_000.0, 1_000_000.0),
            make_supplier("a", "food", 25_000.0, 1_000_000.0),
        ];
        let catalog = make_catalog();
        let averages = fixed_averages();
        let facts = RegionFacts::default();
        let ctx = BulkContext {
            catalog: &catalog,
            averages: &averages,
            facts: &facts,
            all_suppliers: &suppliers,
        };

        let run = run_bulk(&SelectionCriterion::HighRisk, &ctx);
        assert_eq!(run.summary.suppliers_planned, 2);
        assert_eq!(
            run.summary.reached_target + run.summary.missed_target,
            run.summary.suppliers_planned
        );
        let ids: Vec<&str> = run.reports.iter().map(|r| r.supplier_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        // "b" at intensity 16 needs 37.5% off 16000 t = 6000 t; the single
        // 5000 t measure misses the target
        let b = &run.reports[1];
        assert!(!b.selection.reached_target);
        assert_eq!(b.selection.total_investment, 10_000.0);
        assert_eq!(b.coverage.total_coverage, 4000.0);
    }

    #[test]
    fn test_critical_supplier_gets_substitution_candidate() {
        let suppliers = vec![
            make_supplier("crit", "food", 25_000.0, 1_000_000.0),
            make_supplier("peer", "food", 4_000.0, 1_000_000.0),
        ];
        let catalog = make_catalog();
        let averages = fixed_averages();
        let facts = RegionFacts::default();
        let ctx = BulkContext {
            catalog: &catalog,
            averages: &averages,
            facts: &facts,
            all_suppliers: &suppliers,
        };

        let report = plan_for(&suppliers[0], &ctx);
        assert_eq!(report.assessment.tier, risk::RiskTier::Critical);
        assert_eq!(report.alternative.as_ref().unwrap().id, "peer");

        // Below-critical suppliers never get one
        let report = plan_for(&suppliers[1], &ctx);
        assert!(report.alternative.is_none());
    }

    #[test]
    fn test_commit_strategies() {
        let suppliers = vec![
            make_supplier("miss", "food", 16_000.0, 1_000_000.0),
            make_supplier("hit", "food", 11_000.0, 1_000_000.0),
        ];
        let catalog = make_catalog();
        let averages = fixed_averages();
        let facts = RegionFacts::default();
        let ctx = BulkContext {
            catalog: &catalog,
            averages: &averages,
            facts: &facts,
            all_suppliers: &suppliers,
        };
        let run = run_bulk(
            &SelectionCriterion::Manual {
                ids: HashSet::from(["miss".to_string(), "hit".to_string()]),
            },
            &ctx,
        );

        let all = commit_plans(&run, &CommitStrategy::All);
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|p| p.status == PlanStatus::InPreparation));

        let reached = commit_plans(&run, &CommitStrategy::ReachedTargetOnly);
        assert_eq!(reached.len(), 1);
        assert_eq!(reached[0].supplier_id, "hit");

        let subset = commit_plans(
            &run,
            &CommitStrategy::Subset(HashSet::from(["miss".to_string()])),
        );
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].supplier_id, "miss");
    }
}
