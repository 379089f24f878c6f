//! Greedy measure selection toward the sector-average intensity target
//!
//! Global invariants enforced:
//! - Selected measures are always a subset of the candidate set
//! - Sort is stable: equal-priority measures keep their input order
//! - Single pass, no backtracking: the algorithm can overshoot investment
//!   for marginal emission gains; that trade-off is intentional and must
//!   not be "fixed" by adding search

use crate::intensity;
use crate::measures::{self, Recommendation};
use crate::model::{FundingSource, Measure, RegionFacts, Supplier};
use crate::plan::PlanState;
use serde::{Deserialize, Serialize};

/// Result of a selection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Selection {
    pub measure_ids: Vec<String>,
    /// t CO2e per year
    pub total_reduction: f64,
    /// Currency units
    pub total_investment: f64,
    pub new_intensity: f64,
    pub reached_target: bool,
}

/// Emission reduction per currency unit of investment, the selection
/// heuristic (not a financial return metric).
///
/// Investment is treated as 1 for the ratio only when it is 0, so a
/// zero-cost measure gets ROI == its emission reduction rather than a
/// division by zero. Totals always use the real investment.
pub fn roi(measure: &Measure) -> f64 {
    measure.emission_reduction / measure.investment.max(1.0)
}

/// Stable two-key ordering: soft strictly before interventional, then
/// descending ROI within equal intervention level.
fn sort_candidates(candidates: &mut [&Measure]) {
    candidates.sort_by(|a, b| {
        a.intervention_level
            .cmp(&b.intervention_level)
            .then_with(|| {
                roi(b)
                    .partial_cmp(&roi(a))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
}

/// Greedily pick measures until the supplier's intensity reaches the
/// sector average, or the recommended candidates are exhausted.
///
/// Candidates are first narrowed to those the recommendation predicate
/// accepts, then sorted (soft first, ROI descending) and walked once.
/// The measure that crosses the target is included; exhausting the list
/// without reaching the target is a valid terminal state, not an error.
pub fn select_measures(
    supplier: &Supplier,
    candidates: &[&Measure],
    sector_avg: f64,
    facts: &RegionFacts,
    funds: &[FundingSource],
) -> Selection {
    let current_intensity = supplier.emissions_per_revenue();

    // Already at or below target: nothing to select
    if current_intensity <= sector_avg {
        return Selection {
            measure_ids: Vec::new(),
            total_reduction: 0.0,
            total_investment: 0.0,
            new_intensity: current_intensity,
            reached_target: true,
        };
    }

    let mut recommended: Vec<&Measure> = candidates
        .iter()
        .copied()
        .filter(|m| {
            let Recommendation { recommended, .. } = measures::is_recommended(m, facts, funds);
            recommended
        })
        .collect();
    sort_candidates(&mut recommended);

    let mut measure_ids = Vec::new();
    let mut total_reduction = 0.0;
    let mut total_investment = 0.0;
    let mut new_intensity = current_intensity;
    let mut reached_target = false;

    for measure in recommended {
        measure_ids.push(measure.id.clone());
        total_reduction += measure.emission_reduction;
        total_investment += measure.investment;
        new_intensity = intensity::new_intensity_after_reduction(
            current_intensity,
            supplier.total_emissions,
            total_reduction,
        );
        if new_intensity <= sector_avg {
            reached_target = true;
            break;
        }
    }

    Selection {
        measure_ids,
        total_reduction,
        total_investment,
        new_intensity,
        reached_target,
    }
}

/// Manually add or remove one measure from a plan's selected set.
///
/// Manual changes clear the auto-applied flag but never re-run the
/// selection algorithm.
pub fn toggle_measure(state: &mut PlanState, measure_id: &str) {
    if let Some(pos) = state.selected_measures.iter().position(|id| id == measure_id) {
        state.selected_measures.remove(pos);
    } else {
        state.selected_measures.push(measure_id.to_string());
    }
    state.auto_applied = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Applicability, CompanySize, InterventionLevel, Scope};

    fn make_supplier(emissions: f64, revenue: f64) -> Supplier {
        Supplier {
            id: "s1".to_string(),
            name: "Supplier".to_string(),
            sector: "food".to_string(),
            subsector: None,
            company_size: CompanySize::Small,
            total_emissions: emissions,
            scope1: emissions,
            scope2: 0.0,
            scope3: 0.0,
            revenue,
        }
    }

    fn make_measure(
        id: &str,
        level: InterventionLevel,
        reduction: f64,
        investment: f64,
    ) -> Measure {
        Measure {
            id: id.to_string(),
            name: format!("Measure {}", id),
            scope: Scope::Two,
            category: "energy".to_string(),
            intervention_level: level,
            emission_reduction: reduction,
            investment,
            timeline: String::new(),
            applicability: Applicability::default(),
            prerequisite: None,
        }
    }

    fn select(supplier: &Supplier, measures: &[Measure], sector_avg: f64) -> Selection {
        let candidates: Vec<&Measure> = measures.iter().collect();
        // One open fund with no constraints keeps every category recommended
        let funds = vec![crate::model::FundingSource {
            id: "f1".to_string(),
            name: "Fund".to_string(),
            funding_type: crate::model::FundingType::Subsidy,
            max_amount: 1_000_000.0,
            percentage: None,
            interest_rate: None,
            remaining_budget: None,
            currently_open: true,
            deadline: "continuous".to_string(),
            eligibility: Default::default(),
            requirements: vec![],
        }];
        select_measures(supplier, &candidates, sector_avg, &RegionFacts::default(), &funds)
    }

    #[test]
    fn test_already_at_target_selects_nothing() {
        // intensity 10 vs avg 10
        let supplier = make_supplier(10_000.0, 1_000_000.0);
        let measures = vec![make_measure("m1", InterventionLevel::Soft, 100.0, 1000.0)];

        let selection = select(&supplier, &measures, 10.0);
        assert!(selection.measure_ids.is_empty());
        assert!(selection.reached_target);
        assert_eq!(selection.new_intensity, 10.0);
    }

    #[test]
    fn test_soft_measure_picked_before_interventional() {
        // intensity 11 vs avg 10: needs ~9.1% reduction of 11_000 t, ~1000 t.
        // The soft measure alone reaches the target even though the
        // interventional one has far higher ROI.
        let supplier = make_supplier(11_000.0, 1_000_000.0);
        let measures = vec![
            make_measure("hard", InterventionLevel::Interventional, 5000.0, 2000.0),
            make_measure("soft", InterventionLevel::Soft, 1100.0, 1000.0),
        ];

        let selection = select(&supplier, &measures, 10.0);
        assert_eq!(selection.measure_ids, vec!["soft".to_string()]);
        assert!(selection.reached_target);
        assert_eq!(selection.total_investment, 1000.0);
    }

    #[test]
    fn test_crossing_measure_included_and_walk_stops() {
        // intensity 20 vs avg 10: needs 50% reduction of 20_000 t
        let supplier = make_supplier(20_000.0, 1_000_000.0);
        let measures = vec![
            make_measure("m1", InterventionLevel::Soft, 6000.0, 100.0),
            make_measure("m2", InterventionLevel::Soft, 6000.0, 200.0),
            make_measure("m3", InterventionLevel::Soft, 6000.0, 300.0),
        ];

        let selection = select(&supplier, &measures, 10.0);
        assert_eq!(selection.measure_ids.len(), 2); // 12_000 t crosses 10_000 t
        assert!(selection.reached_target);
        assert_eq!(selection.total_reduction, 12_000.0);
    }

    #[test]
    fn test_exhausted_list_is_valid_terminal_state() {
        let supplier = make_supplier(20_000.0, 1_000_000.0);
        let measures = vec![make_measure("m1", InterventionLevel::Soft, 100.0, 100.0)];

        let selection = select(&supplier, &measures, 10.0);
        assert_eq!(selection.measure_ids, vec!["m1".to_string()]);
        assert!(!selection.reached_target);
        assert!(selection.new_intensity > 10.0);
    }

    #[test]
    fn test_subset_invariant() {
        let supplier = make_supplier(50_000.0, 1_000_000.0);
        let measures = vec![
            make_measure("m1", InterventionLevel::Soft, 1000.0, 100.0),
            make_measure("m2", InterventionLevel::Interventional, 2000.0, 5000.0),
        ];
        let candidate_ids: Vec<&str> = measures.iter().map(|m| m.id.as_str()).collect();

        let selection = select(&supplier, &measures, 10.0);
        for id in &selection.measure_ids {
            assert!(candidate_ids.contains(&id.as_str()));
        }
    }

    #[test]
    fn test_sort_stability_on_equal_keys() {
        // Same level, same ROI: input order must survive
        let mut candidates_owned = vec![
            make_measure("first", InterventionLevel::Soft, 10.0, 1000.0),
            make_measure("second", InterventionLevel::Soft, 10.0, 1000.0),
        ];
        candidates_owned[1].name = "Second".to_string();
        let mut candidates: Vec<&Measure> = candidates_owned.iter().collect();
        sort_candidates(&mut candidates);
        assert_eq!(candidates[0].id, "first");
        assert_eq!(candidates[1].id, "second");
    }

    #[test]
    fn test_zero_investment_roi_uses_reduction() {
        let free = make_measure("free", InterventionLevel::Soft, 42.0, 0.0);
        assert_eq!(roi(&free), 42.0);
    }

    #[test]
    fn test_monotonicity_adding_a_measure_never_raises_intensity() {
        let supplier = make_supplier(20_000.0, 1_000_000.0);
        let measures = vec![
            make_measure("m1", InterventionLevel::Soft, 1000.0, 100.0),
            make_measure("m2", InterventionLevel::Soft, 500.0, 100.0),
        ];

        let selection = select(&supplier, &measures, 0.5);
        let with_extra = intensity::new_intensity_after_reduction(
            supplier.emissions_per_revenue(),
            supplier.total_emissions,
            selection.total_reduction + 300.0,
        );
        assert!(with_extra <= selection.new_intensity);
    }

    #[test]
    fn test_toggle_measure_flips_membership_and_clears_auto_flag() {
        let mut state = PlanState {
            selected_measures: vec!["m1".to_string()],
            auto_applied: true,
            ..Default::default()
        };

        toggle_measure(&mut state, "m2");
        assert_eq!(state.selected_measures, vec!["m1", "m2"]);
        assert!(!state.auto_applied);

        toggle_measure(&mut state, "m1");
        assert_eq!(state.selected_measures, vec!["m2"]);
    }
}
