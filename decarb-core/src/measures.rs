//! Measure catalog filtering and the recommendation predicate
//!
//! Global invariants enforced:
//! - Applicability filtering preserves catalog order and never duplicates
//! - The recommendation predicate is a side filter, not an eligibility
//!   gate: non-recommended measures remain selectable

use crate::model::{FundingSource, Measure, RegionFacts, Supplier};
use serde::{Deserialize, Serialize};

/// Category whose measures depend on regional charging infrastructure
const MOBILITY_CATEGORY: &str = "mobility";

/// Outcome of the recommendation predicate. `reason` is human-readable
/// prose surfaced to the user, never parsed downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Recommendation {
    fn yes() -> Self {
        Recommendation {
            recommended: true,
            reason: None,
        }
    }

    fn no(reason: String) -> Self {
        Recommendation {
            recommended: false,
            reason: Some(reason),
        }
    }
}

/// Every catalog measure whose applicability predicate matches the
/// supplier's sector, company size, and emissions magnitude.
///
/// Catalog order is preserved; it is not significant (the selector
/// re-sorts), but it keeps output deterministic.
pub fn applicable_measures<'a>(supplier: &Supplier, catalog: &'a [Measure]) -> Vec<&'a Measure> {
    catalog
        .iter()
        .filter(|m| m.applicability.matches(supplier))
        .collect()
}

/// True if at least one open fund with budget left accepts this category
fn category_has_open_funding(category: &str, funds: &[FundingSource]) -> bool {
    funds
        .iter()
        .any(|f| f.has_budget() && f.eligibility.accepts_category(category))
}

/// Evaluate the secondary "recommended" predicate for a measure.
///
/// A measure is recommended unless a structural prerequisite is unmet
/// (mobility measures need charging infrastructure; a measure may name an
/// arbitrary regional prerequisite fact) or its category has no open
/// funding left. Non-recommended measures are deprioritized, not excluded.
pub fn is_recommended(
    measure: &Measure,
    facts: &RegionFacts,
    funds: &[FundingSource],
) -> Recommendation {
    if measure.category == MOBILITY_CATEGORY && !facts.has_charging_infrastructure {
        return Recommendation::no(format!(
            "{} requires charging infrastructure the region does not have",
            measure.name
        ));
    }

    if let Some(prerequisite) = &measure.prerequisite {
        // An unknown fact counts as unmet
        let met = facts.prerequisites.get(prerequisite).copied().unwrap_or(false);
        if !met {
            return Recommendation::no(format!(
                "{} depends on regional prerequisite '{}' which is not met",
                measure.name, prerequisite
            ));
        }
    }

    if !category_has_open_funding(&measure.category, funds) {
        return Recommendation::no(format!(
            "no open funding source currently accepts '{}' measures",
            measure.category
        ));
    }

    Recommendation::yes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Applicability, CompanySize, FundingEligibility, FundingType, InterventionLevel, Scope,
    };

    fn make_supplier(sector: &str, size: CompanySize, emissions: f64) -> Supplier {
        Supplier {
            id: "s1".to_string(),
            name: "Supplier".to_string(),
            sector: sector.to_string(),
            subsector: None,
            company_size: size,
            total_emissions: emissions,
            scope1: emissions,
            scope2: 0.0,
            scope3: 0.0,
            revenue: 1_000_000.0,
        }
    }

    fn make_measure(id: &str, category: &str, applicability: Applicability) -> Measure {
        Measure {
            id: id.to_string(),
            name: format!("Measure {}", id),
            scope: Scope::Two,
            category: category.to_string(),
            intervention_level: InterventionLevel::Soft,
            emission_reduction: 10.0,
            investment: 1000.0,
            timeline: String::new(),
            applicability,
            prerequisite: None,
        }
    }

    fn open_fund(categories: Vec<String>) -> FundingSource {
        FundingSource {
            id: "f1".to_string(),
            name: "Fund".to_string(),
            funding_type: FundingType::Subsidy,
            max_amount: 10_000.0,
            percentage: None,
            interest_rate: None,
            remaining_budget: None,
            currently_open: true,
            deadline: "continuous".to_string(),
            eligibility: FundingEligibility {
                categories,
                ..Default::default()
            },
            requirements: vec![],
        }
    }

    #[test]
    fn test_applicable_measures_filters_and_keeps_order() {
        let supplier = make_supplier("food", CompanySize::Small, 500.0);
        let catalog = vec![
            make_measure(
                "m1",
                "energy",
                Applicability {
                    sectors: vec!["food".to_string()],
                    ..Default::default()
                },
            ),
            make_measure(
                "m2",
                "energy",
                Applicability {
                    sectors: vec!["textile".to_string()],
                    ..Default::default()
                },
            ),
            make_measure("m3", "waste", Applicability::default()),
        ];

        let applicable = applicable_measures(&supplier, &catalog);
        let ids: Vec<&str> = applicable.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);
    }

    #[test]
    fn test_mobility_needs_charging_infrastructure() {
        let measure = make_measure("m1", "mobility", Applicability::default());
        let funds = vec![open_fund(vec![])];

        let no_infra = RegionFacts {
            has_charging_infrastructure: false,
            ..Default::default()
        };
        let rec = is_recommended(&measure, &no_infra, &funds);
        assert!(!rec.recommended);
        assert!(rec.reason.unwrap().contains("charging infrastructure"));

        let rec = is_recommended(&measure, &RegionFacts::default(), &funds);
        assert!(rec.recommended);
        assert_eq!(rec.reason, None);
    }

    #[test]
    fn test_category_without_open_funding_not_recommended() {
        let measure = make_measure("m1", "water", Applicability::default());

        // Fund exists but only for energy measures
        let funds = vec![open_fund(vec!["energy".to_string()])];
        let rec = is_recommended(&measure, &RegionFacts::default(), &funds);
        assert!(!rec.recommended);

        // Closed fund does not count
        let mut closed = open_fund(vec![]);
        closed.currently_open = false;
        let rec = is_recommended(&measure, &RegionFacts::default(), &[closed]);
        assert!(!rec.recommended);
    }

    #[test]
    fn test_unknown_prerequisite_counts_as_unmet() {
        let mut measure = make_measure("m1", "energy", Applicability::default());
        measure.prerequisite = Some("district_heating_grid".to_string());
        let funds = vec![open_fund(vec![])];

        let rec = is_recommended(&measure, &RegionFacts::default(), &funds);
        assert!(!rec.recommended);

        let mut facts = RegionFacts::default();
        facts
            .prerequisites
            .insert("district_heating_grid".to_string(), true);
        assert!(is_recommended(&measure, &facts, &funds).recommended);
    }
}
