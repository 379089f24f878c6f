//! Input data model: suppliers, measures, and funding sources
//!
//! Global invariants enforced:
//! - All records are plain serde data, snake_case on the wire
//! - Catalog records are read-only once loaded (what-if scenarios clone)
//! - `total_emissions == scope1 + scope2 + scope3` is an upstream
//!   precondition, assumed here and not re-validated

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Company size classes used by applicability and eligibility predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Micro,
    Small,
    Medium,
    Large,
}

impl CompanySize {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanySize::Micro => "micro",
            CompanySize::Small => "small",
            CompanySize::Medium => "medium",
            CompanySize::Large => "large",
        }
    }
}

/// GHG Protocol emission scope of a measure.
///
/// Serialized as the bare number 1|2|3; string forms ("1") are also
/// accepted on input for catalogs produced by older tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScopeRepr", into = "u8")]
pub enum Scope {
    One,
    Two,
    Three,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScopeRepr {
    Number(u8),
    Text(String),
}

impl TryFrom<ScopeRepr> for Scope {
    type Error = String;

    fn try_from(repr: ScopeRepr) -> Result<Self, Self::Error> {
        let n: u8 = match repr {
            ScopeRepr::Number(n) => n,
            ScopeRepr::Text(t) => t
                .parse()
                .map_err(|_| format!("invalid scope: '{}' (expected 1, 2, or 3)", t))?,
        };
        match n {
            1 => Ok(Scope::One),
            2 => Ok(Scope::Two),
            3 => Ok(Scope::Three),
            other => Err(format!("invalid scope: {} (expected 1, 2, or 3)", other)),
        }
    }
}

impl From<Scope> for u8 {
    fn from(scope: Scope) -> u8 {
        match scope {
            Scope::One => 1,
            Scope::Two => 2,
            Scope::Three => 3,
        }
    }
}

/// Intervention level of a measure.
///
/// `Soft` (behavioral/process changes) sorts strictly before
/// `Interventional` (capital-intensive changes) in measure selection;
/// the derived `Ord` encodes that priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionLevel {
    Soft,
    Interventional,
}

impl InterventionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterventionLevel::Soft => "soft",
            InterventionLevel::Interventional => "interventional",
        }
    }
}

/// A supplier (the entity being assessed and planned for)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub sector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsector: Option<String>,
    pub company_size: CompanySize,
    /// t CO2e per year
    pub total_emissions: f64,
    pub scope1: f64,
    pub scope2: f64,
    pub scope3: f64,
    /// Currency units per year
    pub revenue: f64,
}

impl Supplier {
    /// Carbon intensity in kg CO2e per currency unit (0.0 when revenue is 0)
    pub fn emissions_per_revenue(&self) -> f64 {
        crate::intensity::intensity(self.total_emissions, self.revenue)
    }
}

/// Applicability predicate attached to a measure.
///
/// Empty lists and unset bounds mean "any".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Applicability {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub company_sizes: Vec<CompanySize>,
    /// Lower bound on total_emissions (t CO2e/yr), inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_emissions: Option<f64>,
    /// Upper bound on total_emissions (t CO2e/yr), inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_emissions: Option<f64>,
}

impl Applicability {
    /// Check whether a supplier satisfies this predicate
    pub fn matches(&self, supplier: &Supplier) -> bool {
        if !self.sectors.is_empty() && !self.sectors.contains(&supplier.sector) {
            return false;
        }
        if !self.company_sizes.is_empty() && !self.company_sizes.contains(&supplier.company_size) {
            return false;
        }
        if let Some(min) = self.min_emissions {
            if supplier.total_emissions < min {
                return false;
            }
        }
        if let Some(max) = self.max_emissions {
            if supplier.total_emissions > max {
                return false;
            }
        }
        true
    }
}

/// A decarbonization measure from the static catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub id: String,
    pub name: String,
    pub scope: Scope,
    /// Free-form category (energy, mobility, waste, water, ...)
    pub category: String,
    pub intervention_level: InterventionLevel,
    /// t CO2e per year, >= 0
    pub emission_reduction: f64,
    /// Currency units, >= 0
    pub investment: f64,
    /// Free text ("6-12 months", ...)
    #[serde(default)]
    pub timeline: String,
    #[serde(default)]
    pub applicability: Applicability,
    /// Named regional fact this measure depends on, checked against
    /// `RegionFacts::prerequisites` by the recommendation predicate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisite: Option<String>,
}

/// Kind of a funding source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingType {
    Subsidy,
    Incentive,
    Loan,
}

/// Eligibility predicate attached to a funding source.
///
/// Empty lists mean "any".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundingEligibility {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub company_sizes: Vec<CompanySize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sectors: Vec<String>,
}

impl FundingEligibility {
    pub fn accepts_category(&self, category: &str) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| c == category)
    }

    pub fn accepts_size(&self, size: CompanySize) -> bool {
        self.company_sizes.is_empty() || self.company_sizes.contains(&size)
    }

    pub fn accepts_sector(&self, sector: &str) -> bool {
        self.sectors.is_empty() || self.sectors.iter().any(|s| s == sector)
    }
}

fn default_deadline() -> String {
    "continuous".to_string()
}

/// A funding source from the static catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingSource {
    pub id: String,
    pub name: String,
    pub funding_type: FundingType,
    /// Hard cap on what this fund pays out, currency units
    pub max_amount: f64,
    /// Percent of investment covered (0 < p <= 100); absent means the fund
    /// pays a flat amount up to max_amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_budget: Option<f64>,
    pub currently_open: bool,
    /// ISO date or "continuous"
    #[serde(default = "default_deadline")]
    pub deadline: String,
    #[serde(default)]
    pub eligibility: FundingEligibility,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
}

impl FundingSource {
    /// A fund is drawable if it is open and (when tracked) has budget left
    pub fn has_budget(&self) -> bool {
        self.currently_open && self.remaining_budget.map_or(true, |b| b > 0.0)
    }
}

/// Regional facts consulted by the recommendation predicate.
///
/// `prerequisites` is an open map of named boolean facts; a measure naming
/// a prerequisite that is absent from the map is treated as unmet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFacts {
    pub has_charging_infrastructure: bool,
    #[serde(default)]
    pub prerequisites: HashMap<String, bool>,
}

impl Default for RegionFacts {
    fn default() -> Self {
        RegionFacts {
            has_charging_infrastructure: true,
            prerequisites: HashMap::new(),
        }
    }
}
