//! Risk tier classification from carbon intensity
//!
//! Global invariants enforced:
//! - Deterministic classification, first matching threshold wins
//! - An undefined sector average yields an explicit Undefined tier,
//!   never a fabricated comparison

use crate::intensity;
use crate::model::Supplier;
use serde::{Deserialize, Serialize};

/// Risk tier relative to the sector average intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// No sector average available, no comparison possible
    Undefined,
    Low,      // at or below sector average
    Medium,   // 0-50% above
    High,     // 50-100% above
    Critical, // >= 100% above
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Undefined => "undefined",
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
            RiskTier::Critical => "critical",
        }
    }

    /// True for High and Critical
    pub fn is_high_plus(&self) -> bool {
        matches!(self, RiskTier::High | RiskTier::Critical)
    }

    /// Fold the 4-tier classification into the 3-tier bucket some
    /// consumers display (Critical and High collapse into "high").
    /// The engine always computes 4 tiers; folding is the caller's choice.
    pub fn folded(&self) -> &'static str {
        match self {
            RiskTier::Undefined => "undefined",
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High | RiskTier::Critical => "high",
        }
    }
}

/// Outcome of classifying an intensity against a sector average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub tier: RiskTier,
    pub percent_above: f64,
    /// intensity / sector average; None when the average is 0 (undefined)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
}

/// Full risk assessment for a supplier. Derived data, recomputed on
/// demand, never persisted as source-of-truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RiskAssessment {
    pub supplier_id: String,
    pub intensity: f64,
    pub sector_avg_intensity: f64,
    pub percent_above: f64,
    pub tier: RiskTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
}

/// Classify an intensity against the sector average.
///
/// Thresholds, evaluated in order, first match wins:
/// 1. avg == 0        -> Undefined
/// 2. >= 100% above   -> Critical
/// 3. >= 50% above    -> High
/// 4. > 0% above      -> Medium
/// 5. otherwise       -> Low
pub fn classify(intensity_value: f64, sector_avg: f64) -> Classification {
    if sector_avg == 0.0 {
        return Classification {
            tier: RiskTier::Undefined,
            percent_above: 0.0,
            multiplier: None,
        };
    }

    let percent_above = intensity::percent_above(intensity_value, sector_avg);
    let tier = if percent_above >= 100.0 {
        RiskTier::Critical
    } else if percent_above >= 50.0 {
        RiskTier::High
    } else if percent_above > 0.0 {
        RiskTier::Medium
    } else {
        RiskTier::Low
    };

    Classification {
        tier,
        percent_above,
        multiplier: Some(intensity_value / sector_avg),
    }
}

/// Assess one supplier against its sector average intensity
pub fn assess(supplier: &Supplier, sector_avg: f64) -> RiskAssessment {
    let intensity_value = supplier.emissions_per_revenue();
    let classification = classify(intensity_value, sector_avg);
    RiskAssessment {
        supplier_id: supplier.id.clone(),
        intensity: intensity_value,
        sector_avg_intensity: sector_avg,
        percent_above: classification.percent_above,
        tier: classification.tier,
        multiplier: classification.multiplier,
    }
}
