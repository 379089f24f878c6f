//! Carbon intensity arithmetic
//!
//! Global invariants enforced:
//! - Every divide is guarded; guards return safe defaults, never panic
//! - Deterministic, side-effect-free computation

/// Carbon intensity in kg CO2e per currency unit.
///
/// Emissions arrive in t CO2e/yr and revenue in currency/yr, hence the
/// x1000 scale. Returns 0.0 when revenue is 0 (no data, not zero
/// intensity).
pub fn intensity(total_emissions: f64, revenue: f64) -> f64 {
    if revenue == 0.0 {
        return 0.0;
    }
    total_emissions * 1000.0 / revenue
}

/// Percent by which `value` exceeds `reference`.
///
/// Returns 0.0 when `reference` is 0 — a "no data" fallback, not a true
/// zero-deviation signal. Callers must treat `reference == 0` as undefined
/// for display.
pub fn percent_above(value: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        return 0.0;
    }
    ((value - reference) / reference) * 100.0
}

/// Intensity after applying an absolute emission reduction, under the
/// proportional-reduction model: the reduction is assumed uniformly
/// distributed across the intensity base, not scope-specific.
///
/// The ratio is 0 when `total_emissions` is 0 and is clamped to [0, 1] so
/// the result never goes negative when a reduction exceeds emissions.
pub fn new_intensity_after_reduction(
    current_intensity: f64,
    total_emissions: f64,
    total_reduction: f64,
) -> f64 {
    let reduction_ratio = if total_emissions == 0.0 {
        0.0
    } else {
        (total_reduction / total_emissions).clamp(0.0, 1.0)
    };
    current_intensity * (1.0 - reduction_ratio)
}
