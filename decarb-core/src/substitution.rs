//! Best-alternative supplier matching for critical entities
//!
//! Global invariants enforced:
//! - Deterministic: the single lowest-emission candidate in the matched
//!   pool wins, ties broken by id ascending
//! - An empty pool yields None, a valid displayed outcome

use crate::model::Supplier;

/// Fixed criticality multiplier over the cohort mean, not configurable
const CRITICAL_VOLUME_MULTIPLIER: f64 = 1.2;

/// Lowest-emission supplier in a pool, ties broken by id ascending
fn lowest_emission<'a>(pool: &[&'a Supplier]) -> Option<&'a Supplier> {
    pool.iter().copied().min_by(|a, b| {
        a.total_emissions
            .partial_cmp(&b.total_emissions)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    })
}

/// Find the best substitution candidate for a critical supplier.
///
/// The pool is every other supplier with strictly lower total emissions.
/// Subsector-first: when the critical supplier has a subsector and the
/// subsector pool is non-empty, its lowest-emission member wins even if a
/// sector-only peer emits less. Otherwise the same-sector pool decides;
/// an empty pool returns None.
pub fn find_best_alternative<'a>(
    critical: &Supplier,
    all_suppliers: &'a [Supplier],
) -> Option<&'a Supplier> {
    let pool: Vec<&Supplier> = all_suppliers
        .iter()
        .filter(|s| s.id != critical.id && s.total_emissions < critical.total_emissions)
        .collect();

    if let Some(subsector) = &critical.subsector {
        let sub_pool: Vec<&Supplier> = pool
            .iter()
            .copied()
            .filter(|s| s.subsector.as_ref() == Some(subsector))
            .collect();
        if let Some(best) = lowest_emission(&sub_pool) {
            return Some(best);
        }
    }

    let sector_pool: Vec<&Supplier> = pool
        .iter()
        .copied()
        .filter(|s| s.sector == critical.sector)
        .collect();
    lowest_emission(&sector_pool)
}

/// A supplier is critical by volume when its emissions exceed the cohort
/// mean by the fixed 1.2 multiplier.
pub fn is_critical_by_volume(supplier: &Supplier, cohort: &[Supplier]) -> bool {
    if cohort.is_empty() {
        return false;
    }
    let mean =
        cohort.iter().map(|s| s.total_emissions).sum::<f64>() / cohort.len() as f64;
    supplier.total_emissions > mean * CRITICAL_VOLUME_MULTIPLIER
}
