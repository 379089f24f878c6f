//! Catalog and portfolio loading
//!
//! Catalogs are static configuration: loaded once at process start,
//! validated eagerly, and treated as immutable afterwards. What-if
//! scenarios must operate on clones, never on the loaded catalog.
//!
//! Malformed records (negative investment, out-of-range percentages,
//! duplicate ids) are rejected here with a validation error rather than
//! tolerated at selection time.

use crate::model::{FundingSource, Measure, Supplier};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The static measure and funding catalogs, loaded together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub measures: Vec<Measure>,
    #[serde(default)]
    pub funding_sources: Vec<FundingSource>,
}

impl Catalog {
    /// Load and validate a catalog from a JSON file
    pub fn load(path: &Path) -> Result<Catalog> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file: {}", path.display()))?;
        let catalog: Catalog = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse catalog file: {}", path.display()))?;
        catalog
            .validate()
            .with_context(|| format!("invalid catalog in: {}", path.display()))?;
        Ok(catalog)
    }

    /// Validate the catalog for malformed records
    pub fn validate(&self) -> Result<()> {
        let mut measure_ids = HashSet::new();
        for measure in &self.measures {
            if measure.id.is_empty() {
                anyhow::bail!("measure with empty id");
            }
            if !measure_ids.insert(measure.id.as_str()) {
                anyhow::bail!("duplicate measure id: {}", measure.id);
            }
            if measure.emission_reduction < 0.0 {
                anyhow::bail!(
                    "measure {}: emission_reduction must be non-negative (got {})",
                    measure.id,
                    measure.emission_reduction
                );
            }
            if measure.investment < 0.0 {
                anyhow::bail!(
                    "measure {}: investment must be non-negative (got {})",
                    measure.id,
                    measure.investment
                );
            }
        }

        let mut fund_ids = HashSet::new();
        for fund in &self.funding_sources {
            if fund.id.is_empty() {
                anyhow::bail!("funding source with empty id");
            }
            if !fund_ids.insert(fund.id.as_str()) {
                anyhow::bail!("duplicate funding source id: {}", fund.id);
            }
            if fund.max_amount < 0.0 {
                anyhow::bail!(
                    "funding source {}: max_amount must be non-negative (got {})",
                    fund.id,
                    fund.max_amount
                );
            }
            if let Some(p) = fund.percentage {
                if p <= 0.0 || p > 100.0 {
                    anyhow::bail!(
                        "funding source {}: percentage must be in (0, 100] (got {})",
                        fund.id,
                        p
                    );
                }
            }
            if let Some(budget) = fund.remaining_budget {
                if budget < 0.0 {
                    anyhow::bail!(
                        "funding source {}: remaining_budget must be non-negative (got {})",
                        fund.id,
                        budget
                    );
                }
            }
        }

        Ok(())
    }

    pub fn measure(&self, id: &str) -> Option<&Measure> {
        self.measures.iter().find(|m| m.id == id)
    }

    pub fn fund(&self, id: &str) -> Option<&FundingSource> {
        self.funding_sources.iter().find(|f| f.id == id)
    }
}

/// Validate a supplier portfolio
pub fn validate_portfolio(suppliers: &[Supplier]) -> Result<()> {
    let mut ids = HashSet::new();
    for supplier in suppliers {
        if supplier.id.is_empty() {
            anyhow::bail!("supplier with empty id");
        }
        if !ids.insert(supplier.id.as_str()) {
            anyhow::bail!("duplicate supplier id: {}", supplier.id);
        }
        if supplier.total_emissions < 0.0 {
            anyhow::bail!(
                "supplier {}: total_emissions must be non-negative (got {})",
                supplier.id,
                supplier.total_emissions
            );
        }
        if supplier.revenue < 0.0 {
            anyhow::bail!(
                "supplier {}: revenue must be non-negative (got {})",
                supplier.id,
                supplier.revenue
            );
        }
    }
    Ok(())
}

/// Load and validate a supplier portfolio from a JSON file
pub fn load_portfolio(path: &Path) -> Result<Vec<Supplier>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read portfolio file: {}", path.display()))?;
    let suppliers: Vec<Supplier> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse portfolio file: {}", path.display()))?;
    validate_portfolio(&suppliers)
        .with_context(|| format!("invalid portfolio in: {}", path.display()))?;
    Ok(suppliers)
}
