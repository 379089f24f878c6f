//! Action plans and the persistence port
//!
//! The engine computes plans and hands them to the caller; it never
//! touches storage directly. `PlanStore` is the injected key-value port
//! the consuming layer implements (browser storage, a database, ...);
//! `MemoryStore` backs tests and the CLI.
//!
//! Stored plan state uses camelCase keys: the store format is shared with
//! non-Rust consumers and predates this crate.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status of an action plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    None,
    InPreparation,
    Ready,
    Sent,
}

/// A computed action plan for one supplier. Owned by the caller; the
/// engine only computes, never persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ActionPlan {
    pub supplier_id: String,
    pub selected_measure_ids: Vec<String>,
    pub selected_funding_ids: Vec<String>,
    pub total_reduction: f64,
    pub total_investment: f64,
    pub new_intensity: f64,
    pub reached_target: bool,
    pub status: PlanStatus,
}

/// Wizard/plan state as stored in the external key-value store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanState {
    #[serde(default)]
    pub selected_measures: Vec<String>,
    #[serde(default)]
    pub selected_funding: Vec<String>,
    #[serde(default)]
    pub municipality_notes: String,
    #[serde(default)]
    pub current_step: u32,
    #[serde(default)]
    pub completed_step4: bool,
    #[serde(default)]
    pub reached_target: bool,
    #[serde(default)]
    pub email_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_sent_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<String>,
    /// Cleared when the user toggles a measure manually
    #[serde(default)]
    pub auto_applied: bool,
}

/// Injected persistence port. The engine depends on this interface only,
/// never on a storage technology.
pub trait PlanStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// Store key for a supplier's plan state
pub fn plan_key(supplier_id: &str) -> String {
    format!("actionPlan_{}", supplier_id)
}

/// Serialize plan state into the store under the supplier's key
pub fn save_plan(store: &mut dyn PlanStore, supplier_id: &str, state: &PlanState) -> Result<()> {
    let blob = serde_json::to_string(state)
        .with_context(|| format!("failed to serialize plan state for {}", supplier_id))?;
    store.set(&plan_key(supplier_id), blob);
    Ok(())
}

/// Load plan state for a supplier; Ok(None) when no plan is stored
pub fn load_plan(store: &dyn PlanStore, supplier_id: &str) -> Result<Option<PlanState>> {
    match store.get(&plan_key(supplier_id)) {
        Some(blob) => {
            let state: PlanState = serde_json::from_str(&blob)
                .with_context(|| format!("malformed plan state for {}", supplier_id))?;
            Ok(Some(state))
        }
        None => Ok(None),
    }
}

/// In-memory store for tests and the CLI
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }
}

impl PlanStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}
