//! Safety evaluator.
//!
//! Orchestrates one check of a prescription draft:
//!
//! ```text
//! MedicationEntry[] ──resolve──▶ (display, DrugId?)[]
//!                                     │
//!              ┌──────────────────────┴──────────────────────┐
//!              ▼                                             ▼
//!      interaction pair scan                    contraindications × conditions
//!      (always)                                 (only if the patient has any)
//!              │                                             │
//!              └───────────────▶ Warning[] ◀─────────────────┘
//!                       interactions first, then medication order,
//!                       then each drug's declared condition order
//! ```
//!
//! Evaluation is pure: no I/O, no mutation, same input → same output. The
//! evaluator is `Send + Sync` and cheap to clone.

mod session;

pub use session::*;

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::{ConfigResult, EngineOptions, FormularyConfig};
use crate::models::{Condition, DrugId, MedicationEntry, PatientContext, Warning};
use crate::resolver::normalize;
use crate::rules::{RuleSet, ScanItem};

/// A medication after identity resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMedication {
    pub raw_name: String,
    /// `None` when the name matched nothing; such entries are exempt from rules
    pub drug: Option<DrugId>,
    /// Raw name, plus the canonical name in parentheses when they differ
    pub display_name: String,
}

/// Checks prescriptions against a compiled [`RuleSet`].
#[derive(Debug, Clone)]
pub struct SafetyEvaluator {
    rules: Arc<RuleSet>,
}

impl SafetyEvaluator {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    pub fn from_shared(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// Compile a formulary and wrap it.
    pub fn from_config(config: &FormularyConfig, options: EngineOptions) -> ConfigResult<Self> {
        Ok(Self::new(RuleSet::compile_with(config, options)?))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn resolve(&self, raw_name: &str) -> Option<DrugId> {
        self.rules.resolver().resolve(raw_name)
    }

    /// Resolve every entry, keeping list order.
    pub fn resolve_all(&self, medications: &[MedicationEntry]) -> Vec<ResolvedMedication> {
        medications
            .iter()
            .map(|entry| self.resolve_entry(entry))
            .collect()
    }

    /// Warnings for a patient and medication list.
    pub fn evaluate(&self, patient: &PatientContext, medications: &[MedicationEntry]) -> Vec<Warning> {
        let resolved = self.resolve_all(medications);

        let mut warnings = self.interaction_warnings(&resolved);
        let interaction_count = warnings.len();

        if !patient.is_empty() {
            warnings.extend(self.condition_warnings(&patient.conditions, &resolved));
        }

        debug!(
            medications = medications.len(),
            resolved = resolved.iter().filter(|m| m.drug.is_some()).count(),
            interactions = interaction_count,
            condition_warnings = warnings.len() - interaction_count,
            "evaluated prescription"
        );
        warnings
    }

    fn resolve_entry(&self, entry: &MedicationEntry) -> ResolvedMedication {
        let raw_name = entry.raw_name.trim().to_string();
        let drug = self.rules.resolver().resolve(&raw_name);

        let display_name = match &drug {
            Some(id) if normalize(&raw_name) != id.as_str() => {
                format!("{} ({})", raw_name, self.rules.catalog().display_name(id))
            }
            _ => raw_name.clone(),
        };

        ResolvedMedication {
            raw_name,
            drug,
            display_name,
        }
    }

    fn interaction_warnings(&self, resolved: &[ResolvedMedication]) -> Vec<Warning> {
        let catalog = self.rules.catalog();
        let items: Vec<ScanItem<'_>> = resolved
            .iter()
            .filter_map(|medication| {
                let info = catalog.get(medication.drug.as_ref()?)?;
                Some(ScanItem {
                    display: &medication.display_name,
                    identities: info.identities().collect(),
                })
            })
            .collect();

        self.rules
            .interactions()
            .scan(&items, self.rules.options().interaction_reporting)
    }

    /// One warning per (drug, condition), first occurrence wins.
    fn condition_warnings(
        &self,
        conditions: &std::collections::BTreeSet<Condition>,
        resolved: &[ResolvedMedication],
    ) -> Vec<Warning> {
        let catalog = self.rules.catalog();
        let table = self.rules.contraindications();
        let mut seen: HashSet<(&DrugId, Condition)> = HashSet::new();
        let mut warnings = Vec::new();

        for medication in resolved {
            let Some(info) = medication.drug.as_ref().and_then(|id| catalog.get(id)) else {
                continue;
            };
            for identity in info.identities() {
                for rule in table.matching(identity, conditions) {
                    if seen.insert((&rule.drug, rule.condition)) {
                        warnings.push(rule.to_warning(medication.display_name.as_str()));
                    }
                }
            }
        }

        warnings
    }
}
