//! Safety warnings produced by evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Condition, DrugId};

/// How strongly a rule advises against a drug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Use with care; monitor or adjust.
    Caution,
    /// Do not prescribe without an explicit override.
    Contraindicated,
}

impl Severity {
    /// Classify legacy rule text that predates explicit severities.
    ///
    /// Messages containing "contraindicated", "avoid" or "do not" were
    /// historically treated as hard stops; everything else as caution.
    pub fn classify_legacy(message: &str) -> Self {
        let lower = message.to_lowercase();
        if ["contraindicated", "avoid", "do not"]
            .iter()
            .any(|marker| lower.contains(marker))
        {
            Severity::Contraindicated
        } else {
            Severity::Caution
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Caution => "Caution",
            Severity::Contraindicated => "Contraindicated",
        }
    }
}

/// Two prescribed drugs form a known dangerous pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionWarning {
    /// Lower id of the pair (ids are stored in sorted order)
    pub drug_a: DrugId,
    pub drug_b: DrugId,
    /// What the prescriber typed for the medication carrying `drug_a`
    pub display_a: String,
    pub display_b: String,
}

/// A prescribed drug has a rule for one of the patient's conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionWarning {
    pub drug: DrugId,
    /// Raw name, suffixed with the canonical name when they differ
    pub display_name: String,
    pub condition: Condition,
    pub severity: Severity,
    pub message: String,
    pub source: String,
}

/// A safety finding for the prescriber to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Warning {
    #[serde(rename = "drug-drug")]
    Interaction(InteractionWarning),
    #[serde(rename = "condition")]
    Condition(ConditionWarning),
}

impl Warning {
    /// Interactions always block; condition warnings carry the rule's severity.
    pub fn severity(&self) -> Severity {
        match self {
            Warning::Interaction(_) => Severity::Contraindicated,
            Warning::Condition(w) => w.severity,
        }
    }

    pub fn is_interaction(&self) -> bool {
        matches!(self, Warning::Interaction(_))
    }

    /// Drugs the warning is about.
    pub fn drugs(&self) -> Vec<&DrugId> {
        match self {
            Warning::Interaction(w) => vec![&w.drug_a, &w.drug_b],
            Warning::Condition(w) => vec![&w.drug],
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Interaction(w) => write!(
                f,
                "DANGEROUS DRUG INTERACTION DETECTED: {} + {}",
                w.display_a, w.display_b
            ),
            Warning::Condition(w) => write!(
                f,
                "{} with {}: {} ({})",
                w.display_name,
                w.condition.label(),
                w.message,
                w.severity.label()
            ),
        }
    }
}
