//! Serialized formulary data model.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ConfigResult;
use crate::models::{Condition, Severity};

/// A versioned formulary: every piece of clinical knowledge the engine uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormularyConfig {
    /// Dataset version, e.g. "2025.1"
    pub version: String,
    pub drugs: Vec<DrugEntry>,
    /// Raw name (brand, abbreviation, misspelling) → canonical drug name
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub interactions: InteractionConfig,
    /// Safer alternatives shown in the prescribing advisory
    #[serde(default)]
    pub condition_guidance: BTreeMap<Condition, Vec<String>>,
}

/// One canonical drug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugEntry {
    pub name: String,
    /// Citation for the contraindication rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Constituents of a combination product, or the family a member belongs to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contraindications: Vec<ContraindicationEntry>,
}

/// One condition rule as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContraindicationEntry {
    pub condition: Condition,
    /// Older datasets omit this; see [`ContraindicationEntry::effective_severity`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub message: String,
}

impl ContraindicationEntry {
    /// The declared severity, or the legacy classification of the message.
    pub fn effective_severity(&self) -> Severity {
        self.severity
            .unwrap_or_else(|| Severity::classify_legacy(&self.message))
    }
}

/// Dangerous drug pairs, declared explicitly or by class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Named drug classes (e.g. "ssri") usable in class rules
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub pairs: Vec<(String, String)>,
    /// Every member of `left` is dangerous with every member of `right`
    #[serde(default)]
    pub class_rules: Vec<ClassRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRule {
    pub left: MemberSet,
    pub right: MemberSet,
}

/// Either side of a class rule: a group name or an explicit drug list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberSet {
    Group(String),
    Drugs(Vec<String>),
}

impl FormularyConfig {
    /// Parse a formulary from JSON text.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a formulary file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Hex SHA-256 of the canonical serialization.
    ///
    /// Maps are ordered, so the same content always yields the same digest.
    pub fn fingerprint(&self) -> ConfigResult<String> {
        let canonical = self.to_json()?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}
