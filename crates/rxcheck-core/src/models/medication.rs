//! Prescription input models.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::Condition;

/// One line of a prescription as the prescriber typed it.
///
/// Only `raw_name` takes part in safety evaluation; the remaining fields are
/// carried through to the saved prescription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicationEntry {
    /// Free-text drug name: brand, generic, abbreviation or misspelling
    pub raw_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// e.g. "after food"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
}

impl MedicationEntry {
    /// Create an entry with just a name.
    pub fn new(raw_name: impl Into<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            ..Self::default()
        }
    }

    pub fn with_dosage(mut self, dosage: impl Into<String>) -> Self {
        self.dosage = Some(dosage.into());
        self
    }

    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = Some(frequency.into());
        self
    }
}

/// The patient facts evaluation needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientContext {
    /// Active conditions; a set, so duplicates collapse
    pub conditions: BTreeSet<Condition>,
}

impl PatientContext {
    pub fn new<I: IntoIterator<Item = Condition>>(conditions: I) -> Self {
        Self {
            conditions: conditions.into_iter().collect(),
        }
    }

    pub fn has(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_deduplicates() {
        let ctx = PatientContext::new([Condition::Asthma, Condition::Asthma]);
        assert_eq!(ctx.conditions.len(), 1);
        assert!(ctx.has(Condition::Asthma));
        assert!(!ctx.has(Condition::Pregnancy));
    }

    #[test]
    fn test_entry_json_omits_empty_fields() {
        let entry = MedicationEntry::new("Brufen").with_dosage("400mg");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"raw_name":"Brufen","dosage":"400mg"}"#);
    }
}
