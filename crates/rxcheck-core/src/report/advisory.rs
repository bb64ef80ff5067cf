//! Per-condition prescribing advisory.
//!
//! Lists every formulary drug with a rule for a condition, split into hard
//! stops and cautions, plus the configured safer alternatives. Shown when a
//! condition is first recorded for a patient, before any drug is chosen.

use serde::{Deserialize, Serialize};

use crate::models::{Condition, DrugId, Severity};
use crate::rules::RuleSet;

/// One drug line in an advisory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryEntry {
    pub drug: DrugId,
    /// Declared display name
    pub name: String,
    pub message: String,
    pub source: String,
}

/// Advisory for a single condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionAdvisory {
    pub condition: Condition,
    /// Drugs to avoid, in catalog order
    pub contraindicated: Vec<AdvisoryEntry>,
    /// Drugs needing dose adjustment or monitoring, in catalog order
    pub caution: Vec<AdvisoryEntry>,
    pub alternatives: Vec<String>,
}

impl ConditionAdvisory {
    pub fn build(rules: &RuleSet, condition: Condition) -> Self {
        let mut contraindicated = Vec::new();
        let mut caution = Vec::new();

        for info in rules.catalog().iter() {
            let Some(rule) = rules.contraindications().rule_for(&info.id, condition) else {
                continue;
            };
            let entry = AdvisoryEntry {
                drug: info.id.clone(),
                name: info.name.clone(),
                message: rule.message.clone(),
                source: rule.source.clone(),
            };
            match rule.severity {
                Severity::Contraindicated => contraindicated.push(entry),
                Severity::Caution => caution.push(entry),
            }
        }

        Self {
            condition,
            contraindicated,
            caution,
            alternatives: rules.guidance_for(condition).to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contraindicated.is_empty() && self.caution.is_empty()
    }

    fn write_text(&self, number: usize, out: &mut String) {
        out.push_str(&format!(
            "{}. PATIENT CONDITION: {}\n",
            number,
            self.condition.label()
        ));
        out.push_str(&format!("   {}\n\n", "-".repeat(60)));

        if !self.contraindicated.is_empty() {
            out.push_str("   AVOID THESE MEDICATIONS (Contraindicated):\n");
            for entry in &self.contraindicated {
                out.push_str(&format!("      * {}\n", entry.name.to_uppercase()));
                out.push_str(&format!("        Reason: {}\n", entry.message));
            }
            out.push('\n');
        }

        if !self.caution.is_empty() {
            out.push_str("   USE WITH CAUTION (Dose Adjustment/Monitoring Required):\n");
            for entry in &self.caution {
                out.push_str(&format!("      * {}\n", entry.name.to_uppercase()));
                out.push_str(&format!("        Guidance: {}\n", entry.message));
            }
            out.push('\n');
        }

        if !self.alternatives.is_empty() {
            out.push_str("   SAFER ALTERNATIVES:\n");
            for alternative in &self.alternatives {
                out.push_str(&format!("      -> {}\n", alternative));
            }
            out.push('\n');
        }
    }
}

/// Advisories for all of a patient's conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescribingAdvisory {
    pub formulary_version: String,
    pub conditions: Vec<ConditionAdvisory>,
}

impl PrescribingAdvisory {
    /// Build sections in the order the conditions are given; repeats are skipped.
    pub fn build<I: IntoIterator<Item = Condition>>(rules: &RuleSet, conditions: I) -> Self {
        let mut sections: Vec<ConditionAdvisory> = Vec::new();
        for condition in conditions {
            if sections.iter().any(|s| s.condition == condition) {
                continue;
            }
            sections.push(ConditionAdvisory::build(rules, condition));
        }
        Self {
            formulary_version: rules.version().to_string(),
            conditions: sections,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text summary for the clinical notes field.
    pub fn to_text(&self) -> String {
        let rule = "=".repeat(60);
        let mut out = String::new();
        if self.conditions.is_empty() {
            return out;
        }

        out.push_str(&format!("{rule}\nCRITICAL PRESCRIBING CONTRAINDICATIONS\n{rule}\n\n"));
        out.push_str("Based on recorded conditions, the following medications are\n");
        out.push_str("CONTRAINDICATED or require DOSE ADJUSTMENT:\n\n");

        for (idx, section) in self.conditions.iter().enumerate() {
            section.write_text(idx + 1, &mut out);
        }

        out.push_str(&format!("{rule}\n"));
        out.push_str(&format!("Formulary version: {}\n", self.formulary_version));
        out
    }
}
