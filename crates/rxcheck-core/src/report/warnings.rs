//! Warning report for display and audit export.

use serde::{Deserialize, Serialize};

use crate::models::{Severity, Warning};

/// The warnings of one evaluation, with counts for the UI banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningReport {
    pub formulary_version: String,
    pub generated_at: String,
    pub interaction_count: usize,
    pub contraindicated_count: usize,
    pub caution_count: usize,
    pub warnings: Vec<Warning>,
}

impl WarningReport {
    pub fn new(formulary_version: impl Into<String>, warnings: Vec<Warning>) -> Self {
        let interaction_count = warnings.iter().filter(|w| w.is_interaction()).count();
        let contraindicated_count = warnings
            .iter()
            .filter(|w| !w.is_interaction() && w.severity() == Severity::Contraindicated)
            .count();
        let caution_count = warnings.len() - interaction_count - contraindicated_count;

        Self {
            formulary_version: formulary_version.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            interaction_count,
            contraindicated_count,
            caution_count,
            warnings,
        }
    }

    /// True when saving must be gated behind acknowledgement.
    pub fn requires_acknowledgement(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text rendering, one block per warning.
    pub fn to_text(&self) -> String {
        render_warnings(&self.warnings)
    }

    /// One row per warning.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("type,drug_a,drug_b,display,condition,severity,message,source\n");

        for warning in &self.warnings {
            let line = match warning {
                Warning::Interaction(w) => format!(
                    "drug-drug,{},{},{},,{},,\n",
                    escape_csv(w.drug_a.as_str()),
                    escape_csv(w.drug_b.as_str()),
                    escape_csv(&format!("{} + {}", w.display_a, w.display_b)),
                    Severity::Contraindicated.label(),
                ),
                Warning::Condition(w) => format!(
                    "condition,{},,{},{},{},{},{}\n",
                    escape_csv(w.drug.as_str()),
                    escape_csv(&w.display_name),
                    w.condition.as_str(),
                    w.severity.label(),
                    escape_csv(&w.message),
                    escape_csv(&w.source),
                ),
            };
            csv.push_str(&line);
        }

        csv
    }
}

/// Render warnings as the text block shown above the save button.
pub fn render_warnings(warnings: &[Warning]) -> String {
    let mut out = String::new();

    for warning in warnings {
        match warning {
            Warning::Interaction(w) => {
                out.push_str("DANGEROUS DRUG INTERACTION DETECTED\n");
                out.push_str(&format!("  {} + {}\n", w.display_a, w.display_b));
            }
            Warning::Condition(w) => {
                out.push_str(&format!("{}\n", w.display_name.to_uppercase()));
                out.push_str(&format!("  Patient Condition: {}\n", w.condition.label()));
                out.push_str(&format!("  Severity: {}\n", w.severity.label()));
                out.push_str(&format!("  {}\n", w.message));
                out.push_str(&format!("  Source: {}\n", w.source));
            }
        }
        out.push('\n');
    }

    out
}

/// Escape a string for CSV (quote if contains comma, quote, or newline).
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
