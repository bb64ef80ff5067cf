//! Patient conditions that contraindication rules are keyed on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A patient condition from the fixed enumeration the rule data uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Hypertension,
    Diabetes,
    Pregnancy,
    RenalImpairment,
    LiverDisease,
    Asthma,
}

impl Condition {
    /// Every condition, in display order.
    pub const ALL: [Condition; 6] = [
        Condition::Hypertension,
        Condition::Diabetes,
        Condition::Pregnancy,
        Condition::RenalImpairment,
        Condition::LiverDisease,
        Condition::Asthma,
    ];

    /// Wire identifier (matches the serde form).
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Hypertension => "hypertension",
            Condition::Diabetes => "diabetes",
            Condition::Pregnancy => "pregnancy",
            Condition::RenalImpairment => "renal_impairment",
            Condition::LiverDisease => "liver_disease",
            Condition::Asthma => "asthma",
        }
    }

    /// Human-readable label shown to the prescriber.
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Hypertension => "Hypertension",
            Condition::Diabetes => "Diabetes",
            Condition::Pregnancy => "Pregnancy",
            Condition::RenalImpairment => "Renal Impairment",
            Condition::LiverDisease => "Liver Disease",
            Condition::Asthma => "Asthma",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an identifier outside the condition enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown condition: {0}")]
pub struct UnknownCondition(pub String);

impl FromStr for Condition {
    type Err = UnknownCondition;

    /// Accepts the wire identifier or the display label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        Condition::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| UnknownCondition(s.to_string()))
    }
}
