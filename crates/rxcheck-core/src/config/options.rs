//! Engine tuning options.

use serde::{Deserialize, Serialize};

use super::ConfigResult;

/// How many drug-drug warnings one evaluation reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionReporting {
    /// Stop at the first dangerous pair (matches the established UI).
    #[default]
    FirstMatch,
    /// Report every distinct dangerous pair once.
    AllPairs,
}

/// Knobs that change resolution and reporting, not clinical content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub interaction_reporting: InteractionReporting,
    /// Shortest input that may match inside a longer alias or generic name
    pub min_fragment_len: usize,
    /// Keys shorter than this only match whole words of the input
    pub min_partial_key_len: usize,
    /// Typo-tolerant last pass
    pub fuzzy_matching: bool,
    pub fuzzy_threshold: f64,
    /// Shortest token and key the fuzzy pass compares
    pub fuzzy_min_len: usize,
    /// Dosage-form and instruction words that never name a drug on their own.
    /// The partial and fragment passes skip them on both sides.
    pub filler_words: Vec<String>,
}

const FILLER_WORDS: &[&str] = &[
    "after", "and", "before", "cap", "caps", "capsule", "capsules", "cream", "daily", "dose",
    "drops", "food", "for", "gel", "inj", "injection", "morning", "night", "ointment", "once",
    "oral", "sachet", "solution", "suspension", "syrup", "tab", "tablet", "tablets", "tabs",
    "take", "the", "twice", "with",
];

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            interaction_reporting: InteractionReporting::FirstMatch,
            min_fragment_len: 3,
            min_partial_key_len: 4,
            fuzzy_matching: true,
            fuzzy_threshold: 0.88,
            fuzzy_min_len: 5,
            filler_words: FILLER_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl EngineOptions {
    /// Parse options; absent fields keep their defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn report_all_pairs(mut self) -> Self {
        self.interaction_reporting = InteractionReporting::AllPairs;
        self
    }

    pub fn without_fuzzy(mut self) -> Self {
        self.fuzzy_matching = false;
        self
    }
}
