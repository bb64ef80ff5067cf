//! Bundled formulary for rxcheck.
//!
//! The clinical knowledge the engine ships with: drug names and brand
//! aliases, per-condition contraindications, interaction groups and pairs,
//! and safer-alternative guidance. The data lives in `data/formulary.json`
//! and is embedded at build time, so the engine works offline.
//!
//! Deployments that update data without a rebuild store new versions through
//! [`rxcheck_core::Database`] instead; this crate is the fallback baseline.

use std::sync::{Arc, OnceLock};

use rxcheck_core::config::{ConfigResult, EngineOptions, FormularyConfig};
use rxcheck_core::{RuleSet, SafetyEvaluator};
use tracing::info;

/// Raw JSON of the bundled formulary.
pub const FORMULARY_JSON: &str = include_str!("../data/formulary.json");

/// Parse the bundled formulary.
pub fn config() -> ConfigResult<FormularyConfig> {
    FormularyConfig::from_json(FORMULARY_JSON)
}

/// Compile the bundled formulary with default options.
pub fn rule_set() -> ConfigResult<RuleSet> {
    rule_set_with(EngineOptions::default())
}

pub fn rule_set_with(options: EngineOptions) -> ConfigResult<RuleSet> {
    let rules = RuleSet::compile_with(&config()?, options)?;
    info!(version = %rules.version(), "loaded bundled formulary");
    Ok(rules)
}

/// Evaluator over the bundled formulary with default options.
///
/// Compiled once per process; later calls share the same rule set.
pub fn evaluator() -> ConfigResult<SafetyEvaluator> {
    static SHARED: OnceLock<Arc<RuleSet>> = OnceLock::new();

    if let Some(rules) = SHARED.get() {
        return Ok(SafetyEvaluator::from_shared(Arc::clone(rules)));
    }
    // a racing thread may win the set; both compiled the same data
    let compiled = Arc::new(rule_set()?);
    let rules = SHARED.get_or_init(|| compiled);
    Ok(SafetyEvaluator::from_shared(Arc::clone(rules)))
}

/// Evaluator over the bundled formulary with custom options.
pub fn evaluator_with(options: EngineOptions) -> ConfigResult<SafetyEvaluator> {
    Ok(SafetyEvaluator::new(rule_set_with(options)?))
}
