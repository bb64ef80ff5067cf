//! Rule data and engine configuration.
//!
//! The clinical knowledge (drugs, aliases, contraindications, interaction
//! pairs) is plain data in the [`FormularyConfig`] shape, loaded from JSON and
//! validated when compiled into a [`crate::rules::RuleSet`]. Tuning knobs that
//! change engine behavior rather than clinical content live in
//! [`EngineOptions`].

mod formulary;
mod options;

pub use formulary::*;
pub use options::*;

use thiserror::Error;

/// Errors raised while loading or validating rule data.
///
/// Evaluation itself never fails; every problem with the data surfaces here,
/// before an engine exists.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Empty name in {0}")]
    EmptyName(&'static str),

    #[error("Drug declared twice: {0}")]
    DuplicateDrug(String),

    #[error("Drug {drug} lists condition {condition} more than once")]
    DuplicateCondition { drug: String, condition: String },

    #[error("Unknown drug {name} referenced by {context}")]
    UnknownDrug { context: String, name: String },

    #[error("Drug {0} has contraindications but no source")]
    MissingSource(String),

    #[error("Alias {alias} maps to both {first} and {second}")]
    ConflictingAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Alias {alias} names a canonical drug but maps to {target}")]
    AliasShadowsDrug { alias: String, target: String },

    #[error("Unknown interaction group: {0}")]
    UnknownGroup(String),

    #[error("Drug {0} cannot interact with itself")]
    SelfInteraction(String),

    #[error("{name} should resolve to {expected} but resolves to {resolved:?}")]
    Unresolvable {
        name: String,
        expected: String,
        resolved: Option<String>,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
