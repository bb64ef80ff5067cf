//! RxCheck Core Library
//!
//! Prescription safety checks for a point-of-care prescribing app: resolves
//! the drug names a clinician types, then flags dangerous drug pairs and
//! drugs contraindicated by the patient's conditions.
//!
//! # Architecture
//!
//! ```text
//!  formulary JSON ──▶ FormularyConfig ──compile/validate──▶ RuleSet
//!                                                            │
//!            ┌──────────────┬─────────────────┬──────────────┤
//!            ▼              ▼                 ▼              ▼
//!      DrugResolver   DrugCatalog   ContraindicationRules  InteractionRules
//!            │                                               │
//!            └──────────────▶ SafetyEvaluator ◀──────────────┘
//!                                  │
//!            PrescriptionSession (save gate) ──▶ acknowledgement log
//! ```
//!
//! # Core Principle
//!
//! **The engine warns, it never blocks.** Saving over warnings is allowed
//! once they are acknowledged; every such override is recorded.
//!
//! # Modules
//!
//! - [`config`]: Formulary data shape and engine options
//! - [`models`]: Domain types (DrugId, Condition, MedicationEntry, Warning)
//! - [`resolver`]: Free-text drug name resolution
//! - [`rules`]: Compiled, validated rule tables
//! - [`evaluator`]: Safety evaluation and the prescription session
//! - [`report`]: Warning and advisory renderings
//! - [`db`]: SQLite store for formulary versions and acknowledgements

pub mod config;
pub mod db;
pub mod evaluator;
pub mod models;
pub mod report;
pub mod resolver;
pub mod rules;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Re-export commonly used types
pub use config::{ConfigError, EngineOptions, FormularyConfig, InteractionReporting};
pub use db::Database;
pub use evaluator::{PrescriptionSession, SafetyEvaluator, SavedPrescription, SessionError};
pub use models::{Condition, DrugId, MedicationEntry, PatientContext, Severity, Warning};
pub use report::{PrescribingAdvisory, WarningReport};
pub use resolver::{DrugResolver, MatchMethod, Resolution};
pub use rules::RuleSet;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RxCheckError {
    #[error("Invalid formulary: {0}")]
    InvalidFormulary(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid session state: {0}")]
    InvalidState(String),
}

impl From<ConfigError> for RxCheckError {
    fn from(e: ConfigError) -> Self {
        RxCheckError::InvalidFormulary(e.to_string())
    }
}

impl From<db::DbError> for RxCheckError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => RxCheckError::NotFound(what),
            db::DbError::Config(e) => e.into(),
            other => RxCheckError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RxCheckError {
    fn from(e: serde_json::Error) -> Self {
        RxCheckError::SerializationError(e.to_string())
    }
}

impl From<models::UnknownCondition> for RxCheckError {
    fn from(e: models::UnknownCondition) -> Self {
        RxCheckError::InvalidInput(e.to_string())
    }
}

impl From<SessionError> for RxCheckError {
    fn from(e: SessionError) -> Self {
        RxCheckError::InvalidState(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for RxCheckError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        RxCheckError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Compile a formulary into an engine.
///
/// `options_json` may be omitted or partial; missing fields take defaults.
#[uniffi::export]
pub fn open_engine(
    formulary_json: String,
    options_json: Option<String>,
) -> Result<Arc<RxCheckEngine>, RxCheckError> {
    let config = FormularyConfig::from_json(&formulary_json)?;
    let options = parse_options(options_json.as_deref())?;
    Ok(Arc::new(RxCheckEngine {
        evaluator: SafetyEvaluator::from_config(&config, options)?,
    }))
}

/// Open or create a formulary store at the given path.
#[uniffi::export]
pub fn open_store(path: String) -> Result<Arc<RxCheckStore>, RxCheckError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(RxCheckStore { db: Mutex::new(db) }))
}

/// Create an in-memory store (for testing).
#[uniffi::export]
pub fn open_store_in_memory() -> Result<Arc<RxCheckStore>, RxCheckError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(RxCheckStore { db: Mutex::new(db) }))
}

fn parse_options(options_json: Option<&str>) -> Result<EngineOptions, RxCheckError> {
    Ok(match options_json {
        Some(json) => EngineOptions::from_json(json)?,
        None => EngineOptions::default(),
    })
}

fn parse_conditions(conditions: &[String]) -> Result<PatientContext, RxCheckError> {
    let parsed = conditions
        .iter()
        .map(|c| c.parse::<Condition>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PatientContext::new(parsed))
}

// =========================================================================
// Main API Objects
// =========================================================================

/// A compiled rule set, immutable and shareable across threads.
#[derive(uniffi::Object)]
pub struct RxCheckEngine {
    evaluator: SafetyEvaluator,
}

#[uniffi::export]
impl RxCheckEngine {
    /// Resolve a typed drug name to its canonical identity.
    pub fn resolve(&self, raw_name: String) -> Option<FfiResolution> {
        self.evaluator
            .rules()
            .resolver()
            .resolve_detailed(&raw_name)
            .map(|r| FfiResolution {
                display_name: self.evaluator.rules().catalog().display_name(&r.drug).to_string(),
                drug: r.drug.into(),
                method: format!("{:?}", r.method),
                matched: r.matched,
            })
    }

    /// Check a prescription. Condition identifiers are the snake_case ids.
    pub fn evaluate(
        &self,
        conditions: Vec<String>,
        medications: Vec<FfiMedication>,
    ) -> Result<Vec<FfiWarning>, RxCheckError> {
        let patient = parse_conditions(&conditions)?;
        let entries: Vec<MedicationEntry> = medications.into_iter().map(Into::into).collect();
        let warnings = self.evaluator.evaluate(&patient, &entries);
        Ok(warnings.into_iter().map(Into::into).collect())
    }

    /// Whether two typed names resolve to a dangerous pair.
    pub fn is_dangerous_pair(&self, a: String, b: String) -> bool {
        match (self.evaluator.resolve(&a), self.evaluator.resolve(&b)) {
            (Some(a), Some(b)) => self.evaluator.rules().interactions().is_dangerous_pair(&a, &b),
            _ => false,
        }
    }

    /// Per-condition prescribing guidance as plain text.
    pub fn condition_advisory_text(&self, conditions: Vec<String>) -> Result<String, RxCheckError> {
        let patient = parse_conditions(&conditions)?;
        Ok(PrescribingAdvisory::build(self.evaluator.rules(), patient.conditions).to_text())
    }

    /// Per-condition prescribing guidance as JSON.
    pub fn condition_advisory_json(&self, conditions: Vec<String>) -> Result<String, RxCheckError> {
        let patient = parse_conditions(&conditions)?;
        Ok(PrescribingAdvisory::build(self.evaluator.rules(), patient.conditions).to_json()?)
    }

    /// Warning report for a prescription, as JSON.
    pub fn warning_report_json(
        &self,
        conditions: Vec<String>,
        medications: Vec<FfiMedication>,
    ) -> Result<String, RxCheckError> {
        let patient = parse_conditions(&conditions)?;
        let entries: Vec<MedicationEntry> = medications.into_iter().map(Into::into).collect();
        let warnings = self.evaluator.evaluate(&patient, &entries);
        Ok(WarningReport::new(self.evaluator.rules().version(), warnings).to_json()?)
    }

    pub fn formulary_version(&self) -> String {
        self.evaluator.rules().version().to_string()
    }

    pub fn fingerprint(&self) -> String {
        self.evaluator.rules().fingerprint().to_string()
    }

    /// Start writing a prescription for a patient against this engine.
    pub fn start_session(
        &self,
        patient_id: String,
        conditions: Vec<String>,
    ) -> Result<Arc<RxCheckSession>, RxCheckError> {
        let patient = parse_conditions(&conditions)?;
        Ok(Arc::new(RxCheckSession {
            evaluator: self.evaluator.clone(),
            session: Mutex::new(PrescriptionSession::new(patient_id, patient)),
        }))
    }
}

/// One prescription being written; wraps [`PrescriptionSession`].
#[derive(uniffi::Object)]
pub struct RxCheckSession {
    evaluator: SafetyEvaluator,
    session: Mutex<PrescriptionSession>,
}

#[uniffi::export]
impl RxCheckSession {
    pub fn session_id(&self) -> Result<String, RxCheckError> {
        Ok(self.session.lock()?.session_id().to_string())
    }

    /// "empty", "drafting", "warned", "acknowledged" or "saved".
    pub fn state(&self) -> Result<String, RxCheckError> {
        Ok(self.session.lock()?.state().as_str().to_string())
    }

    pub fn set_conditions(&self, conditions: Vec<String>) -> Result<(), RxCheckError> {
        let patient = parse_conditions(&conditions)?;
        self.session.lock()?.set_conditions(patient.conditions)?;
        Ok(())
    }

    pub fn add_medication(&self, medication: FfiMedication) -> Result<(), RxCheckError> {
        self.session.lock()?.add_medication(medication.into())?;
        Ok(())
    }

    pub fn update_medication(&self, index: u32, medication: FfiMedication) -> Result<(), RxCheckError> {
        self.session
            .lock()?
            .update_medication(index as usize, medication.into())?;
        Ok(())
    }

    pub fn remove_medication(&self, index: u32) -> Result<(), RxCheckError> {
        self.session.lock()?.remove_medication(index as usize)?;
        Ok(())
    }

    /// Check the current draft; any later edit invalidates the result.
    pub fn evaluate(&self) -> Result<Vec<FfiWarning>, RxCheckError> {
        let mut session = self.session.lock()?;
        let warnings = session.evaluate(&self.evaluator)?;
        Ok(warnings.iter().cloned().map(Into::into).collect())
    }

    pub fn acknowledge(&self, override_reason: Option<String>) -> Result<(), RxCheckError> {
        self.session.lock()?.acknowledge(override_reason)?;
        Ok(())
    }
}

/// Thread-safe formulary store wrapper for FFI.
#[derive(uniffi::Object)]
pub struct RxCheckStore {
    db: Mutex<Database>,
}

#[uniffi::export]
impl RxCheckStore {
    /// Validate and store a formulary snapshot. Returns false if it was already stored.
    ///
    /// Validation compiles with `options_json`; pass the options later given
    /// to [`RxCheckStore::active_engine`].
    pub fn store_formulary(
        &self,
        formulary_json: String,
        options_json: Option<String>,
    ) -> Result<bool, RxCheckError> {
        let config = FormularyConfig::from_json(&formulary_json)?;
        let options = parse_options(options_json.as_deref())?;
        // reject data that would not compile before it can become active
        RuleSet::compile_with(&config, options)?;
        let db = self.db.lock()?;
        Ok(db.store_formulary(&config)? == db::StoreOutcome::Inserted)
    }

    pub fn activate_formulary(&self, version: String) -> Result<(), RxCheckError> {
        let mut db = self.db.lock()?;
        db.activate_formulary(&version)?;
        Ok(())
    }

    /// Engine for the active formulary, if one was activated.
    pub fn active_engine(
        &self,
        options_json: Option<String>,
    ) -> Result<Option<Arc<RxCheckEngine>>, RxCheckError> {
        let options = parse_options(options_json.as_deref())?;
        let db = self.db.lock()?;
        let Some(config) = db.active_formulary()? else {
            return Ok(None);
        };
        Ok(Some(Arc::new(RxCheckEngine {
            evaluator: SafetyEvaluator::from_config(&config, options)?,
        })))
    }

    pub fn list_formulary_versions(&self) -> Result<Vec<FfiFormularyVersion>, RxCheckError> {
        let db = self.db.lock()?;
        let versions = db.list_formulary_versions()?;
        Ok(versions.into_iter().map(Into::into).collect())
    }

    /// Save a session and log the override if warnings were acknowledged.
    ///
    /// Returns the saved prescription as JSON.
    pub fn save_session(&self, session: Arc<RxCheckSession>) -> Result<String, RxCheckError> {
        let db = self.db.lock()?;
        let saved = session.session.lock()?.save()?;
        db.record_acknowledgement(&saved)?;
        Ok(serde_json::to_string_pretty(&saved)?)
    }

    /// Acknowledged overrides recorded for a patient, as JSON.
    pub fn acknowledgements_json(&self, patient_id: String) -> Result<String, RxCheckError> {
        let db = self.db.lock()?;
        let records = db.acknowledgements_for_patient(&patient_id)?;
        Ok(serde_json::to_string_pretty(&records)?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe medication line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedication {
    pub raw_name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub timing: Option<String>,
    pub route: Option<String>,
}

impl From<FfiMedication> for MedicationEntry {
    fn from(m: FfiMedication) -> Self {
        MedicationEntry {
            raw_name: m.raw_name,
            dosage: m.dosage,
            frequency: m.frequency,
            duration: m.duration,
            timing: m.timing,
            route: m.route,
        }
    }
}

/// FFI-safe resolution.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiResolution {
    pub drug: String,
    pub display_name: String,
    pub method: String,
    pub matched: String,
}

/// FFI-safe warning; `kind` is "drug-drug" or "condition".
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiWarning {
    pub kind: String,
    pub severity: String,
    pub drugs: Vec<String>,
    pub display: String,
    pub condition: Option<String>,
    pub message: Option<String>,
    pub source: Option<String>,
    /// Full text block as shown to the clinician
    pub text: String,
}

impl From<Warning> for FfiWarning {
    fn from(warning: Warning) -> Self {
        let text = report::render_warnings(std::slice::from_ref(&warning));
        let severity = warning.severity().label().to_string();
        match warning {
            Warning::Interaction(w) => Self {
                kind: "drug-drug".into(),
                severity,
                display: format!("{} + {}", w.display_a, w.display_b),
                drugs: vec![w.drug_a.into(), w.drug_b.into()],
                condition: None,
                message: None,
                source: None,
                text,
            },
            Warning::Condition(w) => Self {
                kind: "condition".into(),
                severity,
                drugs: vec![w.drug.into()],
                display: w.display_name,
                condition: Some(w.condition.as_str().to_string()),
                message: Some(w.message),
                source: Some(w.source),
                text,
            },
        }
    }
}

/// FFI-safe stored formulary version.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFormularyVersion {
    pub version: String,
    pub fingerprint: String,
    pub active: bool,
    pub stored_at: String,
}

impl From<db::FormularyVersion> for FfiFormularyVersion {
    fn from(v: db::FormularyVersion) -> Self {
        Self {
            version: v.version,
            fingerprint: v.fingerprint,
            active: v.active,
            stored_at: v.stored_at,
        }
    }
}
