//! Prescription authoring session.
//!
//! The caller owns one session per prescription being written. It tracks the
//! draft and enforces the save gate: a draft with warnings can only be saved
//! after they were acknowledged, and any edit invalidates the last check.
//!
//! ```text
//! Empty ──add──▶ Drafting ──evaluate (warnings)──▶ Warned ──acknowledge──▶ Acknowledged
//!                  │  ▲                               │                        │
//!                  │  └────────────── any edit ───────┴────────────────────────┤
//!                  └──────────── save (no warnings) ──▶ Saved ◀────── save ─────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::SafetyEvaluator;
use crate::models::{Condition, MedicationEntry, PatientContext, Warning};

/// Doctor's note recorded when warnings are acknowledged without a reason.
pub const DEFAULT_ACKNOWLEDGEMENT_NOTE: &str = "Warnings acknowledged by prescribing physician.";

/// Session errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session already saved")]
    Closed,

    #[error("Prescription has no medications")]
    NoMedications,

    #[error("Prescription changed since the last safety check")]
    NotEvaluated,

    #[error("Safety warnings must be acknowledged before saving")]
    Unacknowledged,

    #[error("No warnings to acknowledge")]
    NothingToAcknowledge,

    #[error("No medication at position {0}")]
    NoMedicationAt(usize),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Where a session is in the authoring flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Empty,
    Drafting,
    Warned,
    Acknowledged,
    Saved,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Empty => "empty",
            SessionState::Drafting => "drafting",
            SessionState::Warned => "warned",
            SessionState::Acknowledged => "acknowledged",
            SessionState::Saved => "saved",
        }
    }
}

/// A prescription as committed by [`PrescriptionSession::save`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPrescription {
    pub session_id: String,
    pub patient_id: String,
    pub conditions: Vec<Condition>,
    pub medications: Vec<MedicationEntry>,
    /// Warnings shown at the time of saving
    pub warnings: Vec<Warning>,
    pub warnings_acknowledged: bool,
    /// Override reason, or the default note, when warnings were acknowledged
    pub doctor_notes: Option<String>,
    /// Formulary version the final check ran against
    pub formulary_version: String,
    pub saved_at: String,
}

/// One prescription being written for one patient.
#[derive(Debug, Clone)]
pub struct PrescriptionSession {
    session_id: String,
    patient_id: String,
    patient: PatientContext,
    medications: Vec<MedicationEntry>,
    warnings: Vec<Warning>,
    /// Formulary version of the last check; `None` once an edit makes it stale
    evaluated_with: Option<String>,
    override_reason: Option<String>,
    state: SessionState,
    created_at: String,
}

impl PrescriptionSession {
    /// Start a session for a patient with known conditions.
    pub fn new(patient_id: impl Into<String>, patient: PatientContext) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            patient,
            medications: Vec::new(),
            warnings: Vec::new(),
            evaluated_with: None,
            override_reason: None,
            state: SessionState::Empty,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn patient(&self) -> &PatientContext {
        &self.patient
    }

    pub fn medications(&self) -> &[MedicationEntry] {
        &self.medications
    }

    /// Warnings from the last check; empty after an edit.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// True when the draft changed since the last check (or was never checked).
    pub fn needs_evaluation(&self) -> bool {
        self.state != SessionState::Saved && self.evaluated_with.is_none()
    }

    pub fn set_conditions<I: IntoIterator<Item = Condition>>(&mut self, conditions: I) -> SessionResult<()> {
        self.ensure_open()?;
        self.patient = PatientContext::new(conditions);
        self.mark_edited();
        Ok(())
    }

    pub fn add_medication(&mut self, entry: MedicationEntry) -> SessionResult<()> {
        self.ensure_open()?;
        self.medications.push(entry);
        self.mark_edited();
        Ok(())
    }

    pub fn update_medication(&mut self, index: usize, entry: MedicationEntry) -> SessionResult<()> {
        self.ensure_open()?;
        let slot = self
            .medications
            .get_mut(index)
            .ok_or(SessionError::NoMedicationAt(index))?;
        *slot = entry;
        self.mark_edited();
        Ok(())
    }

    pub fn remove_medication(&mut self, index: usize) -> SessionResult<MedicationEntry> {
        self.ensure_open()?;
        if index >= self.medications.len() {
            return Err(SessionError::NoMedicationAt(index));
        }
        let removed = self.medications.remove(index);
        self.mark_edited();
        Ok(removed)
    }

    /// Run the safety check on the current draft.
    pub fn evaluate(&mut self, evaluator: &SafetyEvaluator) -> SessionResult<&[Warning]> {
        self.ensure_open()?;
        self.warnings = evaluator.evaluate(&self.patient, &self.medications);
        self.evaluated_with = Some(evaluator.rules().version().to_string());
        self.override_reason = None;
        self.state = if !self.warnings.is_empty() {
            SessionState::Warned
        } else if self.medications.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Drafting
        };
        Ok(&self.warnings)
    }

    /// Accept the current warnings, optionally with a reason for the override.
    pub fn acknowledge(&mut self, override_reason: Option<String>) -> SessionResult<()> {
        self.ensure_open()?;
        if self.evaluated_with.is_none() {
            return Err(SessionError::NotEvaluated);
        }
        if self.state != SessionState::Warned && self.state != SessionState::Acknowledged {
            return Err(SessionError::NothingToAcknowledge);
        }
        self.override_reason = override_reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());
        self.state = SessionState::Acknowledged;
        Ok(())
    }

    /// Commit the prescription. Terminal: the session rejects further calls.
    pub fn save(&mut self) -> SessionResult<SavedPrescription> {
        self.ensure_open()?;
        if self.medications.is_empty() {
            return Err(SessionError::NoMedications);
        }
        let formulary_version = self
            .evaluated_with
            .clone()
            .ok_or(SessionError::NotEvaluated)?;
        if self.state == SessionState::Warned {
            return Err(SessionError::Unacknowledged);
        }

        let acknowledged = !self.warnings.is_empty();
        let doctor_notes = acknowledged.then(|| {
            self.override_reason
                .clone()
                .unwrap_or_else(|| DEFAULT_ACKNOWLEDGEMENT_NOTE.to_string())
        });

        if acknowledged {
            warn!(
                session_id = %self.session_id,
                warnings = self.warnings.len(),
                "prescription saved over acknowledged warnings"
            );
        } else {
            info!(session_id = %self.session_id, "prescription saved");
        }

        self.state = SessionState::Saved;
        Ok(SavedPrescription {
            session_id: self.session_id.clone(),
            patient_id: self.patient_id.clone(),
            conditions: self.patient.conditions.iter().copied().collect(),
            medications: self.medications.clone(),
            warnings: self.warnings.clone(),
            warnings_acknowledged: acknowledged,
            doctor_notes,
            formulary_version,
            saved_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    fn ensure_open(&self) -> SessionResult<()> {
        if self.state == SessionState::Saved {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    fn mark_edited(&mut self) {
        self.warnings.clear();
        self.evaluated_with = None;
        self.override_reason = None;
        self.state = if self.medications.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Drafting
        };
    }
}
