//! Audit log of prescriptions saved over safety warnings.

use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Database, DbResult};
use crate::evaluator::SavedPrescription;
use crate::models::{MedicationEntry, Warning};

/// One acknowledged override, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcknowledgementRecord {
    pub session_id: String,
    pub patient_id: String,
    pub formulary_version: String,
    pub warnings: Vec<Warning>,
    pub medications: Vec<MedicationEntry>,
    pub doctor_notes: Option<String>,
    pub saved_at: String,
}

/// Database row representation.
struct AcknowledgementRow {
    session_id: String,
    patient_id: String,
    formulary_version: String,
    warnings: String,
    medications: String,
    doctor_notes: Option<String>,
    saved_at: String,
}

impl TryFrom<AcknowledgementRow> for AcknowledgementRecord {
    type Error = serde_json::Error;

    fn try_from(row: AcknowledgementRow) -> Result<Self, Self::Error> {
        Ok(Self {
            session_id: row.session_id,
            patient_id: row.patient_id,
            formulary_version: row.formulary_version,
            warnings: serde_json::from_str(&row.warnings)?,
            medications: serde_json::from_str(&row.medications)?,
            doctor_notes: row.doctor_notes,
            saved_at: row.saved_at,
        })
    }
}

impl Database {
    /// Record a saved prescription if its warnings were acknowledged.
    ///
    /// Returns `false` (and stores nothing) for prescriptions saved clean.
    pub fn record_acknowledgement(&self, saved: &SavedPrescription) -> DbResult<bool> {
        if !saved.warnings_acknowledged {
            return Ok(false);
        }

        let warnings = serde_json::to_string(&saved.warnings)?;
        let medications = serde_json::to_string(&saved.medications)?;

        self.conn.execute(
            r#"
            INSERT INTO warning_acknowledgements
                (session_id, patient_id, formulary_version, warnings, medications, doctor_notes, saved_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                saved.session_id,
                saved.patient_id,
                saved.formulary_version,
                warnings,
                medications,
                saved.doctor_notes,
                saved.saved_at,
            ],
        )?;

        info!(
            session_id = %saved.session_id,
            warnings = saved.warnings.len(),
            "recorded warning acknowledgement"
        );
        Ok(true)
    }

    /// Acknowledgements for a patient, oldest first.
    pub fn acknowledgements_for_patient(&self, patient_id: &str) -> DbResult<Vec<AcknowledgementRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT session_id, patient_id, formulary_version, warnings, medications, doctor_notes, saved_at
            FROM warning_acknowledgements
            WHERE patient_id = ?
            ORDER BY saved_at ASC
            "#,
        )?;

        let rows = stmt.query_map([patient_id], |row| {
            Ok(AcknowledgementRow {
                session_id: row.get(0)?,
                patient_id: row.get(1)?,
                formulary_version: row.get(2)?,
                warnings: row.get(3)?,
                medications: row.get(4)?,
                doctor_notes: row.get(5)?,
                saved_at: row.get(6)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(AcknowledgementRecord::try_from(row?)?);
        }
        Ok(records)
    }
}
