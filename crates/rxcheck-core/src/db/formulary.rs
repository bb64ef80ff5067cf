//! Formulary snapshot storage.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use tracing::info;

use super::{Database, DbError, DbResult};
use crate::config::FormularyConfig;

/// Result of storing a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted,
    /// Same version with identical content was already present
    Unchanged,
}

/// A stored version, without its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormularyVersion {
    pub version: String,
    pub fingerprint: String,
    pub active: bool,
    pub stored_at: String,
}

impl Database {
    /// Store a formulary snapshot under its version.
    ///
    /// Versions are immutable: storing different content under an existing
    /// version is a [`DbError::Conflict`].
    pub fn store_formulary(&self, config: &FormularyConfig) -> DbResult<StoreOutcome> {
        let fingerprint = config.fingerprint()?;

        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT fingerprint FROM formulary_versions WHERE version = ?",
                [&config.version],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(stored) if stored == fingerprint => return Ok(StoreOutcome::Unchanged),
            Some(_) => return Err(DbError::Conflict(config.version.clone())),
            None => {}
        }

        let payload = config.to_json()?;
        self.conn.execute(
            r#"
            INSERT INTO formulary_versions (version, fingerprint, payload, active)
            VALUES (?1, ?2, ?3, 0)
            "#,
            params![config.version, fingerprint, payload],
        )?;

        info!(version = %config.version, fingerprint = %fingerprint, "stored formulary");
        Ok(StoreOutcome::Inserted)
    }

    /// Make a stored version the active one.
    pub fn activate_formulary(&mut self, version: &str) -> DbResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("UPDATE formulary_versions SET active = 0 WHERE active = 1", [])?;
        let rows = tx.execute(
            "UPDATE formulary_versions SET active = 1 WHERE version = ?",
            [version],
        )?;
        if rows == 0 {
            // dropping the transaction rolls back the deactivation
            return Err(DbError::NotFound(format!("formulary {version}")));
        }
        tx.commit()?;

        info!(version = %version, "activated formulary");
        Ok(())
    }

    /// Load a stored version, verifying its fingerprint.
    pub fn load_formulary(&self, version: &str) -> DbResult<Option<FormularyConfig>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT fingerprint, payload FROM formulary_versions WHERE version = ?",
                [version],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(fingerprint, payload)| decode_snapshot(version, &fingerprint, &payload))
            .transpose()
    }

    /// The active formulary, if one was activated.
    pub fn active_formulary(&self) -> DbResult<Option<FormularyConfig>> {
        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT version, fingerprint, payload FROM formulary_versions WHERE active = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(version, fingerprint, payload)| decode_snapshot(&version, &fingerprint, &payload))
            .transpose()
    }

    /// All stored versions, newest first.
    pub fn list_formulary_versions(&self) -> DbResult<Vec<FormularyVersion>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT version, fingerprint, active, stored_at
            FROM formulary_versions
            ORDER BY stored_at DESC, version DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(FormularyVersion {
                version: row.get(0)?,
                fingerprint: row.get(1)?,
                active: row.get::<_, i64>(2)? != 0,
                stored_at: row.get(3)?,
            })
        })?;

        let mut versions = Vec::new();
        for row in rows {
            versions.push(row?);
        }
        Ok(versions)
    }
}

fn decode_snapshot(version: &str, fingerprint: &str, payload: &str) -> DbResult<FormularyConfig> {
    let config = FormularyConfig::from_json(payload)?;
    if config.fingerprint()? != fingerprint {
        return Err(DbError::Integrity(version.to_string()));
    }
    Ok(config)
}
