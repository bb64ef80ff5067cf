//! SQLite schema definition.

/// Complete database schema for rxcheck.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Formulary Versions
-- ============================================================================

CREATE TABLE IF NOT EXISTS formulary_versions (
    version TEXT PRIMARY KEY,
    fingerprint TEXT NOT NULL,                   -- SHA-256 of payload
    payload TEXT NOT NULL,                       -- JSON FormularyConfig
    active INTEGER NOT NULL DEFAULT 0,
    stored_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- At most one active formulary
CREATE UNIQUE INDEX IF NOT EXISTS idx_formulary_single_active
    ON formulary_versions(active) WHERE active = 1;

-- ============================================================================
-- Warning Acknowledgements (Append-Only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS warning_acknowledgements (
    session_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    formulary_version TEXT NOT NULL,
    warnings TEXT NOT NULL DEFAULT '[]',         -- JSON array of Warning
    medications TEXT NOT NULL DEFAULT '[]',      -- JSON array of MedicationEntry
    doctor_notes TEXT,
    saved_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ack_patient ON warning_acknowledgements(patient_id);

CREATE TRIGGER IF NOT EXISTS warning_acknowledgements_no_update
BEFORE UPDATE ON warning_acknowledgements
BEGIN
    SELECT RAISE(ABORT, 'Acknowledgements are append-only');
END;
"#;
