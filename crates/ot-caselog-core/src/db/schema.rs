//! SQLite schema definition.

/// Complete database schema for the case log.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Case Logs
-- ============================================================================

CREATE TABLE IF NOT EXISTS case_logs (
    case_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    surgery_date TEXT NOT NULL,                  -- YYYY-MM-DD
    location TEXT,
    is_emergency INTEGER NOT NULL DEFAULT 0,
    patient_id TEXT NOT NULL,
    age INTEGER NOT NULL CHECK (age BETWEEN 0 AND 120),
    sex TEXT NOT NULL,
    asa_grade TEXT NOT NULL CHECK (asa_grade IN ('I', 'II', 'III', 'IV', 'V')),
    comorbidities TEXT NOT NULL DEFAULT '[]',    -- JSON array of strings
    specialty TEXT NOT NULL,
    surgery_type TEXT NOT NULL,
    patient_position TEXT NOT NULL,
    anesthesia_technique TEXT NOT NULL,
    has_adjuvants INTEGER NOT NULL DEFAULT 0,
    adjuvant_details TEXT,
    block_details TEXT,                          -- JSON object, NULL unless regional
    duration INTEGER NOT NULL CHECK (duration >= 1),
    hemodynamic_status TEXT NOT NULL,
    has_airway_difficulty INTEGER NOT NULL DEFAULT 0,
    complications TEXT NOT NULL DEFAULT '[]',    -- JSON array of strings
    post_op_analgesia TEXT NOT NULL,
    rescue_analgesia_required INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    created_at TEXT NOT NULL,                    -- RFC 3339, UTC
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_case_logs_user_created ON case_logs(user_id, created_at);
CREATE INDEX IF NOT EXISTS idx_case_logs_user_date ON case_logs(user_id, surgery_date);

-- ============================================================================
-- User Preferences
-- ============================================================================

CREATE TABLE IF NOT EXISTS user_preferences (
    user_id TEXT PRIMARY KEY,
    last_used_technique TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
