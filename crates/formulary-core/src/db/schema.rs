//! SQLite schema definition.

/// Complete database schema for the formulary store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Formulary
-- ============================================================================

CREATE TABLE IF NOT EXISTS formulary (
    id TEXT PRIMARY KEY,
    medicine TEXT NOT NULL UNIQUE COLLATE NOCASE,
    therapeutic_class TEXT,
    indication TEXT,
    drug_cost REAL,
    alternative_1 TEXT,
    cost_1 REAL,
    alternative_2 TEXT,
    cost_2 REAL,
    alternative_3 TEXT,
    cost_3 REAL,
    alternative_4 TEXT,
    cost_4 REAL,
    alternative_5 TEXT,
    cost_5 REAL,
    insurance_drug TEXT,
    insurance_final_cost REAL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_formulary_medicine ON formulary(medicine);
"#;
