//! SQL schema for the Carelog SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// The UNIQUE constraints back up replace-on-commit; they never fire during a
/// replace because every key is deleted before it is re-inserted.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One reading per resident per day, taken at breakfast.
CREATE TABLE IF NOT EXISTS vitals (
    record_id   TEXT PRIMARY KEY,
    resident_id TEXT NOT NULL,
    date        TEXT NOT NULL,      -- YYYY-MM-DD
    meal_window TEXT NOT NULL CHECK (meal_window = 'breakfast'),
    systolic    INTEGER NOT NULL,
    diastolic   INTEGER NOT NULL,
    pulse       INTEGER NOT NULL,
    recorded_at TEXT NOT NULL,      -- ISO 8601 UTC; server-assigned
    UNIQUE (resident_id, date)
);

CREATE TABLE IF NOT EXISTS food_intake (
    record_id    TEXT PRIMARY KEY,
    resident_id  TEXT NOT NULL,
    date         TEXT NOT NULL,
    meal_window  TEXT NOT NULL,     -- 'breakfast' | 'lunch' | 'dinner'
    intake_level TEXT NOT NULL,     -- '25%' | '50%' | '75%' | '100%' | 'Ensure' | 'Other'
    notes        TEXT,              -- only for 'Other'
    recorded_at  TEXT NOT NULL,
    UNIQUE (resident_id, date, meal_window)
);

-- Up to three rows per meal: a single choice or one row per filled slot.
CREATE TABLE IF NOT EXISTS liquid_intake (
    record_id   TEXT PRIMARY KEY,
    resident_id TEXT NOT NULL,
    date        TEXT NOT NULL,
    meal_window TEXT NOT NULL,
    intake      TEXT NOT NULL,      -- 'Yes' | 'No' | 'Partial' | 'slot N: value'
    recorded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bowel_movements (
    record_id   TEXT PRIMARY KEY,
    resident_id TEXT NOT NULL,
    date        TEXT NOT NULL,
    meal_window TEXT NOT NULL,
    size        TEXT NOT NULL,      -- 'Small' | 'Medium' | 'Large'
    consistency TEXT NOT NULL,      -- 'Soft' | 'Medium' | 'Hard'
    recorded_at TEXT NOT NULL,
    UNIQUE (resident_id, date, meal_window)
);

CREATE TABLE IF NOT EXISTS urine_output (
    record_id   TEXT PRIMARY KEY,
    resident_id TEXT NOT NULL,
    date        TEXT NOT NULL,
    meal_window TEXT NOT NULL,
    output      TEXT NOT NULL,      -- 'Yes' | 'No'
    recorded_at TEXT NOT NULL,
    UNIQUE (resident_id, date, meal_window)
);

-- Append-only.
CREATE TABLE IF NOT EXISTS audit_log (
    entry_id    TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    action      TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS liquid_key_idx ON liquid_intake(resident_id, date, meal_window);
CREATE INDEX IF NOT EXISTS audit_recorded_idx ON audit_log(recorded_at);

PRAGMA user_version = 1;
";
