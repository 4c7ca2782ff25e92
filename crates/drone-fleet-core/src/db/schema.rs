//! SQLite schema definition.

/// Complete database schema for the drone fleet.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Drones
-- ============================================================================

CREATE TABLE IF NOT EXISTS drones (
    serial_number TEXT PRIMARY KEY CHECK (length(serial_number) BETWEEN 1 AND 100),
    model TEXT NOT NULL CHECK (model IN ('LIGHTWEIGHT', 'MIDDLEWEIGHT', 'CRUISERWEIGHT', 'HEAVYWEIGHT')),
    weight_limit REAL NOT NULL CHECK (weight_limit <= 1000),
    battery_capacity INTEGER NOT NULL,           -- percent, may go negative after deliveries
    state TEXT NOT NULL,                         -- IDLE, LOADING, LOADED, DELIVERING, DELIVERED, RETURNING
    version INTEGER NOT NULL DEFAULT 1,          -- bumped on every save
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_drones_state ON drones(state);

-- ============================================================================
-- Medications (catalog entries and loaded cargo)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medications (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    weight REAL NOT NULL,                        -- grams, total for `quantity`
    quantity INTEGER NOT NULL DEFAULT 0,
    code TEXT NOT NULL,
    image TEXT,
    drone_serial TEXT REFERENCES drones(serial_number),  -- NULL for catalog entries
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_medications_drone ON medications(drone_serial);
CREATE INDEX IF NOT EXISTS idx_medications_code ON medications(code);
"#;
