use rusqlite::{Connection, OptionalExtension, params};

/// Version written to `system_metadata.schema_version` once all migrations ran.
pub const SCHEMA_VERSION: u32 = 2;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS symbols (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL UNIQUE,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    last_price REAL,
    last_price_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_symbols_active ON symbols(is_active);

CREATE TABLE IF NOT EXISTS price_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol_id INTEGER NOT NULL REFERENCES symbols(id),
    timestamp INTEGER NOT NULL,
    open REAL NOT NULL,
    high REAL NOT NULL,
    low REAL NOT NULL,
    close REAL NOT NULL,
    volume REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(symbol_id, timestamp)
);
CREATE INDEX IF NOT EXISTS idx_price_symbol_ts ON price_data(symbol_id, timestamp DESC);

CREATE TABLE IF NOT EXISTS system_metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

/// Create missing tables and apply pending migrations. Safe to run repeatedly.
pub(crate) fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    add_datetime_column(conn)?;
    set_metadata(conn, "schema_version", &SCHEMA_VERSION.to_string())?;
    Ok(())
}

// Virtual generated columns are hidden from PRAGMA table_info, so test for it with a query.
fn add_datetime_column(conn: &Connection) -> rusqlite::Result<()> {
    if conn.prepare("SELECT datetime FROM price_data LIMIT 1").is_ok() {
        tracing::debug!("datetime column already present");
        return Ok(());
    }
    tracing::info!("adding datetime column to price_data");
    conn.execute_batch(
        "ALTER TABLE price_data ADD COLUMN datetime TEXT
         GENERATED ALWAYS AS (strftime('%Y-%m-%d %H:%M:%S', timestamp / 1000, 'unixepoch')) VIRTUAL;",
    )
}

pub(crate) fn get_metadata(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM system_metadata WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub(crate) fn set_metadata(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO system_metadata (key, value, updated_at)
         VALUES (?1, ?2, CURRENT_TIMESTAMP)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}
