//! Local SQLite database layer for the two-base back office.
//!
//! Uses rusqlite with WAL mode. Provides schema migrations and the managed
//! connection state shared by the service commands. Money columns are
//! INTEGER in the smallest currency unit; dates are TEXT `YYYY-MM-DD` and
//! billing months TEXT `YYYY-MM`.

use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, warn};

/// Managed state holding the database connection.
pub struct DbState {
    pub conn: Mutex<Connection>,
    pub db_path: PathBuf,
}

/// Current schema version. Bump when adding new migrations.
const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Initialize the database at `{data_dir}/office.db`.
///
/// Creates the directory if needed, opens the connection, sets pragmas,
/// and runs any pending migrations. On corruption or open failure,
/// deletes the file and retries once.
pub fn init(data_dir: &Path) -> Result<DbState, String> {
    fs::create_dir_all(data_dir).map_err(|e| format!("Failed to create data dir: {e}"))?;

    let db_path = data_dir.join("office.db");
    info!("Opening database at {}", db_path.display());

    let conn = match open_and_configure(&db_path) {
        Ok(c) => c,
        Err(first_err) => {
            warn!(
                "Database open failed ({}), deleting and retrying once",
                first_err
            );
            if db_path.exists() {
                let _ = fs::remove_file(&db_path);
                // Also remove WAL/SHM files if present
                let wal = db_path.with_extension("db-wal");
                let shm = db_path.with_extension("db-shm");
                let _ = fs::remove_file(&wal);
                let _ = fs::remove_file(&shm);
            }
            open_and_configure(&db_path)
                .map_err(|e| format!("Database open failed after retry: {e}"))?
        }
    };

    run_migrations(&conn)?;

    info!("Database initialized (schema v{CURRENT_SCHEMA_VERSION})");

    Ok(DbState {
        conn: Mutex::new(conn),
        db_path,
    })
}

/// Open the database file and apply pragmas.
fn open_and_configure(path: &Path) -> Result<Connection, String> {
    let conn = Connection::open(path).map_err(|e| format!("sqlite open: {e}"))?;

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )
    .map_err(|e| format!("pragma setup: {e}"))?;

    Ok(conn)
}

/// Run all pending migrations up to `CURRENT_SCHEMA_VERSION`.
fn run_migrations(conn: &Connection) -> Result<(), String> {
    // Ensure schema_version table exists first
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| format!("create schema_version: {e}"))?;

    let current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current >= CURRENT_SCHEMA_VERSION {
        info!("Database schema up to date (v{current})");
        return Ok(());
    }

    info!("Migrating database from v{current} to v{CURRENT_SCHEMA_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }
    if current < 2 {
        migrate_v2(conn)?;
    }
    if current < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

/// Migration v1: daily sales and shared daily expenses.
///
/// One `daily_sales` row per (date, store); one `daily_expenses` row per
/// date. Both are upserted in place by the entry commands, never appended.
fn migrate_v1(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        -- daily_sales (per-store revenue by payment channel)
        CREATE TABLE IF NOT EXISTS daily_sales (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            store_type TEXT NOT NULL CHECK (store_type IN ('base1', 'base3')),
            card INTEGER NOT NULL DEFAULT 0,
            cash INTEGER NOT NULL DEFAULT 0,
            delivery_app INTEGER NOT NULL DEFAULT 0,
            note TEXT DEFAULT '',
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            UNIQUE(date, store_type)
        );

        -- daily_expenses (shared costs, not attributable to one store)
        CREATE TABLE IF NOT EXISTS daily_expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT UNIQUE NOT NULL,
            gosen INTEGER NOT NULL DEFAULT 0,
            hangang INTEGER NOT NULL DEFAULT 0,
            etc INTEGER NOT NULL DEFAULT 0,
            note TEXT DEFAULT '',
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        );

        -- Record migration
        INSERT INTO schema_version (version) VALUES (1);
        ",
    )
    .map_err(|e| {
        error!("Migration v1 failed: {e}");
        format!("migration v1: {e}")
    })?;

    info!("Applied migration v1");
    Ok(())
}

/// Migration v2: manually entered monthly fixed costs per store.
///
/// `water` is only ever entered for base1; it stays at its zero default for
/// base3 rows.
fn migrate_v2(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS monthly_costs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            year_month TEXT NOT NULL,
            store_type TEXT NOT NULL CHECK (store_type IN ('base1', 'base3')),
            water INTEGER NOT NULL DEFAULT 0,
            internet INTEGER NOT NULL DEFAULT 0,
            electricity INTEGER NOT NULL DEFAULT 0,
            cleaning INTEGER NOT NULL DEFAULT 0,
            card_fee INTEGER NOT NULL DEFAULT 0,
            operation INTEGER NOT NULL DEFAULT 0,
            caps INTEGER NOT NULL DEFAULT 0,
            etc1 INTEGER NOT NULL DEFAULT 0,
            etc2 INTEGER NOT NULL DEFAULT 0,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            UNIQUE(year_month, store_type)
        );

        -- Record migration
        INSERT INTO schema_version (version) VALUES (2);
        ",
    )
    .map_err(|e| {
        error!("Migration v2 failed: {e}");
        format!("migration v2: {e}")
    })?;

    info!("Applied migration v2");
    Ok(())
}

/// Migration v3: audit trail and lookup indexes.
fn migrate_v3(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        -- audit_logs (append-only, best-effort)
        CREATE TABLE IF NOT EXISTS audit_logs (
            id TEXT PRIMARY KEY,
            actor TEXT NOT NULL,
            action TEXT NOT NULL,
            target TEXT NOT NULL DEFAULT '',
            details TEXT NOT NULL DEFAULT '',
            created_at TEXT DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_daily_sales_date ON daily_sales(date);
        CREATE INDEX IF NOT EXISTS idx_daily_expenses_date ON daily_expenses(date);
        CREATE INDEX IF NOT EXISTS idx_monthly_costs_month ON monthly_costs(year_month);
        CREATE INDEX IF NOT EXISTS idx_audit_logs_created_at ON audit_logs(created_at);

        -- Record migration
        INSERT INTO schema_version (version) VALUES (3);
        ",
    )
    .map_err(|e| {
        error!("Migration v3 failed: {e}");
        format!("migration v3: {e}")
    })?;

    info!("Applied migration v3");
    Ok(())
}

/// Run all migrations on the given connection (test helper, not public API).
#[cfg(test)]
pub fn run_migrations_for_test(conn: &Connection) {
    run_migrations(conn).expect("run_migrations should succeed in test");
}

// ===========================================================================
// Tests
// ===========================================================================
