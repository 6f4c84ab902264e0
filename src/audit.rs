//! Append-only audit trail for mutating commands.
//!
//! Best-effort: a failed audit write is logged and swallowed so it can
//! never fail the business operation it describes.

use rusqlite::{params, Connection};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

/// Record one audit entry. Never returns an error.
pub fn record(conn: &Connection, actor: &str, action: &str, target: &str, details: &str) {
    let id = format!("al-{}", Uuid::new_v4());
    let result = conn.execute(
        "INSERT INTO audit_logs (id, actor, action, target, details)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, actor, action, target, details],
    );
    if let Err(e) = result {
        warn!(actor = %actor, action = %action, "audit log write failed: {e}");
    }
}

/// Most recent audit entries, newest first.
pub fn recent(conn: &Connection, limit: i64) -> Result<Vec<Value>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, actor, action, target, details, created_at
         FROM audit_logs
         ORDER BY created_at DESC, id DESC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit.clamp(1, 500)], |row| {
        Ok(json!({
            "id": row.get::<_, String>(0)?,
            "actor": row.get::<_, String>(1)?,
            "action": row.get::<_, String>(2)?,
            "target": row.get::<_, String>(3)?,
            "details": row.get::<_, String>(4)?,
            "createdAt": row.get::<_, String>(5)?,
        }))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}
