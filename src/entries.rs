//! Daily sales and shared-expense entry.
//!
//! One revenue row per (date, store), one shared-expense row per date.
//! Saving an existing date overwrites in place; nothing accumulates and
//! nothing is ever deleted. Reads return `null` for a row that was never
//! entered, so callers can tell a real zero from an absent day.

use rusqlite::{params, Connection};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::aggregates::BillingMonth;
use crate::money::Money;

/// One store's sales figures for a day, as entered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalesInput {
    #[serde(default)]
    pub card: Money,
    #[serde(default)]
    pub cash: Money,
    #[serde(default)]
    pub delivery: Money,
    #[serde(default)]
    pub note: String,
}

/// The day's shared expenses, as entered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseInput {
    #[serde(default)]
    pub gosen: Money,
    #[serde(default)]
    pub hangang: Money,
    #[serde(default)]
    pub etc: Money,
    #[serde(default)]
    pub note: String,
}

/// Upsert both stores' sales and the shared expenses for one date.
///
/// Runs in a single transaction: either the whole day's entry lands or
/// none of it does.
pub fn save_daily(
    conn: &mut Connection,
    date: &str,
    base1: &SalesInput,
    base3: &SalesInput,
    expense: &ExpenseInput,
) -> Result<(), rusqlite::Error> {
    let tx = conn.transaction()?;

    for (store, sales) in [("base1", base1), ("base3", base3)] {
        tx.execute(
            "INSERT INTO daily_sales (date, store_type, card, cash, delivery_app, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(date, store_type) DO UPDATE SET
                card = excluded.card,
                cash = excluded.cash,
                delivery_app = excluded.delivery_app,
                note = excluded.note,
                updated_at = datetime('now')",
            params![date, store, sales.card, sales.cash, sales.delivery, sales.note],
        )?;
    }

    tx.execute(
        "INSERT INTO daily_expenses (date, gosen, hangang, etc, note)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(date) DO UPDATE SET
            gosen = excluded.gosen,
            hangang = excluded.hangang,
            etc = excluded.etc,
            note = excluded.note,
            updated_at = datetime('now')",
        params![date, expense.gosen, expense.hangang, expense.etc, expense.note],
    )?;

    tx.commit()
}

/// Both stores' sales and the expense row for one date.
///
/// Each slot is a JSON object when the row exists and `null` when it was
/// never entered.
pub fn get_daily(conn: &Connection, date: &str) -> Result<Value, rusqlite::Error> {
    Ok(json!({
        "base1": sales_row(conn, date, "base1")?,
        "base3": sales_row(conn, date, "base3")?,
        "expense": expense_row(conn, date)?,
    }))
}

/// Per-day entry listing for a billing month, newest first.
///
/// Days appear if any of the three record types exists for them, so a day
/// with only base3 sales is still listed.
pub fn get_history(conn: &Connection, month: &BillingMonth) -> Result<Vec<Value>, rusqlite::Error> {
    let mut days: BTreeMap<String, Value> = BTreeMap::new();

    let mut stmt = conn.prepare(
        "SELECT date, store_type, card, cash, delivery_app
         FROM daily_sales
         WHERE substr(date, 1, 7) = ?1",
    )?;
    let rows = stmt.query_map(params![month.key()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            json!({
                "card": row.get::<_, Money>(2)?,
                "cash": row.get::<_, Money>(3)?,
                "delivery": row.get::<_, Money>(4)?,
            }),
        ))
    })?;
    for row in rows {
        let (date, store, sales) = row?;
        let entry = days.entry(date.clone()).or_insert_with(|| day_stub(&date));
        entry[store.as_str()] = sales;
    }

    let mut stmt = conn.prepare(
        "SELECT date, gosen, hangang, etc, note
         FROM daily_expenses
         WHERE substr(date, 1, 7) = ?1",
    )?;
    let rows = stmt.query_map(params![month.key()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            json!({
                "gosen": row.get::<_, Money>(1)?,
                "hangang": row.get::<_, Money>(2)?,
                "etc": row.get::<_, Money>(3)?,
                "note": row.get::<_, String>(4)?,
            }),
        ))
    })?;
    for row in rows {
        let (date, expense) = row?;
        let entry = days.entry(date.clone()).or_insert_with(|| day_stub(&date));
        entry["expense"] = expense;
    }

    Ok(days.into_values().rev().collect())
}

fn day_stub(date: &str) -> Value {
    json!({
        "date": date,
        "base1": Value::Null,
        "base3": Value::Null,
        "expense": Value::Null,
    })
}

fn sales_row(conn: &Connection, date: &str, store: &str) -> Result<Value, rusqlite::Error> {
    let result = conn.query_row(
        "SELECT card, cash, delivery_app, note
         FROM daily_sales
         WHERE date = ?1 AND store_type = ?2",
        params![date, store],
        |row| {
            Ok(json!({
                "card": row.get::<_, Money>(0)?,
                "cash": row.get::<_, Money>(1)?,
                "delivery": row.get::<_, Money>(2)?,
                "note": row.get::<_, String>(3)?,
            }))
        },
    );
    match result {
        Ok(v) => Ok(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(Value::Null),
        Err(e) => Err(e),
    }
}

fn expense_row(conn: &Connection, date: &str) -> Result<Value, rusqlite::Error> {
    let result = conn.query_row(
        "SELECT gosen, hangang, etc, note FROM daily_expenses WHERE date = ?1",
        params![date],
        |row| {
            Ok(json!({
                "gosen": row.get::<_, Money>(0)?,
                "hangang": row.get::<_, Money>(1)?,
                "etc": row.get::<_, Money>(2)?,
                "note": row.get::<_, String>(3)?,
            }))
        },
    );
    match result {
        Ok(v) => Ok(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(Value::Null),
        Err(e) => Err(e),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        db::run_migrations_for_test(&conn);
        conn
    }

    fn sales(card: Money, cash: Money, delivery: Money) -> SalesInput {
        SalesInput {
            card,
            cash,
            delivery,
            note: String::new(),
        }
    }

    #[test]
    fn save_daily_inserts_both_stores_and_expense() {
        let mut conn = test_db();
        let expense = ExpenseInput {
            gosen: 100,
            hangang: 50,
            etc: 25,
            note: "market run".into(),
        };
        save_daily(
            &mut conn,
            "2025-03-01",
            &sales(1000, 500, 200),
            &sales(100, 50, 25),
            &expense,
        )
        .expect("save");

        let day = get_daily(&conn, "2025-03-01").expect("get");
        assert_eq!(day["base1"]["card"], 1000);
        assert_eq!(day["base3"]["delivery"], 25);
        assert_eq!(day["expense"]["gosen"], 100);
        assert_eq!(day["expense"]["note"], "market run");
    }

    #[test]
    fn save_daily_overwrites_in_place() {
        let mut conn = test_db();
        save_daily(
            &mut conn,
            "2025-03-01",
            &sales(1000, 0, 0),
            &sales(0, 0, 0),
            &ExpenseInput::default(),
        )
        .expect("first save");
        save_daily(
            &mut conn,
            "2025-03-01",
            &sales(2500, 0, 0),
            &sales(0, 0, 0),
            &ExpenseInput::default(),
        )
        .expect("second save");

        let day = get_daily(&conn, "2025-03-01").expect("get");
        assert_eq!(day["base1"]["card"], 2500, "upsert must not accumulate");

        let rows: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM daily_sales WHERE date = '2025-03-01' AND store_type = 'base1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn get_daily_returns_null_for_absent_rows() {
        let conn = test_db();
        let day = get_daily(&conn, "2025-03-09").expect("get");
        assert!(day["base1"].is_null());
        assert!(day["base3"].is_null());
        assert!(day["expense"].is_null());
    }

    #[test]
    fn history_lists_days_newest_first_and_keeps_base3_only_days() {
        let mut conn = test_db();
        save_daily(
            &mut conn,
            "2025-03-01",
            &sales(1000, 0, 0),
            &sales(0, 0, 0),
            &ExpenseInput::default(),
        )
        .unwrap();
        // A day entered only through base3's column of the form
        conn.execute(
            "INSERT INTO daily_sales (date, store_type, card) VALUES ('2025-03-05', 'base3', 700)",
            [],
        )
        .unwrap();
        // Different month must not leak in
        conn.execute(
            "INSERT INTO daily_sales (date, store_type, card) VALUES ('2025-04-01', 'base1', 1)",
            [],
        )
        .unwrap();

        let month = BillingMonth::parse("2025-03").unwrap();
        let history = get_history(&conn, &month).expect("history");

        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["date"], "2025-03-05");
        assert_eq!(history[0]["base3"]["card"], 700);
        assert!(history[0]["base1"].is_null());
        assert_eq!(history[1]["date"], "2025-03-01");
    }
}
