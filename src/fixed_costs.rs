//! Monthly fixed-cost entry per store.
//!
//! One row per (billing month, store), upserted in place. Categories left
//! out of an entry default to zero; `water` is a base1-only line in
//! practice and simply stays zero on base3 rows.

use rusqlite::{params, Connection};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::aggregates::BillingMonth;
use crate::money::Money;

/// One store's manual fixed-cost categories, as entered.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedCostInput {
    #[serde(default)]
    pub water: Money,
    #[serde(default)]
    pub internet: Money,
    #[serde(default)]
    pub electricity: Money,
    #[serde(default)]
    pub cleaning: Money,
    #[serde(default, alias = "card_fee")]
    pub card_fee: Money,
    #[serde(default)]
    pub operation: Money,
    #[serde(default)]
    pub caps: Money,
    #[serde(default)]
    pub etc1: Money,
    #[serde(default)]
    pub etc2: Money,
}

/// Upsert both stores' fixed costs for one billing month.
pub fn save_monthly(
    conn: &mut Connection,
    month: &BillingMonth,
    base1: &FixedCostInput,
    base3: &FixedCostInput,
) -> Result<(), rusqlite::Error> {
    let tx = conn.transaction()?;

    for (store, costs) in [("base1", base1), ("base3", base3)] {
        tx.execute(
            "INSERT INTO monthly_costs
                (year_month, store_type, water, internet, electricity, cleaning,
                 card_fee, operation, caps, etc1, etc2)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(year_month, store_type) DO UPDATE SET
                water = excluded.water,
                internet = excluded.internet,
                electricity = excluded.electricity,
                cleaning = excluded.cleaning,
                card_fee = excluded.card_fee,
                operation = excluded.operation,
                caps = excluded.caps,
                etc1 = excluded.etc1,
                etc2 = excluded.etc2,
                updated_at = datetime('now')",
            params![
                month.key(),
                store,
                costs.water,
                costs.internet,
                costs.electricity,
                costs.cleaning,
                costs.card_fee,
                costs.operation,
                costs.caps,
                costs.etc1,
                costs.etc2
            ],
        )?;
    }

    tx.commit()
}

/// Both stores' fixed-cost rows for a billing month.
///
/// A store with no row yet maps to `null`, not a zero-filled object.
pub fn get_monthly(conn: &Connection, month: &BillingMonth) -> Result<Value, rusqlite::Error> {
    Ok(json!({
        "base1": cost_row(conn, month, "base1")?,
        "base3": cost_row(conn, month, "base3")?,
    }))
}

fn cost_row(
    conn: &Connection,
    month: &BillingMonth,
    store: &str,
) -> Result<Value, rusqlite::Error> {
    let result = conn.query_row(
        "SELECT water, internet, electricity, cleaning, card_fee,
                operation, caps, etc1, etc2
         FROM monthly_costs
         WHERE year_month = ?1 AND store_type = ?2",
        params![month.key(), store],
        |row| {
            Ok(json!({
                "water": row.get::<_, Money>(0)?,
                "internet": row.get::<_, Money>(1)?,
                "electricity": row.get::<_, Money>(2)?,
                "cleaning": row.get::<_, Money>(3)?,
                "cardFee": row.get::<_, Money>(4)?,
                "operation": row.get::<_, Money>(5)?,
                "caps": row.get::<_, Money>(6)?,
                "etc1": row.get::<_, Money>(7)?,
                "etc2": row.get::<_, Money>(8)?,
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
