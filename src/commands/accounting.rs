//! Daily entry, monthly fixed costs, and the per-day history listing.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{lock_conn, parse_payload, require_analysis_access, require_entry_access};
use crate::audit;
use crate::aggregates::BillingMonth;
use crate::db::DbState;
use crate::entries::{self, ExpenseInput, SalesInput};
use crate::errors::ServiceError;
use crate::fixed_costs::{self, FixedCostInput};
use crate::identity::Caller;

// ---------------------------------------------------------------------------
// Payload shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DailyEntryPayload {
    date: String,
    #[serde(default)]
    base1: SalesInput,
    #[serde(default)]
    base3: SalesInput,
    #[serde(default)]
    expense: ExpenseInput,
}

#[derive(Debug, Deserialize)]
struct DailyQueryPayload {
    date: String,
}

#[derive(Debug, Deserialize)]
struct MonthPayload {
    month: String,
}

#[derive(Debug, Deserialize)]
struct MonthlyCostsPayload {
    month: String,
    #[serde(default)]
    base1: FixedCostInput,
    #[serde(default)]
    base3: FixedCostInput,
}

/// Accept either a bare string (`"2025-03-01"`) or an object payload.
fn normalize_string_arg(arg0: Option<Value>, key: &str) -> Option<Value> {
    match arg0 {
        Some(Value::String(s)) => Some(json!({ key: s })),
        other => other,
    }
}

fn validated_date(raw: &str) -> Result<&str, ServiceError> {
    let invalid = || ServiceError::InvalidDate(raw.to_string());
    if raw.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    Ok(raw)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Upsert one day's sales for both stores plus the shared expenses.
pub fn accounting_save_daily(
    db: &DbState,
    caller: &Caller,
    arg0: Option<Value>,
) -> Result<Value, ServiceError> {
    require_entry_access(caller)?;
    let payload: DailyEntryPayload = parse_payload(arg0)?;
    let date = validated_date(&payload.date)?;

    let mut conn = lock_conn(db)?;
    entries::save_daily(
        &mut conn,
        date,
        &payload.base1,
        &payload.base3,
        &payload.expense,
    )?;
    audit::record(
        &conn,
        &caller.name,
        "SALES_INPUT",
        date,
        "daily sales and expenses recorded",
    );
    info!(date = %date, actor = %caller.name, "daily entry saved");

    Ok(json!({ "success": true }))
}

/// One day's entry as stored; absent rows come back as `null`.
pub fn accounting_get_daily(
    db: &DbState,
    caller: &Caller,
    arg0: Option<Value>,
) -> Result<Value, ServiceError> {
    require_entry_access(caller)?;
    let payload: DailyQueryPayload = parse_payload(normalize_string_arg(arg0, "date"))?;
    let date = validated_date(&payload.date)?;

    let conn = lock_conn(db)?;
    Ok(entries::get_daily(&conn, date)?)
}

/// Per-day entry listing for one billing month, newest first.
pub fn accounting_get_history(
    db: &DbState,
    caller: &Caller,
    arg0: Option<Value>,
) -> Result<Value, ServiceError> {
    require_entry_access(caller)?;
    let payload: MonthPayload = parse_payload(normalize_string_arg(arg0, "month"))?;
    let month = BillingMonth::parse(&payload.month)?;

    let conn = lock_conn(db)?;
    let history = entries::get_history(&conn, &month)?;
    Ok(json!({ "success": true, "history": history }))
}

/// Upsert both stores' fixed costs for one billing month.
pub fn accounting_save_monthly(
    db: &DbState,
    caller: &Caller,
    arg0: Option<Value>,
) -> Result<Value, ServiceError> {
    require_analysis_access(caller)?;
    let payload: MonthlyCostsPayload = parse_payload(arg0)?;
    let month = BillingMonth::parse(&payload.month)?;

    let mut conn = lock_conn(db)?;
    fixed_costs::save_monthly(&mut conn, &month, &payload.base1, &payload.base3)?;
    audit::record(
        &conn,
        &caller.name,
        "FIXED_COST",
        &month.key(),
        "monthly fixed costs updated",
    );
    info!(month = %month, actor = %caller.name, "monthly fixed costs saved");

    Ok(json!({ "success": true }))
}

/// Both stores' fixed-cost rows for one billing month.
pub fn accounting_get_monthly(
    db: &DbState,
    caller: &Caller,
    arg0: Option<Value>,
) -> Result<Value, ServiceError> {
    require_analysis_access(caller)?;
    let payload: MonthPayload = parse_payload(normalize_string_arg(arg0, "month"))?;
    let month = BillingMonth::parse(&payload.month)?;

    let conn = lock_conn(db)?;
    Ok(fixed_costs::get_monthly(&conn, &month)?)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::identity::Role;
    use rusqlite::Connection;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn test_state() -> DbState {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        db::run_migrations_for_test(&conn);
        DbState {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        }
    }

    fn caller(role: Role) -> Caller {
        Caller {
            id: "u-1".into(),
            name: "Manager Lee".into(),
            role,
        }
    }

    fn daily_payload(date: &str, card1: i64) -> Value {
        json!({
            "date": date,
            "base1": { "card": card1, "cash": 500, "delivery": 200 },
            "base3": { "card": 100 },
            "expense": { "gosen": 30, "hangang": 20, "etc": 10, "note": "" },
        })
    }

    #[test]
    fn save_then_get_daily_round_trips() {
        let state = test_state();
        let manager = caller(Role::Manager);

        let saved =
            accounting_save_daily(&state, &manager, Some(daily_payload("2025-03-01", 1000)))
                .expect("save");
        assert_eq!(saved["success"], true);

        let day = accounting_get_daily(&state, &manager, Some(json!("2025-03-01"))).expect("get");
        assert_eq!(day["base1"]["card"], 1000);
        assert_eq!(day["base3"]["card"], 100);
        assert_eq!(day["expense"]["gosen"], 30);
    }

    #[test]
    fn save_daily_writes_an_audit_entry() {
        let state = test_state();
        accounting_save_daily(
            &state,
            &caller(Role::Admin),
            Some(daily_payload("2025-03-01", 1000)),
        )
        .expect("save");

        let conn = state.conn.lock().unwrap();
        let entries = audit::recent(&conn, 10).expect("recent");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["action"], "SALES_INPUT");
        assert_eq!(entries[0]["target"], "2025-03-01");
    }

    #[test]
    fn staff_cannot_enter_accounting() {
        let state = test_state();
        let err = accounting_save_daily(
            &state,
            &caller(Role::Staff),
            Some(daily_payload("2025-03-01", 1000)),
        )
        .unwrap_err();
        assert_eq!(err.code(), "unauthorized");
    }

    #[test]
    fn save_daily_rejects_malformed_dates() {
        let state = test_state();
        let admin = caller(Role::Admin);
        for date in ["2025-3-1", "20250301", "2025-03-32", "yesterday", ""] {
            let err = accounting_save_daily(&state, &admin, Some(daily_payload(date, 1)))
                .unwrap_err();
            assert_eq!(err.code(), "invalid_date", "{date:?}");
        }
    }

    #[test]
    fn save_daily_rejects_a_missing_payload() {
        let state = test_state();
        let err = accounting_save_daily(&state, &caller(Role::Admin), None).unwrap_err();
        assert_eq!(err.code(), "invalid_payload");
    }

    #[test]
    fn history_accepts_a_bare_month_string() {
        let state = test_state();
        let admin = caller(Role::Admin);
        accounting_save_daily(&state, &admin, Some(daily_payload("2025-03-01", 1000))).unwrap();
        accounting_save_daily(&state, &admin, Some(daily_payload("2025-03-04", 2000))).unwrap();

        let listed =
            accounting_get_history(&state, &admin, Some(json!("2025-03"))).expect("history");
        let history = listed["history"].as_array().expect("array");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["date"], "2025-03-04");
    }

    #[test]
    fn history_validates_month_before_touching_the_store() {
        let state = test_state();
        {
            let conn = state.conn.lock().unwrap();
            conn.execute_batch("DROP TABLE daily_sales").unwrap();
        }
        // An invalid month must still fail as such, not as a store error.
        let err = accounting_get_history(&state, &caller(Role::Admin), Some(json!("2025-13")))
            .unwrap_err();
        assert_eq!(err.code(), "invalid_month");
    }

    #[test]
    fn monthly_costs_are_admin_only() {
        let state = test_state();
        let payload = json!({ "month": "2025-03", "base1": { "water": 100 } });
        let err = accounting_save_monthly(&state, &caller(Role::Manager), Some(payload.clone()))
            .unwrap_err();
        assert_eq!(err.code(), "unauthorized");

        accounting_save_monthly(&state, &caller(Role::Admin), Some(payload)).expect("save");
        let costs = accounting_get_monthly(&state, &caller(Role::Admin), Some(json!("2025-03")))
            .expect("get");
        assert_eq!(costs["base1"]["water"], 100);
        assert!(costs["base3"].is_null());
    }
}
