//! Analysis commands: monthly profit/loss, prorated prediction, dashboard.
//!
//! Validation runs before any query: a bad month or store selector never
//! touches the database. The three reads then either all succeed or the
//! command fails whole; partial figures are never served.

use chrono::Local;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{lock_conn, parse_payload, require_analysis_access};
use crate::aggregates::{self, BillingMonth, StoreSelector};
use crate::analysis::{DashboardAnalysis, MonthlyAnalysis, ProratedAnalysis};
use crate::db::DbState;
use crate::errors::ServiceError;
use crate::identity::Caller;
use crate::money::Money;

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    month: String,
    #[serde(default)]
    store: Option<String>,
}

/// Accept either a bare month string or an object payload.
fn normalize_month_arg(arg0: Option<Value>) -> Option<Value> {
    match arg0 {
        Some(Value::String(month)) => Some(json!({ "month": month })),
        other => other,
    }
}

struct AnalysisInputs {
    revenue: aggregates::RevenueTotals,
    shared_expense: Money,
    fixed: aggregates::FixedTotals,
}

fn load_inputs(
    conn: &rusqlite::Connection,
    month: &BillingMonth,
) -> Result<AnalysisInputs, ServiceError> {
    Ok(AnalysisInputs {
        revenue: aggregates::revenue_for_month(conn, month)?,
        shared_expense: aggregates::shared_expense_for_month(conn, month)?,
        fixed: aggregates::manual_fixed_for_month(conn, month)?,
    })
}

/// Full monthly profit/loss analysis for both stores plus the combined view.
pub fn analysis_get_monthly(
    db: &DbState,
    caller: &Caller,
    arg0: Option<Value>,
) -> Result<Value, ServiceError> {
    require_analysis_access(caller)?;
    let payload: AnalysisPayload = parse_payload(normalize_month_arg(arg0))?;
    let month = BillingMonth::parse(&payload.month)?;

    let conn = lock_conn(db)?;
    let inputs = load_inputs(&conn, &month)?;
    let result = MonthlyAnalysis::compute(&inputs.revenue, inputs.shared_expense, &inputs.fixed);
    Ok(json!(result))
}

/// Month-to-date prediction with the fixed cost prorated by elapsed days.
pub fn analysis_get_prediction(
    db: &DbState,
    caller: &Caller,
    arg0: Option<Value>,
) -> Result<Value, ServiceError> {
    require_analysis_access(caller)?;
    let payload: AnalysisPayload = parse_payload(normalize_month_arg(arg0))?;
    let month = BillingMonth::parse(&payload.month)?;
    let scope = StoreSelector::parse(payload.store.as_deref())?;

    let days_elapsed = month.days_elapsed(Local::now().date_naive());
    let days_in_month = month.days_in_month();

    let conn = lock_conn(db)?;
    let inputs = load_inputs(&conn, &month)?;
    let result = ProratedAnalysis::compute(
        scope,
        &inputs.revenue,
        inputs.shared_expense,
        &inputs.fixed,
        days_elapsed,
        days_in_month,
    );
    Ok(json!({ "success": true, "store": scope.as_str(), "analysis": result }))
}

/// Monthly dashboard breakdown with revenue split by payment channel.
pub fn analysis_get_dashboard(
    db: &DbState,
    caller: &Caller,
    arg0: Option<Value>,
) -> Result<Value, ServiceError> {
    require_analysis_access(caller)?;
    let payload: AnalysisPayload = parse_payload(normalize_month_arg(arg0))?;
    let month = BillingMonth::parse(&payload.month)?;
    let scope = StoreSelector::parse(payload.store.as_deref())?;

    let conn = lock_conn(db)?;
    let inputs = load_inputs(&conn, &month)?;
    let result =
        DashboardAnalysis::compute(scope, &inputs.revenue, inputs.shared_expense, &inputs.fixed);
    Ok(json!({ "success": true, "store": scope.as_str(), "analysis": result }))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::accounting::{accounting_save_daily, accounting_save_monthly};
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

    fn admin() -> Caller {
        Caller {
            id: "u-1".into(),
            name: "Admin Kim".into(),
            role: Role::Admin,
        }
    }

    /// Seed the worked scenario through the entry commands themselves.
    fn seed_scenario(state: &DbState) {
        accounting_save_daily(
            state,
            &admin(),
            Some(json!({
                "date": "2025-03-01",
                "base1": { "card": 500_000, "cash": 300_000, "delivery": 200_000 },
                "base3": { "card": 100_000, "cash": 50_000, "delivery": 50_000 },
                "expense": { "gosen": 40_000, "hangang": 15_000, "etc": 5_000 },
            })),
        )
        .expect("seed daily");
        accounting_save_monthly(
            state,
            &admin(),
            Some(json!({
                "month": "2025-03",
                "base1": { "internet": 40_000 },
                "base3": { "internet": 10_000 },
            })),
        )
        .expect("seed monthly");
    }

    #[test]
    fn monthly_analysis_over_seeded_entries() {
        let state = test_state();
        seed_scenario(&state);

        let result =
            analysis_get_monthly(&state, &admin(), Some(json!("2025-03"))).expect("analysis");

        assert_eq!(result["grand"]["revenue"], 1_200_000);
        assert_eq!(result["base1"]["allocatedVariableCost"], 50_000);
        assert_eq!(result["base1"]["fixedCost"]["commission"], 300_000);
        assert_eq!(result["base1"]["fixedCost"]["deliveryFee"], 9_900);
        assert_eq!(result["base1"]["profit"], 600_100);
        assert_eq!(result["base3"]["profit"], 117_526);
        assert_eq!(result["grand"]["profit"], 717_625);
    }

    #[test]
    fn analysis_is_admin_only() {
        let state = test_state();
        let manager = Caller {
            id: "u-2".into(),
            name: "Manager Lee".into(),
            role: Role::Manager,
        };
        for result in [
            analysis_get_monthly(&state, &manager, Some(json!("2025-03"))),
            analysis_get_prediction(&state, &manager, Some(json!("2025-03"))),
            analysis_get_dashboard(&state, &manager, Some(json!("2025-03"))),
        ] {
            assert_eq!(result.unwrap_err().code(), "unauthorized");
        }
    }

    #[test]
    fn malformed_month_fails_before_any_query() {
        let state = test_state();
        {
            let conn = state.conn.lock().unwrap();
            conn.execute_batch("DROP TABLE daily_sales").unwrap();
        }
        let err = analysis_get_monthly(&state, &admin(), Some(json!("2025-13"))).unwrap_err();
        assert_eq!(err.code(), "invalid_month");
    }

    #[test]
    fn store_failure_is_not_served_as_zeros() {
        let state = test_state();
        {
            let conn = state.conn.lock().unwrap();
            conn.execute_batch("DROP TABLE daily_sales").unwrap();
        }
        let err = analysis_get_monthly(&state, &admin(), Some(json!("2025-03"))).unwrap_err();
        assert_eq!(err.code(), "store_unavailable");
    }

    #[test]
    fn prediction_rejects_an_unknown_store_selector() {
        let state = test_state();
        let err = analysis_get_prediction(
            &state,
            &admin(),
            Some(json!({ "month": "2025-03", "store": "base2" })),
        )
        .unwrap_err();
        assert_eq!(err.code(), "unknown_store");
    }

    #[test]
    fn prediction_defaults_to_the_grand_scope() {
        let state = test_state();
        seed_scenario(&state);

        // A past month is fully elapsed, so fixed costs carry whole.
        let result = analysis_get_prediction(&state, &admin(), Some(json!("2025-03")))
            .expect("prediction");
        assert_eq!(result["store"], "grand");
        let analysis = &result["analysis"];
        assert_eq!(analysis["totalRevenue"], 1_200_000);
        assert_eq!(analysis["totalExpense"], 60_000);
        assert_eq!(analysis["commissionFee"], 360_000);
        assert_eq!(analysis["deliveryFee"], 12_375);
        assert_eq!(analysis["fixedCost"], 50_000);
        assert_eq!(analysis["daysElapsed"], analysis["daysInMonth"]);
    }

    #[test]
    fn dashboard_scopes_to_a_single_store() {
        let state = test_state();
        seed_scenario(&state);

        let result = analysis_get_dashboard(
            &state,
            &admin(),
            Some(json!({ "month": "2025-03", "store": "base1" })),
        )
        .expect("dashboard");
        assert_eq!(result["store"], "base1");
        let analysis = &result["analysis"];
        assert_eq!(analysis["salesByType"]["card"], 500_000);
        assert_eq!(analysis["salesByType"]["delivery"], 200_000);
        assert_eq!(analysis["totalRevenue"], 1_000_000);
        assert_eq!(analysis["totalExpense"], 50_000);
        assert_eq!(analysis["fixedCost"], 40_000);
    }

    #[test]
    fn empty_month_serves_zeros_not_errors() {
        let state = test_state();
        let result =
            analysis_get_monthly(&state, &admin(), Some(json!("2025-07"))).expect("analysis");
        assert_eq!(result["grand"]["revenue"], 0);
        assert_eq!(result["base1"]["allocatedVariableCost"], 0);
        assert_eq!(result["grand"]["profit"], 0);
    }
}
