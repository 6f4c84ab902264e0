//! Billing-period aggregation over the daily entry tables.
//!
//! Everything the analysis engine consumes comes from the three reads in
//! this module: per-store revenue by channel, the shared-expense total, and
//! the per-store manual fixed-cost totals. Each read distinguishes "no rows
//! for this month" (a valid zero) from "the store failed" (the SQL error
//! propagates and the whole computation aborts).

use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ServiceError;
use crate::money::Money;

// ---------------------------------------------------------------------------
// Billing month
// ---------------------------------------------------------------------------

/// A validated `YYYY-MM` billing month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingMonth {
    year: i32,
    month: u32,
}

impl BillingMonth {
    /// Parse a strict `YYYY-MM` string. Rejected before any query runs.
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let invalid = || ServiceError::InvalidMonth(raw.to_string());

        let (year_part, month_part) = match raw.split_once('-') {
            Some(parts) => parts,
            None => return Err(invalid()),
        };
        if year_part.len() != 4 || month_part.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year_part.parse().map_err(|_| invalid())?;
        let month: u32 = month_part.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        // Guard degenerate years like 0000 that chrono would still accept.
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() || year < 1 {
            return Err(invalid());
        }

        Ok(Self { year, month })
    }

    pub fn days_in_month(&self) -> u32 {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .map(|d| d.day())
            .unwrap_or(31)
    }

    /// Days of this billing month elapsed as of `today`.
    ///
    /// The current month counts up to today's day-of-month; any other month
    /// (past or future) is treated as fully elapsed.
    pub fn days_elapsed(&self, today: NaiveDate) -> u32 {
        if today.year() == self.year && today.month() == self.month {
            today.day()
        } else {
            self.days_in_month()
        }
    }

    /// The `YYYY-MM` key used in queries.
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ---------------------------------------------------------------------------
// Store selector
// ---------------------------------------------------------------------------

/// Which store (or the combined view) a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreSelector {
    Base1,
    Base3,
    Grand,
}

impl StoreSelector {
    /// Parse the request selector; `None` means the combined view.
    pub fn parse(raw: Option<&str>) -> Result<Self, ServiceError> {
        match raw.map(str::trim) {
            None | Some("") | Some("grand") => Ok(StoreSelector::Grand),
            Some("base1") => Ok(StoreSelector::Base1),
            Some("base3") => Ok(StoreSelector::Base3),
            Some(other) => Err(ServiceError::UnknownStore(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreSelector::Base1 => "base1",
            StoreSelector::Base3 => "base3",
            StoreSelector::Grand => "grand",
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate shapes
// ---------------------------------------------------------------------------

/// Revenue sums for one store, split by payment channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelTotals {
    pub card: Money,
    pub cash: Money,
    pub delivery: Money,
}

impl ChannelTotals {
    pub fn total(&self) -> Money {
        self.card + self.cash + self.delivery
    }

    pub fn plus(&self, other: &ChannelTotals) -> ChannelTotals {
        ChannelTotals {
            card: self.card + other.card,
            cash: self.cash + other.cash,
            delivery: self.delivery + other.delivery,
        }
    }
}

/// Per-store channel sums for one billing month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevenueTotals {
    pub base1: ChannelTotals,
    pub base3: ChannelTotals,
}

impl RevenueTotals {
    pub fn grand_total(&self) -> Money {
        self.base1.total() + self.base3.total()
    }
}

/// Per-store manual fixed-cost sums for one billing month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedTotals {
    pub base1: Money,
    pub base3: Money,
}

// ---------------------------------------------------------------------------
// Aggregate reads
// ---------------------------------------------------------------------------

/// Sum each store's revenue by channel over the billing month.
///
/// A store with no rows gets zero-filled channel totals; the 0/0 allocation
/// case is the engine's to handle, not an error here.
pub fn revenue_for_month(
    conn: &Connection,
    month: &BillingMonth,
) -> Result<RevenueTotals, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT store_type,
                COALESCE(SUM(card), 0),
                COALESCE(SUM(cash), 0),
                COALESCE(SUM(delivery_app), 0)
         FROM daily_sales
         WHERE substr(date, 1, 7) = ?1
         GROUP BY store_type",
    )?;
    let rows = stmt.query_map(params![month.key()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            ChannelTotals {
                card: row.get(1)?,
                cash: row.get(2)?,
                delivery: row.get(3)?,
            },
        ))
    })?;

    let mut totals = RevenueTotals::default();
    for row in rows {
        let (store, channels) = row?;
        match store.as_str() {
            "base1" => totals.base1 = channels,
            "base3" => totals.base3 = channels,
            _ => {}
        }
    }
    Ok(totals)
}

/// Sum all shared-expense line items over the billing month.
pub fn shared_expense_for_month(
    conn: &Connection,
    month: &BillingMonth,
) -> Result<Money, rusqlite::Error> {
    conn.query_row(
        "SELECT COALESCE(SUM(gosen + hangang + etc), 0)
         FROM daily_expenses
         WHERE substr(date, 1, 7) = ?1",
        params![month.key()],
        |row| row.get(0),
    )
}

/// Sum each store's manual fixed-cost categories for the billing month.
///
/// An absent row means no costs entered yet: zero, not an error.
pub fn manual_fixed_for_month(
    conn: &Connection,
    month: &BillingMonth,
) -> Result<FixedTotals, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT store_type,
                water + internet + electricity + cleaning +
                card_fee + operation + caps + etc1 + etc2
         FROM monthly_costs
         WHERE year_month = ?1",
    )?;
    let rows = stmt.query_map(params![month.key()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Money>(1)?))
    })?;

    let mut totals = FixedTotals::default();
    for row in rows {
        let (store, manual) = row?;
        match store.as_str() {
            "base1" => totals.base1 = manual,
            "base3" => totals.base3 = manual,
            _ => {}
        }
    }
    Ok(totals)
}

// ===========================================================================
// Tests
// ===========================================================================
