//! Profit/loss allocation and analysis engine.
//!
//! Pure computation over the month's aggregates: per-store revenue by
//! channel, the shared-expense total, and the manual fixed-cost totals.
//! Shared variable costs are split between the two stores by revenue ratio;
//! commission and the delivery-platform fee are derived from each store's
//! own revenue. All three variants (monthly, prorated prediction, dashboard
//! breakdown) go through the same floor-rounding helpers so the figures can
//! never drift between views.
//!
//! No state, no queries, no mutation: identical inputs always produce
//! identical results.

use serde::Serialize;

use crate::aggregates::{ChannelTotals, FixedTotals, RevenueTotals, StoreSelector};
use crate::money::{
    allocate_by_ratio, floor_mul, Money, COMMISSION_RATE, DELIVERY_FEE_RATE,
};

// ---------------------------------------------------------------------------
// Monthly analysis (standard view)
// ---------------------------------------------------------------------------

/// Fixed-cost breakdown for one store: the manually entered total plus the
/// two auto-derived fee categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedCostBreakdown {
    pub manual: Money,
    pub commission: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

impl FixedCostBreakdown {
    /// Commission is taken on the store's whole revenue; the delivery fee
    /// only on the delivery channel. Both floored, never rounded.
    fn derive(manual: Money, revenue: Money, delivery_revenue: Money) -> Self {
        let commission = floor_mul(revenue, COMMISSION_RATE);
        let delivery_fee = floor_mul(delivery_revenue, DELIVERY_FEE_RATE);
        Self {
            manual,
            commission,
            delivery_fee,
            total: manual + commission + delivery_fee,
        }
    }
}

/// One store's slice of the monthly analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAnalysis {
    pub revenue: Money,
    pub allocated_variable_cost: Money,
    pub fixed_cost: FixedCostBreakdown,
    pub profit: Money,
}

/// The combined view. Derived from the per-store fixed totals, not
/// recomputed, so commission and fee figures always agree across views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrandView {
    pub revenue: Money,
    pub cost: Money,
    pub profit: Money,
}

/// Full monthly profit/loss analysis for both stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAnalysis {
    pub base1: StoreAnalysis,
    pub base3: StoreAnalysis,
    pub grand: GrandView,
}

impl MonthlyAnalysis {
    pub fn compute(revenue: &RevenueTotals, shared_expense: Money, fixed: &FixedTotals) -> Self {
        let total1 = revenue.base1.total();
        let total3 = revenue.base3.total();
        let grand_revenue = total1 + total3;

        // Shared variable cost split by revenue ratio, each share floored
        // independently. A dead month (0/0) allocates nothing to either.
        let variable1 = allocate_by_ratio(shared_expense, total1, grand_revenue);
        let variable3 = allocate_by_ratio(shared_expense, total3, grand_revenue);

        let fixed1 = FixedCostBreakdown::derive(fixed.base1, total1, revenue.base1.delivery);
        let fixed3 = FixedCostBreakdown::derive(fixed.base3, total3, revenue.base3.delivery);

        let base1 = StoreAnalysis {
            revenue: total1,
            allocated_variable_cost: variable1,
            fixed_cost: fixed1,
            profit: total1 - variable1 - fixed1.total,
        };
        let base3 = StoreAnalysis {
            revenue: total3,
            allocated_variable_cost: variable3,
            fixed_cost: fixed3,
            profit: total3 - variable3 - fixed3.total,
        };

        // Grand cost charges the true shared-expense total (not the floored
        // allocations) plus the fixed totals already derived above.
        let grand_cost = shared_expense + fixed1.total + fixed3.total;
        let grand = GrandView {
            revenue: grand_revenue,
            cost: grand_cost,
            profit: grand_revenue - grand_cost,
        };

        Self { base1, base3, grand }
    }
}

// ---------------------------------------------------------------------------
// Scoped figures shared by the prediction and dashboard variants
// ---------------------------------------------------------------------------

/// Period-accurate figures for one selector scope. Both single-scope
/// variants derive from this so there is exactly one rounding path.
struct ScopedFigures {
    channels: ChannelTotals,
    revenue: Money,
    expense: Money,
    commission_fee: Money,
    delivery_fee: Money,
}

impl ScopedFigures {
    fn derive(scope: StoreSelector, revenue: &RevenueTotals, shared_expense: Money) -> Self {
        let grand_revenue = revenue.grand_total();
        let (channels, expense) = match scope {
            StoreSelector::Base1 => (
                revenue.base1,
                allocate_by_ratio(shared_expense, revenue.base1.total(), grand_revenue),
            ),
            StoreSelector::Base3 => (
                revenue.base3,
                allocate_by_ratio(shared_expense, revenue.base3.total(), grand_revenue),
            ),
            StoreSelector::Grand => (revenue.base1.plus(&revenue.base3), shared_expense),
        };

        Self {
            channels,
            revenue: channels.total(),
            expense,
            commission_fee: floor_mul(channels.total(), COMMISSION_RATE),
            delivery_fee: floor_mul(channels.delivery, DELIVERY_FEE_RATE),
        }
    }
}

fn margin_percent(net_profit: Money, revenue: Money) -> f64 {
    if revenue > 0 {
        net_profit as f64 / revenue as f64 * 100.0
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Prorated ("prediction") variant
// ---------------------------------------------------------------------------

/// Month-to-date profit picture with the fixed cost scaled by elapsed days.
///
/// Revenue, shared expense, commission and delivery fee come from actual
/// period data and are not scaled; only the monthly fixed cost is prorated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProratedAnalysis {
    pub total_revenue: Money,
    pub total_expense: Money,
    pub commission_fee: Money,
    pub delivery_fee: Money,
    pub fixed_cost: Money,
    pub total_cost: Money,
    pub net_profit: Money,
    pub margin_percent: f64,
    pub days_elapsed: u32,
    pub days_in_month: u32,
}

impl ProratedAnalysis {
    pub fn compute(
        scope: StoreSelector,
        revenue: &RevenueTotals,
        shared_expense: Money,
        fixed: &FixedTotals,
        days_elapsed: u32,
        days_in_month: u32,
    ) -> Self {
        let figures = ScopedFigures::derive(scope, revenue, shared_expense);

        // Each store's fixed cost is prorated separately, then combined for
        // the grand scope, matching the per-store views unit for unit.
        let ratio = days_elapsed as f64 / days_in_month as f64;
        let fixed1 = floor_mul(fixed.base1, ratio);
        let fixed3 = floor_mul(fixed.base3, ratio);
        let fixed_cost = match scope {
            StoreSelector::Base1 => fixed1,
            StoreSelector::Base3 => fixed3,
            StoreSelector::Grand => fixed1 + fixed3,
        };

        let total_cost =
            figures.expense + figures.commission_fee + figures.delivery_fee + fixed_cost;
        let net_profit = figures.revenue - total_cost;

        Self {
            total_revenue: figures.revenue,
            total_expense: figures.expense,
            commission_fee: figures.commission_fee,
            delivery_fee: figures.delivery_fee,
            fixed_cost,
            total_cost,
            net_profit,
            margin_percent: margin_percent(net_profit, figures.revenue),
            days_elapsed,
            days_in_month,
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard variant
// ---------------------------------------------------------------------------

/// Monthly picture with the revenue split by payment channel on top.
/// Same allocation and fee math as the other views; nothing is prorated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalysis {
    pub total_revenue: Money,
    pub sales_by_type: ChannelTotals,
    pub total_expense: Money,
    pub commission_fee: Money,
    pub delivery_fee: Money,
    pub fixed_cost: Money,
    pub total_cost: Money,
    pub net_profit: Money,
    pub margin_percent: f64,
}

impl DashboardAnalysis {
    pub fn compute(
        scope: StoreSelector,
        revenue: &RevenueTotals,
        shared_expense: Money,
        fixed: &FixedTotals,
    ) -> Self {
        let figures = ScopedFigures::derive(scope, revenue, shared_expense);

        let fixed_cost = match scope {
            StoreSelector::Base1 => fixed.base1,
            StoreSelector::Base3 => fixed.base3,
            StoreSelector::Grand => fixed.base1 + fixed.base3,
        };

        let total_cost =
            figures.expense + figures.commission_fee + figures.delivery_fee + fixed_cost;
        let net_profit = figures.revenue - total_cost;

        Self {
            total_revenue: figures.revenue,
            sales_by_type: figures.channels,
            total_expense: figures.expense,
            commission_fee: figures.commission_fee,
            delivery_fee: figures.delivery_fee,
            fixed_cost,
            total_cost,
            net_profit,
            margin_percent: margin_percent(net_profit, figures.revenue),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
