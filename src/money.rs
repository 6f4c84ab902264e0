//! Money scalar, fee-rate constants, and the floor-rounding helpers.
//!
//! All amounts are integers in the smallest currency unit. Every
//! percentage-derived figure in the crate goes through [`floor_mul`] or
//! [`allocate_by_ratio`]; there is deliberately no other rounding path.

/// Amount in the smallest currency unit.
pub type Money = i64;

// ---------------------------------------------------------------------------
// Business constants
// ---------------------------------------------------------------------------

/// Commission charged on a store's total revenue.
pub const COMMISSION_RATE: f64 = 0.30;

/// Platform fee charged on delivery-channel revenue only.
pub const DELIVERY_FEE_RATE: f64 = 0.0495;

// ---------------------------------------------------------------------------
// Rounding helpers
// ---------------------------------------------------------------------------

/// Multiply an amount by a rate and floor to whole currency units.
pub fn floor_mul(amount: Money, rate: f64) -> Money {
    (amount as f64 * rate).floor() as Money
}

/// A store's share of combined revenue, 0.0 when combined revenue is zero.
///
/// The zero guard keeps a dead month from producing NaN; both stores then
/// get a zero allocation and the shared expense stays unallocated.
pub fn allocation_ratio(part: Money, whole: Money) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64
    } else {
        0.0
    }
}

/// Floor-allocate `total` proportionally to `part / whole`.
///
/// Each store's share is floored independently, so the two shares may sum
/// to slightly less than `total`. That gap is accepted, never corrected.
pub fn allocate_by_ratio(total: Money, part: Money, whole: Money) -> Money {
    floor_mul(total, allocation_ratio(part, whole))
}
