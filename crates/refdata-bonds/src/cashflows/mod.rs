//! Cash flows and coupon schedules.

mod schedule;

pub use schedule::Schedule;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use refdata_core::types::Date;

/// What a cash flow pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashFlowKind {
    /// Interest.
    Coupon,
    /// Scheduled partial principal repayment.
    Amortization,
    /// Final principal repayment.
    Redemption,
}

/// A dated payment in face value units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    /// Payment date.
    pub date: Date,
    /// Amount paid.
    pub amount: f64,
    /// Payment type.
    pub kind: CashFlowKind,
}

impl CashFlow {
    /// Creates a coupon flow.
    #[must_use]
    pub fn coupon(date: Date, amount: f64) -> Self {
        Self {
            date,
            amount,
            kind: CashFlowKind::Coupon,
        }
    }

    /// Creates an amortization flow.
    #[must_use]
    pub fn amortization(date: Date, amount: f64) -> Self {
        Self {
            date,
            amount,
            kind: CashFlowKind::Amortization,
        }
    }

    /// Creates a redemption flow.
    #[must_use]
    pub fn redemption(date: Date, amount: f64) -> Self {
        Self {
            date,
            amount,
            kind: CashFlowKind::Redemption,
        }
    }
}

/// A `(date, amount)` pair after aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedAmount {
    /// Payment date.
    pub date: Date,
    /// Sum of all flows paid on the date.
    pub amount: f64,
}

/// Sums flows landing on the same date, in date order.
#[must_use]
pub fn aggregate_by_date(flows: &[CashFlow]) -> Vec<DatedAmount> {
    let mut totals: BTreeMap<Date, f64> = BTreeMap::new();
    for flow in flows {
        *totals.entry(flow.date).or_insert(0.0) += flow.amount;
    }
    totals
        .into_iter()
        .map(|(date, amount)| DatedAmount { date, amount })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_by_date() {
        let d1 = Date::from_ymd(2025, 1, 2).unwrap();
        let d2 = Date::from_ymd(2026, 1, 2).unwrap();
        let flows = [
            CashFlow::coupon(d2, 25.0),
            CashFlow::coupon(d1, 50.0),
            CashFlow::amortization(d1, 500.0),
            CashFlow::redemption(d2, 500.0),
        ];
        let totals = aggregate_by_date(&flows);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0], DatedAmount { date: d1, amount: 550.0 });
        assert_eq!(totals[1], DatedAmount { date: d2, amount: 525.0 });
    }
}
