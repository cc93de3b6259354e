//! Bond records: the validated input to the analytics engines.

mod record;

pub(crate) use record::decimal_to_f64;
pub use record::{
    BondKind, BondRecord, CouponTerms, ScheduleEntry, SinkingFundEntry, SINKING_FUND_TOLERANCE,
};
