//! # Refdata Bonds
//!
//! Bond analytics for the reference data services.
//!
//! This crate provides:
//!
//! - **Bond Models**: validated bond records for zero coupon, fixed coupon,
//!   callable, putable, floating and sinking fund bonds
//! - **Convention Mappers**: record tags to day counts, calendars, business
//!   day conventions, compounding and frequencies
//! - **Analytics**: clean/dirty price, accrued interest, YTM/YTC/YTP/YTW,
//!   durations, convexity, DV01, key rate durations, cash flows
//! - **Options**: Hull-White tree valuation of call and put schedules
//!
//! ## Example
//!
//! ```rust
//! use refdata_bonds::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! let record = BondRecord::new(
//!     "FIX28",
//!     Date::from_ymd(2023, 1, 1).unwrap(),
//!     Date::from_ymd(2028, 1, 1).unwrap(),
//!     Date::from_ymd(2023, 1, 1).unwrap(),
//!     dec!(1000),
//!     BondKind::FixedCoupon {
//!         coupon: CouponTerms::new(dec!(0.05), CouponFrequency::SemiAnnual),
//!     },
//! )
//! .with_market_price(dec!(1050));
//!
//! let mut engine = bond_analytics(record).unwrap();
//! let summary = engine.summary();
//! assert!(summary.yield_to_maturity.unwrap() < 0.05);
//! assert_eq!(summary.cashflows.len(), 10);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::float_cmp)]
#![allow(clippy::missing_fields_in_debug)]

pub mod analytics;
pub mod cashflows;
pub mod config;
pub mod conventions;
pub mod curves;
pub mod error;
pub mod factory;
pub mod models;
pub mod options;
pub mod pricing;
pub mod risk;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    // Analytics
    pub use crate::analytics::{BondAnalytics, BondSummary, EvaluationContext, KeyRateDuration};
    pub use crate::factory::{bond_analytics, bond_analytics_factory, bond_analytics_for_tag};

    // Configuration and errors
    pub use crate::config::{AnalyticsConfig, ConfigError};
    pub use crate::error::{BondError, BondResult};

    // Records and tags
    pub use crate::models::{BondKind, BondRecord, CouponTerms, ScheduleEntry, SinkingFundEntry};
    pub use crate::types::{
        BondType, BusinessDayConventionKind, CalendarKind, CompoundingKind, CouponFrequency,
        DayCountConventionKind, FrequencyKind, SinkingFundType,
    };

    // Cash flows and curves
    pub use crate::cashflows::{CashFlow, CashFlowKind, DatedAmount};
    pub use crate::curves::{DiscountCurve, FlatForwardCurve, RateQuote};

    pub use refdata_core::types::Date;
}

pub use analytics::{BondAnalytics, BondSummary};
pub use error::{BondError, BondResult};
pub use factory::{bond_analytics, bond_analytics_factory};
