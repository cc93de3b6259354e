//! # Refdata Core
//!
//! Market-convention primitives used by the bond analytics:
//!
//! - **Types**: [`Date`], [`Period`], [`Frequency`], [`Compounding`], [`InterestRate`]
//! - **Day Count Conventions**: ACT/360, ACT/365F, ACT/ACT ISDA, the 30/360 family, BUS/252
//! - **Business Day Calendars**: TARGET, US, UK and German market calendars
//! - **Business Day Conventions**: following, modified following, nearest and friends
//!
//! ## Example
//!
//! ```rust
//! use refdata_core::prelude::*;
//!
//! let eval = Date::from_ymd(2023, 1, 1).unwrap();
//! let adjusted = Target.adjust(eval, BusinessDayConvention::Following).unwrap();
//! let settle = Target
//!     .advance(adjusted, Period::days(2), BusinessDayConvention::Following)
//!     .unwrap();
//! assert_eq!(settle, Date::from_ymd(2023, 1, 4).unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::similar_names)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::new_without_default)]

pub mod calendars;
pub mod daycounts;
pub mod error;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::calendars::{
        BusinessDayConvention, Calendar, Germany, GermanyMarket, JointCalendar, NullCalendar,
        Target, UkMarket, UnitedKingdom, UnitedStates, UsMarket, WeekendsOnly,
    };
    pub use crate::daycounts::{DayCount, DayCountConvention};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::types::{Compounding, Date, Frequency, InterestRate, Period, TimeUnit};
}

pub use error::{CoreError, CoreResult};
pub use types::{Compounding, Date, Frequency, InterestRate, Period};
