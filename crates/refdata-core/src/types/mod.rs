//! Value types shared by calendars, day counts and pricing.

mod date;
mod frequency;
mod interest_rate;
mod period;

pub use date::{days_in_month, Date};
pub use frequency::{Compounding, Frequency};
pub use interest_rate::InterestRate;
pub use period::{Period, TimeUnit};
