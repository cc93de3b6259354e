//! Convention mappers.
//!
//! Turn the record-side convention tags into market primitives from
//! `refdata-core`. Every mapper is total over the tags it has a primitive
//! for; a calendar tag without a holiday set yields
//! [`BondError::UnsupportedConvention`] naming the tag.

use refdata_core::calendars::{
    BusinessDayConvention, Calendar, Germany, GermanyMarket, NullCalendar, Target, UkMarket,
    UnitedKingdom, UnitedStates, UsMarket,
};
use refdata_core::daycounts::DayCountConvention;
use refdata_core::types::{Compounding, Frequency, Period};

use crate::error::{BondError, BondResult};
use crate::types::{
    BusinessDayConventionKind, CalendarKind, CompoundingKind, CouponFrequency,
    DayCountConventionKind, FrequencyKind,
};

/// Maps a day count tag to its convention.
///
/// BUSINESS_252 counts business days on the TARGET calendar.
#[must_use]
pub fn to_day_count(kind: DayCountConventionKind) -> DayCountConvention {
    match kind {
        DayCountConventionKind::ActualActual => DayCountConvention::ActActIsda,
        DayCountConventionKind::Actual360 | DayCountConventionKind::Act360 => {
            DayCountConvention::Act360
        }
        DayCountConventionKind::Actual365Fixed | DayCountConventionKind::Act365 => {
            DayCountConvention::Act365Fixed
        }
        DayCountConventionKind::Thirty360 | DayCountConventionKind::Thirty360Us => {
            DayCountConvention::Thirty360US
        }
        DayCountConventionKind::ThirtyE360 => DayCountConvention::Thirty360E,
        DayCountConventionKind::ThirtyE360Isda => DayCountConvention::Thirty360EIsda,
        DayCountConventionKind::Business252 => DayCountConvention::Business252,
    }
}

/// Maps a calendar tag to a holiday calendar.
pub fn to_calendar(kind: CalendarKind) -> BondResult<Box<dyn Calendar>> {
    let calendar: Box<dyn Calendar> = match kind {
        CalendarKind::Target => Box::new(Target),
        CalendarKind::NullCalendar => Box::new(NullCalendar),
        CalendarKind::UsSettlement | CalendarKind::UsFederalReserve => {
            Box::new(UnitedStates::new(UsMarket::Settlement))
        }
        CalendarKind::UsGovernmentBond => Box::new(UnitedStates::new(UsMarket::GovernmentBond)),
        CalendarKind::UsNyse => Box::new(UnitedStates::new(UsMarket::Nyse)),
        CalendarKind::UkExchange => Box::new(UnitedKingdom::new(UkMarket::Exchange)),
        CalendarKind::UkSettlement => Box::new(UnitedKingdom::new(UkMarket::Settlement)),
        CalendarKind::UkMetals => Box::new(UnitedKingdom::new(UkMarket::Metals)),
        CalendarKind::GermanyFrankfurtStockExchange => {
            Box::new(Germany::new(GermanyMarket::FrankfurtStockExchange))
        }
        CalendarKind::GermanyEurex => Box::new(Germany::new(GermanyMarket::Xetra)),
        CalendarKind::GermanySettlement => Box::new(Germany::new(GermanyMarket::Settlement)),
        other => return Err(BondError::unsupported_convention("calendar", other.as_str())),
    };
    Ok(calendar)
}

/// Returns true if [`to_calendar`] has a holiday set for the tag.
#[must_use]
pub fn is_calendar_supported(kind: CalendarKind) -> bool {
    to_calendar(kind).is_ok()
}

/// Maps a business day convention tag.
#[must_use]
pub fn to_business_day_convention(kind: BusinessDayConventionKind) -> BusinessDayConvention {
    match kind {
        BusinessDayConventionKind::Following => BusinessDayConvention::Following,
        BusinessDayConventionKind::ModifiedFollowing => BusinessDayConvention::ModifiedFollowing,
        BusinessDayConventionKind::Preceding => BusinessDayConvention::Preceding,
        BusinessDayConventionKind::ModifiedPreceding => BusinessDayConvention::ModifiedPreceding,
        BusinessDayConventionKind::Unadjusted => BusinessDayConvention::Unadjusted,
        BusinessDayConventionKind::HalfMonthModifiedFollowing => {
            BusinessDayConvention::HalfMonthModifiedFollowing
        }
        BusinessDayConventionKind::Nearest => BusinessDayConvention::Nearest,
    }
}

/// Maps a compounding tag.
#[must_use]
pub fn to_compounding(kind: CompoundingKind) -> Compounding {
    match kind {
        CompoundingKind::Simple => Compounding::Simple,
        CompoundingKind::Compounded => Compounding::Compounded,
        CompoundingKind::Continuous => Compounding::Continuous,
        CompoundingKind::SimpleThenCompounded => Compounding::SimpleThenCompounded,
        CompoundingKind::CompoundedThenSimple => Compounding::CompoundedThenSimple,
    }
}

/// Maps a frequency tag to a core frequency.
#[must_use]
pub fn to_frequency(kind: FrequencyKind) -> Frequency {
    match kind {
        FrequencyKind::NoFrequency => Frequency::NoFrequency,
        FrequencyKind::Once => Frequency::Once,
        FrequencyKind::Annual => Frequency::Annual,
        FrequencyKind::Semiannual => Frequency::Semiannual,
        FrequencyKind::Quarterly => Frequency::Quarterly,
        FrequencyKind::Monthly => Frequency::Monthly,
        FrequencyKind::Weekly => Frequency::Weekly,
        FrequencyKind::Daily => Frequency::Daily,
        FrequencyKind::OtherFrequency => Frequency::OtherFrequency,
    }
}

/// Maps a frequency tag to the period between payments.
#[must_use]
pub fn to_period(kind: FrequencyKind) -> Period {
    to_frequency(kind).tenor()
}

/// Maps a coupon frequency to its coupon tenor.
#[must_use]
pub fn coupon_tenor(frequency: CouponFrequency) -> Period {
    Period::months(frequency.months_per_period())
}
