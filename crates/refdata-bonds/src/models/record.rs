//! Bond reference records.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use refdata_core::types::Date;

use crate::error::{BondError, BondResult};
use crate::types::{
    BondType, BusinessDayConventionKind, CalendarKind, CompoundingKind, CouponFrequency,
    DayCountConventionKind, FrequencyKind, SinkingFundType,
};

/// Tolerance for the sinking fund notionals against the face value.
pub const SINKING_FUND_TOLERANCE: f64 = 1e-6;

/// Coupon terms shared by every coupon-bearing bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponTerms {
    /// Annual coupon rate as a fraction (0.05 for 5%).
    pub coupon_rate: Decimal,
    /// Coupon payment frequency.
    #[serde(default)]
    pub coupon_frequency: CouponFrequency,
}

impl CouponTerms {
    /// Creates coupon terms.
    #[must_use]
    pub fn new(coupon_rate: Decimal, coupon_frequency: CouponFrequency) -> Self {
        Self {
            coupon_rate,
            coupon_frequency,
        }
    }

    /// Returns the coupon rate as a float.
    pub fn rate(&self) -> BondResult<f64> {
        decimal_to_f64(self.coupon_rate, "coupon_rate")
    }
}

/// An exercise date with its clean price per 100 of face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Exercise date.
    pub date: Date,
    /// Clean exercise price per 100 of face.
    pub price: Decimal,
}

impl ScheduleEntry {
    /// Creates a schedule entry.
    #[must_use]
    pub fn new(date: Date, price: Decimal) -> Self {
        Self { date, price }
    }
}

/// A scheduled principal repayment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkingFundEntry {
    /// Repayment date.
    pub date: Date,
    /// Principal repaid, in face value units.
    pub notional: Decimal,
}

impl SinkingFundEntry {
    /// Creates a sinking fund entry.
    #[must_use]
    pub fn new(date: Date, notional: Decimal) -> Self {
        Self { date, notional }
    }
}

fn default_gearing() -> Decimal {
    dec!(1)
}

/// Kind-specific terms of a bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BondKind {
    /// Single redemption at maturity.
    ZeroCoupon,
    /// Fixed coupons, bullet redemption.
    FixedCoupon {
        /// Coupon terms.
        coupon: CouponTerms,
    },
    /// Fixed coupons with an issuer call schedule.
    Callable {
        /// Coupon terms.
        coupon: CouponTerms,
        /// Call dates and clean call prices.
        call_schedule: Vec<ScheduleEntry>,
    },
    /// Fixed coupons with a holder put schedule.
    Putable {
        /// Coupon terms.
        coupon: CouponTerms,
        /// Put dates and clean put prices.
        put_schedule: Vec<ScheduleEntry>,
    },
    /// Coupons projected off a reference index.
    Floating {
        /// Current fixing (used for the first live period when non-zero) and frequency.
        coupon: CouponTerms,
        /// Reference index label, e.g. `EURIBOR6M`.
        reference_index: String,
        /// Spread added to the projected index rate.
        #[serde(default)]
        spread: Decimal,
        /// Multiplier applied to the projected index rate.
        #[serde(default = "default_gearing")]
        gearing: Decimal,
    },
    /// Fixed coupons with scheduled partial redemptions.
    SinkingFund {
        /// Coupon terms.
        coupon: CouponTerms,
        /// Principal repayments, one per coupon period.
        sinking_fund_schedule: Vec<SinkingFundEntry>,
        /// Informational amortization style.
        #[serde(default)]
        sinking_fund_type: Option<SinkingFundType>,
    },
}

impl BondKind {
    /// Returns the bond type tag matching this payload.
    #[must_use]
    pub fn bond_type(&self) -> BondType {
        match self {
            BondKind::ZeroCoupon => BondType::ZeroCoupon,
            BondKind::FixedCoupon { .. } => BondType::FixedCoupon,
            BondKind::Callable { .. } => BondType::Callable,
            BondKind::Putable { .. } => BondType::Putable,
            BondKind::Floating { .. } => BondType::Floating,
            BondKind::SinkingFund { .. } => BondType::SinkingFund,
        }
    }

    /// Returns the coupon terms, if the bond pays coupons.
    #[must_use]
    pub fn coupon(&self) -> Option<&CouponTerms> {
        match self {
            BondKind::ZeroCoupon => None,
            BondKind::FixedCoupon { coupon }
            | BondKind::Callable { coupon, .. }
            | BondKind::Putable { coupon, .. }
            | BondKind::Floating { coupon, .. }
            | BondKind::SinkingFund { coupon, .. } => Some(coupon),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_settlement_days() -> i32 {
    2
}

/// A bond as stored by the reference data layer.
///
/// Identity fields are fixed at creation; `market_price` is the only field
/// callers are expected to update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondRecord {
    /// Ticker or other display symbol.
    pub symbol: String,
    /// Declared bond type.
    pub bond_type: BondType,
    /// ISO currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Issue date.
    pub issue_date: Date,
    /// Maturity date.
    pub maturity_date: Date,
    /// Valuation date.
    pub evaluation_date: Date,
    /// Business days between evaluation and settlement.
    #[serde(default = "default_settlement_days")]
    pub settlement_days: i32,
    /// Holiday calendar.
    #[serde(default)]
    pub calendar: CalendarKind,
    /// Business day convention.
    #[serde(default)]
    pub business_day_convention: BusinessDayConventionKind,
    /// Face value.
    pub face_value: Decimal,
    /// Quoted clean price in face value units.
    #[serde(default)]
    pub market_price: Option<Decimal>,
    /// Day count for accrual, discounting and yields.
    #[serde(default)]
    pub day_count_convention: DayCountConventionKind,
    /// Compounding for curve and yield rates.
    #[serde(default)]
    pub compounding: CompoundingKind,
    /// Compounding frequency for curve and yield rates.
    #[serde(default)]
    pub frequency: FrequencyKind,
    /// Kind-specific terms.
    pub kind: BondKind,
}

impl BondRecord {
    /// Creates a record with default conventions (TARGET, following,
    /// ACT/365F, annual compounding, two settlement days).
    #[must_use]
    pub fn new(
        symbol: impl Into<String>,
        issue_date: Date,
        maturity_date: Date,
        evaluation_date: Date,
        face_value: Decimal,
        kind: BondKind,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            bond_type: kind.bond_type(),
            currency: default_currency(),
            issue_date,
            maturity_date,
            evaluation_date,
            settlement_days: default_settlement_days(),
            calendar: CalendarKind::default(),
            business_day_convention: BusinessDayConventionKind::default(),
            face_value,
            market_price: None,
            day_count_convention: DayCountConventionKind::default(),
            compounding: CompoundingKind::default(),
            frequency: FrequencyKind::default(),
            kind,
        }
    }

    /// Sets the quoted market price.
    #[must_use]
    pub fn with_market_price(mut self, price: Decimal) -> Self {
        self.market_price = Some(price);
        self
    }

    /// Sets the currency code.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Sets the settlement lag.
    #[must_use]
    pub fn with_settlement_days(mut self, days: i32) -> Self {
        self.settlement_days = days;
        self
    }

    /// Sets the holiday calendar.
    #[must_use]
    pub fn with_calendar(mut self, calendar: CalendarKind) -> Self {
        self.calendar = calendar;
        self
    }

    /// Sets the business day convention.
    #[must_use]
    pub fn with_business_day_convention(mut self, convention: BusinessDayConventionKind) -> Self {
        self.business_day_convention = convention;
        self
    }

    /// Sets the day count convention.
    #[must_use]
    pub fn with_day_count(mut self, day_count: DayCountConventionKind) -> Self {
        self.day_count_convention = day_count;
        self
    }

    /// Sets the compounding rule and frequency.
    #[must_use]
    pub fn with_compounding(mut self, compounding: CompoundingKind, frequency: FrequencyKind) -> Self {
        self.compounding = compounding;
        self.frequency = frequency;
        self
    }

    /// Overrides the declared bond type without touching the payload.
    #[must_use]
    pub fn with_bond_type(mut self, bond_type: BondType) -> Self {
        self.bond_type = bond_type;
        self
    }

    /// Returns the coupon terms, if any.
    #[must_use]
    pub fn coupon(&self) -> Option<&CouponTerms> {
        self.kind.coupon()
    }

    /// Face value as a float.
    pub fn face(&self) -> BondResult<f64> {
        decimal_to_f64(self.face_value, "face_value")
    }

    /// Checks the record's own fields.
    ///
    /// Date checks that need a calendar (settlement) are done by the engine.
    pub fn validate(&self) -> BondResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(BondError::invalid_parameters("symbol", "must not be empty"));
        }
        if self.settlement_days < 0 {
            return Err(BondError::invalid_parameters(
                "settlement_days",
                format!("must be non-negative, got {}", self.settlement_days),
            ));
        }
        if self.maturity_date <= self.issue_date {
            return Err(BondError::invalid_parameters(
                "maturity_date",
                format!(
                    "maturity {} must be after issue {}",
                    self.maturity_date, self.issue_date
                ),
            ));
        }
        if self.evaluation_date < self.issue_date {
            return Err(BondError::invalid_parameters(
                "evaluation_date",
                format!(
                    "evaluation date {} precedes issue date {}",
                    self.evaluation_date, self.issue_date
                ),
            ));
        }
        if self.evaluation_date > self.maturity_date {
            return Err(BondError::invalid_parameters(
                "evaluation_date",
                format!(
                    "evaluation date {} follows maturity date {}",
                    self.evaluation_date, self.maturity_date
                ),
            ));
        }
        if self.face_value <= Decimal::ZERO {
            return Err(BondError::invalid_parameters(
                "face_value",
                format!("must be positive, got {}", self.face_value),
            ));
        }
        if let Some(price) = self.market_price {
            if price <= Decimal::ZERO {
                return Err(BondError::invalid_parameters(
                    "market_price",
                    format!("must be positive, got {price}"),
                ));
            }
        }
        if let Some(coupon) = self.kind.coupon() {
            if coupon.coupon_rate < Decimal::ZERO || coupon.coupon_rate > Decimal::ONE {
                return Err(BondError::invalid_parameters(
                    "coupon_rate",
                    format!("must be within [0, 1], got {}", coupon.coupon_rate),
                ));
            }
        }
        self.validate_kind()
    }

    fn validate_kind(&self) -> BondResult<()> {
        match &self.kind {
            BondKind::ZeroCoupon | BondKind::FixedCoupon { .. } => Ok(()),
            BondKind::Callable { call_schedule, .. } => {
                validate_exercise_schedule("call_schedule", call_schedule, self.maturity_date)
            }
            BondKind::Putable { put_schedule, .. } => {
                validate_exercise_schedule("put_schedule", put_schedule, self.maturity_date)
            }
            BondKind::Floating { gearing, .. } => {
                if *gearing < Decimal::ZERO {
                    return Err(BondError::invalid_parameters(
                        "gearing",
                        format!("must be non-negative, got {gearing}"),
                    ));
                }
                Ok(())
            }
            BondKind::SinkingFund {
                sinking_fund_schedule,
                ..
            } => validate_sinking_fund(sinking_fund_schedule, self.face_value),
        }
    }
}

fn validate_exercise_schedule(
    field: &str,
    schedule: &[ScheduleEntry],
    maturity: Date,
) -> BondResult<()> {
    if schedule.is_empty() {
        return Err(BondError::invalid_parameters(field, "must not be empty"));
    }
    for (i, entry) in schedule.iter().enumerate() {
        if entry.price <= Decimal::ZERO {
            return Err(BondError::invalid_parameters(
                field,
                format!("price on {} must be positive, got {}", entry.date, entry.price),
            ));
        }
        if entry.date > maturity {
            return Err(BondError::invalid_parameters(
                field,
                format!("date {} is after maturity {maturity}", entry.date),
            ));
        }
        if i > 0 {
            let previous = schedule[i - 1].date;
            if entry.date == previous {
                return Err(BondError::invalid_parameters(
                    field,
                    format!("duplicate date {}", entry.date),
                ));
            }
            if entry.date < previous {
                return Err(BondError::invalid_parameters(
                    field,
                    format!("dates must be increasing, {} follows {previous}", entry.date),
                ));
            }
        }
    }
    Ok(())
}

fn validate_sinking_fund(schedule: &[SinkingFundEntry], face_value: Decimal) -> BondResult<()> {
    const FIELD: &str = "sinking_fund_schedule";
    if schedule.is_empty() {
        return Err(BondError::invalid_parameters(FIELD, "must not be empty"));
    }
    let mut dates: Vec<Date> = schedule.iter().map(|entry| entry.date).collect();
    dates.sort();
    if let Some(pair) = dates.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(BondError::invalid_parameters(
            FIELD,
            format!("duplicate date {}", pair[0]),
        ));
    }
    if let Some(entry) = schedule.iter().find(|entry| entry.notional <= Decimal::ZERO) {
        return Err(BondError::invalid_parameters(
            FIELD,
            format!("notional on {} must be positive, got {}", entry.date, entry.notional),
        ));
    }
    let total: Decimal = schedule.iter().map(|entry| entry.notional).sum();
    let gap = decimal_to_f64((total - face_value).abs(), FIELD)?;
    if gap > SINKING_FUND_TOLERANCE {
        return Err(BondError::invalid_parameters(
            FIELD,
            format!("notionals sum to {total}, expected face value {face_value}"),
        ));
    }
    Ok(())
}

/// Converts a record decimal to a float, naming the field on failure.
pub(crate) fn decimal_to_f64(value: Decimal, field: &str) -> BondResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| BondError::invalid_parameters(field, format!("{value} is not representable")))
}
