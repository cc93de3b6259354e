//! Bond analytics engine.
//!
//! One [`BondAnalytics`] serves all six bond kinds. The record's
//! [`BondKind`](crate::models::BondKind) selects the cash-flow shape
//! (bullet, fixed coupons, projected floating coupons, amortizing) and the
//! optionality (none, call schedule, put schedule).
//!
//! Every metric has a `try_*` form returning a [`BondResult`] and a fail-soft
//! form returning `f64`, where a failure is logged at warn level and becomes
//! NaN. [`BondAnalytics::summary`] computes each metric independently so a
//! failing metric never blanks the others.
//!
//! # Example
//!
//! ```rust
//! use refdata_bonds::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! let record = BondRecord::new(
//!     "ZC30",
//!     Date::from_ymd(2020, 1, 1).unwrap(),
//!     Date::from_ymd(2030, 1, 1).unwrap(),
//!     Date::from_ymd(2023, 1, 1).unwrap(),
//!     dec!(100),
//!     BondKind::ZeroCoupon,
//! )
//! .with_market_price(dec!(82.03));
//!
//! let mut engine = bond_analytics(record).unwrap();
//! let ytm = engine.yield_to_maturity();
//! assert!((ytm - 0.03).abs() < 0.01);
//! ```

mod instrument;
mod summary;

pub use summary::BondSummary;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use refdata_core::calendars::{BusinessDayConvention, Calendar};
use refdata_core::daycounts::DayCountConvention;
use refdata_core::types::{Date, InterestRate, Period};

use crate::cashflows::{aggregate_by_date, DatedAmount};
use crate::config::AnalyticsConfig;
use crate::conventions::{
    to_business_day_convention, to_calendar, to_compounding, to_day_count, to_frequency,
};
use crate::curves::{DiscountCurve, FlatForwardCurve, KeyRateBump, RateQuote};
use crate::error::{BondError, BondResult};
use crate::models::{decimal_to_f64, BondRecord};
use crate::options::{option_adjusted_dirty_price, ExercisePoint, ExerciseStyle, HullWhite};
use crate::pricing::{price_at_yield, TimedCashFlow, YieldSolver};
use crate::risk;
use crate::types::BondType;

use instrument::{ExerciseDate, Instrument};
use summary::finite;

/// Dates every calculation is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationContext {
    /// Business-day adjusted valuation date; the curve's reference date.
    pub evaluation_date: Date,
    /// Date cash changes hands; flows on or before it are not priced.
    pub settlement_date: Date,
}

/// Lifecycle of the built instrument.
#[derive(Debug, Clone)]
enum InstrumentState {
    Unbuilt,
    Built(Arc<Instrument>),
    Stale,
}

/// Key-rate duration at one tenor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyRateDuration {
    /// Key tenor in years.
    pub tenor: f64,
    /// Price sensitivity to a bump centred on the tenor.
    pub duration: f64,
}

/// Analytics engine for one bond record.
///
/// Not intended for concurrent mutation: updates take `&mut self`, and the
/// curve quote is shared with the curve handle so a rate update is visible
/// to it immediately.
pub struct BondAnalytics {
    record: BondRecord,
    config: AnalyticsConfig,
    calendar: Box<dyn Calendar>,
    convention: BusinessDayConvention,
    day_count: DayCountConvention,
    conventions: InterestRate,
    issue_date: Date,
    maturity_date: Date,
    context: EvaluationContext,
    curve: FlatForwardCurve,
    state: InstrumentState,
    cache: Option<BondSummary>,
}

impl fmt::Debug for BondAnalytics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BondAnalytics")
            .field("symbol", &self.record.symbol)
            .field("bond_type", &self.record.bond_type)
            .field("calendar", &self.calendar.name())
            .field("context", &self.context)
            .field("curve_rate", &self.curve.quote().value())
            .field("built", &self.is_built())
            .finish_non_exhaustive()
    }
}

impl BondAnalytics {
    /// Validates `record` and sets up the evaluation context and curve.
    ///
    /// The instrument itself is built lazily on first use.
    ///
    /// # Errors
    ///
    /// Returns [`BondError::InvalidBondParameters`] for inconsistent dates or
    /// values, and [`BondError::UnsupportedConvention`] for a calendar with no
    /// holiday set.
    pub fn new(record: BondRecord, config: AnalyticsConfig) -> BondResult<Self> {
        config.validate()?;
        record.validate()?;

        let calendar = to_calendar(record.calendar)?;
        let convention = to_business_day_convention(record.business_day_convention);
        let day_count = to_day_count(record.day_count_convention);
        let conventions = InterestRate::new(
            config.initial_rate,
            day_count,
            to_compounding(record.compounding),
            to_frequency(record.frequency),
        )?;

        let issue_date = calendar.adjust(record.issue_date, convention)?;
        let maturity_date = calendar.adjust(record.maturity_date, convention)?;
        let evaluation_date = calendar.adjust(record.evaluation_date, convention)?;
        let settlement_date = settlement_for(
            calendar.as_ref(),
            convention,
            evaluation_date,
            record.settlement_days,
        )?;
        check_settlement(settlement_date, issue_date, maturity_date)?;

        let curve = FlatForwardCurve::new(
            evaluation_date,
            RateQuote::new(config.initial_rate),
            day_count,
            conventions.compounding(),
            conventions.frequency(),
        )?;

        log::debug!(
            "{}: evaluation {evaluation_date}, settlement {settlement_date}",
            record.symbol
        );

        Ok(Self {
            record,
            config,
            calendar,
            convention,
            day_count,
            conventions,
            issue_date,
            maturity_date,
            context: EvaluationContext {
                evaluation_date,
                settlement_date,
            },
            curve,
            state: InstrumentState::Unbuilt,
            cache: None,
        })
    }

    /// The bond record.
    #[must_use]
    pub fn record(&self) -> &BondRecord {
        &self.record
    }

    /// Declared bond type.
    #[must_use]
    pub fn bond_type(&self) -> BondType {
        self.record.bond_type
    }

    /// Current evaluation and settlement dates.
    #[must_use]
    pub fn context(&self) -> EvaluationContext {
        self.context
    }

    /// Settlement date.
    #[must_use]
    pub fn settlement_date(&self) -> Date {
        self.context.settlement_date
    }

    /// Analytics configuration.
    #[must_use]
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Discount curve handle.
    #[must_use]
    pub fn curve(&self) -> &FlatForwardCurve {
        &self.curve
    }

    /// Returns true once the instrument has been built and not invalidated.
    #[must_use]
    pub fn is_built(&self) -> bool {
        matches!(self.state, InstrumentState::Built(_))
    }

    /// Returns true when a summary is cached.
    #[must_use]
    pub fn has_cached_summary(&self) -> bool {
        self.cache.is_some()
    }

    /// Builds the instrument now instead of on first use.
    ///
    /// # Errors
    ///
    /// Sinking fund schedules that do not line up with the coupon schedule
    /// fail here.
    pub fn build(&mut self) -> BondResult<()> {
        self.instrument().map(|_| ())
    }

    /// Marks the instrument stale and drops the cached summary.
    pub fn invalidate(&mut self) {
        if self.is_built() {
            self.state = InstrumentState::Stale;
        }
        self.cache = None;
    }

    fn instrument(&mut self) -> BondResult<Arc<Instrument>> {
        if let InstrumentState::Built(instrument) = &self.state {
            return Ok(Arc::clone(instrument));
        }
        log::debug!(
            "{}: building {} instrument",
            self.record.symbol,
            self.record.bond_type
        );
        let instrument = Arc::new(Instrument::build(
            &self.record,
            self.calendar.as_ref(),
            self.convention,
            self.day_count,
        )?);
        self.state = InstrumentState::Built(Arc::clone(&instrument));
        Ok(instrument)
    }

    fn face(&self) -> BondResult<f64> {
        self.record.face()
    }

    fn soft(&self, metric: &str, result: BondResult<f64>) -> f64 {
        match result {
            Ok(value) => value,
            Err(e) => {
                log::warn!("{}: {metric} unavailable: {e}", self.record.symbol);
                f64::NAN
            }
        }
    }

    // ---- prices ------------------------------------------------------

    /// Dirty price in face value units.
    pub fn try_dirty_price(&mut self) -> BondResult<f64> {
        let instrument = self.instrument()?;
        Ok(instrument.dirty_value(&self.curve, self.context.settlement_date))
    }

    /// Accrued interest at settlement in face value units.
    pub fn try_accrued_interest(&mut self) -> BondResult<f64> {
        let instrument = self.instrument()?;
        let settlement = self.context.settlement_date;
        Ok(instrument.accrued_at(settlement, &self.curve, settlement))
    }

    /// Clean price in face value units.
    pub fn try_clean_price(&mut self) -> BondResult<f64> {
        Ok(self.try_dirty_price()? - self.try_accrued_interest()?)
    }

    /// Clean price in face value units, NaN on failure.
    pub fn clean_price(&mut self) -> f64 {
        let result = self.try_clean_price();
        self.soft("clean_price", result)
    }

    /// Dirty price in face value units, NaN on failure.
    pub fn dirty_price(&mut self) -> f64 {
        let result = self.try_dirty_price();
        self.soft("dirty_price", result)
    }

    /// Accrued interest in face value units, NaN on failure.
    pub fn accrued_interest(&mut self) -> f64 {
        let result = self.try_accrued_interest();
        self.soft("accrued_interest", result)
    }

    /// Clean price per 100 of face used for yield solving: the market price
    /// when quoted, otherwise the curve clean price.
    pub fn try_normalized_price(&mut self) -> BondResult<f64> {
        let face = self.face()?;
        if let Some(price) = self.record.market_price {
            return Ok(decimal_to_f64(price, "market_price")? / face * 100.0);
        }
        log::warn!(
            "{}: no market price, solving yields on the curve clean price",
            self.record.symbol
        );
        Ok(self.try_clean_price()? / face * 100.0)
    }

    /// Normalized price, NaN on failure.
    pub fn normalized_price(&mut self) -> f64 {
        let result = self.try_normalized_price();
        self.soft("normalized_price", result)
    }

    // ---- yields ------------------------------------------------------

    /// Flows after settlement per 100 of face, timed with the record day
    /// count. With `redemption`, flows stop at its date and its price per
    /// 100 is paid there.
    fn yield_flows(
        &self,
        instrument: &Instrument,
        redemption: Option<ExerciseDate>,
    ) -> BondResult<Vec<TimedCashFlow>> {
        let settlement = self.context.settlement_date;
        let scale = 100.0 / instrument.face();
        let flows = instrument.cashflows(&self.curve, settlement);
        let mut timed: Vec<TimedCashFlow> = flows
            .iter()
            .filter(|cf| cf.date > settlement)
            .filter(|cf| match redemption {
                Some(exercise) => {
                    cf.date <= exercise.date && cf.kind == crate::cashflows::CashFlowKind::Coupon
                }
                None => true,
            })
            .map(|cf| {
                TimedCashFlow::new(
                    self.day_count.year_fraction(settlement, cf.date),
                    cf.amount * scale,
                )
            })
            .collect();
        if let Some(exercise) = redemption {
            timed.push(TimedCashFlow::new(
                self.day_count.year_fraction(settlement, exercise.date),
                exercise.price,
            ));
        }
        if timed.is_empty() {
            return Err(BondError::pricing("no cash flows after settlement"));
        }
        Ok(timed)
    }

    fn solve_yield(&mut self, redemption: Option<ExerciseDate>) -> BondResult<InterestRate> {
        let instrument = self.instrument()?;
        let flows = self.yield_flows(&instrument, redemption)?;
        let accrued = self.try_accrued_interest()? / instrument.face() * 100.0;
        let target = self.try_normalized_price()? + accrued;
        YieldSolver::new(self.config.solver()).solve(&flows, target, &self.conventions)
    }

    fn first_exercise(&mut self, style: ExerciseStyle) -> BondResult<ExerciseDate> {
        let instrument = self.instrument()?;
        let label = match style {
            ExerciseStyle::Call => "call",
            ExerciseStyle::Put => "put",
        };
        let exercise = instrument
            .exercise()
            .filter(|e| e.style == style)
            .ok_or_else(|| BondError::pricing(format!("bond has no {label} schedule")))?;
        exercise
            .dates
            .iter()
            .copied()
            .find(|e| e.date > self.context.settlement_date)
            .ok_or_else(|| BondError::pricing(format!("no {label} date after settlement")))
    }

    /// Yield to maturity.
    pub fn try_yield_to_maturity(&mut self) -> BondResult<f64> {
        Ok(self.solve_yield(None)?.rate())
    }

    /// Yield to the first call date after settlement.
    pub fn try_yield_to_call(&mut self) -> BondResult<f64> {
        let call = self.first_exercise(ExerciseStyle::Call)?;
        Ok(self.solve_yield(Some(call))?.rate())
    }

    /// Yield to the first put date after settlement.
    pub fn try_yield_to_put(&mut self) -> BondResult<f64> {
        let put = self.first_exercise(ExerciseStyle::Put)?;
        Ok(self.solve_yield(Some(put))?.rate())
    }

    /// Yield to maturity, NaN on failure.
    pub fn yield_to_maturity(&mut self) -> f64 {
        let result = self.try_yield_to_maturity();
        self.soft("yield_to_maturity", result)
    }

    /// Yield to call, NaN on failure or for non-callable bonds.
    pub fn yield_to_call(&mut self) -> f64 {
        let result = self.try_yield_to_call();
        self.soft("yield_to_call", result)
    }

    /// Yield to put, NaN on failure or for non-putable bonds.
    pub fn yield_to_put(&mut self) -> f64 {
        let result = self.try_yield_to_put();
        self.soft("yield_to_put", result)
    }

    /// Lowest of the yield to maturity and the yield to the first exercise
    /// date. Callable and putable bonds both take the minimum; other bonds
    /// return the yield to maturity.
    pub fn yield_to_worst(&mut self) -> f64 {
        let ytm = self.yield_to_maturity();
        let exercise = match self.record.bond_type {
            BondType::Callable => self.yield_to_call(),
            BondType::Putable => self.yield_to_put(),
            _ => return ytm,
        };
        match (ytm.is_finite(), exercise.is_finite()) {
            (true, true) => ytm.min(exercise),
            (true, false) => ytm,
            (false, true) => exercise,
            (false, false) => f64::NAN,
        }
    }

    // ---- risk --------------------------------------------------------

    fn ytm_and_flows(&mut self) -> BondResult<(InterestRate, Vec<TimedCashFlow>)> {
        let ytm = self.solve_yield(None)?;
        let instrument = self.instrument()?;
        let flows = self.yield_flows(&instrument, None)?;
        Ok((ytm, flows))
    }

    /// Modified duration at the yield to maturity.
    pub fn try_modified_duration(&mut self) -> BondResult<f64> {
        let (ytm, flows) = self.ytm_and_flows()?;
        risk::modified_duration(&flows, &ytm)
    }

    /// Macaulay duration at the yield to maturity.
    pub fn try_macaulay_duration(&mut self) -> BondResult<f64> {
        let (ytm, flows) = self.ytm_and_flows()?;
        risk::macaulay_duration(&flows, &ytm)
    }

    /// Duration with the yield to maturity read as a simple rate.
    pub fn try_simple_duration(&mut self) -> BondResult<f64> {
        let (ytm, flows) = self.ytm_and_flows()?;
        risk::simple_duration(&flows, &ytm)
    }

    /// Convexity at the yield to maturity.
    pub fn try_convexity(&mut self) -> BondResult<f64> {
        let (ytm, flows) = self.ytm_and_flows()?;
        risk::convexity(&flows, &ytm)
    }

    /// Modified duration, NaN on failure.
    pub fn modified_duration(&mut self) -> f64 {
        let result = self.try_modified_duration();
        self.soft("modified_duration", result)
    }

    /// Macaulay duration, NaN on failure.
    pub fn macaulay_duration(&mut self) -> f64 {
        let result = self.try_macaulay_duration();
        self.soft("macaulay_duration", result)
    }

    /// Simple duration, NaN on failure.
    pub fn simple_duration(&mut self) -> f64 {
        let result = self.try_simple_duration();
        self.soft("simple_duration", result)
    }

    /// Convexity, NaN on failure.
    pub fn convexity(&mut self) -> f64 {
        let result = self.try_convexity();
        self.soft("convexity", result)
    }

    /// `(P(y - bump) - P(y + bump)) / (2 · bump)` on the clean price in face
    /// value units, around the yield to maturity.
    pub fn try_dv01(&mut self, bump: f64) -> BondResult<f64> {
        let (ytm, flows) = self.ytm_and_flows()?;
        let face = self.face()?;
        let accrued = self.try_accrued_interest()? / face * 100.0;
        risk::dv01(
            |rate| Ok((price_at_yield(&flows, rate) - accrued) * face / 100.0),
            &ytm,
            bump,
        )
    }

    /// DV01, NaN on failure.
    pub fn dv01(&mut self, bump: f64) -> f64 {
        let result = self.try_dv01(bump);
        self.soft("dv01", result)
    }

    /// Sensitivity of the curve dirty price to triangular zero-rate bumps
    /// at `tenors` (years, ascending): `(P(-bump) - P(+bump)) / (2 · bump · P)`.
    pub fn key_rate_durations(
        &mut self,
        tenors: &[f64],
        bump: f64,
    ) -> BondResult<Vec<KeyRateDuration>> {
        if !(bump.is_finite() && bump > 0.0) {
            return Err(BondError::invalid_parameters(
                "bump_size",
                format!("must be positive, got {bump}"),
            ));
        }
        if tenors.windows(2).any(|w| w[1] <= w[0]) {
            return Err(BondError::invalid_parameters(
                "tenors",
                "must be strictly increasing",
            ));
        }
        let instrument = self.instrument()?;
        let settlement = self.context.settlement_date;
        let base = instrument.dirty_value(&self.curve, settlement);
        if base <= 0.0 {
            return Err(BondError::pricing("non-positive dirty price"));
        }
        Ok(KeyRateBump::profile(tenors, bump)
            .into_iter()
            .map(|up| {
                let down = up.with_shift(-bump);
                let p_down = instrument.dirty_value(&down.apply(&self.curve), settlement);
                let p_up = instrument.dirty_value(&up.apply(&self.curve), settlement);
                KeyRateDuration {
                    tenor: up.key_tenor(),
                    duration: (p_down - p_up) / (2.0 * bump * base),
                }
            })
            .collect())
    }

    /// Clean price in face value units with the embedded option valued on a
    /// Hull-White tree fitted to the curve.
    ///
    /// Exercise pays the schedule's clean price plus accrued interest.
    pub fn try_option_adjusted_price(&mut self) -> BondResult<f64> {
        let instrument = self.instrument()?;
        let exercise = instrument
            .exercise()
            .ok_or_else(|| BondError::pricing("bond has no embedded option"))?;
        let settlement = self.context.settlement_date;
        let face = instrument.face();
        let scale = 100.0 / face;

        let t0 = self.curve.time_to(settlement);
        let anchor = self.curve.discount_factor(t0);
        let curve = &self.curve;
        let discount = move |t: f64| curve.discount_factor(t0 + t) / anchor;

        let flows: Vec<(f64, f64)> = instrument
            .cashflows(curve, settlement)
            .iter()
            .filter(|cf| cf.date > settlement)
            .map(|cf| (curve.time_to(cf.date) - t0, cf.amount * scale))
            .collect();
        let points: Vec<ExercisePoint> = exercise
            .dates
            .iter()
            .filter(|e| e.date > settlement)
            .map(|e| ExercisePoint {
                time: curve.time_to(e.date) - t0,
                strike: e.price + instrument.accrued_at(e.date, curve, settlement) * scale,
            })
            .collect();

        let model = HullWhite::new(self.config.hw_mean_reversion, self.config.hw_volatility);
        let dirty = option_adjusted_dirty_price(
            &model,
            &discount,
            &flows,
            &points,
            exercise.style,
            self.config.tree_steps,
        )?;
        let accrued = instrument.accrued_at(settlement, curve, settlement) * scale;
        Ok((dirty - accrued) / scale)
    }

    /// Option adjusted price, NaN on failure or for bonds without options.
    pub fn option_adjusted_price(&mut self) -> f64 {
        let result = self.try_option_adjusted_price();
        self.soft("option_adjusted_price", result)
    }

    // ---- cash flows and curve ----------------------------------------

    /// Flows on or after settlement in face value units, aggregated by date.
    ///
    /// Returns an empty list if the instrument cannot be built.
    pub fn cashflows(&mut self) -> Vec<DatedAmount> {
        match self.instrument() {
            Ok(instrument) => {
                let settlement = self.context.settlement_date;
                let flows: Vec<_> = instrument
                    .cashflows(&self.curve, settlement)
                    .into_iter()
                    .filter(|cf| cf.date >= settlement)
                    .collect();
                aggregate_by_date(&flows)
            }
            Err(e) => {
                log::warn!("{}: cash flows unavailable: {e}", self.record.symbol);
                Vec::new()
            }
        }
    }

    /// Zero rates sampled at `points` evenly spaced dates from `start` to
    /// `end` (defaults: issue and maturity), in the record's conventions.
    ///
    /// Sample dates are business-day adjusted, capped at `end`, and `end` is
    /// always included. Returns an empty map, logged at error level, for an
    /// invalid range.
    pub fn get_discount_curve(
        &self,
        start: Option<Date>,
        end: Option<Date>,
        points: usize,
    ) -> BTreeMap<Date, f64> {
        match self.try_discount_curve(start, end, points) {
            Ok(samples) => samples,
            Err(e) => {
                log::error!("{}: discount curve sampling failed: {e}", self.record.symbol);
                BTreeMap::new()
            }
        }
    }

    fn try_discount_curve(
        &self,
        start: Option<Date>,
        end: Option<Date>,
        points: usize,
    ) -> BondResult<BTreeMap<Date, f64>> {
        let start = start.unwrap_or(self.issue_date);
        let end = end.unwrap_or(self.maturity_date);
        if start > end {
            return Err(BondError::invalid_parameters(
                "start",
                format!("start {start} is after end {end}"),
            ));
        }
        if points < 2 {
            return Err(BondError::invalid_parameters(
                "points",
                format!("must be at least 2, got {points}"),
            ));
        }

        let total_days = start.days_between(&end);
        let intervals = (points - 1) as i64;
        let mut samples = BTreeMap::new();
        for i in 0..intervals {
            let offset = i * total_days / intervals;
            let date = self
                .calendar
                .adjust(start.add_days(offset), self.convention)?
                .min(end);
            samples.insert(date, self.zero_rate(date)?);
        }
        samples.insert(end, self.zero_rate(end)?);
        Ok(samples)
    }

    fn zero_rate(&self, date: Date) -> BondResult<f64> {
        Ok(self
            .curve
            .zero_rate(
                date,
                self.day_count,
                self.conventions.compounding(),
                self.conventions.frequency(),
            )?
            .rate())
    }

    // ---- summary -----------------------------------------------------

    /// Every metric, each computed independently; cached until the next
    /// update.
    pub fn summary(&mut self) -> BondSummary {
        if let Some(cached) = &self.cache {
            return cached.clone();
        }

        let bump = self.config.bump;
        let mut summary = BondSummary {
            clean_price: finite(self.clean_price()),
            dirty_price: finite(self.dirty_price()),
            accrued_interest: finite(self.accrued_interest()),
            normalized_price: finite(self.normalized_price()),
            yield_to_maturity: finite(self.yield_to_maturity()),
            yield_to_worst: finite(self.yield_to_worst()),
            modified_duration: finite(self.modified_duration()),
            macaulay_duration: finite(self.macaulay_duration()),
            simple_duration: finite(self.simple_duration()),
            convexity: finite(self.convexity()),
            dv01: finite(self.dv01(bump)),
            extras: BTreeMap::new(),
            cashflows: self.cashflows(),
        };
        match self.record.bond_type {
            BondType::Callable => {
                let ytc = self.yield_to_call();
                summary.extras.insert("yield_to_call".to_string(), finite(ytc));
            }
            BondType::Putable => {
                let ytp = self.yield_to_put();
                summary.extras.insert("yield_to_put".to_string(), finite(ytp));
            }
            _ => {}
        }
        if self.record.bond_type.has_optionality() {
            let oap = self.option_adjusted_price();
            summary
                .extras
                .insert("option_adjusted_price".to_string(), finite(oap));
        }

        self.cache = Some(summary.clone());
        summary
    }

    // ---- updates -----------------------------------------------------

    /// Sets the flat curve rate in place.
    ///
    /// # Errors
    ///
    /// Negative or non-finite rates are rejected with
    /// [`BondError::InvalidRate`]; the curve and cached summary are left
    /// untouched.
    pub fn update_yield_curve(&mut self, rate: f64) -> BondResult<()> {
        self.curve.set_rate(rate)?;
        log::info!("{}: curve rate set to {rate}", self.record.symbol);
        self.cache = None;
        Ok(())
    }

    /// Moves the evaluation date, re-deriving settlement and re-anchoring
    /// the curve. The instrument is rebuilt on next use.
    ///
    /// # Errors
    ///
    /// Dates outside `[issue_date, maturity_date]` are rejected.
    pub fn update_evaluation_date(&mut self, new_date: Date) -> BondResult<()> {
        self.check_within_life("evaluation_date", new_date)?;
        let evaluation_date = self.calendar.adjust(new_date, self.convention)?;
        let settlement_date = settlement_for(
            self.calendar.as_ref(),
            self.convention,
            evaluation_date,
            self.record.settlement_days,
        )?;
        check_settlement(settlement_date, self.issue_date, self.maturity_date)?;

        self.record.evaluation_date = new_date;
        self.context = EvaluationContext {
            evaluation_date,
            settlement_date,
        };
        self.curve = self.curve.rebased(evaluation_date);
        self.state = InstrumentState::Stale;
        self.cache = None;
        log::info!(
            "{}: evaluation date {evaluation_date}, settlement {settlement_date}",
            self.record.symbol
        );
        Ok(())
    }

    /// Overrides the settlement date, keeping the evaluation date.
    ///
    /// A non-business day rolls to the next business day.
    ///
    /// # Errors
    ///
    /// Dates outside `[issue_date, maturity_date]` are rejected.
    pub fn update_settlement_date(&mut self, new_date: Date) -> BondResult<()> {
        self.check_within_life("settlement_date", new_date)?;
        let settlement_date = roll_to_business_day(self.calendar.as_ref(), new_date)?;
        self.context.settlement_date = settlement_date;
        self.state = InstrumentState::Stale;
        self.cache = None;
        log::info!("{}: settlement date {settlement_date}", self.record.symbol);
        Ok(())
    }

    fn check_within_life(&self, field: &str, date: Date) -> BondResult<()> {
        if date < self.record.issue_date || date > self.record.maturity_date {
            return Err(BondError::invalid_parameters(
                field,
                format!(
                    "{date} is outside [{}, {}]",
                    self.record.issue_date, self.record.maturity_date
                ),
            ));
        }
        Ok(())
    }
}

/// Evaluation date advanced by the settlement lag, on a business day.
fn settlement_for(
    calendar: &dyn Calendar,
    convention: BusinessDayConvention,
    evaluation_date: Date,
    settlement_days: i32,
) -> BondResult<Date> {
    let advanced = calendar.advance(evaluation_date, Period::days(settlement_days), convention)?;
    let adjusted = calendar.adjust(advanced, convention)?;
    roll_to_business_day(calendar, adjusted)
}

fn roll_to_business_day(calendar: &dyn Calendar, date: Date) -> BondResult<Date> {
    if calendar.is_business_day(date) {
        return Ok(date);
    }
    let rolled = calendar.next_business_day(date)?;
    log::info!("settlement {date} is not a business day, rolled to {rolled}");
    Ok(rolled)
}

fn check_settlement(settlement: Date, issue: Date, maturity: Date) -> BondResult<()> {
    if settlement < issue {
        return Err(BondError::invalid_parameters(
            "evaluation_date",
            format!("settlement {settlement} precedes issue {issue}"),
        ));
    }
    if settlement > maturity {
        return Err(BondError::invalid_parameters(
            "evaluation_date",
            format!("settlement {settlement} follows maturity {maturity}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BondKind, CouponTerms, ScheduleEntry};
    use crate::types::{
        BusinessDayConventionKind, CalendarKind, CouponFrequency, DayCountConventionKind,
    };
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn fixed(market_price: Option<rust_decimal::Decimal>) -> BondRecord {
        let record = BondRecord::new(
            "FIX28",
            d(2023, 1, 1),
            d(2028, 1, 1),
            d(2023, 1, 1),
            dec!(1000),
            BondKind::FixedCoupon {
                coupon: CouponTerms::new(dec!(0.05), CouponFrequency::SemiAnnual),
            },
        );
        match market_price {
            Some(price) => record.with_market_price(price),
            None => record,
        }
    }

    fn engine(record: BondRecord) -> BondAnalytics {
        BondAnalytics::new(record, AnalyticsConfig::default()).unwrap()
    }

    #[test]
    fn test_settlement_skips_holiday() {
        // 2023-01-01 is a Sunday; adjusted evaluation is Monday 2023-01-02
        let engine = engine(fixed(None));
        assert_eq!(engine.context().evaluation_date, d(2023, 1, 2));
        assert_eq!(engine.settlement_date(), d(2023, 1, 4));
    }

    #[test]
    fn test_lazy_build_and_invalidate() {
        let mut engine = engine(fixed(None));
        assert!(!engine.is_built());
        let _ = engine.clean_price();
        assert!(engine.is_built());
        engine.invalidate();
        assert!(!engine.is_built());
        engine.build().unwrap();
        assert!(engine.is_built());
    }

    #[test]
    fn test_price_identity() {
        let mut engine = engine(fixed(None));
        engine.update_settlement_date(d(2024, 3, 15)).unwrap();
        let dirty = engine.dirty_price();
        let clean = engine.clean_price();
        let accrued = engine.accrued_interest();
        assert!(accrued > 0.0);
        assert_relative_eq!(dirty, clean + accrued, epsilon = 1e-9);
    }

    #[test]
    fn test_update_yield_curve_moves_price() {
        let mut engine = engine(fixed(None));
        let before = engine.clean_price();
        engine.update_yield_curve(0.07).unwrap();
        assert!(engine.clean_price() < before);
    }

    #[test]
    fn test_negative_rate_keeps_cache() {
        let mut engine = engine(fixed(Some(dec!(1050))));
        let summary = engine.summary();
        assert!(engine.has_cached_summary());
        let err = engine.update_yield_curve(-0.01).unwrap_err();
        assert!(matches!(err, BondError::InvalidRate { .. }));
        assert!(engine.has_cached_summary());
        assert_relative_eq!(engine.curve().quote().value(), 0.05);
        assert_eq!(engine.summary(), summary);
    }

    #[test]
    fn test_update_evaluation_date_rebuilds() {
        let mut engine = engine(fixed(None));
        engine.build().unwrap();
        engine.update_yield_curve(0.04).unwrap();
        engine.update_evaluation_date(d(2025, 6, 2)).unwrap();
        assert!(!engine.is_built());
        assert_eq!(engine.curve().reference_date(), d(2025, 6, 2));
        assert_relative_eq!(engine.curve().quote().value(), 0.04);
        assert_eq!(engine.settlement_date(), d(2025, 6, 4));
    }

    #[test]
    fn test_update_evaluation_date_out_of_range() {
        let mut engine = engine(fixed(None));
        assert!(engine.update_evaluation_date(d(2022, 12, 31)).is_err());
        assert!(engine.update_evaluation_date(d(2028, 1, 2)).is_err());
        assert!(engine.update_settlement_date(d(2030, 1, 1)).is_err());
    }

    #[test]
    fn test_settlement_after_maturity_rejected() {
        let record = fixed(None);
        let record = BondRecord {
            evaluation_date: d(2027, 12, 31),
            ..record
        };
        let err = BondAnalytics::new(record, AnalyticsConfig::default()).unwrap_err();
        assert!(
            matches!(err, BondError::InvalidBondParameters { ref field, .. } if field == "evaluation_date")
        );
    }

    #[test]
    fn test_unsupported_calendar() {
        let record = fixed(None).with_calendar(CalendarKind::Japan);
        let err = BondAnalytics::new(record, AnalyticsConfig::default()).unwrap_err();
        assert!(matches!(err, BondError::UnsupportedConvention { kind: "calendar", .. }));
    }

    #[test]
    fn test_unadjusted_settlement_rolls() {
        let record = fixed(None)
            .with_settlement_days(0)
            .with_business_day_convention(BusinessDayConventionKind::Unadjusted);
        let engine = engine(record);
        assert_eq!(engine.settlement_date(), d(2023, 1, 2));
    }

    #[test]
    fn test_non_option_bond_has_no_yield_to_call() {
        let mut engine = engine(fixed(None));
        assert!(engine.yield_to_call().is_nan());
        assert!(engine.option_adjusted_price().is_nan());
        let ytm = engine.yield_to_maturity();
        assert_relative_eq!(engine.yield_to_worst(), ytm);
    }

    #[test]
    fn test_yield_without_market_price_reproduces_curve_rate() {
        // Annual ACT/365F curve at 5%: solving on the curve clean price must
        // return the curve rate.
        let mut engine = engine(fixed(None));
        assert_relative_eq!(engine.yield_to_maturity(), 0.05, epsilon = 1e-8);
    }

    #[test]
    fn test_discount_curve_samples() {
        let engine = engine(fixed(None));
        let samples = engine.get_discount_curve(None, None, 5);
        assert_eq!(samples.len(), 5);
        assert_eq!(samples.keys().next_back(), Some(&d(2028, 1, 3)));
        for rate in samples.values() {
            assert_relative_eq!(*rate, 0.05, epsilon = 1e-10);
        }
        assert!(engine.get_discount_curve(None, None, 1).is_empty());
        assert!(engine
            .get_discount_curve(Some(d(2027, 1, 1)), Some(d(2026, 1, 1)), 5)
            .is_empty());
    }

    #[test]
    fn test_discount_curve_keeps_every_point_under_actual_360() {
        let record = BondRecord::new(
            "FIX33",
            d(2023, 1, 1),
            d(2033, 1, 1),
            d(2023, 1, 1),
            dec!(1000),
            BondKind::FixedCoupon {
                coupon: CouponTerms::new(dec!(0.05), CouponFrequency::SemiAnnual),
            },
        )
        .with_day_count(DayCountConventionKind::Actual360);
        let engine = engine(record);
        for points in [50, 100, 250] {
            let samples = engine.get_discount_curve(None, None, points);
            assert_eq!(samples.len(), points);
            assert_eq!(samples.keys().next_back(), Some(&d(2033, 1, 3)));
        }
    }

    #[test]
    fn test_summary_at_maturity_has_unsigned_zero_price() {
        let mut engine = engine(fixed(None));
        engine.update_settlement_date(d(2028, 1, 1)).unwrap();
        let summary = engine.summary();
        let clean = summary.clean_price.unwrap();
        assert_eq!(clean, 0.0);
        assert!(clean.is_sign_positive());
        assert!(summary.dirty_price.unwrap().is_sign_positive());
    }

    #[test]
    fn test_key_rate_durations_sum_to_parallel_duration() {
        // a full profile is a parallel continuous shift, whose duration is
        // the Macaulay duration when the yield equals the curve rate
        let mut engine = engine(fixed(None));
        let krds = engine
            .key_rate_durations(crate::curves::DEFAULT_KEY_TENORS, 1e-4)
            .unwrap();
        let total: f64 = krds.iter().map(|k| k.duration).sum();
        let macaulay = engine.macaulay_duration();
        assert!(total > 0.0);
        assert_relative_eq!(total, macaulay, max_relative = 1e-4);
    }

    #[test]
    fn test_callable_option_price_below_straight() {
        let record = BondRecord::new(
            "CALL30",
            d(2023, 1, 1),
            d(2030, 1, 1),
            d(2023, 1, 1),
            dec!(100),
            BondKind::Callable {
                coupon: CouponTerms::new(dec!(0.06), CouponFrequency::SemiAnnual),
                call_schedule: vec![
                    ScheduleEntry::new(d(2026, 1, 1), dec!(100)),
                    ScheduleEntry::new(d(2027, 1, 1), dec!(100)),
                ],
            },
        );
        let mut engine = engine(record);
        let straight = engine.clean_price();
        let oap = engine.option_adjusted_price();
        assert!(oap.is_finite());
        assert!(oap < straight);
    }
}
