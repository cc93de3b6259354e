//! Built instruments: the dated legs of a bond, ready to be valued on a curve.

use refdata_core::calendars::{BusinessDayConvention, Calendar};
use refdata_core::daycounts::DayCountConvention;
use refdata_core::types::Date;

use crate::cashflows::{CashFlow, Schedule};
use crate::curves::DiscountCurve;
use crate::error::{BondError, BondResult};
use crate::models::{decimal_to_f64, BondKind, BondRecord, ScheduleEntry, SinkingFundEntry};
use crate::options::ExerciseStyle;

/// How a period's coupon rate is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CouponSpec {
    Fixed {
        rate: f64,
    },
    Floating {
        current_fixing: Option<f64>,
        gearing: f64,
        spread: f64,
    },
}

/// One coupon accrual period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CouponPeriod {
    pub accrual_start: Date,
    pub accrual_end: Date,
    pub payment_date: Date,
    /// Outstanding notional over the period, face units.
    pub notional: f64,
}

/// An exercise date with its clean price per 100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ExerciseDate {
    pub date: Date,
    pub price: f64,
}

/// Embedded option terms.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Exercise {
    pub style: ExerciseStyle,
    pub dates: Vec<ExerciseDate>,
}

/// A bond's legs on adjusted dates.
#[derive(Debug, Clone)]
pub(crate) struct Instrument {
    face: f64,
    day_count: DayCountConvention,
    coupon: Option<CouponSpec>,
    periods: Vec<CouponPeriod>,
    principal: Vec<CashFlow>,
    exercise: Option<Exercise>,
    maturity: Date,
}

impl Instrument {
    /// Builds the legs for `record`.
    ///
    /// Coupon schedules run from the unadjusted issue date to the unadjusted
    /// maturity. Sinking fund repayments must fall one per coupon period.
    pub fn build(
        record: &BondRecord,
        calendar: &dyn Calendar,
        convention: BusinessDayConvention,
        day_count: DayCountConvention,
    ) -> BondResult<Self> {
        let face = record.face()?;

        let Some(terms) = record.coupon() else {
            let maturity = calendar.adjust(record.maturity_date, convention)?;
            return Ok(Self {
                face,
                day_count,
                coupon: None,
                periods: Vec::new(),
                principal: vec![CashFlow::redemption(maturity, face)],
                exercise: None,
                maturity,
            });
        };

        let schedule = Schedule::backward(
            record.issue_date,
            record.maturity_date,
            terms.coupon_frequency.months_per_period(),
            calendar,
            convention,
        )?;
        let maturity = schedule
            .dates()
            .last()
            .copied()
            .ok_or_else(|| BondError::pricing("empty coupon schedule"))?;

        let coupon = match &record.kind {
            BondKind::Floating {
                spread, gearing, ..
            } => {
                let rate = terms.rate()?;
                CouponSpec::Floating {
                    current_fixing: (rate != 0.0).then_some(rate),
                    gearing: decimal_to_f64(*gearing, "gearing")?,
                    spread: decimal_to_f64(*spread, "spread")?,
                }
            }
            _ => CouponSpec::Fixed {
                rate: terms.rate()?,
            },
        };

        let repayments = match &record.kind {
            BondKind::SinkingFund {
                sinking_fund_schedule,
                ..
            } => align_sinking_fund(&schedule, sinking_fund_schedule)?,
            _ => {
                let mut bullet = vec![0.0; schedule.period_count()];
                if let Some(last) = bullet.last_mut() {
                    *last = face;
                }
                bullet
            }
        };

        let mut periods = Vec::with_capacity(schedule.period_count());
        let mut principal = Vec::new();
        let mut outstanding = face;
        let last = schedule.period_count().saturating_sub(1);
        for (i, ((start, end), repayment)) in schedule.periods().zip(&repayments).enumerate() {
            periods.push(CouponPeriod {
                accrual_start: start,
                accrual_end: end,
                payment_date: end,
                notional: outstanding,
            });
            if *repayment > 0.0 {
                principal.push(if i == last {
                    CashFlow::redemption(end, *repayment)
                } else {
                    CashFlow::amortization(end, *repayment)
                });
            }
            outstanding -= repayment;
        }

        let exercise = match &record.kind {
            BondKind::Callable { call_schedule, .. } => Some(exercise_dates(
                ExerciseStyle::Call,
                call_schedule,
                calendar,
                convention,
            )?),
            BondKind::Putable { put_schedule, .. } => Some(exercise_dates(
                ExerciseStyle::Put,
                put_schedule,
                calendar,
                convention,
            )?),
            _ => None,
        };

        Ok(Self {
            face,
            day_count,
            coupon: Some(coupon),
            periods,
            principal,
            exercise,
            maturity,
        })
    }

    pub fn face(&self) -> f64 {
        self.face
    }

    pub fn maturity(&self) -> Date {
        self.maturity
    }

    pub fn exercise(&self) -> Option<&Exercise> {
        self.exercise.as_ref()
    }

    /// Annual coupon rate for period `index`.
    fn period_rate<C: DiscountCurve + ?Sized>(
        &self,
        index: usize,
        curve: &C,
        settlement: Date,
    ) -> f64 {
        match self.coupon {
            None => 0.0,
            Some(CouponSpec::Fixed { rate }) => rate,
            Some(CouponSpec::Floating {
                current_fixing,
                gearing,
                spread,
            }) => {
                let period = &self.periods[index];
                let is_current = period.payment_date > settlement
                    && (index == 0 || self.periods[index - 1].payment_date <= settlement);
                match current_fixing {
                    Some(fixing) if is_current => fixing,
                    _ => {
                        let forward = curve.forward_rate(
                            period.accrual_start,
                            period.accrual_end,
                            self.day_count,
                        );
                        gearing * forward + spread
                    }
                }
            }
        }
    }

    /// Every flow over the bond's life, in date order.
    pub fn cashflows<C: DiscountCurve + ?Sized>(&self, curve: &C, settlement: Date) -> Vec<CashFlow> {
        let mut flows: Vec<CashFlow> = self
            .periods
            .iter()
            .enumerate()
            .map(|(i, period)| {
                let tau = self
                    .day_count
                    .year_fraction(period.accrual_start, period.accrual_end);
                let rate = self.period_rate(i, curve, settlement);
                CashFlow::coupon(period.payment_date, period.notional * rate * tau)
            })
            .collect();
        flows.extend(self.principal.iter().copied());
        flows.sort_by_key(|cf| cf.date);
        flows
    }

    /// Interest accrued at `date` in face units.
    pub fn accrued_at<C: DiscountCurve + ?Sized>(
        &self,
        date: Date,
        curve: &C,
        settlement: Date,
    ) -> f64 {
        self.periods
            .iter()
            .enumerate()
            .find(|(_, p)| p.accrual_start < date && date < p.payment_date)
            .map_or(0.0, |(i, period)| {
                let end = date.min(period.accrual_end);
                let tau = self.day_count.year_fraction(period.accrual_start, end);
                period.notional * self.period_rate(i, curve, settlement) * tau
            })
    }

    /// Present value at `settlement` of flows paid after it, face units.
    pub fn dirty_value<C: DiscountCurve + ?Sized>(&self, curve: &C, settlement: Date) -> f64 {
        let anchor = curve.discount(settlement);
        self.cashflows(curve, settlement)
            .iter()
            .filter(|cf| cf.date > settlement)
            .map(|cf| cf.amount * curve.discount(cf.date) / anchor)
            .sum()
    }
}

fn exercise_dates(
    style: ExerciseStyle,
    entries: &[ScheduleEntry],
    calendar: &dyn Calendar,
    convention: BusinessDayConvention,
) -> BondResult<Exercise> {
    let dates = entries
        .iter()
        .map(|entry| {
            Ok(ExerciseDate {
                date: calendar.adjust(entry.date, convention)?,
                price: decimal_to_f64(entry.price, "exercise_price")?,
            })
        })
        .collect::<BondResult<Vec<_>>>()?;
    Ok(Exercise { style, dates })
}

/// Matches each repayment to a coupon payment date, unadjusted or adjusted.
fn align_sinking_fund(schedule: &Schedule, entries: &[SinkingFundEntry]) -> BondResult<Vec<f64>> {
    const FIELD: &str = "sinking_fund_schedule";
    let periods = schedule.period_count();
    if entries.len() != periods {
        return Err(BondError::invalid_parameters(
            FIELD,
            format!(
                "{} repayments for {periods} coupon periods",
                entries.len()
            ),
        ));
    }

    let unadjusted = &schedule.unadjusted_dates()[1..];
    let adjusted = &schedule.dates()[1..];
    let mut repayments = vec![0.0; periods];
    for entry in entries {
        let index = (0..periods)
            .find(|&i| unadjusted[i] == entry.date || adjusted[i] == entry.date)
            .ok_or_else(|| {
                BondError::invalid_parameters(
                    FIELD,
                    format!("repayment date {} is not a coupon payment date", entry.date),
                )
            })?;
        repayments[index] = decimal_to_f64(entry.notional, FIELD)?;
    }
    Ok(repayments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{FlatForwardCurve, RateQuote};
    use crate::models::CouponTerms;
    use crate::types::CouponFrequency;
    use approx::assert_relative_eq;
    use refdata_core::calendars::{NullCalendar, Target};
    use refdata_core::types::{Compounding, Frequency};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn curve(reference: Date, rate: f64) -> FlatForwardCurve {
        FlatForwardCurve::new(
            reference,
            RateQuote::new(rate),
            DayCountConvention::Act365Fixed,
            Compounding::Compounded,
            Frequency::Annual,
        )
        .unwrap()
    }

    fn build(record: &BondRecord) -> BondResult<Instrument> {
        Instrument::build(
            record,
            &NullCalendar,
            BusinessDayConvention::Following,
            DayCountConvention::Act365Fixed,
        )
    }

    fn sinking(entries: Vec<SinkingFundEntry>) -> BondRecord {
        BondRecord::new(
            "SINK",
            d(2023, 1, 1),
            d(2026, 1, 1),
            d(2023, 1, 1),
            dec!(300),
            BondKind::SinkingFund {
                coupon: CouponTerms::new(dec!(0.04), CouponFrequency::Annual),
                sinking_fund_schedule: entries,
                sinking_fund_type: None,
            },
        )
    }

    #[test]
    fn test_zero_coupon_single_redemption() {
        let record = BondRecord::new(
            "ZC",
            d(2020, 1, 1),
            d(2030, 1, 1),
            d(2023, 1, 1),
            dec!(100),
            BondKind::ZeroCoupon,
        );
        let instrument = Instrument::build(
            &record,
            &Target,
            BusinessDayConvention::Following,
            DayCountConvention::Act365Fixed,
        )
        .unwrap();
        let flows = instrument.cashflows(&curve(d(2023, 1, 2), 0.05), d(2023, 1, 4));
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].date, d(2030, 1, 2));
        assert_relative_eq!(flows[0].amount, 100.0);
    }

    #[test]
    fn test_sinking_fund_amortizes_notional() {
        let record = sinking(vec![
            SinkingFundEntry::new(d(2024, 1, 1), dec!(100)),
            SinkingFundEntry::new(d(2025, 1, 1), dec!(100)),
            SinkingFundEntry::new(d(2026, 1, 1), dec!(100)),
        ]);
        let instrument = build(&record).unwrap();
        let flows = instrument.cashflows(&curve(d(2023, 1, 1), 0.05), d(2023, 1, 3));
        let coupons: Vec<f64> = flows
            .iter()
            .filter(|cf| cf.kind == crate::cashflows::CashFlowKind::Coupon)
            .map(|cf| cf.amount)
            .collect();
        assert_relative_eq!(coupons[0], 300.0 * 0.04, epsilon = 1e-12);
        assert_relative_eq!(coupons[1], 200.0 * 0.04 * 366.0 / 365.0, epsilon = 1e-12);
        assert_relative_eq!(coupons[2], 100.0 * 0.04, epsilon = 1e-12);
        let principal: f64 = flows
            .iter()
            .filter(|cf| cf.kind != crate::cashflows::CashFlowKind::Coupon)
            .map(|cf| cf.amount)
            .sum();
        assert_relative_eq!(principal, 300.0);
    }

    #[test]
    fn test_sinking_fund_misaligned_dates_rejected() {
        let record = sinking(vec![
            SinkingFundEntry::new(d(2024, 1, 1), dec!(100)),
            SinkingFundEntry::new(d(2025, 3, 1), dec!(100)),
            SinkingFundEntry::new(d(2026, 1, 1), dec!(100)),
        ]);
        let err = build(&record).unwrap_err();
        assert!(
            matches!(err, BondError::InvalidBondParameters { ref field, .. } if field == "sinking_fund_schedule")
        );
    }

    #[test]
    fn test_sinking_fund_count_mismatch_rejected() {
        let record = sinking(vec![
            SinkingFundEntry::new(d(2025, 1, 1), dec!(150)),
            SinkingFundEntry::new(d(2026, 1, 1), dec!(150)),
        ]);
        assert!(build(&record).is_err());
    }

    #[test]
    fn test_accrued_mid_period() {
        let record = BondRecord::new(
            "FIX",
            d(2023, 1, 1),
            d(2025, 1, 1),
            d(2023, 1, 1),
            dec!(100),
            BondKind::FixedCoupon {
                coupon: CouponTerms::new(dec!(0.06), CouponFrequency::Annual),
            },
        );
        let instrument = build(&record).unwrap();
        let c = curve(d(2023, 1, 1), 0.05);
        let accrued = instrument.accrued_at(d(2023, 7, 1), &c, d(2023, 7, 1));
        assert_relative_eq!(accrued, 100.0 * 0.06 * 181.0 / 365.0, epsilon = 1e-12);
        assert_relative_eq!(instrument.accrued_at(d(2024, 1, 1), &c, d(2024, 1, 1)), 0.0);
    }

    #[test]
    fn test_floating_uses_current_fixing_then_forwards() {
        let record = BondRecord::new(
            "FRN",
            d(2023, 1, 1),
            d(2025, 1, 1),
            d(2023, 1, 1),
            dec!(100),
            BondKind::Floating {
                coupon: CouponTerms::new(dec!(0.03), CouponFrequency::Annual),
                reference_index: "SOFR".to_string(),
                spread: dec!(0.01),
                gearing: dec!(1),
            },
        );
        let instrument = build(&record).unwrap();
        let c = curve(d(2023, 1, 1), 0.05);
        let flows = instrument.cashflows(&c, d(2023, 1, 3));
        assert_relative_eq!(flows[0].amount, 3.0, epsilon = 1e-12);
        // annual compounding at 5% over one ACT/365F year gives a 5% simple forward
        let tau = 366.0 / 365.0;
        let forward = (1.05_f64.powf(tau) - 1.0) / tau;
        assert_relative_eq!(flows[1].amount, 100.0 * (forward + 0.01) * tau, epsilon = 1e-10);
    }
}
