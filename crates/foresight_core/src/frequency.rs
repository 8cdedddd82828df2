//! Amount/frequency arithmetic
//!
//! Pure conversions between declared frequencies and monthly-equivalent
//! amounts, plus compound growth. Weekly and biweekly flows are
//! approximated as monthly aggregates (52/12 and 26/12 paychecks a month);
//! `OnceOff` amounts pass through untouched in both directions.

use crate::model::{AmountWithFrequency, Frequency};

/// Convert a declared amount to its monthly equivalent.
pub fn to_monthly(amount: f64, frequency: Frequency) -> AmountWithFrequency {
    let monthly = match frequency {
        Frequency::Monthly => amount,
        Frequency::Annually => amount / 12.0,
        Frequency::Weekly => amount * 52.0 / 12.0,
        Frequency::Biweekly => amount * 26.0 / 12.0,
        Frequency::Quarterly => amount / 3.0,
        Frequency::Semiannually => amount / 6.0,
        Frequency::OnceOff => amount,
    };
    AmountWithFrequency {
        amount: monthly,
        frequency,
    }
}

/// Exact inverse of [`to_monthly`].
pub fn from_monthly(monthly_amount: f64, frequency: Frequency) -> f64 {
    match frequency {
        Frequency::Monthly => monthly_amount,
        Frequency::Annually => monthly_amount * 12.0,
        Frequency::Weekly => monthly_amount * 12.0 / 52.0,
        Frequency::Biweekly => monthly_amount * 12.0 / 26.0,
        Frequency::Quarterly => monthly_amount * 3.0,
        Frequency::Semiannually => monthly_amount * 6.0,
        Frequency::OnceOff => monthly_amount,
    }
}

/// Round-trip tolerance: a cent, or one basis point of the amount for
/// large values.
pub fn conversion_tolerance(amount: f64) -> f64 {
    f64::max(0.01, 0.0001 * amount.abs())
}

/// Internal self-check that a conversion round-trips within tolerance.
///
/// Not a caller-facing gate; the validation pipeline uses it to flag
/// conversions that lost precision.
pub fn validate_conversion(amount: f64, frequency: Frequency) -> bool {
    let monthly = to_monthly(amount, frequency);
    let round_trip = from_monthly(monthly.amount, frequency);
    (round_trip - amount).abs() <= conversion_tolerance(amount)
}

/// Compound a monthly amount by an annual growth rate over elapsed years.
///
/// The annual rate is converted to an equivalent monthly compounding rate
/// `(1 + r)^(1/12) - 1` and raised over `years_elapsed * 12` months. Must
/// be invoked once with total elapsed time, not incrementally per
/// occurrence.
pub fn apply_growth(monthly_amount: f64, annual_rate: f64, years_elapsed: f64) -> f64 {
    if annual_rate <= 0.0 || years_elapsed <= 0.0 {
        return monthly_amount;
    }
    let monthly_rate = (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0;
    monthly_amount * (1.0 + monthly_rate).powf(years_elapsed * 12.0)
}
