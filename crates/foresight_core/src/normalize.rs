//! Event normalization
//!
//! Converts one raw event into its canonical intermediate record: amount
//! extraction by kind capability, frequency conversion, growth resolution,
//! offset disambiguation, safety clamping, and account routing. This is
//! the single boundary where the loosely-typed input shape is resolved;
//! nothing past here ever sees an ambiguous field.

use tracing::warn;

use crate::error::NormalizeError;
use crate::frequency::{apply_growth, to_monthly};
use crate::limits::PlanningLimits;
use crate::model::{
    AmountCapability, EventCategory, EventPayload, Frequency, NormalizedEvent, RawEvent,
};
use crate::routing::route_event;

/// Per-run inputs to normalization.
#[derive(Debug, Clone)]
pub struct NormalizeContext<'a> {
    /// Calendar year the simulation starts in; the pivot for resolving
    /// the overloaded absolute-year/month-offset scheduling fields.
    pub start_year: i16,
    /// Months elapsed between plan authoring and this normalization run,
    /// used for one-shot growth application.
    pub elapsed_months: u32,
    /// Default annual growth for income kinds that don't opt out.
    pub inflation_rate: f64,
    pub limits: &'a PlanningLimits,
}

/// Extract the declared amount and frequency for an event, per its kind's
/// capability. Failing to find a legal combination is a typed hard error,
/// never a silent zero.
pub fn extract_amount(raw: &RawEvent) -> Result<(f64, Frequency), NormalizeError> {
    let policy = raw.kind.policy();
    let mismatched = || NormalizeError::MismatchedPayload {
        event: raw.id,
        kind: raw.kind,
    };
    let missing = || NormalizeError::MissingAmount {
        event: raw.id,
        kind: raw.kind,
    };

    match policy.amount {
        AmountCapability::Flow => {
            let fields = match &raw.payload {
                EventPayload::CashFlow(f) => f,
                _ => return Err(mismatched()),
            };
            if let Some(amount) = fields.amount {
                Ok((amount, fields.frequency.unwrap_or(Frequency::Monthly)))
            } else if let Some(monthly) = fields.monthly_amount {
                Ok((monthly, Frequency::Monthly))
            } else if let Some(annual) = fields.annual_amount {
                Ok((annual, Frequency::Annually))
            } else {
                Err(missing())
            }
        }
        AmountCapability::PurchaseOutlay => {
            let fields = match &raw.payload {
                EventPayload::RealEstate(f) => f,
                _ => return Err(mismatched()),
            };
            let down = fields.down_payment.ok_or_else(missing)?;
            Ok((down + fields.closing_costs.unwrap_or(0.0), Frequency::OnceOff))
        }
        AmountCapability::SaleProceeds => {
            let fields = match &raw.payload {
                EventPayload::RealEstate(f) => f,
                _ => return Err(mismatched()),
            };
            Ok((fields.sale_proceeds.ok_or_else(missing)?, Frequency::OnceOff))
        }
        AmountCapability::CarryingCost => {
            let fields = match &raw.payload {
                EventPayload::RealEstate(f) => f,
                _ => return Err(mismatched()),
            };
            Ok((fields.monthly_payment.ok_or_else(missing)?, Frequency::Monthly))
        }
        AmountCapability::DebtService => {
            let fields = match &raw.payload {
                EventPayload::Debt(f) => f,
                _ => return Err(mismatched()),
            };
            let payment = fields.payment.ok_or_else(missing)?;
            Ok((payment, fields.frequency.unwrap_or(Frequency::Monthly)))
        }
        AmountCapability::PrincipalBalance => {
            let fields = match &raw.payload {
                EventPayload::Debt(f) => f,
                _ => return Err(mismatched()),
            };
            Ok((fields.balance.ok_or_else(missing)?, Frequency::OnceOff))
        }
        AmountCapability::None => match &raw.payload {
            EventPayload::Marker => Ok((0.0, Frequency::OnceOff)),
            _ => Err(mismatched()),
        },
    }
}

/// The effective annual growth rate for an event.
///
/// Income kinds default to the plan inflation rate unless the event opts
/// out; everything else uses its explicit rate or zero.
pub fn resolve_growth_rate(raw: &RawEvent, inflation_rate: f64) -> f64 {
    let explicit = match &raw.payload {
        EventPayload::CashFlow(f) => f.annual_growth_rate,
        EventPayload::RealEstate(f) => f.annual_appreciation_rate,
        EventPayload::Debt(_) | EventPayload::Marker => None,
    };

    if raw.kind.category() == EventCategory::Income {
        let opted_out = matches!(&raw.payload, EventPayload::CashFlow(f) if f.inflation_adjusted == Some(false));
        if opted_out {
            explicit.unwrap_or(0.0)
        } else {
            explicit.unwrap_or(inflation_rate)
        }
    } else {
        explicit.unwrap_or(0.0)
    }
}

/// Resolve one overloaded scheduling value against the start year.
///
/// Values at or above the start year are absolute calendar years and
/// become `(value - start_year) * 12`; smaller values are already month
/// offsets.
pub fn resolve_offset(value: u32, start_year: i16) -> u32 {
    let start_year = start_year.max(0) as u32;
    if value >= start_year {
        (value - start_year) * 12
    } else {
        value
    }
}

/// Normalize one raw event into its canonical intermediate record.
pub fn normalize_event(
    raw: &RawEvent,
    ctx: &NormalizeContext<'_>,
) -> Result<NormalizedEvent, NormalizeError> {
    let (original_amount, original_frequency) = extract_amount(raw)?;
    let converted = to_monthly(original_amount, original_frequency);

    // Growth is applied exactly once here, with total elapsed time; the
    // resulting amount is reused unmodified for every later occurrence.
    let annual_growth_rate = resolve_growth_rate(raw, ctx.inflation_rate);
    let mut monthly_amount = if annual_growth_rate > 0.0 {
        apply_growth(
            converted.amount,
            annual_growth_rate,
            ctx.elapsed_months as f64 / 12.0,
        )
    } else {
        converted.amount
    };

    let start_month_offset = raw
        .start
        .map(|v| resolve_offset(v, ctx.start_year))
        .unwrap_or(0);
    let end_month_offset = raw.end.map(|v| resolve_offset(v, ctx.start_year));
    if let Some(end) = end_month_offset
        && end < start_month_offset
    {
        return Err(NormalizeError::InvalidOffsets {
            event: raw.id,
            start: start_month_offset,
            end,
        });
    }

    // Safety clamps: keep the batch alive, but never silently.
    if !monthly_amount.is_finite() {
        warn!(event = raw.id.0, name = %raw.name, "non-finite monthly amount clamped to zero");
        monthly_amount = 0.0;
    } else if monthly_amount < 0.0 && !raw.kind.is_signed() {
        warn!(
            event = raw.id.0,
            name = %raw.name,
            amount = monthly_amount,
            "negative amount on unsigned kind clamped to zero"
        );
        monthly_amount = 0.0;
    } else if monthly_amount.abs() > ctx.limits.plausible_monthly_amount {
        warn!(
            event = raw.id.0,
            name = %raw.name,
            amount = monthly_amount,
            "implausibly large monthly amount"
        );
    }

    let explicit_token = match &raw.payload {
        EventPayload::CashFlow(f) => f.target_account.as_deref(),
        _ => None,
    };
    let target_account = route_event(raw.id, raw.kind, explicit_token)?;

    Ok(NormalizedEvent {
        id: raw.id,
        name: raw.name.clone(),
        kind: raw.kind,
        monthly_amount,
        start_month_offset,
        end_month_offset,
        original_amount,
        original_frequency,
        annual_growth_rate: (annual_growth_rate > 0.0).then_some(annual_growth_rate),
        target_account,
    })
}
