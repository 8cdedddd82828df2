//! Occurrence expansion
//!
//! Turns normalized events into engine-ready occurrences, bounded by an
//! occurrence-count ceiling. Exceeding the ceiling degrades the entire
//! batch to recurring descriptors — all-or-nothing, so callers always get
//! a predictable output shape rather than a mix.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frequency::apply_growth;
use crate::model::{
    CanonicalEvent, CanonicalMetadata, EventCategory, Frequency, NormalizedEvent,
};

/// How a batch was materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionMode {
    /// Every occurrence materialized eagerly.
    Expanded,
    /// One descriptor per source event, expanded lazily by the engine.
    Recurring,
}

/// Whether growth stays frozen at the normalized amount or compounds at
/// each occurrence's own offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthMode {
    /// Growth was applied once at normalization; every occurrence reuses
    /// that amount. Matches long-standing behavior.
    #[default]
    FrozenAtNormalization,
    /// Recompute growth per occurrence from its month offset.
    PerOccurrence,
}

/// Default ceiling on materialized occurrences per batch.
pub const DEFAULT_OCCURRENCE_CEILING: u64 = 100_000;

/// Estimated occurrences per simulated year for a declared frequency.
///
/// Sub-monthly flows aggregate to one occurrence a month; annual income
/// pays out monthly while annual non-income hits once a year.
fn occurrences_per_year(frequency: Frequency, category: EventCategory) -> u64 {
    match frequency {
        Frequency::Monthly
        | Frequency::Weekly
        | Frequency::Biweekly
        | Frequency::Quarterly
        | Frequency::Semiannually => 12,
        Frequency::Annually => {
            if category == EventCategory::Income {
                12
            } else {
                1
            }
        }
        Frequency::OnceOff => 1,
    }
}

/// Estimate the total occurrence count a batch would expand to.
pub fn estimate_occurrences(events: &[NormalizedEvent], horizon_months: u32) -> u64 {
    let horizon_years = u64::from(horizon_months.div_ceil(12));
    events
        .iter()
        .map(|ev| match ev.original_frequency {
            Frequency::OnceOff => 1,
            freq => occurrences_per_year(freq, ev.kind.category()) * horizon_years,
        })
        .sum()
}

/// Rough memory footprint of materializing `occurrences` canonical events.
pub fn estimate_memory_mb(occurrences: u64) -> f64 {
    let bytes = occurrences as f64 * std::mem::size_of::<CanonicalEvent>() as f64;
    bytes / (1024.0 * 1024.0)
}

fn occurrence(
    ev: &NormalizedEvent,
    month_offset: u32,
    amount: f64,
    frequency: Frequency,
) -> CanonicalEvent {
    CanonicalEvent {
        id: ev.id,
        kind: ev.kind,
        description: ev.name.clone(),
        month_offset,
        amount,
        frequency,
        target_account: ev.target_account,
        metadata: CanonicalMetadata {
            recurring: false,
            interval_months: None,
            end_month_offset: None,
            original_frequency: ev.original_frequency,
            annual_growth_rate: ev.annual_growth_rate,
        },
    }
}

fn grown_amount(ev: &NormalizedEvent, month_offset: u32, growth_mode: GrowthMode) -> f64 {
    match (growth_mode, ev.annual_growth_rate) {
        (GrowthMode::PerOccurrence, Some(rate)) => {
            apply_growth(ev.monthly_amount, rate, f64::from(month_offset) / 12.0)
        }
        _ => ev.monthly_amount,
    }
}

/// Materialize every occurrence of one event within the horizon.
///
/// Events starting at or past the horizon produce nothing. An absent end
/// offset recurs to the end of the horizon.
pub fn expand_event(
    ev: &NormalizedEvent,
    horizon_months: u32,
    growth_mode: GrowthMode,
) -> Vec<CanonicalEvent> {
    if horizon_months == 0 || ev.start_month_offset >= horizon_months {
        return Vec::new();
    }
    let start = ev.start_month_offset;
    let end = ev
        .end_month_offset
        .unwrap_or(horizon_months - 1)
        .min(horizon_months - 1);

    match ev.original_frequency {
        Frequency::OnceOff => {
            vec![occurrence(ev, start, grown_amount(ev, start, growth_mode), Frequency::OnceOff)]
        }
        // Annual non-income hits each 12-month boundary with the full
        // annual amount, not divided.
        Frequency::Annually if ev.kind.category() != EventCategory::Income => (start..=end)
            .step_by(12)
            .map(|offset| {
                let amount = 12.0 * grown_amount(ev, offset, growth_mode);
                occurrence(ev, offset, amount, Frequency::OnceOff)
            })
            .collect(),
        // Everything else is a monthly stream of the monthly-equivalent
        // amount: monthly, aggregated weekly/biweekly, spread quarterly/
        // semiannual, and annual income paid out monthly.
        _ => (start..=end)
            .map(|offset| {
                occurrence(ev, offset, grown_amount(ev, offset, growth_mode), Frequency::Monthly)
            })
            .collect(),
    }
}

/// Collapse one event to a single recurring descriptor for lazy engine
/// expansion. One-time events are already canonical and pass through.
pub fn recurring_descriptor(ev: &NormalizedEvent) -> CanonicalEvent {
    match ev.original_frequency {
        Frequency::OnceOff => occurrence(
            ev,
            ev.start_month_offset,
            ev.monthly_amount,
            Frequency::OnceOff,
        ),
        Frequency::Annually if ev.kind.category() != EventCategory::Income => CanonicalEvent {
            metadata: CanonicalMetadata {
                recurring: true,
                interval_months: Some(12),
                end_month_offset: ev.end_month_offset,
                original_frequency: ev.original_frequency,
                annual_growth_rate: ev.annual_growth_rate,
            },
            ..occurrence(
                ev,
                ev.start_month_offset,
                ev.monthly_amount * 12.0,
                Frequency::OnceOff,
            )
        },
        _ => CanonicalEvent {
            metadata: CanonicalMetadata {
                recurring: true,
                interval_months: Some(1),
                end_month_offset: ev.end_month_offset,
                original_frequency: ev.original_frequency,
                annual_growth_rate: ev.annual_growth_rate,
            },
            ..occurrence(
                ev,
                ev.start_month_offset,
                ev.monthly_amount,
                Frequency::Monthly,
            )
        },
    }
}

/// Expand a batch, degrading to recurring mode when the estimate exceeds
/// the ceiling. The degrade is all-or-nothing: one oversized event puts
/// the whole batch in recurring mode.
pub fn expand_batch(
    events: &[NormalizedEvent],
    horizon_months: u32,
    occurrence_ceiling: u64,
    growth_mode: GrowthMode,
) -> (Vec<CanonicalEvent>, ExpansionMode) {
    let estimate = estimate_occurrences(events, horizon_months);
    if estimate > occurrence_ceiling {
        debug!(
            estimate,
            occurrence_ceiling, "occurrence estimate over ceiling, degrading batch to recurring mode"
        );
        let descriptors = events.iter().map(recurring_descriptor).collect();
        return (descriptors, ExpansionMode::Recurring);
    }

    #[cfg(feature = "parallel")]
    let per_event: Vec<Vec<CanonicalEvent>> = events
        .par_iter()
        .map(|ev| expand_event(ev, horizon_months, growth_mode))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let per_event: Vec<Vec<CanonicalEvent>> = events
        .iter()
        .map(|ev| expand_event(ev, horizon_months, growth_mode))
        .collect();

    (per_event.into_iter().flatten().collect(), ExpansionMode::Expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountKind, EventId, EventKind};

    fn normalized(kind: EventKind, monthly: f64, frequency: Frequency) -> NormalizedEvent {
        NormalizedEvent {
            id: EventId(1),
            name: "test".to_string(),
            kind,
            monthly_amount: monthly,
            start_month_offset: 0,
            end_month_offset: None,
            original_amount: crate::frequency::from_monthly(monthly, frequency),
            original_frequency: frequency,
            annual_growth_rate: None,
            target_account: Some(AccountKind::Cash),
        }
    }

    #[test]
    fn test_monthly_expansion_conserves_amount() {
        let ev = normalized(EventKind::LivingExpenses, 2_500.0, Frequency::Monthly);
        let out = expand_event(&ev, 36, GrowthMode::default());
        assert_eq!(out.len(), 36);
        assert!(out.iter().all(|c| c.amount == 2_500.0));
        assert!(out.iter().all(|c| c.frequency == Frequency::Monthly));
        assert!(!out[0].metadata.recurring);
    }

    #[test]
    fn test_once_off_expands_to_single_occurrence() {
        let mut ev = normalized(EventKind::OneTimeExpense, 9_000.0, Frequency::OnceOff);
        ev.start_month_offset = 17;
        let out = expand_event(&ev, 120, GrowthMode::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].month_offset, 17);
        assert_eq!(out[0].amount, 9_000.0);
        assert_eq!(out[0].frequency, Frequency::OnceOff);
    }

    #[test]
    fn test_annual_income_pays_out_monthly() {
        let ev = normalized(EventKind::Salary, 10_000.0, Frequency::Annually);
        let out = expand_event(&ev, 240, GrowthMode::default());
        assert_eq!(out.len(), 240);
        assert!(out.iter().all(|c| c.amount == 10_000.0));
    }

    #[test]
    fn test_annual_non_income_hits_yearly_with_full_amount() {
        let ev = normalized(EventKind::InsurancePremium, 100.0, Frequency::Annually);
        let out = expand_event(&ev, 60, GrowthMode::default());
        assert_eq!(out.len(), 5);
        assert_eq!(
            out.iter().map(|c| c.month_offset).collect::<Vec<_>>(),
            vec![0, 12, 24, 36, 48]
        );
        // Full annual amount, not divided.
        assert!(out.iter().all(|c| c.amount == 1_200.0));
        assert!(out.iter().all(|c| c.frequency == Frequency::OnceOff));
    }

    #[test]
    fn test_start_past_horizon_expands_to_nothing() {
        let mut ev = normalized(EventKind::LivingExpenses, 100.0, Frequency::Monthly);
        ev.start_month_offset = 360;
        assert!(expand_event(&ev, 120, GrowthMode::default()).is_empty());
    }

    #[test]
    fn test_end_offset_bounds_expansion() {
        let mut ev = normalized(EventKind::LivingExpenses, 100.0, Frequency::Monthly);
        ev.start_month_offset = 6;
        ev.end_month_offset = Some(17);
        let out = expand_event(&ev, 600, GrowthMode::default());
        assert_eq!(out.len(), 12);
        assert_eq!(out.first().unwrap().month_offset, 6);
        assert_eq!(out.last().unwrap().month_offset, 17);
    }

    #[test]
    fn test_per_occurrence_growth_compounds() {
        let mut ev = normalized(EventKind::Salary, 1_000.0, Frequency::Monthly);
        ev.annual_growth_rate = Some(0.03);
        let out = expand_event(&ev, 25, GrowthMode::PerOccurrence);
        assert_eq!(out[0].amount, 1_000.0);
        let expected_two_years = 1_000.0 * 1.03f64.powi(2);
        assert!((out[24].amount - expected_two_years).abs() < 1e-6);

        // Frozen mode reuses the normalized amount everywhere.
        let frozen = expand_event(&ev, 25, GrowthMode::FrozenAtNormalization);
        assert!(frozen.iter().all(|c| c.amount == 1_000.0));
    }

    #[test]
    fn test_batch_over_ceiling_degrades_to_recurring() {
        let events: Vec<NormalizedEvent> = (0..10)
            .map(|i| {
                let mut ev = normalized(EventKind::LivingExpenses, 100.0, Frequency::Monthly);
                ev.id = EventId(i);
                ev
            })
            .collect();
        // 10 events * 12/yr * 50 yr = 6000 estimated; ceiling below that.
        let (out, mode) = expand_batch(&events, 600, 1_000, GrowthMode::default());
        assert_eq!(mode, ExpansionMode::Recurring);
        assert_eq!(out.len(), events.len());
        assert!(out.iter().all(|c| c.metadata.recurring));
        assert!(out.iter().all(|c| c.metadata.interval_months == Some(1)));

        let (expanded, mode) = expand_batch(&events, 600, 100_000, GrowthMode::default());
        assert_eq!(mode, ExpansionMode::Expanded);
        assert_eq!(expanded.len(), 6_000);
    }

    #[test]
    fn test_estimator_counts_once_off_as_single() {
        let events = vec![
            normalized(EventKind::OneTimeExpense, 100.0, Frequency::OnceOff),
            normalized(EventKind::LivingExpenses, 100.0, Frequency::Monthly),
            normalized(EventKind::InsurancePremium, 100.0, Frequency::Annually),
        ];
        // 1 + 12*10 + 1*10 over a 10-year horizon.
        assert_eq!(estimate_occurrences(&events, 120), 131);
    }
}
