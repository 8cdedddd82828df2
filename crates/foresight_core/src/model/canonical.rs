//! Intermediate and engine-facing event records
//!
//! `NormalizedEvent` is the per-input intermediate produced by the
//! normalizer; `CanonicalEvent` is what the projection engine consumes.
//! Both are ephemeral and regenerated per simulation run.

use serde::{Deserialize, Serialize};

use super::events::{EventKind, Frequency};
use super::ids::EventId;
use super::policy::AccountKind;

/// An amount paired with the frequency it was declared at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountWithFrequency {
    pub amount: f64,
    pub frequency: Frequency,
}

/// One canonical intermediate record per input event.
///
/// Amounts are monthly-equivalent and offsets are resolved month offsets;
/// the original declaration survives in `original_amount`/
/// `original_frequency` for expansion decisions and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub id: EventId,
    pub name: String,
    pub kind: EventKind,
    /// Finite by invariant; negative only for signed "change" kinds.
    pub monthly_amount: f64,
    pub start_month_offset: u32,
    /// `None` means indefinite recurrence; the horizon bounds it only at
    /// expansion time, never here.
    pub end_month_offset: Option<u32>,
    pub original_amount: f64,
    pub original_frequency: Frequency,
    pub annual_growth_rate: Option<f64>,
    pub target_account: Option<AccountKind>,
}

/// Sidecar carried on every canonical event.
///
/// The engine-facing `frequency` field is restricted to the `Monthly` /
/// `OnceOff` sentinels, so everything the engine would otherwise have to
/// interpret (recurrence, interval, end, declared frequency) lives here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMetadata {
    /// True when this is a recurring descriptor the engine must expand
    /// lazily; false for a materialized occurrence.
    pub recurring: bool,
    #[serde(default)]
    pub interval_months: Option<u32>,
    #[serde(default)]
    pub end_month_offset: Option<u32>,
    pub original_frequency: Frequency,
    #[serde(default)]
    pub annual_growth_rate: Option<f64>,
}

/// Engine-ready monthly cash-flow instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub description: String,
    pub month_offset: u32,
    /// Monthly-equivalent amount, except annual non-income occurrences
    /// which carry the full annual amount.
    pub amount: f64,
    /// Guaranteed to be `Monthly` or `OnceOff` after processing.
    pub frequency: Frequency,
    #[serde(default)]
    pub target_account: Option<AccountKind>,
    pub metadata: CanonicalMetadata,
}

impl CanonicalEvent {
    /// Whether this record is a lazily-expanded recurring descriptor.
    pub fn is_recurring_descriptor(&self) -> bool {
        self.metadata.recurring
    }

    /// The calendar (year, month) this occurrence lands in, given the
    /// simulation start date.
    pub fn calendar_slot(&self, start_date: jiff::civil::Date) -> (i16, i8) {
        crate::month_math::offset_to_year_month(start_date, self.month_offset)
    }
}
