//! Batch validation
//!
//! Two entry points over the same checks: [`run_checks`] collects
//! categorized issues and never fails; [`validate_strict`] rejects the
//! whole batch atomically when anything critical was found. Warnings and
//! info never block. Dollar thresholds come from [`PlanningLimits`], not
//! from literals here.

use serde::{Deserialize, Serialize};

use crate::error::ValidationRejected;
use crate::frequency::{to_monthly, validate_conversion};
use crate::limits::PlanningLimits;
use crate::model::{EventId, EventKind, Frequency, RawEvent};
use crate::normalize::extract_amount;
use crate::routing::route_event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// One finding from the validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Stable machine-readable code for the check that fired.
    pub code: String,
    pub event: Option<EventId>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationStats {
    pub events_checked: usize,
    pub critical_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
}

/// Outcome of a collecting validation pass.
///
/// `errors` holds critical findings; `warnings` holds warning and info
/// findings. `valid` is false exactly when `errors` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub stats: ValidationStats,
}

struct IssueCollector {
    issues: Vec<ValidationIssue>,
}

impl IssueCollector {
    fn push(&mut self, severity: Severity, code: &'static str, event: Option<EventId>, message: String) {
        self.issues.push(ValidationIssue {
            severity,
            code: code.to_string(),
            event,
            message,
        });
    }

    fn critical(&mut self, code: &'static str, event: EventId, message: String) {
        self.push(Severity::Critical, code, Some(event), message);
    }

    fn warning(&mut self, code: &'static str, event: EventId, message: String) {
        self.push(Severity::Warning, code, Some(event), message);
    }

    fn info(&mut self, code: &'static str, event: EventId, message: String) {
        self.push(Severity::Info, code, Some(event), message);
    }
}

fn check_event(raw: &RawEvent, limits: &PlanningLimits, out: &mut IssueCollector) {
    if raw.name.trim().is_empty() {
        out.critical("missing_name", raw.id, "event has no name".to_string());
    }

    // Marker kinds legitimately carry no amount and route to no bucket;
    // anything else about them worth saying is informational.
    if raw.kind.policy().amount == crate::model::AmountCapability::None {
        match &raw.payload {
            crate::model::EventPayload::Marker => out.info(
                "no_cash_impact",
                raw.id,
                format!("{:?} is a planning marker with no cash flow", raw.kind),
            ),
            _ => out.critical(
                "mismatched_payload",
                raw.id,
                format!("{:?} must carry a marker payload", raw.kind),
            ),
        }
        return;
    }

    // Amount extraction mirrors the normalizer's capability rules; a kind
    // with no usable amount fails the batch before normalization would.
    let extracted = match extract_amount(raw) {
        Ok(pair) => Some(pair),
        Err(e) => {
            let code = match e {
                crate::error::NormalizeError::MismatchedPayload { .. } => "mismatched_payload",
                _ => "missing_amount",
            };
            out.critical(code, raw.id, e.to_string());
            None
        }
    };

    // Routing mirrors the account router exactly, so a contribution with
    // no target is rejected here with the same descriptive message.
    let explicit_token = match &raw.payload {
        crate::model::EventPayload::CashFlow(f) => f.target_account.as_deref(),
        _ => None,
    };
    let target = match route_event(raw.id, raw.kind, explicit_token) {
        Ok(target) => target,
        Err(e) => {
            out.critical("unroutable_account", raw.id, e.to_string());
            None
        }
    };

    let Some((amount, frequency)) = extracted else {
        return;
    };

    if !amount.is_finite() {
        out.critical(
            "non_finite_amount",
            raw.id,
            format!("amount {amount} is not a finite number"),
        );
        return;
    }

    if amount < 0.0 && !raw.kind.is_signed() {
        out.warning(
            "negative_amount",
            raw.id,
            format!("negative amount {amount} on unsigned kind {:?} will be clamped to zero", raw.kind),
        );
    }

    let monthly = to_monthly(amount, frequency).amount;
    if monthly.abs() > limits.plausible_monthly_amount {
        out.warning(
            "implausible_amount",
            raw.id,
            format!(
                "monthly-equivalent amount {monthly:.2} exceeds plausibility bound {:.2}",
                limits.plausible_monthly_amount
            ),
        );
    }

    if !validate_conversion(amount, frequency) {
        out.warning(
            "conversion_round_trip",
            raw.id,
            format!("amount {amount} does not round-trip through {frequency:?} conversion"),
        );
    }

    // Per-kind semantic rules.
    if let Some(ceiling) = limits.statutory_ceiling(raw.kind, target) {
        let annualized = monthly * 12.0;
        if annualized > ceiling {
            out.warning(
                "contribution_over_limit",
                raw.id,
                format!(
                    "annualized contribution {annualized:.2} exceeds the {} statutory ceiling {ceiling:.2}",
                    limits.version
                ),
            );
        }
    }

    if raw.kind == EventKind::QuarterlyEstimatedTax && frequency != Frequency::Quarterly {
        out.warning(
            "frequency_mismatch",
            raw.id,
            format!("quarterly estimated tax declared with {frequency:?} frequency"),
        );
    }

    if frequency == Frequency::OnceOff && raw.end.is_some() {
        out.info(
            "end_ignored",
            raw.id,
            "end offset has no effect on a one-time event".to_string(),
        );
    }
}

/// Collecting validation pass. Never fails; categorizes everything it
/// finds and reports stats.
pub fn run_checks(events: &[RawEvent], limits: &PlanningLimits) -> ValidationReport {
    let mut collector = IssueCollector { issues: Vec::new() };
    for raw in events {
        check_event(raw, limits, &mut collector);
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut stats = ValidationStats {
        events_checked: events.len(),
        ..Default::default()
    };
    for issue in collector.issues {
        match issue.severity {
            Severity::Critical => {
                stats.critical_count += 1;
                errors.push(issue);
            }
            Severity::Warning => {
                stats.warning_count += 1;
                warnings.push(issue);
            }
            Severity::Info => {
                stats.info_count += 1;
                warnings.push(issue);
            }
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
        stats,
    }
}

/// Fail-fast gate over [`run_checks`].
///
/// A batch either fully passes (possibly with warnings) or is rejected
/// atomically with every collected issue attached.
pub fn validate_strict(
    events: &[RawEvent],
    limits: &PlanningLimits,
) -> Result<ValidationReport, ValidationRejected> {
    let report = run_checks(events, limits);
    if report.valid {
        Ok(report)
    } else {
        Err(ValidationRejected { report })
    }
}
