use std::fmt;

use crate::invariant::InvariantViolation;
use crate::model::{AccountKind, EventId, EventKind};
use crate::validate::ValidationReport;

/// Errors raised while routing an event to an account bucket.
///
/// All of these are hard failures: account routing defaults have caused
/// silently misrouted retirement money before, so absence and mismatch are
/// never papered over.
#[derive(Debug, Clone)]
pub enum RoutingError {
    /// A kind that requires an explicit target arrived without one.
    MissingTargetAccount {
        event: EventId,
        kind: EventKind,
        valid: &'static [AccountKind],
    },
    /// An explicit target outside the kind's valid set.
    InvalidTargetAccount {
        event: EventId,
        kind: EventKind,
        given: AccountKind,
        valid: &'static [AccountKind],
    },
    /// An explicit target that contradicts the bucket the kind names.
    ConflictingTargetAccount {
        event: EventId,
        kind: EventKind,
        given: AccountKind,
        fixed: AccountKind,
    },
    /// An account token no storage-format generation recognizes.
    UnknownAccountToken { event: EventId, token: String },
}

fn bucket_list(buckets: &[AccountKind]) -> String {
    buckets
        .iter()
        .map(AccountKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::MissingTargetAccount { event, kind, valid } => write!(
                f,
                "event {event:?} ({kind:?}) requires an explicit target account; valid targets: {}",
                bucket_list(valid)
            ),
            RoutingError::InvalidTargetAccount {
                event,
                kind,
                given,
                valid,
            } => write!(
                f,
                "event {event:?} ({kind:?}) cannot target {}; valid targets: {}",
                given.as_str(),
                bucket_list(valid)
            ),
            RoutingError::ConflictingTargetAccount {
                event,
                kind,
                given,
                fixed,
            } => write!(
                f,
                "event {event:?} ({kind:?}) always routes to {} but was given {}",
                fixed.as_str(),
                given.as_str()
            ),
            RoutingError::UnknownAccountToken { event, token } => {
                write!(f, "event {event:?} has unrecognized account token {token:?}")
            }
        }
    }
}

impl std::error::Error for RoutingError {}

/// Errors raised while normalizing a raw event.
#[derive(Debug, Clone)]
pub enum NormalizeError {
    /// No legal field combination supplied an amount for this kind.
    MissingAmount { event: EventId, kind: EventKind },
    /// The payload family does not match what the kind's policy expects.
    MismatchedPayload { event: EventId, kind: EventKind },
    /// End offset resolves to before the start offset.
    InvalidOffsets {
        event: EventId,
        start: u32,
        end: u32,
    },
    Routing(RoutingError),
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::MissingAmount { event, kind } => {
                write!(f, "event {event:?} ({kind:?}) declares no usable amount")
            }
            NormalizeError::MismatchedPayload { event, kind } => write!(
                f,
                "event {event:?} payload does not match the field family for {kind:?}"
            ),
            NormalizeError::InvalidOffsets { event, start, end } => write!(
                f,
                "event {event:?} ends (month {end}) before it starts (month {start})"
            ),
            NormalizeError::Routing(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for NormalizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NormalizeError::Routing(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RoutingError> for NormalizeError {
    fn from(e: RoutingError) -> Self {
        NormalizeError::Routing(e)
    }
}

/// A batch rejected by the validation gate.
///
/// Carries every collected issue: validation either fully succeeds or
/// fails atomically, never partially.
#[derive(Debug, Clone)]
pub struct ValidationRejected {
    pub report: ValidationReport,
}

impl fmt::Display for ValidationRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validation rejected batch: {} critical issue(s), {} warning(s)",
            self.report.stats.critical_count, self.report.stats.warning_count
        )
    }
}

impl std::error::Error for ValidationRejected {}

/// Errors surfaced by the processing orchestrator.
///
/// Resource-limit pressure is deliberately absent here: exceeding the
/// expansion ceiling degrades the whole batch to recurring mode instead of
/// failing.
#[derive(Debug, Clone)]
pub enum ProcessError {
    Validation(ValidationRejected),
    Normalize(NormalizeError),
    /// Zero-length horizon or other unusable options.
    InvalidOptions(String),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Validation(e) => write!(f, "{e}"),
            ProcessError::Normalize(e) => write!(f, "{e}"),
            ProcessError::InvalidOptions(msg) => write!(f, "invalid processing options: {msg}"),
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::Validation(e) => Some(e),
            ProcessError::Normalize(e) => Some(e),
            ProcessError::InvalidOptions(_) => None,
        }
    }
}

impl From<ValidationRejected> for ProcessError {
    fn from(e: ValidationRejected) -> Self {
        ProcessError::Validation(e)
    }
}

impl From<NormalizeError> for ProcessError {
    fn from(e: NormalizeError) -> Self {
        ProcessError::Normalize(e)
    }
}

impl From<RoutingError> for ProcessError {
    fn from(e: RoutingError) -> Self {
        ProcessError::Normalize(NormalizeError::Routing(e))
    }
}

/// An accounting/temporal invariant breach, raised only by the strict
/// sequence checker. Log-only mode records violations without erroring.
#[derive(Debug, Clone)]
pub struct ConsistencyError {
    pub violation: InvariantViolation,
}

impl fmt::Display for ConsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invariant {} violated: expected {}, got {} ({})",
            self.violation.name,
            self.violation.expected,
            self.violation.actual,
            self.violation.description
        )
    }
}

impl std::error::Error for ConsistencyError {}
