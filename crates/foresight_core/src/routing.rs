//! Account routing
//!
//! Applies the static policy table to one event: parse the explicit or
//! legacy account token (if any) and reconcile it with the kind's routing
//! rule. Every failure mode is a hard error; there is no default bucket.

use crate::error::RoutingError;
use crate::model::{AccountKind, EventId, EventKind, RoutingRule};

/// Resolve the target account bucket for an event.
///
/// Returns `None` for pure tracking/planning kinds. `explicit_token` is
/// the raw string from the UI/store layer; unknown tokens fail here rather
/// than falling through to a guess.
pub fn route_event(
    event: EventId,
    kind: EventKind,
    explicit_token: Option<&str>,
) -> Result<Option<AccountKind>, RoutingError> {
    let explicit = match explicit_token {
        Some(token) => Some(AccountKind::from_token(token).ok_or_else(|| {
            RoutingError::UnknownAccountToken {
                event,
                token: token.to_string(),
            }
        })?),
        None => None,
    };

    match kind.policy().routing {
        RoutingRule::Fixed(fixed) => match explicit {
            Some(given) if given != fixed => Err(RoutingError::ConflictingTargetAccount {
                event,
                kind,
                given,
                fixed,
            }),
            _ => Ok(Some(fixed)),
        },
        RoutingRule::RequireExplicit { valid } => match explicit {
            None => Err(RoutingError::MissingTargetAccount { event, kind, valid }),
            Some(given) if !valid.contains(&given) => Err(RoutingError::InvalidTargetAccount {
                event,
                kind,
                given,
                valid,
            }),
            Some(given) => Ok(Some(given)),
        },
        RoutingRule::NoBucket => Ok(None),
    }
}
