//! Unique identifiers for planning entities
//!
//! Each entity type gets its own ID newtype so different kinds of
//! identifiers cannot be mixed up.

use serde::{Deserialize, Serialize};

/// Unique identifier for a user-declared event within a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u32);
