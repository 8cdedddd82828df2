//! Event canonicalization core for financial-plan simulation
//!
//! This crate converts a heterogeneous set of user-declared life events
//! (income, expenses, contributions, withdrawals, real estate, debt,
//! lifecycle markers) into a memory-bounded, strictly-validated sequence
//! of monthly cash-flow instructions for a downstream projection engine,
//! and independently verifies the accounting consistency of the states
//! that engine produces.
//!
//! The pipeline is a batch transform: raw events are validated, then
//! normalized (unit and offset ambiguity resolved, accounts routed), then
//! either eagerly expanded into per-month occurrences or collapsed to
//! recurring descriptors when expansion would be memory-prohibitive.
//!
//! ```ignore
//! use foresight_core::process::{EventProcessor, ProcessOptions};
//!
//! let mut processor = EventProcessor::new();
//! let options = ProcessOptions::new(jiff::civil::date(2025, 1, 1)).horizon_years(30);
//! let result = processor.process(&events, &options)?;
//! for event in &result.events {
//!     // hand off to the projection engine
//! }
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod error;
pub mod expand;
pub mod frequency;
pub mod invariant;
pub mod limits;
pub mod month_math;
pub mod normalize;
pub mod process;
pub mod routing;
pub mod validate;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use expand::{ExpansionMode, GrowthMode};
pub use invariant::{CheckMode, SequenceChecker};
pub use limits::PlanningLimits;
pub use process::{EventProcessor, ProcessOptions, ProcessingResult};
pub use validate::ValidationReport;
