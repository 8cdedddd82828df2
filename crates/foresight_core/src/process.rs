//! Processing orchestration
//!
//! Single entry point composing validation, normalization and expansion,
//! with result caching keyed by a content hash over every field that
//! affects output. The cache is explicitly owned and bounded; there is no
//! process-wide singleton to leak in long-lived hosts.

use std::collections::VecDeque;
use std::hash::Hasher;
use std::time::Instant;

use jiff::civil::Date;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ProcessError;
use crate::expand::{ExpansionMode, GrowthMode, estimate_memory_mb, estimate_occurrences, expand_batch};
use crate::limits::PlanningLimits;
use crate::model::{CanonicalEvent, EventPayload, RawEvent};
use crate::normalize::{NormalizeContext, normalize_event};
use crate::validate::{ValidationReport, validate_strict};

/// Default orchestrator occurrence ceiling. Deliberately looser than the
/// expansion engine's own default so callers have headroom on long
/// horizons before the batch degrades.
pub const DEFAULT_PROCESS_CEILING: u64 = 500_000;

const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Caller-facing knobs for one processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Calendar date the simulation starts; its year is the pivot for
    /// resolving the overloaded scheduling fields.
    pub start_date: Date,
    pub horizon_years: u32,
    /// Months between plan authoring and this run, for growth.
    pub elapsed_months: u32,
    /// Default annual growth for income kinds that don't opt out.
    pub default_inflation_rate: f64,
    pub growth_mode: GrowthMode,
    /// Occurrence ceiling before the batch degrades to recurring mode.
    pub occurrence_ceiling: u64,
    pub limits: PlanningLimits,
}

impl ProcessOptions {
    pub fn new(start_date: Date) -> Self {
        Self {
            start_date,
            horizon_years: 30,
            elapsed_months: 0,
            default_inflation_rate: 0.03,
            growth_mode: GrowthMode::default(),
            occurrence_ceiling: DEFAULT_PROCESS_CEILING,
            limits: PlanningLimits::default(),
        }
    }

    #[must_use]
    pub fn horizon_years(mut self, years: u32) -> Self {
        self.horizon_years = years;
        self
    }

    /// Derive the elapsed-month count from the date the plan was
    /// authored. Growth on income streams compounds from that date to
    /// the simulation start.
    #[must_use]
    pub fn authored_on(mut self, authored: Date) -> Self {
        self.elapsed_months = crate::month_math::months_between(authored, self.start_date).max(0) as u32;
        self
    }

    #[must_use]
    pub fn inflation_rate(mut self, rate: f64) -> Self {
        self.default_inflation_rate = rate;
        self
    }

    #[must_use]
    pub fn growth_mode(mut self, mode: GrowthMode) -> Self {
        self.growth_mode = mode;
        self
    }

    #[must_use]
    pub fn occurrence_ceiling(mut self, ceiling: u64) -> Self {
        self.occurrence_ceiling = ceiling;
        self
    }
}

/// Observability block returned with every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub input_count: usize,
    pub output_count: usize,
    pub mode: ExpansionMode,
    pub estimated_occurrences: u64,
    pub memory_estimate_mb: f64,
    pub elapsed_ms: f64,
}

/// Canonical events plus the report and stats for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub events: Vec<CanonicalEvent>,
    pub report: ValidationReport,
    pub stats: ProcessingStats,
}

fn hash_f64(hasher: &mut FxHasher, value: f64) {
    hasher.write_u64(value.to_bits());
}

fn hash_opt_f64(hasher: &mut FxHasher, value: Option<f64>) {
    match value {
        Some(v) => {
            hasher.write_u8(1);
            hash_f64(hasher, v);
        }
        None => hasher.write_u8(0),
    }
}

fn hash_opt_u32(hasher: &mut FxHasher, value: Option<u32>) {
    match value {
        Some(v) => {
            hasher.write_u8(1);
            hasher.write_u32(v);
        }
        None => hasher.write_u8(0),
    }
}

/// Content hash over every field that affects canonical output.
///
/// Any field omitted here risks serving stale results after an edit, so
/// the payload hashing is exhaustive per family rather than selective.
fn content_hash(events: &[RawEvent], options: &ProcessOptions) -> u64 {
    let mut hasher = FxHasher::default();

    for raw in events {
        hasher.write_u32(raw.id.0);
        hasher.write(raw.name.as_bytes());
        hasher.write_u16(raw.kind as u16);
        hash_opt_u32(&mut hasher, raw.start);
        hash_opt_u32(&mut hasher, raw.end);
        match &raw.payload {
            EventPayload::CashFlow(f) => {
                hasher.write_u8(0);
                hash_opt_f64(&mut hasher, f.amount);
                hash_opt_f64(&mut hasher, f.monthly_amount);
                hash_opt_f64(&mut hasher, f.annual_amount);
                hasher.write_u8(f.frequency.map(|fr| fr as u8 + 1).unwrap_or(0));
                hash_opt_f64(&mut hasher, f.annual_growth_rate);
                hasher.write_u8(match f.inflation_adjusted {
                    None => 0,
                    Some(false) => 1,
                    Some(true) => 2,
                });
                match &f.target_account {
                    Some(token) => {
                        hasher.write_u8(1);
                        hasher.write(token.as_bytes());
                    }
                    None => hasher.write_u8(0),
                }
            }
            EventPayload::RealEstate(f) => {
                hasher.write_u8(1);
                hash_opt_f64(&mut hasher, f.property_value);
                hash_opt_f64(&mut hasher, f.down_payment);
                hash_opt_f64(&mut hasher, f.closing_costs);
                hash_opt_f64(&mut hasher, f.monthly_payment);
                hash_opt_f64(&mut hasher, f.sale_proceeds);
                hash_opt_f64(&mut hasher, f.annual_appreciation_rate);
            }
            EventPayload::Debt(f) => {
                hasher.write_u8(2);
                hash_opt_f64(&mut hasher, f.balance);
                hash_opt_f64(&mut hasher, f.payment);
                hash_opt_f64(&mut hasher, f.interest_rate);
                hasher.write_u8(f.frequency.map(|fr| fr as u8 + 1).unwrap_or(0));
            }
            EventPayload::Marker => hasher.write_u8(3),
        }
    }

    hasher.write_i16(options.start_date.year());
    hasher.write_u8(options.start_date.month() as u8);
    hasher.write_u8(options.start_date.day() as u8);
    hasher.write_u32(options.horizon_years);
    hasher.write_u32(options.elapsed_months);
    hash_f64(&mut hasher, options.default_inflation_rate);
    hasher.write_u8(options.growth_mode as u8);
    hasher.write_u64(options.occurrence_ceiling);
    hasher.write(options.limits.version.as_bytes());
    hash_f64(&mut hasher, options.limits.employee_deferral_limit);
    hash_f64(&mut hasher, options.limits.ira_contribution_limit);
    hash_f64(&mut hasher, options.limits.hsa_contribution_limit);
    hash_f64(&mut hasher, options.limits.education_gift_limit);
    hash_f64(&mut hasher, options.limits.plausible_monthly_amount);

    hasher.finish()
}

/// Bounded FIFO result cache.
#[derive(Debug, Default)]
pub struct ProcessingCache {
    capacity: usize,
    entries: FxHashMap<u64, ProcessingResult>,
    order: VecDeque<u64>,
}

impl ProcessingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: FxHashMap::default(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: u64) -> Option<&ProcessingResult> {
        self.entries.get(&key)
    }

    fn insert(&mut self, key: u64, result: ProcessingResult) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key, result).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The canonicalization entry point.
///
/// Guarantees one canonicalization per distinct (event set, options) pair
/// within the cache window.
#[derive(Debug)]
pub struct EventProcessor {
    cache: ProcessingCache,
}

impl Default for EventProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl EventProcessor {
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            cache: ProcessingCache::new(capacity),
        }
    }

    /// Validate, normalize and expand one batch.
    ///
    /// Fails atomically: a critical validation finding or a hard
    /// normalization/routing error rejects the whole batch. Resource
    /// pressure never fails; it degrades the batch to recurring mode.
    pub fn process(
        &mut self,
        events: &[RawEvent],
        options: &ProcessOptions,
    ) -> Result<ProcessingResult, ProcessError> {
        if options.horizon_years == 0 {
            return Err(ProcessError::InvalidOptions(
                "horizon must cover at least one year".to_string(),
            ));
        }

        let key = content_hash(events, options);
        if let Some(hit) = self.cache.get(key) {
            debug!(key, "serving processing result from cache");
            return Ok(hit.clone());
        }

        let started = Instant::now();
        let report = validate_strict(events, &options.limits)?;

        let ctx = NormalizeContext {
            start_year: options.start_date.year(),
            elapsed_months: options.elapsed_months,
            inflation_rate: options.default_inflation_rate,
            limits: &options.limits,
        };

        #[cfg(feature = "parallel")]
        let normalized = events
            .par_iter()
            .map(|raw| normalize_event(raw, &ctx))
            .collect::<Result<Vec<_>, _>>()?;
        #[cfg(not(feature = "parallel"))]
        let normalized = events
            .iter()
            .map(|raw| normalize_event(raw, &ctx))
            .collect::<Result<Vec<_>, _>>()?;

        let horizon_months = options.horizon_years * 12;
        let estimated_occurrences = estimate_occurrences(&normalized, horizon_months);
        let (canonical, mode) = expand_batch(
            &normalized,
            horizon_months,
            options.occurrence_ceiling,
            options.growth_mode,
        );

        let stats = ProcessingStats {
            input_count: events.len(),
            output_count: canonical.len(),
            mode,
            estimated_occurrences,
            memory_estimate_mb: estimate_memory_mb(estimated_occurrences),
            elapsed_ms: started.elapsed().as_secs_f64() * 1_000.0,
        };
        info!(
            input = stats.input_count,
            output = stats.output_count,
            mode = ?stats.mode,
            elapsed_ms = stats.elapsed_ms,
            "processed event batch"
        );

        let result = ProcessingResult {
            events: canonical,
            report,
            stats,
        };
        self.cache.insert(key, result.clone());
        Ok(result)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cached_runs(&self) -> usize {
        self.cache.len()
    }
}

/// Heuristic probe for output fed back in as input.
///
/// Independent callers have double-processed batches before; canonical
/// output is recognizable by recurring descriptors or by the dense
/// consecutive-offset runs expansion produces.
pub fn looks_already_canonical(events: &[CanonicalEvent]) -> bool {
    if events.is_empty() {
        return false;
    }
    if events.iter().any(CanonicalEvent::is_recurring_descriptor) {
        return true;
    }

    let mut offsets_by_id: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
    for ev in events {
        offsets_by_id.entry(ev.id.0).or_default().push(ev.month_offset);
    }
    offsets_by_id.values_mut().any(|offsets| {
        offsets.sort_unstable();
        let mut run = 1;
        for pair in offsets.windows(2) {
            if pair[1] == pair[0] + 1 {
                run += 1;
                if run >= 3 {
                    return true;
                }
            } else {
                run = 1;
            }
        }
        false
    })
}
