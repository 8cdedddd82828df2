//! Accounting and temporal invariants
//!
//! Pure verification over engine-produced state snapshots. Nothing here
//! mutates a state or fails on its own: [`check_state`] and
//! [`check_transition`] return violation lists, and only the strict
//! sequence-checker mode turns an error-severity violation into a
//! `ConsistencyError`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConsistencyError;
use crate::model::{CanonicalEvent, EventKind, SimulationState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

/// One breached invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantViolation {
    pub name: String,
    pub description: String,
    pub expected: f64,
    pub actual: f64,
    #[serde(default)]
    pub tolerance: Option<f64>,
    pub severity: ViolationSeverity,
}

/// Numeric slack for the comparison checks.
///
/// The cash-change tolerance is deliberately loose: it scales with the
/// month's event activity and only ever warns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckerTolerances {
    /// Fixed floor for the accounting identity; the effective tolerance
    /// is `max(accounting, |assets| * 1e-10)`.
    pub accounting: f64,
    /// Per-holding and per-account derived-total slack.
    pub per_holding: f64,
    /// Base allowance for month-over-month aggregate cash change.
    pub cash_flow_base: f64,
    /// Additional allowance per dollar of applied event activity.
    pub cash_flow_activity_factor: f64,
    /// Plausible monthly investment return magnitude.
    pub max_monthly_return: f64,
    /// Plausible liability interest rate ceiling.
    pub max_liability_rate: f64,
}

impl Default for CheckerTolerances {
    fn default() -> Self {
        Self {
            accounting: 0.01,
            per_holding: 0.01,
            cash_flow_base: 1_000.0,
            cash_flow_activity_factor: 2.0,
            max_monthly_return: 0.5,
            max_liability_rate: 0.5,
        }
    }
}

fn violation(
    name: &'static str,
    description: String,
    expected: f64,
    actual: f64,
    tolerance: Option<f64>,
    severity: ViolationSeverity,
) -> InvariantViolation {
    InvariantViolation {
        name: name.to_string(),
        description,
        expected,
        actual,
        tolerance,
        severity,
    }
}

fn check_finite(out: &mut Vec<InvariantViolation>, context: &str, field: &str, value: f64) {
    if !value.is_finite() {
        out.push(violation(
            "NumericFinite",
            format!("{context}: {field} is {value}"),
            0.0,
            value,
            None,
            ViolationSeverity::Error,
        ));
    }
}

/// Verify all point-in-time invariants of one state snapshot.
pub fn check_state(state: &SimulationState, tol: &CheckerTolerances) -> Vec<InvariantViolation> {
    let mut out = Vec::new();

    // No NaN/Infinity anywhere in the numeric fields.
    for (kind, account) in state.accounts.iter() {
        let context = kind.as_str();
        check_finite(&mut out, context, "cash", account.cash);
        check_finite(&mut out, context, "total_value", account.total_value);
        for holding in &account.holdings {
            check_finite(&mut out, context, "quantity", holding.quantity);
            check_finite(&mut out, context, "purchase_price", holding.purchase_price);
            check_finite(&mut out, context, "market_price", holding.market_price);
            check_finite(&mut out, context, "market_value", holding.market_value);
            check_finite(&mut out, context, "cost_basis", holding.cost_basis);
            check_finite(&mut out, context, "unrealized_gain", holding.unrealized_gain);
        }
    }
    for liability in &state.liabilities {
        check_finite(&mut out, &liability.name, "balance", liability.balance);
        check_finite(&mut out, &liability.name, "interest_rate", liability.interest_rate);
    }
    for asset in &state.real_estate {
        check_finite(&mut out, &asset.name, "market_value", asset.market_value);
    }
    for (field, value) in state.taxes_ytd.fields() {
        check_finite(&mut out, "taxes_ytd", field, value);
    }
    check_finite(&mut out, "state", "capital_loss_carryover", state.capital_loss_carryover);
    check_finite(&mut out, "state", "net_worth", state.net_worth);
    if !out.is_empty() {
        // Comparison checks against non-finite numbers produce noise, not
        // signal.
        return out;
    }

    // Accounting identity: Assets = Liabilities + NetWorth.
    let assets = state.total_assets();
    let liabilities = state.total_liabilities();
    let expected_net_worth = assets - liabilities;
    let identity_tol = f64::max(tol.accounting, assets.abs() * 1e-10);
    if (state.net_worth - expected_net_worth).abs() > identity_tol {
        out.push(violation(
            "AccountingIdentity",
            "assets minus liabilities does not equal net worth".to_string(),
            expected_net_worth,
            state.net_worth,
            Some(identity_tol),
            ViolationSeverity::Error,
        ));
    }

    for (kind, account) in state.accounts.iter() {
        let expected_total = account.cash + account.holdings_value();
        if (account.total_value - expected_total).abs() > tol.per_holding {
            out.push(violation(
                "AccountBalance",
                format!("{} total differs from cash plus holdings", kind.as_str()),
                expected_total,
                account.total_value,
                Some(tol.per_holding),
                ViolationSeverity::Error,
            ));
        }

        for holding in &account.holdings {
            let expected_value = holding.quantity * holding.market_price;
            if (holding.market_value - expected_value).abs() > tol.per_holding {
                out.push(violation(
                    "HoldingMarketValue",
                    format!("{} {}: market value differs from quantity times price", kind.as_str(), holding.symbol),
                    expected_value,
                    holding.market_value,
                    Some(tol.per_holding),
                    ViolationSeverity::Error,
                ));
            }
            let expected_basis = holding.quantity * holding.purchase_price;
            if (holding.cost_basis - expected_basis).abs() > tol.per_holding {
                out.push(violation(
                    "HoldingCostBasis",
                    format!("{} {}: cost basis differs from quantity times purchase price", kind.as_str(), holding.symbol),
                    expected_basis,
                    holding.cost_basis,
                    Some(tol.per_holding),
                    ViolationSeverity::Error,
                ));
            }
            // Checked against the primary-derived value so a corrupted
            // market_value surfaces once, not three times.
            let expected_gain = expected_value - holding.cost_basis;
            if (holding.unrealized_gain - expected_gain).abs() > tol.per_holding {
                out.push(violation(
                    "HoldingUnrealizedGain",
                    format!("{} {}: unrealized gain differs from value minus basis", kind.as_str(), holding.symbol),
                    expected_gain,
                    holding.unrealized_gain,
                    Some(tol.per_holding),
                    ViolationSeverity::Error,
                ));
            }

            if holding.quantity < 0.0 {
                out.push(violation(
                    "NonNegativeQuantity",
                    format!("{} {}: negative quantity", kind.as_str(), holding.symbol),
                    0.0,
                    holding.quantity,
                    None,
                    ViolationSeverity::Error,
                ));
            }
            if holding.market_price < 0.0 || holding.purchase_price < 0.0 {
                out.push(violation(
                    "NonNegativePrice",
                    format!("{} {}: negative price", kind.as_str(), holding.symbol),
                    0.0,
                    holding.market_price.min(holding.purchase_price),
                    None,
                    ViolationSeverity::Error,
                ));
            }
        }
    }

    for liability in &state.liabilities {
        if liability.balance < 0.0 {
            out.push(violation(
                "NonNegativeLiability",
                format!("{}: negative balance", liability.name),
                0.0,
                liability.balance,
                None,
                ViolationSeverity::Error,
            ));
        }
        if !(0.0..=tol.max_liability_rate).contains(&liability.interest_rate) {
            out.push(violation(
                "LiabilityInterestRate",
                format!("{}: interest rate outside plausible range", liability.name),
                tol.max_liability_rate,
                liability.interest_rate,
                None,
                ViolationSeverity::Warning,
            ));
        }
    }

    out
}

fn crossed_year_boundary(prev: &SimulationState, curr: &SimulationState) -> bool {
    curr.year != prev.year
}

fn has_new_losses(applied: Option<&[CanonicalEvent]>) -> bool {
    applied.is_some_and(|events| {
        events.iter().any(|ev| {
            matches!(
                ev.kind,
                EventKind::TaxLossHarvest | EventKind::CapitalGainsRealization
            )
        })
    })
}

/// Verify the invariants that relate two adjacent monthly states,
/// optionally informed by the events applied in between.
pub fn check_transition(
    prev: &SimulationState,
    curr: &SimulationState,
    applied: Option<&[CanonicalEvent]>,
    tol: &CheckerTolerances,
) -> Vec<InvariantViolation> {
    let mut out = Vec::new();

    // Time advances by exactly one unit per step.
    if curr.age_months != prev.age_months + 1 {
        out.push(violation(
            "TemporalMonotonicity",
            "age did not advance by exactly one month".to_string(),
            f64::from(prev.age_months + 1),
            f64::from(curr.age_months),
            None,
            ViolationSeverity::Error,
        ));
    }
    if curr.month_offset != prev.month_offset + 1 {
        out.push(violation(
            "TemporalMonotonicity",
            "month offset did not advance by exactly one".to_string(),
            f64::from(prev.month_offset + 1),
            f64::from(curr.month_offset),
            None,
            ViolationSeverity::Error,
        ));
    }
    let (expected_year, expected_month) = if prev.month == 12 {
        (prev.year + 1, 1)
    } else {
        (prev.year, prev.month + 1)
    };
    if curr.year != expected_year || curr.month != expected_month {
        out.push(violation(
            "TemporalMonotonicity",
            format!(
                "calendar advanced {}-{:02} -> {}-{:02}, expected {}-{:02}",
                prev.year, prev.month, curr.year, curr.month, expected_year, expected_month
            ),
            f64::from(expected_month),
            f64::from(curr.month),
            None,
            ViolationSeverity::Error,
        ));
    }

    // YTD tax accumulators reset exactly at the calendar-year boundary.
    if crossed_year_boundary(prev, curr) {
        for (field, value) in curr.taxes_ytd.fields() {
            if value != 0.0 {
                out.push(violation(
                    "TaxStateYearBoundary",
                    format!("taxes_ytd.{field} nonzero immediately after year boundary"),
                    0.0,
                    value,
                    None,
                    ViolationSeverity::Error,
                ));
            }
        }

        // Carryover may shrink as losses are consumed, but can only grow
        // if the month actually realized new losses.
        if curr.capital_loss_carryover > prev.capital_loss_carryover + tol.accounting
            && !has_new_losses(applied)
        {
            out.push(violation(
                "CapitalLossCarryover",
                "capital-loss carryover grew across a year boundary without new losses".to_string(),
                prev.capital_loss_carryover,
                curr.capital_loss_carryover,
                Some(tol.accounting),
                ViolationSeverity::Warning,
            ));
        }
    }

    // Aggregate cash change, bounded by event activity.
    let activity: f64 = applied
        .map(|events| events.iter().map(|ev| ev.amount.abs()).sum())
        .unwrap_or(0.0);
    let allowed = tol.cash_flow_base + tol.cash_flow_activity_factor * activity;
    let cash_delta = curr.accounts.total_cash() - prev.accounts.total_cash();
    if cash_delta.abs() > allowed {
        out.push(violation(
            "CashChange",
            "aggregate cash change exceeds activity-scaled tolerance".to_string(),
            allowed,
            cash_delta,
            Some(allowed),
            ViolationSeverity::Warning,
        ));
    }

    // Monthly investment return plausibility, per bucket.
    for ((kind, prev_account), (_, curr_account)) in prev.accounts.iter().zip(curr.accounts.iter()) {
        let prev_value = prev_account.holdings_value();
        if prev_value > 0.0 {
            let monthly_return = curr_account.holdings_value() / prev_value - 1.0;
            if monthly_return.abs() > tol.max_monthly_return {
                out.push(violation(
                    "MonthlyReturn",
                    format!("{}: implausible monthly investment return", kind.as_str()),
                    tol.max_monthly_return,
                    monthly_return,
                    None,
                    ViolationSeverity::Warning,
                ));
            }
        }
    }

    out
}

/// How the sequence checker reacts to error-severity violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// Record and log; never fail. Production behavior.
    #[default]
    LogOnly,
    /// Fail on the first error-severity violation. Test behavior.
    Strict,
}

/// Stateful checker that accumulates violations across a run.
#[derive(Debug, Clone, Default)]
pub struct SequenceChecker {
    mode: CheckMode,
    tolerances: CheckerTolerances,
    prev: Option<SimulationState>,
    violations: Vec<InvariantViolation>,
}

impl SequenceChecker {
    pub fn new(mode: CheckMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_tolerances(mut self, tolerances: CheckerTolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    /// Feed the next state (plus optionally the month's applied events).
    ///
    /// In strict mode the first error-severity violation fails the run;
    /// in log-only mode everything is recorded and logged.
    pub fn observe(
        &mut self,
        state: &SimulationState,
        applied: Option<&[CanonicalEvent]>,
    ) -> Result<(), ConsistencyError> {
        let mut found = check_state(state, &self.tolerances);
        if let Some(prev) = &self.prev {
            found.extend(check_transition(prev, state, applied, &self.tolerances));
        }
        self.prev = Some(state.clone());

        let mut first_error = None;
        for v in &found {
            match v.severity {
                ViolationSeverity::Error => {
                    warn!(
                        invariant = %v.name,
                        expected = v.expected,
                        actual = v.actual,
                        "invariant violated: {}",
                        v.description
                    );
                    if first_error.is_none() {
                        first_error = Some(v.clone());
                    }
                }
                ViolationSeverity::Warning => {
                    debug!(invariant = %v.name, "invariant warning: {}", v.description);
                }
            }
        }
        self.violations.extend(found);

        match (self.mode, first_error) {
            (CheckMode::Strict, Some(v)) => Err(ConsistencyError { violation: v }),
            _ => Ok(()),
        }
    }

    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    pub fn error_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Error)
            .count()
    }

    /// Forget accumulated violations and transition history.
    pub fn reset(&mut self) {
        self.prev = None;
        self.violations.clear();
    }
}
