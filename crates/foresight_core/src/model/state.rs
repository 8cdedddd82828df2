//! Simulation state snapshots
//!
//! The projection engine owns these; this crate only reads them. The
//! invariant checker consumes snapshots in exactly this shape, so the
//! engine (and test fixtures) must produce the same bucket/holding/
//! liability/tax structure.

use serde::{Deserialize, Serialize};

use super::policy::AccountKind;

/// A position held inside an account bucket.
///
/// `market_value`, `cost_basis` and `unrealized_gain` are derived fields
/// the engine writes alongside the primaries; the invariant checker
/// verifies they agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: f64,
    pub purchase_price: f64,
    pub market_price: f64,
    pub market_value: f64,
    pub cost_basis: f64,
    pub unrealized_gain: f64,
}

impl Holding {
    /// Build a holding with derived totals consistent by construction.
    pub fn consistent(symbol: impl Into<String>, quantity: f64, purchase_price: f64, market_price: f64) -> Self {
        let market_value = quantity * market_price;
        let cost_basis = quantity * purchase_price;
        Self {
            symbol: symbol.into(),
            quantity,
            purchase_price,
            market_price,
            market_value,
            cost_basis,
            unrealized_gain: market_value - cost_basis,
        }
    }
}

/// One account bucket: cash plus holdings, with an engine-written total.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountState {
    pub cash: f64,
    #[serde(default)]
    pub holdings: Vec<Holding>,
    pub total_value: f64,
}

impl AccountState {
    pub fn cash_only(cash: f64) -> Self {
        Self {
            cash,
            holdings: Vec::new(),
            total_value: cash,
        }
    }

    pub fn with_holdings(cash: f64, holdings: Vec<Holding>) -> Self {
        let total_value = cash + holdings.iter().map(|h| h.market_value).sum::<f64>();
        Self {
            cash,
            holdings,
            total_value,
        }
    }

    /// Sum of holding market values, independent of the stored total.
    pub fn holdings_value(&self) -> f64 {
        self.holdings.iter().map(|h| h.market_value).sum()
    }
}

/// The five account buckets tracked by the state model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountSet {
    pub cash: AccountState,
    pub taxable: AccountState,
    pub tax_deferred: AccountState,
    pub roth: AccountState,
    pub hsa: AccountState,
}

impl AccountSet {
    /// Iterate buckets with their kind labels.
    pub fn iter(&self) -> impl Iterator<Item = (AccountKind, &AccountState)> {
        [
            (AccountKind::Cash, &self.cash),
            (AccountKind::Taxable, &self.taxable),
            (AccountKind::TaxDeferred, &self.tax_deferred),
            (AccountKind::Roth, &self.roth),
            (AccountKind::Hsa, &self.hsa),
        ]
        .into_iter()
    }

    pub fn total_value(&self) -> f64 {
        self.iter().map(|(_, a)| a.total_value).sum()
    }

    pub fn total_cash(&self) -> f64 {
        self.iter().map(|(_, a)| a.cash).sum()
    }
}

/// An outstanding liability. Balances are stored positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Liability {
    pub name: String,
    pub balance: f64,
    pub interest_rate: f64,
}

/// A real-estate asset held outside the account buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealEstateAsset {
    pub name: String,
    pub market_value: f64,
}

/// Year-to-date tax accumulators, reset at every calendar-year boundary.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TaxAccumulator {
    pub ordinary_income: f64,
    pub capital_gains: f64,
    pub federal_tax_paid: f64,
    pub state_tax_paid: f64,
}

impl TaxAccumulator {
    /// Field name/value pairs, for per-field boundary reporting.
    pub fn fields(&self) -> [(&'static str, f64); 4] {
        [
            ("ordinary_income", self.ordinary_income),
            ("capital_gains", self.capital_gains),
            ("federal_tax_paid", self.federal_tax_paid),
            ("state_tax_paid", self.state_tax_paid),
        ]
    }
}

/// A point-in-time snapshot of the simulated household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub accounts: AccountSet,
    #[serde(default)]
    pub liabilities: Vec<Liability>,
    #[serde(default)]
    pub real_estate: Vec<RealEstateAsset>,
    pub taxes_ytd: TaxAccumulator,
    /// Carries across year boundaries, unlike the YTD block.
    pub capital_loss_carryover: f64,
    pub age_months: u32,
    pub year: i16,
    /// 1..=12
    pub month: u8,
    /// Months since simulation start.
    pub month_offset: u32,
    /// Engine-reported net worth; the checker verifies it against the
    /// accounting identity rather than trusting it.
    pub net_worth: f64,
}

impl SimulationState {
    /// Total assets: bucket values plus real estate.
    pub fn total_assets(&self) -> f64 {
        self.accounts.total_value() + self.real_estate.iter().map(|r| r.market_value).sum::<f64>()
    }

    /// Total outstanding liability balances.
    pub fn total_liabilities(&self) -> f64 {
        self.liabilities.iter().map(|l| l.balance).sum()
    }

    /// A consistent-by-construction snapshot for tests and fixtures:
    /// net worth satisfies the accounting identity exactly.
    pub fn consistent(accounts: AccountSet, liabilities: Vec<Liability>, real_estate: Vec<RealEstateAsset>) -> Self {
        let mut state = Self {
            accounts,
            liabilities,
            real_estate,
            taxes_ytd: TaxAccumulator::default(),
            capital_loss_carryover: 0.0,
            age_months: 40 * 12,
            year: 2025,
            month: 1,
            month_offset: 0,
            net_worth: 0.0,
        };
        state.net_worth = state.total_assets() - state.total_liabilities();
        state
    }

    /// Step a cloned snapshot forward one month with correct rollover.
    /// Fixture helper; the real engine produces its own states.
    pub fn advanced_one_month(&self) -> Self {
        let mut next = self.clone();
        next.age_months += 1;
        next.month_offset += 1;
        if next.month == 12 {
            next.month = 1;
            next.year += 1;
            next.taxes_ytd = TaxAccumulator::default();
        } else {
            next.month += 1;
        }
        next
    }
}
