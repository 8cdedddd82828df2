//! Raw event vocabulary and input shapes
//!
//! Users declare life events in the UI layer; each arrives here as a
//! `RawEvent` tagged with an `EventKind` from a closed vocabulary. Field
//! presence is sparse and varies by kind, so the payload is a sum over the
//! field families the vocabulary actually uses rather than one struct of
//! ninety optionals.

use serde::{Deserialize, Serialize};

use super::ids::EventId;

/// How often a declared cash flow occurs.
///
/// `OnceOff` means the amount applies exactly once and is never divided
/// or aggregated by the frequency converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Monthly,
    Annually,
    Weekly,
    Biweekly,
    Quarterly,
    Semiannually,
    OnceOff,
}

/// Broad classification of an event kind.
///
/// Categories drive growth defaults (income tracks inflation), the annual
/// expansion split (annual income is paid out monthly, annual non-income
/// hits once a year), and which validation rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Income,
    Expense,
    Contribution,
    Withdrawal,
    Transfer,
    RealEstate,
    Debt,
    Gifting,
    Tax,
    Insurance,
    Lifecycle,
    Change,
}

/// Closed vocabulary of user-declarable event types.
///
/// Every kind must be classified in [`EventKind::policy`]; there is no
/// wildcard arm anywhere downstream, so adding a variant here forces a
/// conscious routing/extraction decision at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // === Income ===
    Salary,
    SelfEmploymentIncome,
    BonusIncome,
    CommissionIncome,
    RentalIncome,
    DividendIncome,
    InterestIncome,
    SocialSecurity,
    PensionIncome,
    AnnuityIncome,
    RoyaltyIncome,
    PartTimeIncome,
    SpouseIncome,
    OtherIncome,

    // === Expense ===
    LivingExpenses,
    RentPayment,
    UtilitiesExpense,
    GroceriesExpense,
    TransportationExpense,
    HealthcareExpense,
    ChildcareExpense,
    TuitionExpense,
    TravelExpense,
    EntertainmentExpense,
    SubscriptionExpense,
    VehiclePurchase,
    MajorRepairExpense,
    MedicalExpense,
    WeddingExpense,
    OneTimeExpense,

    // === Contribution ===
    Contribution401k,
    ContributionRoth401k,
    ContributionTraditionalIra,
    ContributionRothIra,
    ContributionSepIra,
    ContributionHsa,
    Contribution529,
    ContributionBrokerage,
    ContributionEmergencyFund,
    EmployerMatch,
    ScheduledContribution,

    // === Withdrawal ===
    Withdrawal401k,
    WithdrawalTraditionalIra,
    WithdrawalRothIra,
    WithdrawalHsa,
    WithdrawalBrokerage,
    Withdrawal529,
    RequiredMinimumDistribution,
    EmergencyFundWithdrawal,
    ScheduledWithdrawal,

    // === Transfer ===
    RothConversion,
    RolloverToIra,
    BackdoorRoth,
    MegaBackdoorRoth,
    AccountTransfer,

    // === Real estate ===
    HomePurchase,
    HomeSale,
    RentalPropertyPurchase,
    RentalPropertySale,
    MortgagePayment,
    PropertyTaxPayment,
    HomeImprovement,
    MortgageRefinance,

    // === Debt ===
    StudentLoanPayment,
    AutoLoanPayment,
    CreditCardPayment,
    PersonalLoanPayment,
    MedicalDebtPayment,
    DebtPayoff,
    NewLoan,
    LoanConsolidation,

    // === Gifting ===
    GiftReceived,
    GiftGiven,
    Inheritance,
    CharitableDonation,

    // === Tax ===
    QuarterlyEstimatedTax,
    TaxPayment,
    TaxRefund,
    CapitalGainsRealization,
    TaxLossHarvest,

    // === Insurance ===
    InsurancePremium,
    LifeInsurancePayout,
    InsuranceClaimPayout,
    LongTermCareExpense,

    // === Lifecycle ===
    Retirement,
    SemiRetirement,
    CareerBreak,
    CareerChange,
    Marriage,
    Divorce,
    ChildBirth,
    ChildIndependence,
    Relocation,
    BusinessSale,

    // === Signed adjustments ===
    IncomeChange,
    ExpenseChange,
    SavingsRateChange,
    WindfallAdjustment,
}

/// Cash-flow style fields shared by income, expense, contribution,
/// withdrawal, transfer, gifting, tax, insurance and adjustment kinds.
///
/// Exactly one of `amount`, `monthly_amount`, `annual_amount` is expected;
/// which combinations are legal for a kind is decided by its policy, never
/// by probing. `target_account` is the raw token as typed/stored by the UI
/// layer and is parsed (with legacy aliases) during routing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowFields {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub monthly_amount: Option<f64>,
    #[serde(default)]
    pub annual_amount: Option<f64>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub annual_growth_rate: Option<f64>,
    /// Income kinds default their growth to the plan inflation rate;
    /// `Some(false)` opts a single event out of that default.
    #[serde(default)]
    pub inflation_adjusted: Option<bool>,
    #[serde(default)]
    pub target_account: Option<String>,
}

/// Fields for property purchase/sale/carrying-cost kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealEstateFields {
    #[serde(default)]
    pub property_value: Option<f64>,
    #[serde(default)]
    pub down_payment: Option<f64>,
    #[serde(default)]
    pub closing_costs: Option<f64>,
    #[serde(default)]
    pub monthly_payment: Option<f64>,
    #[serde(default)]
    pub sale_proceeds: Option<f64>,
    #[serde(default)]
    pub annual_appreciation_rate: Option<f64>,
}

/// Fields for loan payment and principal-change kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtFields {
    #[serde(default)]
    pub balance: Option<f64>,
    #[serde(default)]
    pub payment: Option<f64>,
    #[serde(default)]
    pub interest_rate: Option<f64>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
}

/// The sparse, per-kind field families a raw event can carry.
///
/// Lifecycle markers (retirement, marriage, ...) carry no cash fields at
/// all; they flow through the pipeline as zero-amount planning markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "shape")]
pub enum EventPayload {
    CashFlow(CashFlowFields),
    RealEstate(RealEstateFields),
    Debt(DebtFields),
    Marker,
}

/// A user-declared event exactly as the UI/store layer hands it over.
///
/// `start`/`end` are the historically overloaded scheduling fields: a value
/// at or above the simulation start year is an absolute calendar year, any
/// smaller value is a month offset relative to the simulation start. The
/// normalizer resolves the ambiguity once; nothing downstream sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: EventId,
    pub name: String,
    pub kind: EventKind,
    pub payload: EventPayload,
    #[serde(default)]
    pub start: Option<u32>,
    #[serde(default)]
    pub end: Option<u32>,
}

impl RawEvent {
    /// Convenience constructor for a cash-flow event starting immediately.
    pub fn cash_flow(id: u32, name: impl Into<String>, kind: EventKind, fields: CashFlowFields) -> Self {
        Self {
            id: EventId(id),
            name: name.into(),
            kind,
            payload: EventPayload::CashFlow(fields),
            start: None,
            end: None,
        }
    }

    /// Convenience constructor for a lifecycle marker event.
    pub fn marker(id: u32, name: impl Into<String>, kind: EventKind) -> Self {
        Self {
            id: EventId(id),
            name: name.into(),
            kind,
            payload: EventPayload::Marker,
            start: None,
            end: None,
        }
    }
}
