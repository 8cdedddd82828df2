//! Per-kind classification policy
//!
//! One exhaustive table maps every [`EventKind`] to its category, the field
//! combination its amount may legally come from, and its account routing
//! rule. There is deliberately no wildcard arm: a new vocabulary entry does
//! not compile until it is classified here, and no kind ever falls back to
//! a default bucket.

use serde::{Deserialize, Serialize};

use super::events::{EventCategory, EventKind};

/// The fixed account buckets money can be routed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Cash,
    Taxable,
    TaxDeferred,
    Roth,
    Hsa,
    Education,
}

impl AccountKind {
    /// Parse an explicit or legacy account token from the UI/store layer.
    ///
    /// Tokens accumulated over several storage-format generations; all of
    /// them stay parseable. Unknown tokens are a hard routing error at the
    /// call site, never a silent default.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "cash" | "checking" | "savings" | "bank" => Some(AccountKind::Cash),
            "taxable" | "brokerage" | "investment" => Some(AccountKind::Taxable),
            "tax_deferred" | "401k" | "403b" | "ira" | "traditional_ira" | "sep_ira" => {
                Some(AccountKind::TaxDeferred)
            }
            "roth" | "roth_ira" | "roth_401k" => Some(AccountKind::Roth),
            "hsa" => Some(AccountKind::Hsa),
            "education" | "529" | "college" => Some(AccountKind::Education),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Cash => "cash",
            AccountKind::Taxable => "taxable",
            AccountKind::TaxDeferred => "tax_deferred",
            AccountKind::Roth => "roth",
            AccountKind::Hsa => "hsa",
            AccountKind::Education => "education",
        }
    }
}

/// Buckets a generic contribution may be routed into.
pub const INVESTABLE_BUCKETS: &[AccountKind] = &[
    AccountKind::Taxable,
    AccountKind::TaxDeferred,
    AccountKind::Roth,
    AccountKind::Hsa,
    AccountKind::Education,
];

/// Buckets a generic withdrawal may be routed out of.
pub const WITHDRAWABLE_BUCKETS: &[AccountKind] = &[
    AccountKind::Taxable,
    AccountKind::TaxDeferred,
    AccountKind::Roth,
    AccountKind::Hsa,
    AccountKind::Education,
];

/// Every bucket, for unrestricted transfers.
pub const ALL_BUCKETS: &[AccountKind] = &[
    AccountKind::Cash,
    AccountKind::Taxable,
    AccountKind::TaxDeferred,
    AccountKind::Roth,
    AccountKind::Hsa,
    AccountKind::Education,
];

/// How an event kind is routed to an account bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingRule {
    /// The vocabulary itself names the bucket (e.g. `Contribution401k`).
    /// A conflicting explicit target is a hard error.
    Fixed(AccountKind),
    /// The user must name the bucket; absence is a hard, descriptive
    /// error listing the valid targets. Guards retirement contributions
    /// against silent misrouting.
    RequireExplicit { valid: &'static [AccountKind] },
    /// Pure tracking/planning kinds that move no bucketed money.
    NoBucket,
}

/// Which payload field combination legally supplies the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountCapability {
    /// `CashFlowFields`: `amount` (+`frequency`), or `monthly_amount`,
    /// or `annual_amount`.
    Flow,
    /// `RealEstateFields`: `down_payment` plus optional `closing_costs`,
    /// applied once.
    PurchaseOutlay,
    /// `RealEstateFields`: `sale_proceeds`, applied once.
    SaleProceeds,
    /// `RealEstateFields`: `monthly_payment`, monthly.
    CarryingCost,
    /// `DebtFields`: `payment` (+`frequency`, defaulting to monthly).
    DebtService,
    /// `DebtFields`: `balance`, applied once.
    PrincipalBalance,
    /// Marker kinds carry no amount.
    None,
}

/// Static classification record for one event kind.
#[derive(Debug, Clone, Copy)]
pub struct EventPolicy {
    pub category: EventCategory,
    pub amount: AmountCapability,
    pub routing: RoutingRule,
}

const fn flow(category: EventCategory, routing: RoutingRule) -> EventPolicy {
    EventPolicy {
        category,
        amount: AmountCapability::Flow,
        routing,
    }
}

const fn to_cash(category: EventCategory) -> EventPolicy {
    flow(category, RoutingRule::Fixed(AccountKind::Cash))
}

impl EventKind {
    /// Look up the static policy for this kind.
    ///
    /// Exhaustive by construction; an unclassified kind is a compile
    /// error, which is the whole point.
    pub fn policy(&self) -> EventPolicy {
        use AccountKind::*;
        use AmountCapability as Cap;
        use EventCategory as Cat;
        use EventKind::*;
        use RoutingRule::*;

        match self {
            // Income lands in cash.
            Salary | SelfEmploymentIncome | BonusIncome | CommissionIncome | RentalIncome
            | DividendIncome | InterestIncome | SocialSecurity | PensionIncome | AnnuityIncome
            | RoyaltyIncome | PartTimeIncome | SpouseIncome | OtherIncome => to_cash(Cat::Income),

            // Expenses are paid from cash.
            LivingExpenses | RentPayment | UtilitiesExpense | GroceriesExpense
            | TransportationExpense | HealthcareExpense | ChildcareExpense | TuitionExpense
            | TravelExpense | EntertainmentExpense | SubscriptionExpense | VehiclePurchase
            | MajorRepairExpense | MedicalExpense | WeddingExpense | OneTimeExpense => {
                to_cash(Cat::Expense)
            }

            // Contributions whose kind names the destination bucket.
            Contribution401k | ContributionTraditionalIra | ContributionSepIra | EmployerMatch => {
                flow(Cat::Contribution, Fixed(TaxDeferred))
            }
            ContributionRoth401k | ContributionRothIra => flow(Cat::Contribution, Fixed(Roth)),
            ContributionHsa => flow(Cat::Contribution, Fixed(Hsa)),
            Contribution529 => flow(Cat::Contribution, Fixed(Education)),
            ContributionBrokerage => flow(Cat::Contribution, Fixed(Taxable)),
            ContributionEmergencyFund => flow(Cat::Contribution, Fixed(Cash)),
            // The generic contribution has no implied bucket. Requiring an
            // explicit target here is what keeps retirement money from
            // being misrouted by a defaulting bug.
            ScheduledContribution => flow(
                Cat::Contribution,
                RequireExplicit {
                    valid: INVESTABLE_BUCKETS,
                },
            ),

            // Withdrawals name the bucket money leaves.
            Withdrawal401k | WithdrawalTraditionalIra | RequiredMinimumDistribution => {
                flow(Cat::Withdrawal, Fixed(TaxDeferred))
            }
            WithdrawalRothIra => flow(Cat::Withdrawal, Fixed(Roth)),
            WithdrawalHsa => flow(Cat::Withdrawal, Fixed(Hsa)),
            WithdrawalBrokerage => flow(Cat::Withdrawal, Fixed(Taxable)),
            Withdrawal529 => flow(Cat::Withdrawal, Fixed(Education)),
            EmergencyFundWithdrawal => flow(Cat::Withdrawal, Fixed(Cash)),
            ScheduledWithdrawal => flow(
                Cat::Withdrawal,
                RequireExplicit {
                    valid: WITHDRAWABLE_BUCKETS,
                },
            ),

            // Transfers name the receiving bucket.
            RothConversion | BackdoorRoth | MegaBackdoorRoth => flow(Cat::Transfer, Fixed(Roth)),
            RolloverToIra => flow(Cat::Transfer, Fixed(TaxDeferred)),
            AccountTransfer => flow(Cat::Transfer, RequireExplicit { valid: ALL_BUCKETS }),

            // Real estate settles through cash.
            HomePurchase | RentalPropertyPurchase => EventPolicy {
                category: Cat::RealEstate,
                amount: Cap::PurchaseOutlay,
                routing: Fixed(Cash),
            },
            HomeSale | RentalPropertySale => EventPolicy {
                category: Cat::RealEstate,
                amount: Cap::SaleProceeds,
                routing: Fixed(Cash),
            },
            MortgagePayment | MortgageRefinance => EventPolicy {
                category: Cat::RealEstate,
                amount: Cap::CarryingCost,
                routing: Fixed(Cash),
            },
            PropertyTaxPayment | HomeImprovement => to_cash(Cat::RealEstate),

            // Debt service is paid from cash.
            StudentLoanPayment | AutoLoanPayment | CreditCardPayment | PersonalLoanPayment
            | MedicalDebtPayment => EventPolicy {
                category: Cat::Debt,
                amount: Cap::DebtService,
                routing: Fixed(Cash),
            },
            DebtPayoff | NewLoan | LoanConsolidation => EventPolicy {
                category: Cat::Debt,
                amount: Cap::PrincipalBalance,
                routing: Fixed(Cash),
            },

            // Gifting in/out of cash.
            GiftReceived | Inheritance => to_cash(Cat::Gifting),
            GiftGiven | CharitableDonation => to_cash(Cat::Gifting),

            // Tax flows settle through cash.
            QuarterlyEstimatedTax | TaxPayment | TaxRefund | CapitalGainsRealization
            | TaxLossHarvest => to_cash(Cat::Tax),

            // Insurance flows settle through cash.
            InsurancePremium | LifeInsurancePayout | InsuranceClaimPayout | LongTermCareExpense => {
                to_cash(Cat::Insurance)
            }

            // Lifecycle markers move no money themselves; the engine reacts
            // to them. BusinessSale is the exception: proceeds are cash.
            Retirement | SemiRetirement | CareerBreak | CareerChange | Marriage | Divorce
            | ChildBirth | ChildIndependence | Relocation => EventPolicy {
                category: Cat::Lifecycle,
                amount: Cap::None,
                routing: NoBucket,
            },
            BusinessSale => to_cash(Cat::Lifecycle),

            // Signed adjustments are planning instructions, not transfers.
            IncomeChange | ExpenseChange | SavingsRateChange | WindfallAdjustment => EventPolicy {
                category: Cat::Change,
                amount: Cap::Flow,
                routing: NoBucket,
            },
        }
    }

    /// Category shorthand.
    pub fn category(&self) -> EventCategory {
        self.policy().category
    }

    /// Whether negative amounts are meaningful for this kind.
    ///
    /// Only the explicitly signed "change" kinds may carry a negative
    /// monthly amount; everything else gets clamped to zero.
    pub fn is_signed(&self) -> bool {
        self.category() == EventCategory::Change
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_token_parsing() {
        assert_eq!(AccountKind::from_token("401k"), Some(AccountKind::TaxDeferred));
        assert_eq!(AccountKind::from_token(" Roth_IRA "), Some(AccountKind::Roth));
        assert_eq!(AccountKind::from_token("529"), Some(AccountKind::Education));
        assert_eq!(AccountKind::from_token("brokerage"), Some(AccountKind::Taxable));
        assert_eq!(AccountKind::from_token("hsa"), Some(AccountKind::Hsa));
        assert_eq!(AccountKind::from_token("checking"), Some(AccountKind::Cash));
        assert_eq!(AccountKind::from_token("crypto_wallet"), None);
    }

    #[test]
    fn test_contribution_kinds_route_to_investment_buckets() {
        let fixed = [
            (EventKind::Contribution401k, AccountKind::TaxDeferred),
            (EventKind::ContributionRothIra, AccountKind::Roth),
            (EventKind::ContributionHsa, AccountKind::Hsa),
            (EventKind::Contribution529, AccountKind::Education),
            (EventKind::ContributionBrokerage, AccountKind::Taxable),
        ];
        for (kind, bucket) in fixed {
            match kind.policy().routing {
                RoutingRule::Fixed(b) => assert_eq!(b, bucket, "{kind:?}"),
                other => panic!("{kind:?} should route fixed, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_generic_contribution_requires_explicit_target() {
        match EventKind::ScheduledContribution.policy().routing {
            RoutingRule::RequireExplicit { valid } => {
                assert!(valid.contains(&AccountKind::Roth));
                assert!(!valid.contains(&AccountKind::Cash));
            }
            other => panic!("expected RequireExplicit, got {other:?}"),
        }
    }

    #[test]
    fn test_routing_is_idempotent() {
        for kind in [
            EventKind::Salary,
            EventKind::Contribution401k,
            EventKind::HomePurchase,
            EventKind::Retirement,
        ] {
            let a = kind.policy().routing;
            let b = kind.policy().routing;
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_only_change_kinds_are_signed() {
        assert!(EventKind::IncomeChange.is_signed());
        assert!(EventKind::WindfallAdjustment.is_signed());
        assert!(!EventKind::Salary.is_signed());
        assert!(!EventKind::LivingExpenses.is_signed());
    }
}
