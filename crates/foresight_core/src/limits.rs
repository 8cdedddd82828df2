//! Versioned planning thresholds
//!
//! Statutory contribution ceilings and plausibility bounds used by the
//! validation pipeline. These change with tax law, so they live in a
//! serde-loadable config struct instead of as literals inside check code;
//! the defaults carry 2025 figures.

use serde::{Deserialize, Serialize};

use crate::model::{AccountKind, EventKind};

/// Thresholds the validation pipeline checks against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningLimits {
    /// Law year the statutory figures below were taken from.
    pub version: String,
    /// 401(k)/403(b) employee deferral limit (annual).
    pub employee_deferral_limit: f64,
    /// Traditional/Roth IRA contribution limit (annual).
    pub ira_contribution_limit: f64,
    /// HSA family contribution limit (annual).
    pub hsa_contribution_limit: f64,
    /// Annual gift-tax exclusion, used as the 529 reference ceiling.
    pub education_gift_limit: f64,
    /// Monthly amounts above this are flagged as implausible (warning).
    pub plausible_monthly_amount: f64,
}

impl Default for PlanningLimits {
    fn default() -> Self {
        Self {
            version: "2025".to_string(),
            employee_deferral_limit: 23_500.0,
            ira_contribution_limit: 7_000.0,
            hsa_contribution_limit: 8_550.0,
            education_gift_limit: 19_000.0,
            plausible_monthly_amount: 1_000_000.0,
        }
    }
}

impl PlanningLimits {
    /// The annual statutory ceiling for a contribution kind, if one
    /// applies. Generic contributions are checked against the ceiling of
    /// the bucket they target.
    pub fn statutory_ceiling(&self, kind: EventKind, target: Option<AccountKind>) -> Option<f64> {
        match kind {
            EventKind::Contribution401k | EventKind::ContributionRoth401k => {
                Some(self.employee_deferral_limit)
            }
            EventKind::ContributionTraditionalIra
            | EventKind::ContributionRothIra
            | EventKind::ContributionSepIra
            | EventKind::BackdoorRoth => Some(self.ira_contribution_limit),
            EventKind::ContributionHsa => Some(self.hsa_contribution_limit),
            EventKind::Contribution529 => Some(self.education_gift_limit),
            EventKind::ScheduledContribution => match target? {
                AccountKind::TaxDeferred => Some(self.employee_deferral_limit),
                AccountKind::Roth => Some(self.ira_contribution_limit),
                AccountKind::Hsa => Some(self.hsa_contribution_limit),
                AccountKind::Education => Some(self.education_gift_limit),
                AccountKind::Cash | AccountKind::Taxable => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_current_law() {
        let limits = PlanningLimits::default();
        assert_eq!(limits.version, "2025");
        assert_eq!(
            limits.statutory_ceiling(EventKind::Contribution401k, None),
            Some(23_500.0)
        );
        assert_eq!(
            limits.statutory_ceiling(EventKind::ContributionRothIra, None),
            Some(7_000.0)
        );
        assert_eq!(limits.statutory_ceiling(EventKind::Salary, None), None);
    }

    #[test]
    fn test_generic_contribution_uses_target_ceiling() {
        let limits = PlanningLimits::default();
        assert_eq!(
            limits.statutory_ceiling(
                EventKind::ScheduledContribution,
                Some(AccountKind::TaxDeferred)
            ),
            Some(23_500.0)
        );
        assert_eq!(
            limits.statutory_ceiling(EventKind::ScheduledContribution, Some(AccountKind::Taxable)),
            None
        );
        assert_eq!(
            limits.statutory_ceiling(EventKind::ScheduledContribution, None),
            None
        );
    }
}
