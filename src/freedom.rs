// 🕊️ Freedom Score - how much of life do the assets already pay for?
//
// Pure derivation over a snapshot: no state, no persistence, never fails.
// Anything that would divide by zero or is not a finite number contributes
// nothing instead of raising.
//
//   annual_outflow  = obligations + debt_weight * debt payments (+ recurring desires)
//   coverage_ratio  = annual_asset_income / annual_outflow
//   freedom_days    = net_worth / (annual_outflow / 365)

use crate::snapshot::ProfileSnapshot;
use serde::{Deserialize, Serialize};

pub const DAYS_PER_YEAR: f64 = 365.0;

// ============================================================================
// POLICY (business rules, exposed as configuration)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreedomPolicy {
    /// Coverage ratio at which the profile counts as free (default: 1.0)
    pub free_coverage_ratio: f64,

    /// Weight applied to minimum debt payments in the outflow (default: 1.0)
    pub debt_payment_weight: f64,

    /// Count recurring desires as outflow (default: false)
    pub include_desires: bool,
}

impl Default for FreedomPolicy {
    fn default() -> Self {
        FreedomPolicy {
            free_coverage_ratio: 1.0,
            debt_payment_weight: 1.0,
            include_desires: false,
        }
    }
}

// ============================================================================
// FREEDOM STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreedomState {
    /// Asset income does not yet cover essential obligations
    Accumulating,

    /// Asset income covers essentials but not everything
    CoveringEssentials,

    /// Asset income covers the full outflow
    Free,
}

impl FreedomState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FreedomState::Accumulating => "Accumulating",
            FreedomState::CoveringEssentials => "Covering essentials",
            FreedomState::Free => "Free",
        }
    }
}

// ============================================================================
// FREEDOM REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreedomReport {
    pub daily_asset_income: f64,
    pub annual_asset_income: f64,

    /// Salary + other income + asset income
    pub annual_income: f64,

    pub annual_outflow: f64,
    pub essential_outflow: f64,

    /// Asset income / outflow (0 when there is no outflow)
    pub coverage_ratio: f64,

    /// Bank balances + asset values - debt balances, floored at zero
    pub net_worth: f64,

    /// Days the net worth alone would fund the outflow. None = unbounded.
    pub freedom_days: Option<u64>,

    pub state: FreedomState,
    pub formatted: String,
}

impl FreedomReport {
    pub fn summary(&self) -> String {
        format!(
            "{} | asset income ${:.2}/day | coverage {:.0}% | {}",
            self.state.as_str(),
            self.daily_asset_income,
            self.coverage_ratio * 100.0,
            self.formatted
        )
    }
}

// ============================================================================
// CALCULATOR
// ============================================================================

pub struct FreedomCalculator {
    pub policy: FreedomPolicy,
}

impl FreedomCalculator {
    pub fn new() -> Self {
        FreedomCalculator {
            policy: FreedomPolicy::default(),
        }
    }

    pub fn with_policy(policy: FreedomPolicy) -> Self {
        FreedomCalculator { policy }
    }

    pub fn calculate(&self, snapshot: &ProfileSnapshot) -> FreedomReport {
        let annual_asset_income = Self::annual_asset_income(snapshot);
        let daily_asset_income = annual_asset_income / DAYS_PER_YEAR;
        let annual_income = finite(snapshot.income.annual_total()) + annual_asset_income;

        let essential_outflow: f64 = snapshot
            .obligations
            .iter()
            .filter(|o| o.essential)
            .map(|o| non_negative(o.annual_amount()))
            .sum();
        let discretionary_outflow: f64 = snapshot
            .obligations
            .iter()
            .filter(|o| !o.essential)
            .map(|o| non_negative(o.annual_amount()))
            .sum();
        let debt_outflow: f64 = snapshot
            .debts
            .iter()
            .map(|d| non_negative(d.annual_payment()))
            .sum::<f64>()
            * finite(self.policy.debt_payment_weight);
        let desire_outflow: f64 = if self.policy.include_desires {
            snapshot
                .desires
                .iter()
                .map(|d| non_negative(d.annual_cost()))
                .sum()
        } else {
            0.0
        };

        let annual_outflow =
            essential_outflow + discretionary_outflow + debt_outflow + desire_outflow;

        let coverage_ratio = ratio(annual_asset_income, annual_outflow);

        let net_worth = non_negative(
            snapshot.total_bank_balance() + snapshot.total_asset_value() - snapshot.total_debt(),
        );

        let freedom_days = if annual_outflow > 0.0 {
            Some((net_worth / (annual_outflow / DAYS_PER_YEAR)).floor() as u64)
        } else {
            None
        };

        let state = self.classify(
            annual_asset_income,
            annual_outflow,
            essential_outflow,
            coverage_ratio,
        );
        let formatted = Self::format(state, freedom_days);

        FreedomReport {
            daily_asset_income,
            annual_asset_income,
            annual_income,
            annual_outflow,
            essential_outflow,
            coverage_ratio,
            net_worth,
            freedom_days,
            state,
            formatted,
        }
    }

    /// Sum of each asset's annual income, ignoring garbage values
    pub fn annual_asset_income(snapshot: &ProfileSnapshot) -> f64 {
        snapshot
            .assets
            .iter()
            .map(|a| non_negative(a.annual_income))
            .sum()
    }

    pub fn daily_asset_income(snapshot: &ProfileSnapshot) -> f64 {
        Self::annual_asset_income(snapshot) / DAYS_PER_YEAR
    }

    fn classify(
        &self,
        asset_income: f64,
        outflow: f64,
        essential_outflow: f64,
        coverage_ratio: f64,
    ) -> FreedomState {
        if outflow <= 0.0 {
            return if asset_income > 0.0 {
                FreedomState::Free
            } else {
                FreedomState::Accumulating
            };
        }

        if coverage_ratio >= self.policy.free_coverage_ratio {
            FreedomState::Free
        } else if essential_outflow > 0.0 && asset_income >= essential_outflow {
            FreedomState::CoveringEssentials
        } else {
            FreedomState::Accumulating
        }
    }

    /// "2y 3m 10d of runway"
    fn format(state: FreedomState, freedom_days: Option<u64>) -> String {
        match (state, freedom_days) {
            (FreedomState::Free, _) => "Free: asset income covers all obligations".to_string(),
            (_, None) => "No obligations recorded".to_string(),
            (_, Some(days)) => {
                let years = days / 365;
                let months = (days % 365) / 30;
                let rest = (days % 365) % 30;
                format!("{}y {}m {}d of runway", years, months, rest)
            }
        }
    }
}

impl Default for FreedomCalculator {
    fn default() -> Self {
        Self::new()
    }
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn non_negative(value: f64) -> f64 {
    finite(value).max(0.0)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        finite(numerator / denominator)
    } else {
        0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        Asset, AssetDetails, BankAccount, BankAccountType, Debt, Desire, Frequency, Obligation,
    };

    fn rental(annual_income: f64) -> Asset {
        Asset::new(
            "Rental",
            200_000.0,
            annual_income,
            AssetDetails::RealEstate {
                address: "1 Elm".to_string(),
                monthly_rent: annual_income / 12.0,
            },
        )
    }

    #[test]
    fn test_empty_snapshot_is_total() {
        let report = FreedomCalculator::new().calculate(&ProfileSnapshot::default());

        assert_eq!(report.daily_asset_income, 0.0);
        assert_eq!(report.coverage_ratio, 0.0);
        assert_eq!(report.freedom_days, None);
        assert_eq!(report.state, FreedomState::Accumulating);
        assert_eq!(report.formatted, "No obligations recorded");
    }

    #[test]
    fn test_daily_asset_income() {
        let mut snapshot = ProfileSnapshot::default();
        snapshot.assets.push(rental(36_500.0));
        snapshot.assets.push(rental(3_650.0));

        assert!((FreedomCalculator::daily_asset_income(&snapshot) - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_classification() {
        let calculator = FreedomCalculator::new();
        let mut snapshot = ProfileSnapshot::default();
        snapshot
            .obligations
            .push(Obligation::new("Rent", 1_000.0, Frequency::Monthly));
        snapshot
            .obligations
            .push(Obligation::new("Dining", 500.0, Frequency::Monthly).discretionary());

        snapshot.assets.push(rental(6_000.0));
        assert_eq!(calculator.calculate(&snapshot).state, FreedomState::Accumulating);

        snapshot.assets[0].annual_income = 12_000.0;
        assert_eq!(
            calculator.calculate(&snapshot).state,
            FreedomState::CoveringEssentials
        );

        snapshot.assets[0].annual_income = 18_000.0;
        let report = calculator.calculate(&snapshot);
        assert_eq!(report.state, FreedomState::Free);
        assert!((report.coverage_ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_debt_weight_and_desires_follow_policy() {
        let mut snapshot = ProfileSnapshot::default();
        snapshot.debts.push(Debt::new("Card", 5_000.0, 20.0, 100.0));
        snapshot
            .desires
            .push(Desire::new("Travel", 2_400.0, Some(Frequency::Annual)));

        let report = FreedomCalculator::new().calculate(&snapshot);
        assert_eq!(report.annual_outflow, 1_200.0);

        let report = FreedomCalculator::with_policy(FreedomPolicy {
            debt_payment_weight: 0.5,
            include_desires: true,
            ..Default::default()
        })
        .calculate(&snapshot);
        assert_eq!(report.annual_outflow, 600.0 + 2_400.0);
    }

    #[test]
    fn test_freedom_days_and_formatting() {
        let mut snapshot = ProfileSnapshot::default();
        snapshot.bank_accounts.push(BankAccount::new(
            "Savings",
            "Ally",
            BankAccountType::Savings,
            36_500.0,
        ));
        snapshot
            .obligations
            .push(Obligation::new("Living", 36_500.0, Frequency::Annual));

        let report = FreedomCalculator::new().calculate(&snapshot);
        assert_eq!(report.net_worth, 36_500.0);
        assert_eq!(report.freedom_days, Some(365));
        assert_eq!(report.formatted, "1y 0m 0d of runway");
    }

    #[test]
    fn test_garbage_values_degrade_gracefully() {
        let mut snapshot = ProfileSnapshot::default();
        let mut asset = rental(1_000.0);
        asset.annual_income = f64::NAN;
        snapshot.assets.push(asset);
        snapshot
            .obligations
            .push(Obligation::new("Weird", f64::INFINITY, Frequency::Monthly));
        snapshot.debts.push(Debt::new("Huge", 1e308, 0.0, -50.0));

        let report = FreedomCalculator::new().calculate(&snapshot);
        assert_eq!(report.annual_asset_income, 0.0);
        assert_eq!(report.annual_outflow, 0.0);
        assert_eq!(report.net_worth, 0.0);
        assert_eq!(report.state, FreedomState::Accumulating);
    }
}
