// 🧾 Obligations, Debts, Desires - the outflow side of the profile

use super::{require_amount, require_name};
use crate::error::Result;
use serde::{Deserialize, Serialize};

// ============================================================================
// FREQUENCY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Frequency::Weekly => 52.0,
            Frequency::Monthly => 12.0,
            Frequency::Quarterly => 4.0,
            Frequency::Annual => 1.0,
        }
    }

    pub fn annualize(&self, amount: f64) -> f64 {
        amount * self.periods_per_year()
    }

    // serde default hook
    pub(crate) fn monthly() -> Self {
        Frequency::Monthly
    }
}

// ============================================================================
// OBLIGATION
// ============================================================================

/// Recurring cost of living (rent, groceries, insurance)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: String,
    pub name: String,
    pub amount: f64,
    #[serde(default = "Frequency::monthly")]
    pub frequency: Frequency,

    /// Essentials are what "covering essentials" is measured against
    #[serde(default = "default_true")]
    pub essential: bool,

    /// Paying account (may dangle after account removal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Obligation {
    pub fn new(name: impl Into<String>, amount: f64, frequency: Frequency) -> Self {
        Obligation {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            amount,
            frequency,
            essential: true,
            account_id: None,
        }
    }

    pub fn discretionary(mut self) -> Self {
        self.essential = false;
        self
    }

    pub fn annual_amount(&self) -> f64 {
        self.frequency.annualize(self.amount)
    }

    pub fn validate(&self) -> Result<()> {
        require_name("obligation", &self.name)?;
        require_amount("obligation amount", self.amount)
    }
}

// ============================================================================
// DEBT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: String,
    pub name: String,

    /// Outstanding principal
    pub balance: f64,

    /// APR as a percentage (e.g. 19.99)
    #[serde(default)]
    pub interest_rate: f64,

    /// Required monthly payment
    #[serde(default)]
    pub minimum_payment: f64,
}

impl Debt {
    pub fn new(
        name: impl Into<String>,
        balance: f64,
        interest_rate: f64,
        minimum_payment: f64,
    ) -> Self {
        Debt {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            balance,
            interest_rate,
            minimum_payment,
        }
    }

    pub fn annual_payment(&self) -> f64 {
        Frequency::Monthly.annualize(self.minimum_payment)
    }

    pub fn validate(&self) -> Result<()> {
        require_name("debt", &self.name)?;
        require_amount("debt balance", self.balance)?;
        require_amount("debt interest rate", self.interest_rate)?;
        require_amount("debt minimum payment", self.minimum_payment)
    }
}

// ============================================================================
// DESIRE
// ============================================================================

/// Something the user wants to afford
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Desire {
    pub id: String,
    pub name: String,
    pub cost: f64,

    /// Recurring desires count toward outflow; one-off purchases do not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
}

impl Desire {
    pub fn new(name: impl Into<String>, cost: f64, frequency: Option<Frequency>) -> Self {
        Desire {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            cost,
            frequency,
        }
    }

    pub fn annual_cost(&self) -> f64 {
        self.frequency.map(|f| f.annualize(self.cost)).unwrap_or(0.0)
    }

    pub fn validate(&self) -> Result<()> {
        require_name("desire", &self.name)?;
        require_amount("desire cost", self.cost)
    }
}
