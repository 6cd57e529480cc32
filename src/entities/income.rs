// 💵 Income - salary plus any other recurring inflows
//
// Income sources may point at a bank account. When that account is removed
// the reference dangles and is treated as "unlinked", never as an error.

use super::obligations::Frequency;
use super::{require_amount, require_name};
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeSource {
    pub id: String,
    pub name: String,
    pub amount: f64,
    #[serde(default = "Frequency::monthly")]
    pub frequency: Frequency,

    /// Account the money lands in (may dangle after account removal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl IncomeSource {
    pub fn new(name: impl Into<String>, amount: f64, frequency: Frequency) -> Self {
        IncomeSource {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            amount,
            frequency,
            account_id: None,
        }
    }

    pub fn linked_to(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn annual_amount(&self) -> f64 {
        self.frequency.annualize(self.amount)
    }

    pub fn validate(&self) -> Result<()> {
        require_name("income source", &self.name)?;
        require_amount("income source amount", self.amount)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Income {
    /// Annual gross salary
    #[serde(default)]
    pub salary: f64,

    #[serde(default)]
    pub other_sources: Vec<IncomeSource>,
}

impl Income {
    /// Salary + every other source, annualized
    pub fn annual_total(&self) -> f64 {
        let other: f64 = self
            .other_sources
            .iter()
            .map(IncomeSource::annual_amount)
            .filter(|v| v.is_finite())
            .sum();
        let salary = if self.salary.is_finite() { self.salary } else { 0.0 };
        salary + other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annual_total() {
        let income = Income {
            salary: 60_000.0,
            other_sources: vec![
                IncomeSource::new("Freelance", 500.0, Frequency::Monthly),
                IncomeSource::new("Dividends", 1_000.0, Frequency::Annual),
            ],
        };
        assert_eq!(income.annual_total(), 60_000.0 + 6_000.0 + 1_000.0);
    }

    #[test]
    fn test_non_finite_salary_contributes_nothing() {
        let income = Income {
            salary: f64::INFINITY,
            other_sources: vec![],
        };
        assert_eq!(income.annual_total(), 0.0);
    }

    #[test]
    fn test_source_validation() {
        assert!(IncomeSource::new("Rent roll", 900.0, Frequency::Monthly).validate().is_ok());
        assert!(IncomeSource::new("", 900.0, Frequency::Monthly).validate().is_err());
        assert!(IncomeSource::new("Gig", f64::NAN, Frequency::Monthly).validate().is_err());
        assert!(IncomeSource::new("Gig", -1.0, Frequency::Monthly).validate().is_err());
    }
}
