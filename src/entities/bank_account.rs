// 💳 Bank Account Entity - where the money sits, and where the paycheck lands
//
// "Account name is a VALUE (can change), Account id is IDENTITY (never changes)"
//
// At most one account in a profile carries `is_primary_income`. The flag is
// only ever written through the ProfileStore, which owns that invariant.

use crate::error::{Result, TrackerError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// ACCOUNT TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankAccountType {
    /// Checking account (debit card, daily spending)
    Checking,

    /// Savings account (interest-bearing)
    Savings,

    /// Investment account (brokerage)
    Investment,

    /// Any type written by a newer version
    #[serde(other)]
    Other,
}

impl BankAccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BankAccountType::Checking => "Checking",
            BankAccountType::Savings => "Savings",
            BankAccountType::Investment => "Investment",
            BankAccountType::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "checking" => Some(BankAccountType::Checking),
            "savings" => Some(BankAccountType::Savings),
            "investment" => Some(BankAccountType::Investment),
            "other" => Some(BankAccountType::Other),
            _ => None,
        }
    }
}

// ============================================================================
// BANK ACCOUNT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    /// Stable identity (UUID) - NEVER changes
    pub id: String,

    /// Display name (e.g., "Chase Checking")
    pub name: String,

    /// Institution name (e.g., "Chase")
    pub institution: String,

    pub account_type: BankAccountType,

    /// Current balance (signed: overdrafts are negative)
    pub balance: f64,

    /// Paycheck destination flag
    #[serde(default)]
    pub is_primary_income: bool,

    pub created_at: DateTime<Utc>,
}

impl BankAccount {
    /// Create new account entity with UUID
    pub fn new(
        name: impl Into<String>,
        institution: impl Into<String>,
        account_type: BankAccountType,
        balance: f64,
    ) -> Self {
        BankAccount {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            institution: institution.into(),
            account_type,
            balance,
            is_primary_income: false,
            created_at: Utc::now(),
        }
    }

    /// Request the primary-income flag. The store decides whether it sticks.
    pub fn with_primary(mut self, primary: bool) -> Self {
        self.is_primary_income = primary;
        self
    }

    /// Required-field check applied on create
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(TrackerError::Validation("bank account id is required".into()));
        }
        if self.name.trim().is_empty() {
            return Err(TrackerError::Validation("bank account name is required".into()));
        }
        if self.institution.trim().is_empty() {
            return Err(TrackerError::Validation(
                "bank account institution is required".into(),
            ));
        }
        if !self.balance.is_finite() {
            return Err(TrackerError::Validation(format!(
                "bank account balance must be a finite number (got {})",
                self.balance
            )));
        }
        Ok(())
    }

    /// Check if account is overdrawn (negative balance)
    pub fn is_overdrawn(&self) -> bool {
        self.balance < 0.0
    }

    /// Merge a partial update. The primary flag is NOT touched here.
    pub(crate) fn apply(&mut self, patch: &BankAccountPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(institution) = &patch.institution {
            self.institution = institution.clone();
        }
        if let Some(account_type) = patch.account_type {
            self.account_type = account_type;
        }
        if let Some(balance) = patch.balance {
            self.balance = balance;
        }
    }
}

// ============================================================================
// PARTIAL UPDATE
// ============================================================================

/// Fields to merge into an existing account; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankAccountPatch {
    pub name: Option<String>,
    pub institution: Option<String>,
    pub account_type: Option<BankAccountType>,
    pub balance: Option<f64>,
    /// `Some(true)` routes through the store's primary exclusivity routine.
    pub is_primary_income: Option<bool>,
}

impl BankAccountPatch {
    pub fn balance(balance: f64) -> Self {
        BankAccountPatch {
            balance: Some(balance),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_creation() {
        let account =
            BankAccount::new("Chase Checking", "Chase", BankAccountType::Checking, 1000.0);

        assert!(!account.id.is_empty());
        assert_eq!(account.name, "Chase Checking");
        assert_eq!(account.institution, "Chase");
        assert_eq!(account.account_type, BankAccountType::Checking);
        assert_eq!(account.balance, 1000.0);
        assert!(!account.is_primary_income);
        assert!(account.validate().is_ok());
    }

    #[test]
    fn test_account_validation_rejects_missing_fields() {
        let account = BankAccount::new("", "Chase", BankAccountType::Checking, 0.0);
        assert!(matches!(account.validate(), Err(TrackerError::Validation(_))));

        let account = BankAccount::new("Savings", "  ", BankAccountType::Savings, 0.0);
        assert!(matches!(account.validate(), Err(TrackerError::Validation(_))));

        let account = BankAccount::new("Savings", "Ally", BankAccountType::Savings, f64::NAN);
        assert!(matches!(account.validate(), Err(TrackerError::Validation(_))));
    }

    #[test]
    fn test_patch_merges_only_given_fields() {
        let mut account = BankAccount::new("Old", "Chase", BankAccountType::Checking, -50.0);
        assert!(account.is_overdrawn());

        account.apply(&BankAccountPatch {
            name: Some("New".to_string()),
            balance: Some(250.0),
            ..Default::default()
        });

        assert_eq!(account.name, "New");
        assert_eq!(account.institution, "Chase");
        assert_eq!(account.balance, 250.0);
        assert!(!account.is_overdrawn());
    }

    #[test]
    fn test_account_type_serialization() {
        let json = serde_json::to_string(&BankAccountType::Investment).unwrap();
        assert_eq!(json, "\"investment\"");
        assert_eq!(BankAccountType::parse("Savings"), Some(BankAccountType::Savings));
        assert_eq!(BankAccountType::parse("credit"), None);

        let unknown: BankAccountType = serde_json::from_str(r#""credit_union""#).unwrap();
        assert_eq!(unknown, BankAccountType::Other);
    }
}
