// 📸 Profile Snapshot - the complete set of a user's financial entities at one instant
//
// This is the unit of local persistence, plaintext export, and encrypted backup.
// Every collection defaults to empty so that documents written by older
// versions still load.

use crate::entities::{Asset, BankAccount, Debt, Desire, Income, Obligation, Settings};
use serde::{Deserialize, Serialize};

/// Current schema version written into every persisted/exported snapshot
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    #[serde(default)]
    pub bank_accounts: Vec<BankAccount>,

    #[serde(default)]
    pub assets: Vec<Asset>,

    /// Connected wallet addresses, in connection order
    #[serde(default)]
    pub wallets: Vec<String>,

    #[serde(default)]
    pub income: Income,

    #[serde(default)]
    pub obligations: Vec<Obligation>,

    #[serde(default)]
    pub debts: Vec<Debt>,

    #[serde(default)]
    pub desires: Vec<Desire>,

    #[serde(default)]
    pub settings: Settings,
}

impl ProfileSnapshot {
    pub fn is_empty(&self) -> bool {
        self.bank_accounts.is_empty()
            && self.assets.is_empty()
            && self.wallets.is_empty()
            && self.obligations.is_empty()
            && self.debts.is_empty()
            && self.desires.is_empty()
            && self.income == Income::default()
    }

    pub fn primary_account(&self) -> Option<&BankAccount> {
        self.bank_accounts.iter().find(|a| a.is_primary_income)
    }

    pub fn total_bank_balance(&self) -> f64 {
        self.bank_accounts
            .iter()
            .map(|a| a.balance)
            .filter(|b| b.is_finite())
            .sum()
    }

    pub fn total_asset_value(&self) -> f64 {
        self.assets
            .iter()
            .map(|a| a.value)
            .filter(|v| v.is_finite())
            .sum()
    }

    pub fn total_debt(&self) -> f64 {
        self.debts
            .iter()
            .map(|d| d.balance)
            .filter(|b| b.is_finite())
            .sum()
    }

    /// Keep only the first account flagged primary. Returns true if anything changed.
    ///
    /// Used when a whole snapshot arrives from outside (import/restore); normal
    /// mutations never produce a second primary.
    pub(crate) fn normalize_primary(&mut self) -> bool {
        let mut seen = false;
        let mut changed = false;
        for account in self.bank_accounts.iter_mut() {
            if account.is_primary_income {
                if seen {
                    account.is_primary_income = false;
                    changed = true;
                }
                seen = true;
            }
        }
        changed
    }
}
