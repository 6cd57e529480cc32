// Entity Models - the typed records a profile is made of
// No behavior beyond small helpers; every mutation goes through ProfileStore.

pub mod asset;
pub mod bank_account;
pub mod income;
pub mod obligations;
pub mod settings;

pub use asset::{Asset, AssetCategory, AssetDetails, CryptoHolding, DefiPosition};
pub use bank_account::{BankAccount, BankAccountPatch, BankAccountType};
pub use income::{Income, IncomeSource};
pub use obligations::{Debt, Desire, Frequency, Obligation};
pub use settings::Settings;

use crate::error::{Result, TrackerError};

/// Non-finite amounts serialize as `null` and would make the saved profile unreadable
pub(crate) fn require_amount(what: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(TrackerError::Validation(format!(
            "{} must be a finite number >= 0 (got {})",
            what, value
        )));
    }
    Ok(())
}

pub(crate) fn require_name(what: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TrackerError::Validation(format!("{} name is required", what)));
    }
    Ok(())
}
