// 🪙 Asset Entity - things that hold value and (sometimes) pay you
//
// Category-specific data lives in a tagged variant rather than a loose map,
// so the wallet address on synced holdings is a typed field, not a guess.

use super::{require_amount, require_name};
use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};

// ============================================================================
// ASSET CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Crypto,
    Defi,
    RealEstate,
    Stocks,
    Business,
    Other,
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Crypto => "Crypto",
            AssetCategory::Defi => "DeFi",
            AssetCategory::RealEstate => "Real Estate",
            AssetCategory::Stocks => "Stocks",
            AssetCategory::Business => "Business",
            AssetCategory::Other => "Other",
        }
    }

    /// Crypto and DeFi holdings have an external source of truth (the chain).
    pub fn is_synced(&self) -> bool {
        matches!(self, AssetCategory::Crypto | AssetCategory::Defi)
    }
}

// ============================================================================
// CATEGORY DETAILS
// ============================================================================

/// Token holding discovered in (or entered for) a wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoHolding {
    /// Token mint / identifier
    pub token_id: String,

    /// Quantity in whole-token units
    pub quantity: f64,

    #[serde(default)]
    pub staked: bool,

    /// Wallet that produced this holding. Reconciliation join key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,

    pub symbol: String,

    #[serde(default)]
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefiPosition {
    pub protocol: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,

    #[serde(default)]
    pub symbol: String,

    #[serde(default)]
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum AssetDetails {
    Crypto(CryptoHolding),
    Defi(DefiPosition),
    RealEstate {
        #[serde(default)]
        address: String,
        #[serde(default)]
        monthly_rent: f64,
    },
    Stocks {
        #[serde(default)]
        ticker: String,
        #[serde(default)]
        shares: f64,
    },
    Business {
        #[serde(default)]
        ownership_percent: f64,
    },
    Other {
        #[serde(default)]
        notes: String,
    },
    /// Category written by a newer version; treated as a manual asset
    #[serde(other)]
    Unrecognized,
}

// ============================================================================
// ASSET ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub name: String,

    /// Current value in the profile currency (>= 0)
    pub value: f64,

    /// Annual income attributable to this asset (>= 0)
    #[serde(default)]
    pub annual_income: f64,

    pub details: AssetDetails,
}

impl Asset {
    pub fn new(
        name: impl Into<String>,
        value: f64,
        annual_income: f64,
        details: AssetDetails,
    ) -> Self {
        Asset {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            value: value.max(0.0),
            annual_income: annual_income.max(0.0),
            details,
        }
    }

    pub fn category(&self) -> AssetCategory {
        match &self.details {
            AssetDetails::Crypto(_) => AssetCategory::Crypto,
            AssetDetails::Defi(_) => AssetCategory::Defi,
            AssetDetails::RealEstate { .. } => AssetCategory::RealEstate,
            AssetDetails::Stocks { .. } => AssetCategory::Stocks,
            AssetDetails::Business { .. } => AssetCategory::Business,
            AssetDetails::Other { .. } | AssetDetails::Unrecognized => AssetCategory::Other,
        }
    }

    pub fn is_synced(&self) -> bool {
        self.category().is_synced()
    }

    /// Every number must survive a JSON round trip
    pub fn validate(&self) -> Result<()> {
        require_name("asset", &self.name)?;
        require_amount("asset value", self.value)?;
        require_amount("asset income", self.annual_income)?;

        let detail = match &self.details {
            AssetDetails::Crypto(holding) => holding.quantity,
            AssetDetails::Defi(position) => position.quantity,
            AssetDetails::RealEstate { monthly_rent, .. } => *monthly_rent,
            AssetDetails::Stocks { shares, .. } => *shares,
            AssetDetails::Business { ownership_percent } => *ownership_percent,
            AssetDetails::Other { .. } | AssetDetails::Unrecognized => 0.0,
        };
        if !detail.is_finite() {
            return Err(TrackerError::Validation(format!(
                "{} details contain a non-finite number",
                self.category().as_str()
            )));
        }
        Ok(())
    }

    /// Owning wallet of a crypto/defi asset, if it carries one
    pub fn wallet_address(&self) -> Option<&str> {
        match &self.details {
            AssetDetails::Crypto(holding) => holding.wallet_address.as_deref(),
            AssetDetails::Defi(position) => position.wallet_address.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sol_holding(wallet: Option<&str>) -> Asset {
        Asset::new(
            "SOL",
            100.0,
            0.0,
            AssetDetails::Crypto(CryptoHolding {
                token_id: "So11111111111111111111111111111111111111112".to_string(),
                quantity: 1.0,
                staked: false,
                wallet_address: wallet.map(str::to_string),
                symbol: "SOL".to_string(),
                decimals: 9,
            }),
        )
    }

    #[test]
    fn test_category_and_wallet_address() {
        let asset = sol_holding(Some("Wallet1"));
        assert_eq!(asset.category(), AssetCategory::Crypto);
        assert!(asset.is_synced());
        assert_eq!(asset.wallet_address(), Some("Wallet1"));

        let house = Asset::new(
            "Rental",
            250_000.0,
            18_000.0,
            AssetDetails::RealEstate {
                address: "12 Main St".to_string(),
                monthly_rent: 1500.0,
            },
        );
        assert_eq!(house.category(), AssetCategory::RealEstate);
        assert!(!house.is_synced());
        assert_eq!(house.wallet_address(), None);
    }

    #[test]
    fn test_negative_values_are_clamped() {
        let asset = Asset::new(
            "Broken",
            -10.0,
            -1.0,
            AssetDetails::Other {
                notes: String::new(),
            },
        );
        assert_eq!(asset.value, 0.0);
        assert_eq!(asset.annual_income, 0.0);
    }

    #[test]
    fn test_details_are_tagged_by_category() {
        let json = serde_json::to_value(sol_holding(None)).unwrap();
        assert_eq!(json["details"]["category"], "crypto");
        assert!(json["details"].get("wallet_address").is_none());

        let parsed: AssetDetails =
            serde_json::from_str(r#"{"category":"stocks","ticker":"VTI"}"#).unwrap();
        assert_eq!(
            parsed,
            AssetDetails::Stocks {
                ticker: "VTI".to_string(),
                shares: 0.0
            }
        );
    }

    #[test]
    fn test_unknown_category_loads_as_manual_asset() {
        let json = r#"{
            "id": "a1",
            "name": "Art",
            "value": 5000.0,
            "details": {"category": "collectible", "artist": "X"}
        }"#;
        let asset: Asset = serde_json::from_str(json).unwrap();

        assert_eq!(asset.details, AssetDetails::Unrecognized);
        assert_eq!(asset.category(), AssetCategory::Other);
        assert!(!asset.is_synced());
    }

    #[test]
    fn test_validation_rejects_non_finite_numbers() {
        assert!(sol_holding(Some("W1")).validate().is_ok());

        let mut asset = sol_holding(Some("W1"));
        asset.value = f64::INFINITY;
        assert!(asset.validate().is_err());

        let stocks = Asset::new(
            "VTI",
            10.0,
            0.0,
            AssetDetails::Stocks {
                ticker: "VTI".to_string(),
                shares: f64::NAN,
            },
        );
        assert!(matches!(stocks.validate(), Err(TrackerError::Validation(_))));
    }
}
