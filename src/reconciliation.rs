// ⚖️ Asset Reconciliation - fold wallet-synced holdings into the asset list
//
// Synced assets are a complete picture of on-chain holdings at sync time, so
// the crypto/defi partition is REPLACED wholesale, never patched. Manually
// entered assets have no external source of truth and are never touched.
//
//   existing = [manual..., synced...]
//   merged   = [manual..., fresh...]

use crate::entities::Asset;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// MERGE OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// Manual (non-synced) assets carried over untouched
    pub kept_manual: usize,

    /// Previously synced assets discarded
    pub replaced: usize,

    /// Fresh synced assets inserted
    pub inserted: usize,
}

// ============================================================================
// RECONCILER
// ============================================================================

pub struct AssetReconciler {
    /// Synced holdings valued below this are dust (default: 0.01)
    pub materiality_threshold: f64,
}

impl AssetReconciler {
    pub fn new() -> Self {
        AssetReconciler {
            materiality_threshold: 0.01,
        }
    }

    pub fn with_threshold(materiality_threshold: f64) -> Self {
        AssetReconciler {
            materiality_threshold,
        }
    }

    /// Drop synced holdings below the materiality threshold.
    ///
    /// Returns the material assets (original order) and how many were dropped.
    pub fn filter_material(&self, assets: Vec<Asset>) -> (Vec<Asset>, usize) {
        let before = assets.len();
        let material: Vec<Asset> = assets
            .into_iter()
            .filter(|a| a.value.is_finite() && a.value >= self.materiality_threshold)
            .collect();
        let dropped = before - material.len();
        if dropped > 0 {
            debug!("Dropped {} dust holdings below {}", dropped, self.materiality_threshold);
        }
        (material, dropped)
    }

    /// Replace the crypto/defi partition of `existing` with `fresh`.
    ///
    /// Non-synced assets keep their relative order and come first; fresh assets
    /// follow in the order given. Anything non-synced in `fresh` is ignored.
    pub fn merge_synced_assets(
        &self,
        existing: &[Asset],
        fresh: Vec<Asset>,
    ) -> (Vec<Asset>, MergeOutcome) {
        let (synced, manual): (Vec<&Asset>, Vec<&Asset>) =
            existing.iter().partition(|a| a.is_synced());

        let fresh: Vec<Asset> = fresh.into_iter().filter(|a| a.is_synced()).collect();

        let outcome = MergeOutcome {
            kept_manual: manual.len(),
            replaced: synced.len(),
            inserted: fresh.len(),
        };

        let mut merged: Vec<Asset> = manual.into_iter().cloned().collect();
        merged.extend(fresh);

        (merged, outcome)
    }

    /// Remove every crypto/defi asset owned by `address`.
    ///
    /// Assets without a wallet address are not attributable to any wallet and
    /// are always kept. Returns the remaining assets and the removed count.
    pub fn remove_assets_for_wallet(
        &self,
        existing: &[Asset],
        address: &str,
    ) -> (Vec<Asset>, usize) {
        let remaining: Vec<Asset> = existing
            .iter()
            .filter(|a| !(a.is_synced() && a.wallet_address() == Some(address)))
            .cloned()
            .collect();
        let removed = existing.len() - remaining.len();
        (remaining, removed)
    }
}

impl Default for AssetReconciler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{AssetDetails, CryptoHolding, DefiPosition};

    fn crypto(symbol: &str, value: f64, wallet: Option<&str>) -> Asset {
        Asset::new(
            symbol,
            value,
            0.0,
            AssetDetails::Crypto(CryptoHolding {
                token_id: format!("{}-mint", symbol),
                quantity: 1.0,
                staked: false,
                wallet_address: wallet.map(str::to_string),
                symbol: symbol.to_string(),
                decimals: 6,
            }),
        )
    }

    fn defi(protocol: &str, wallet: &str) -> Asset {
        Asset::new(
            protocol,
            500.0,
            25.0,
            AssetDetails::Defi(DefiPosition {
                protocol: protocol.to_string(),
                wallet_address: Some(wallet.to_string()),
                symbol: "LP".to_string(),
                quantity: 10.0,
            }),
        )
    }

    fn house() -> Asset {
        Asset::new(
            "House",
            300_000.0,
            0.0,
            AssetDetails::RealEstate {
                address: "1 Main".to_string(),
                monthly_rent: 0.0,
            },
        )
    }

    fn names(assets: &[Asset]) -> Vec<&str> {
        assets.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_merge_replaces_synced_partition() {
        let reconciler = AssetReconciler::new();
        let existing = vec![
            crypto("SOL", 100.0, Some("W1")),
            house(),
            crypto("USDC", 5000.0, Some("W1")),
        ];

        let fresh = vec![crypto("SOL", 120.0, Some("W1"))];
        let (merged, outcome) = reconciler.merge_synced_assets(&existing, fresh);

        assert_eq!(names(&merged), vec!["House", "SOL"]);
        assert_eq!(merged[1].value, 120.0);
        assert_eq!(
            outcome,
            MergeOutcome {
                kept_manual: 1,
                replaced: 2,
                inserted: 1
            }
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let reconciler = AssetReconciler::new();
        let fresh = vec![crypto("SOL", 100.0, Some("W1")), crypto("USDC", 50.0, Some("W2"))];

        let (first, _) = reconciler.merge_synced_assets(&[house()], fresh.clone());
        let (second, _) = reconciler.merge_synced_assets(&first, fresh);

        assert_eq!(first, second);
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn test_merge_ignores_non_synced_input() {
        let reconciler = AssetReconciler::new();
        let (merged, outcome) = reconciler.merge_synced_assets(&[], vec![house()]);
        assert!(merged.is_empty());
        assert_eq!(outcome.inserted, 0);
    }

    #[test]
    fn test_remove_assets_for_wallet() {
        let reconciler = AssetReconciler::new();
        let existing = vec![
            crypto("SOL", 100.0, Some("W1")),
            crypto("BONK", 20.0, Some("W2")),
            defi("Orca", "W1"),
            crypto("Manual BTC", 900.0, None),
            house(),
        ];

        let (remaining, removed) = reconciler.remove_assets_for_wallet(&existing, "W1");

        assert_eq!(removed, 2);
        assert_eq!(names(&remaining), vec!["BONK", "Manual BTC", "House"]);
    }

    #[test]
    fn test_remove_for_unknown_wallet_is_noop() {
        let reconciler = AssetReconciler::new();
        let existing = vec![crypto("SOL", 100.0, Some("W1")), house()];
        let (remaining, removed) = reconciler.remove_assets_for_wallet(&existing, "W9");
        assert_eq!(removed, 0);
        assert_eq!(remaining, existing);
    }

    #[test]
    fn test_filter_material_drops_dust() {
        let reconciler = AssetReconciler::with_threshold(1.0);
        let (material, dropped) = reconciler.filter_material(vec![
            crypto("SOL", 100.0, Some("W1")),
            crypto("DUST", 0.2, Some("W1")),
            crypto("EDGE", 1.0, Some("W1")),
        ]);

        assert_eq!(dropped, 1);
        assert_eq!(names(&material), vec!["SOL", "EDGE"]);
    }
}
