// 🗄️ Profile Store - single source of truth for the user's financial profile
//
// Owns the in-memory snapshot. Every entity change goes through one of the
// operations below, which:
//   1. enforce cross-entity invariants (primary income account, wallet set)
//   2. persist the new snapshot through the injected collaborator
//   3. append an audit event
//
// A failed persistence write is logged and remembered but does NOT roll back
// the in-memory change: for the rest of the session memory is the truth.

use crate::backup;
use crate::config::TrackerConfig;
use crate::entities::{
    Asset, BankAccount, BankAccountPatch, Debt, Desire, IncomeSource, Obligation, Settings,
};
use crate::error::{Result, TrackerError};
use crate::freedom::{FreedomCalculator, FreedomReport};
use crate::persistence::{SnapshotPersistence, StoreEvent};
use crate::reconciliation::AssetReconciler;
use crate::snapshot::ProfileSnapshot;
use crate::sync::{PriceTable, WalletDataProvider, WalletSynchronizer};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

// ============================================================================
// OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletConnection {
    Connected,
    /// Benign duplicate: nothing changed
    AlreadyConnected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub wallets: usize,

    /// Synced holdings now in the asset list
    pub assets_merged: usize,

    /// Holdings dropped below the materiality threshold
    pub dust_dropped: usize,

    /// Previously synced holdings replaced by this merge
    pub replaced: usize,
}

// ============================================================================
// PROFILE STORE
// ============================================================================

pub struct ProfileStore {
    snapshot: ProfileSnapshot,
    persistence: Box<dyn SnapshotPersistence>,
    config: TrackerConfig,
    reconciler: AssetReconciler,
    persistence_failures: usize,
    last_persistence_error: Option<String>,
}

impl ProfileStore {
    /// Open the store from persistence; an empty profile on first run
    pub fn open(persistence: Box<dyn SnapshotPersistence>, config: TrackerConfig) -> Result<Self> {
        let mut snapshot = persistence
            .load()
            .map_err(|e| TrackerError::Persistence(format!("failed to load profile: {:#}", e)))?
            .unwrap_or_default();

        if snapshot.normalize_primary() {
            warn!("Stored profile had several primary income accounts; kept the first");
        }

        info!(
            "Profile loaded: {} accounts, {} assets, {} wallets",
            snapshot.bank_accounts.len(),
            snapshot.assets.len(),
            snapshot.wallets.len()
        );

        let reconciler = AssetReconciler::with_threshold(config.sync.materiality_threshold);

        Ok(ProfileStore {
            snapshot,
            persistence,
            config,
            reconciler,
            persistence_failures: 0,
            last_persistence_error: None,
        })
    }

    // ========================================================================
    // READS
    // ========================================================================

    pub fn snapshot(&self) -> &ProfileSnapshot {
        &self.snapshot
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn bank_accounts(&self) -> &[BankAccount] {
        &self.snapshot.bank_accounts
    }

    pub fn assets(&self) -> &[Asset] {
        &self.snapshot.assets
    }

    pub fn wallets(&self) -> &[String] {
        &self.snapshot.wallets
    }

    /// Explicit lookup: fails loudly when missing
    pub fn bank_account(&self, id: &str) -> Result<&BankAccount> {
        self.snapshot
            .bank_accounts
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| TrackerError::not_found("BankAccount", id))
    }

    pub fn primary_account(&self) -> Option<&BankAccount> {
        self.snapshot.primary_account()
    }

    /// Follow a foreign account reference; dangling or absent = unlinked (None)
    pub fn resolve_account(&self, account_id: Option<&str>) -> Option<&BankAccount> {
        let id = account_id?;
        self.snapshot.bank_accounts.iter().find(|a| a.id == id)
    }

    pub fn freedom_report(&self) -> FreedomReport {
        FreedomCalculator::with_policy(self.config.freedom.clone()).calculate(&self.snapshot)
    }

    pub fn persistence_failures(&self) -> usize {
        self.persistence_failures
    }

    pub fn last_persistence_error(&self) -> Option<&str> {
        self.last_persistence_error.as_deref()
    }

    // ========================================================================
    // BANK ACCOUNTS
    // ========================================================================

    /// Add an account. The very first account always becomes primary; an
    /// account requesting primary takes the flag from every other account.
    pub fn add_bank_account(&mut self, account: BankAccount) -> Result<BankAccount> {
        account.validate()?;

        if self.snapshot.bank_accounts.iter().any(|a| a.id == account.id) {
            return Err(TrackerError::Duplicate {
                entity: "BankAccount",
                id: account.id,
            });
        }

        let becomes_primary = self.snapshot.bank_accounts.is_empty() || account.is_primary_income;
        let id = account.id.clone();

        let mut account = account;
        account.is_primary_income = false;
        self.snapshot.bank_accounts.push(account);

        if becomes_primary {
            self.assert_primary(&id);
        }

        let stored = self.bank_account(&id)?.clone();
        debug!("Added bank account {} (primary: {})", stored.name, stored.is_primary_income);
        self.commit(StoreEvent::new(
            "bank_account_added",
            "bank_account",
            &id,
            json!({ "name": stored.name, "primary": stored.is_primary_income }),
        ));
        Ok(stored)
    }

    /// Merge fields into an account. Unknown id: silent no-op (returns false).
    pub fn update_bank_account(&mut self, id: &str, patch: BankAccountPatch) -> Result<bool> {
        let Some(account) = self.snapshot.bank_accounts.iter_mut().find(|a| a.id == id) else {
            debug!("update_bank_account: {} not found, ignoring", id);
            return Ok(false);
        };

        let mut candidate = account.clone();
        candidate.apply(&patch);
        candidate.validate()?;
        *account = candidate;

        match patch.is_primary_income {
            Some(true) => self.assert_primary(id),
            Some(false) => {
                if let Some(account) = self.snapshot.bank_accounts.iter_mut().find(|a| a.id == id) {
                    account.is_primary_income = false;
                }
            }
            None => {}
        }

        self.commit(StoreEvent::new(
            "bank_account_updated",
            "bank_account",
            id,
            serde_json::to_value(&patch).unwrap_or_default(),
        ));
        Ok(true)
    }

    /// Remove an account. Income sources and obligations pointing at it are
    /// left alone; their references simply become unlinked.
    pub fn remove_bank_account(&mut self, id: &str) -> Result<BankAccount> {
        let index = self
            .snapshot
            .bank_accounts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| TrackerError::not_found("BankAccount", id))?;

        let removed = self.snapshot.bank_accounts.remove(index);
        debug!("Removed bank account {}", removed.name);
        self.commit(StoreEvent::new(
            "bank_account_removed",
            "bank_account",
            id,
            json!({ "name": removed.name, "was_primary": removed.is_primary_income }),
        ));
        Ok(removed)
    }

    /// Make `id` the primary income account
    pub fn set_primary(&mut self, id: &str) -> Result<()> {
        let account = self.bank_account(id)?;
        if account.is_primary_income {
            return Ok(());
        }

        self.assert_primary(id);
        self.commit(StoreEvent::new("primary_account_set", "bank_account", id, json!({})));
        Ok(())
    }

    /// The one place the primary flag is written to true: clear everyone
    /// else, then flag `id`.
    fn assert_primary(&mut self, id: &str) {
        for account in self.snapshot.bank_accounts.iter_mut() {
            account.is_primary_income = account.id == id;
        }
    }

    // ========================================================================
    // WALLETS
    // ========================================================================

    pub fn connect_wallet(&mut self, address: &str) -> Result<WalletConnection> {
        let address = address.trim();
        self.validate_address(address)?;

        if self.snapshot.wallets.iter().any(|w| w == address) {
            info!("Wallet {} already connected", address);
            return Ok(WalletConnection::AlreadyConnected);
        }

        self.snapshot.wallets.push(address.to_string());
        self.commit(StoreEvent::new("wallet_connected", "wallet", address, json!({})));
        Ok(WalletConnection::Connected)
    }

    /// Forget a wallet and every synced asset it produced. Returns the number
    /// of assets removed.
    pub fn disconnect_wallet(&mut self, address: &str) -> Result<usize> {
        let address = address.trim();
        let before = self.snapshot.wallets.len();
        self.snapshot.wallets.retain(|w| w != address);
        let was_connected = self.snapshot.wallets.len() != before;

        let (remaining, removed) = self
            .reconciler
            .remove_assets_for_wallet(&self.snapshot.assets, address);

        if !was_connected && removed == 0 {
            debug!("disconnect_wallet: {} not connected, nothing to do", address);
            return Ok(0);
        }

        self.snapshot.assets = remaining;
        self.commit(StoreEvent::new(
            "wallet_disconnected",
            "wallet",
            address,
            json!({ "assets_removed": removed }),
        ));
        Ok(removed)
    }

    fn validate_address(&self, address: &str) -> Result<()> {
        let bounds = &self.config.wallet;
        let len = address.chars().count();
        if len < bounds.min_address_len || len > bounds.max_address_len {
            return Err(TrackerError::Validation(format!(
                "wallet address must be {}-{} characters (got {})",
                bounds.min_address_len, bounds.max_address_len, len
            )));
        }
        if let Some(bad) = address.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
            return Err(TrackerError::Validation(format!(
                "wallet address contains invalid character '{}'",
                bad
            )));
        }
        Ok(())
    }

    // ========================================================================
    // ASSET RECONCILIATION
    // ========================================================================

    /// Replace every crypto/defi asset with `fresh` in one update. Dust below
    /// the materiality threshold and holdings with non-finite numbers are
    /// dropped first.
    pub fn merge_synced_assets(&mut self, fresh: Vec<Asset>) -> SyncSummary {
        let (material, dust_dropped) = self.reconciler.filter_material(fresh);
        let material: Vec<Asset> = material
            .into_iter()
            .filter(|asset| match asset.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!("Dropping synced holding {}: {}", asset.name, e);
                    false
                }
            })
            .collect();
        let (merged, outcome) = self
            .reconciler
            .merge_synced_assets(&self.snapshot.assets, material);

        self.snapshot.assets = merged;
        self.commit(StoreEvent::new(
            "synced_assets_merged",
            "asset",
            "synced",
            json!({
                "replaced": outcome.replaced,
                "inserted": outcome.inserted,
                "dust_dropped": dust_dropped,
            }),
        ));

        SyncSummary {
            wallets: 0,
            assets_merged: outcome.inserted,
            dust_dropped,
            replaced: outcome.replaced,
        }
    }

    pub fn remove_assets_for_wallet(&mut self, address: &str) -> usize {
        let (remaining, removed) = self
            .reconciler
            .remove_assets_for_wallet(&self.snapshot.assets, address);
        if removed > 0 {
            self.snapshot.assets = remaining;
            self.commit(StoreEvent::new(
                "wallet_assets_removed",
                "wallet",
                address,
                json!({ "assets_removed": removed }),
            ));
        }
        removed
    }

    /// Sync all connected wallets and merge the result. On any wallet failure
    /// the store is left exactly as it was.
    pub async fn sync_wallets(
        &mut self,
        provider: &dyn WalletDataProvider,
        prices: &PriceTable,
    ) -> Result<SyncSummary> {
        let wallets = self.snapshot.wallets.clone();
        let synchronizer = WalletSynchronizer::new(provider, prices)
            .with_native_token(self.config.sync.native_token_id.clone());

        let fresh = synchronizer.sync_all(&wallets).await.map_err(|e| {
            error!("Wallet sync failed, store unchanged: {}", e);
            e
        })?;

        let mut summary = self.merge_synced_assets(fresh);
        summary.wallets = wallets.len();
        info!(
            "Sync merged {} holdings from {} wallets ({} dust dropped)",
            summary.assets_merged, summary.wallets, summary.dust_dropped
        );
        Ok(summary)
    }

    // ========================================================================
    // MANUAL ASSETS
    // ========================================================================

    pub fn add_asset(&mut self, asset: Asset) -> Result<()> {
        asset.validate()?;
        if self.snapshot.assets.iter().any(|a| a.id == asset.id) {
            return Err(TrackerError::Duplicate {
                entity: "Asset",
                id: asset.id,
            });
        }

        let event = StoreEvent::new(
            "asset_added",
            "asset",
            &asset.id,
            json!({ "name": asset.name, "category": asset.category().as_str() }),
        );
        self.snapshot.assets.push(asset);
        self.commit(event);
        Ok(())
    }

    pub fn update_asset_value(&mut self, id: &str, value: f64, annual_income: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 || !annual_income.is_finite() || annual_income < 0.0 {
            return Err(TrackerError::Validation(
                "asset value and income must be finite and >= 0".into(),
            ));
        }
        let asset = self
            .snapshot
            .assets
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| TrackerError::not_found("Asset", id))?;
        asset.value = value;
        asset.annual_income = annual_income;

        self.commit(StoreEvent::new(
            "asset_updated",
            "asset",
            id,
            json!({ "value": value, "annual_income": annual_income }),
        ));
        Ok(())
    }

    pub fn remove_asset(&mut self, id: &str) -> Result<Asset> {
        let index = self
            .snapshot
            .assets
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| TrackerError::not_found("Asset", id))?;
        let removed = self.snapshot.assets.remove(index);
        self.commit(StoreEvent::new(
            "asset_removed",
            "asset",
            id,
            json!({ "name": removed.name }),
        ));
        Ok(removed)
    }

    // ========================================================================
    // INCOME / OBLIGATIONS / DEBTS / DESIRES / SETTINGS
    // ========================================================================

    pub fn set_salary(&mut self, salary: f64) -> Result<()> {
        if !salary.is_finite() || salary < 0.0 {
            return Err(TrackerError::Validation("salary must be >= 0".into()));
        }
        self.snapshot.income.salary = salary;
        self.commit(StoreEvent::new(
            "salary_set",
            "income",
            "salary",
            json!({ "salary": salary }),
        ));
        Ok(())
    }

    pub fn add_income_source(&mut self, source: IncomeSource) -> Result<()> {
        source.validate()?;
        let event = StoreEvent::new(
            "income_source_added",
            "income",
            &source.id,
            json!({ "name": source.name }),
        );
        self.snapshot.income.other_sources.push(source);
        self.commit(event);
        Ok(())
    }

    pub fn remove_income_source(&mut self, id: &str) -> Result<IncomeSource> {
        let sources = &mut self.snapshot.income.other_sources;
        let index = sources
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| TrackerError::not_found("IncomeSource", id))?;
        let removed = sources.remove(index);
        self.commit(StoreEvent::new("income_source_removed", "income", id, json!({})));
        Ok(removed)
    }

    pub fn add_obligation(&mut self, obligation: Obligation) -> Result<()> {
        obligation.validate()?;
        let event = StoreEvent::new(
            "obligation_added",
            "obligation",
            &obligation.id,
            json!({ "name": obligation.name }),
        );
        self.snapshot.obligations.push(obligation);
        self.commit(event);
        Ok(())
    }

    pub fn remove_obligation(&mut self, id: &str) -> Result<Obligation> {
        let index = self
            .snapshot
            .obligations
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| TrackerError::not_found("Obligation", id))?;
        let removed = self.snapshot.obligations.remove(index);
        self.commit(StoreEvent::new("obligation_removed", "obligation", id, json!({})));
        Ok(removed)
    }

    pub fn add_debt(&mut self, debt: Debt) -> Result<()> {
        debt.validate()?;
        let event = StoreEvent::new(
            "debt_added",
            "debt",
            &debt.id,
            json!({ "name": debt.name, "balance": debt.balance }),
        );
        self.snapshot.debts.push(debt);
        self.commit(event);
        Ok(())
    }

    pub fn remove_debt(&mut self, id: &str) -> Result<Debt> {
        let index = self
            .snapshot
            .debts
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| TrackerError::not_found("Debt", id))?;
        let removed = self.snapshot.debts.remove(index);
        self.commit(StoreEvent::new("debt_removed", "debt", id, json!({})));
        Ok(removed)
    }

    pub fn add_desire(&mut self, desire: Desire) -> Result<()> {
        desire.validate()?;
        let event = StoreEvent::new(
            "desire_added",
            "desire",
            &desire.id,
            json!({ "name": desire.name }),
        );
        self.snapshot.desires.push(desire);
        self.commit(event);
        Ok(())
    }

    pub fn remove_desire(&mut self, id: &str) -> Result<Desire> {
        let index = self
            .snapshot
            .desires
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| TrackerError::not_found("Desire", id))?;
        let removed = self.snapshot.desires.remove(index);
        self.commit(StoreEvent::new("desire_removed", "desire", id, json!({})));
        Ok(removed)
    }

    pub fn update_settings<F>(&mut self, update_fn: F)
    where
        F: FnOnce(&mut Settings),
    {
        update_fn(&mut self.snapshot.settings);
        self.commit(StoreEvent::new("settings_updated", "settings", "settings", json!({})));
    }

    // ========================================================================
    // WHOLESALE: EXPORT / IMPORT / RESET / RESTORE
    // ========================================================================

    pub fn export_backup(&self) -> Result<String> {
        backup::export_backup(&self.snapshot)
    }

    /// Replace the whole profile from backup text. Malformed text leaves the
    /// current profile untouched.
    pub fn import_backup(&mut self, text: &str) -> Result<()> {
        let snapshot = backup::import_backup(text)?;
        self.replace_snapshot(snapshot, "backup_imported");
        Ok(())
    }

    /// Irreversibly return to the empty default profile
    pub fn reset_store(&mut self) {
        self.replace_snapshot(ProfileSnapshot::default(), "store_reset");
    }

    /// Wholesale replacement (used by import and encrypted restore)
    pub fn restore_snapshot(&mut self, snapshot: ProfileSnapshot) {
        self.replace_snapshot(snapshot, "backup_restored");
    }

    fn replace_snapshot(&mut self, mut snapshot: ProfileSnapshot, event_type: &str) {
        if snapshot.normalize_primary() {
            warn!("Incoming profile had several primary income accounts; kept the first");
        }
        info!(
            "{}: {} accounts, {} assets, {} wallets",
            event_type,
            snapshot.bank_accounts.len(),
            snapshot.assets.len(),
            snapshot.wallets.len()
        );
        self.snapshot = snapshot;
        self.commit(StoreEvent::new(event_type, "profile", "profile", json!({})));
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    fn commit(&mut self, event: StoreEvent) {
        if let Err(e) = self.persistence.save(&self.snapshot) {
            self.persistence_failures += 1;
            self.last_persistence_error = Some(format!("{:#}", e));
            error!("Failed to persist profile after {}: {:#}", event.event_type, e);
            return;
        }
        self.last_persistence_error = None;

        if let Err(e) = self.persistence.record_event(&event) {
            warn!("Failed to record audit event {}: {:#}", event.event_type, e);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
