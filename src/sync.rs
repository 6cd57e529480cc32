// 🔄 Wallet Sync - turn on-chain token accounts into priced assets
//
// Fan-out: every connected wallet is queried independently and in parallel.
// Fan-in:  results are concatenated in wallet-list order only after ALL
//          wallets answered. One failing wallet aborts the whole cycle, so a
//          partial picture is never merged.

use crate::entities::{Asset, AssetDetails, CryptoHolding};
use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

pub const NATIVE_SOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";
pub const BONK_MINT: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
pub const JITOSOL_MINT: &str = "J1toso1uCk3RLmjorhTtrVwY9HJ7X8V9yYac6Y7kGCPn";
pub const MSOL_MINT: &str = "mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So";

// ============================================================================
// DATA PROVIDER
// ============================================================================

/// Raw token account as returned by the chain data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAccountRecord {
    pub token_id: String,

    /// Integer amount in base units
    pub raw_amount: u64,

    pub decimals: u8,

    /// Provider reports the position as staked/delegated
    #[serde(default)]
    pub staked: bool,
}

impl TokenAccountRecord {
    pub fn ui_amount(&self) -> f64 {
        self.raw_amount as f64 / 10f64.powi(self.decimals as i32)
    }
}

#[async_trait]
pub trait WalletDataProvider: Send + Sync {
    /// All token accounts owned by `address`
    async fn token_accounts(&self, address: &str) -> anyhow::Result<Vec<TokenAccountRecord>>;

    /// Native balance in base units (lamports for SOL)
    async fn native_balance(&self, address: &str) -> anyhow::Result<u64>;
}

/// Provider backed by fixed per-wallet data
#[derive(Debug, Clone, Default)]
pub struct StaticWalletProvider {
    wallets: HashMap<String, (u64, Vec<TokenAccountRecord>)>,
}

impl StaticWalletProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallet(
        mut self,
        address: &str,
        native: u64,
        tokens: Vec<TokenAccountRecord>,
    ) -> Self {
        self.wallets.insert(address.to_string(), (native, tokens));
        self
    }
}

#[async_trait]
impl WalletDataProvider for StaticWalletProvider {
    async fn token_accounts(&self, address: &str) -> anyhow::Result<Vec<TokenAccountRecord>> {
        self.wallets
            .get(address)
            .map(|(_, tokens)| tokens.clone())
            .ok_or_else(|| anyhow::anyhow!("unknown wallet {}", address))
    }

    async fn native_balance(&self, address: &str) -> anyhow::Result<u64> {
        self.wallets
            .get(address)
            .map(|(native, _)| *native)
            .ok_or_else(|| anyhow::anyhow!("unknown wallet {}", address))
    }
}

// ============================================================================
// PRICE TABLE (static lookup, no live feed)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub symbol: String,
    pub name: String,
    pub unit_price: f64,
    pub decimals: u8,

    /// Yield earned by staked positions of this token (0.07 = 7%)
    #[serde(default)]
    pub staking_apy: f64,

    /// Holding the token IS a staked position (liquid staking tokens)
    #[serde(default)]
    pub liquid_staking: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    entries: HashMap<String, PriceEntry>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Well-known Solana mints with placeholder prices
    pub fn solana_defaults() -> Self {
        let mut table = Self::new();
        table.insert(
            NATIVE_SOL_MINT,
            PriceEntry::new("SOL", "Solana", 100.0, 9).with_staking(0.065, false),
        );
        table.insert(USDC_MINT, PriceEntry::new("USDC", "USD Coin", 1.0, 6));
        table.insert(USDT_MINT, PriceEntry::new("USDT", "Tether USD", 1.0, 6));
        table.insert(BONK_MINT, PriceEntry::new("BONK", "Bonk", 0.0002, 5));
        table.insert(
            JITOSOL_MINT,
            PriceEntry::new("JitoSOL", "Jito Staked SOL", 110.0, 9).with_staking(0.075, true),
        );
        table.insert(
            MSOL_MINT,
            PriceEntry::new("mSOL", "Marinade Staked SOL", 115.0, 9).with_staking(0.07, true),
        );
        table
    }

    pub fn insert(&mut self, token_id: &str, entry: PriceEntry) {
        self.entries.insert(token_id.to_string(), entry);
    }

    pub fn get(&self, token_id: &str) -> Option<&PriceEntry> {
        self.entries.get(token_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PriceEntry {
    pub fn new(symbol: &str, name: &str, unit_price: f64, decimals: u8) -> Self {
        PriceEntry {
            symbol: symbol.to_string(),
            name: name.to_string(),
            unit_price,
            decimals,
            staking_apy: 0.0,
            liquid_staking: false,
        }
    }

    pub fn with_staking(mut self, staking_apy: f64, liquid_staking: bool) -> Self {
        self.staking_apy = staking_apy;
        self.liquid_staking = liquid_staking;
        self
    }
}

// ============================================================================
// SYNCHRONIZER
// ============================================================================

pub struct WalletSynchronizer<'a> {
    provider: &'a dyn WalletDataProvider,
    prices: &'a PriceTable,
    native_token_id: String,
}

impl<'a> WalletSynchronizer<'a> {
    pub fn new(provider: &'a dyn WalletDataProvider, prices: &'a PriceTable) -> Self {
        WalletSynchronizer {
            provider,
            prices,
            native_token_id: NATIVE_SOL_MINT.to_string(),
        }
    }

    pub fn with_native_token(mut self, native_token_id: impl Into<String>) -> Self {
        self.native_token_id = native_token_id.into();
        self
    }

    /// Sync every wallet in parallel; all-or-nothing.
    pub async fn sync_all(&self, wallets: &[String]) -> Result<Vec<Asset>> {
        let per_wallet = try_join_all(wallets.iter().map(|w| self.sync_wallet(w))).await?;

        for (wallet, assets) in wallets.iter().zip(per_wallet.iter()) {
            debug!("Wallet {} produced {} priced holdings", wallet, assets.len());
        }

        let assets: Vec<Asset> = per_wallet.into_iter().flatten().collect();
        info!("Synced {} wallets → {} holdings", wallets.len(), assets.len());
        Ok(assets)
    }

    /// Priced holdings for a single wallet. Unknown tokens are skipped.
    pub async fn sync_wallet(&self, address: &str) -> Result<Vec<Asset>> {
        let (native, tokens) = futures::try_join!(
            self.provider.native_balance(address),
            self.provider.token_accounts(address),
        )
        .map_err(|e| TrackerError::external(address, e))?;

        let mut records = Vec::with_capacity(tokens.len() + 1);
        if native > 0 {
            let decimals = self
                .prices
                .get(&self.native_token_id)
                .map(|p| p.decimals)
                .unwrap_or(9);
            records.push(TokenAccountRecord {
                token_id: self.native_token_id.clone(),
                raw_amount: native,
                decimals,
                staked: false,
            });
        }
        records.extend(tokens);

        Ok(self.price_records(address, records))
    }

    /// Aggregate per (token, staked) and price against the table, first-seen order
    fn price_records(&self, address: &str, records: Vec<TokenAccountRecord>) -> Vec<Asset> {
        let mut order: Vec<(String, bool)> = Vec::new();
        let mut quantities: HashMap<(String, bool), (f64, u8)> = HashMap::new();

        for record in records {
            if self.prices.get(&record.token_id).is_none() {
                debug!("Skipping unpriced token {} in {}", record.token_id, address);
                continue;
            }
            let key = (record.token_id.clone(), record.staked);
            let entry = quantities.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                (0.0, record.decimals)
            });
            entry.0 += record.ui_amount();
        }

        order
            .into_iter()
            .filter_map(|key| {
                let (quantity, decimals) = quantities.get(&key).copied()?;
                let price = self.prices.get(&key.0)?;
                let (token_id, staked_account) = key;
                let staked = staked_account || price.liquid_staking;
                let value = quantity * price.unit_price;
                let annual_income = if staked { value * price.staking_apy } else { 0.0 };
                let name = if staked_account {
                    format!("{} (staked)", price.name)
                } else {
                    price.name.clone()
                };

                let mut asset = Asset::new(
                    name,
                    value,
                    annual_income,
                    AssetDetails::Crypto(CryptoHolding {
                        token_id: token_id.clone(),
                        quantity,
                        staked,
                        wallet_address: Some(address.to_string()),
                        symbol: price.symbol.clone(),
                        decimals,
                    }),
                );
                asset.id = format!(
                    "crypto:{}:{}{}",
                    address,
                    token_id,
                    if staked_account { ":staked" } else { "" }
                );
                Some(asset)
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
