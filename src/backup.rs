// 📦 Backup Codec - portable, versioned text form of a whole profile
//
// {
//   "version": 1,
//   "timestamp": "2026-10-19T12:00:00Z",
//   "app": "freedom-tracker",
//   "data": { ...ProfileSnapshot... }
// }
//
// Import is strict about the envelope (well-formed JSON, a version tag, a
// data object) and lenient about the contents: unknown fields are ignored and
// missing collections default to empty, so older and newer exports both load.

use crate::error::{Result, TrackerError};
use crate::snapshot::{ProfileSnapshot, SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

pub const APP_TAG: &str = "freedom-tracker";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupDocument {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub app: String,
    pub data: ProfileSnapshot,
}

impl BackupDocument {
    pub fn new(snapshot: ProfileSnapshot) -> Self {
        BackupDocument {
            version: SCHEMA_VERSION,
            timestamp: Utc::now(),
            app: APP_TAG.to_string(),
            data: snapshot,
        }
    }
}

/// Serialize a snapshot with version tag and timestamp
pub fn export_backup(snapshot: &ProfileSnapshot) -> Result<String> {
    let document = BackupDocument::new(snapshot.clone());
    serde_json::to_string_pretty(&document)
        .map_err(|e| TrackerError::Validation(format!("snapshot is not serializable: {}", e)))
}

/// Parse and validate a backup document
pub fn parse_backup(text: &str) -> Result<BackupDocument> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| TrackerError::MalformedBackup(format!("not valid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| TrackerError::MalformedBackup("top level must be an object".into()))?;

    let version = match object.get("version") {
        None => return Err(TrackerError::MalformedBackup("missing version tag".into())),
        Some(v) => v
            .as_u64()
            .filter(|v| *v >= 1 && *v <= u32::MAX as u64)
            .ok_or_else(|| {
                TrackerError::MalformedBackup(format!("invalid version tag: {}", v))
            })? as u32,
    };

    let data = object
        .get("data")
        .ok_or_else(|| TrackerError::MalformedBackup("missing data section".into()))?;
    if !data.is_object() {
        return Err(TrackerError::MalformedBackup("data section must be an object".into()));
    }

    if version > SCHEMA_VERSION {
        warn!(
            "Backup written by newer schema v{} (current v{}); unknown fields are ignored",
            version, SCHEMA_VERSION
        );
    }

    let snapshot: ProfileSnapshot = serde_json::from_value(data.clone())
        .map_err(|e| TrackerError::MalformedBackup(format!("invalid profile data: {}", e)))?;

    // Older exports may lack a timestamp; it is informational only
    let timestamp = object
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let app = object
        .get("app")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(BackupDocument {
        version,
        timestamp,
        app,
        data: snapshot,
    })
}

/// Parse a backup and return only the profile
pub fn import_backup(text: &str) -> Result<ProfileSnapshot> {
    parse_backup(text).map(|doc| doc.data)
}

pub fn export_to_path(snapshot: &ProfileSnapshot, path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;
    let text = export_backup(snapshot)?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write backup to {}", path.display()))
}

pub fn import_from_path(path: &Path) -> anyhow::Result<ProfileSnapshot> {
    use anyhow::Context;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read backup from {}", path.display()))?;
    Ok(import_backup(&text)?)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        Asset, AssetDetails, BankAccount, BankAccountType, CryptoHolding, Debt, Frequency,
        IncomeSource, Obligation,
    };

    fn rich_snapshot() -> ProfileSnapshot {
        let mut snapshot = ProfileSnapshot::default();
        let checking =
            BankAccount::new("Chase Checking", "Chase", BankAccountType::Checking, 1000.0)
                .with_primary(true);
        snapshot.income.salary = 85_000.0;
        snapshot
            .income
            .other_sources
            .push(
                IncomeSource::new("Freelance", 400.0, Frequency::Monthly).linked_to(&checking.id),
            );
        snapshot.bank_accounts.push(checking);
        snapshot.assets.push(Asset::new(
            "Solana",
            120.0,
            7.8,
            AssetDetails::Crypto(CryptoHolding {
                token_id: crate::sync::NATIVE_SOL_MINT.to_string(),
                quantity: 1.2,
                staked: true,
                wallet_address: Some("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".to_string()),
                symbol: "SOL".to_string(),
                decimals: 9,
            }),
        ));
        snapshot
            .obligations
            .push(Obligation::new("Rent", 1_800.0, Frequency::Monthly));
        snapshot.debts.push(Debt::new("Visa", 2_500.0, 21.9, 75.0));
        snapshot.wallets.push("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".to_string());
        snapshot.settings.hide_balances = true;
        snapshot
    }

    #[test]
    fn test_export_import_roundtrip() {
        let snapshot = rich_snapshot();
        let text = export_backup(&snapshot).unwrap();

        let document = parse_backup(&text).unwrap();
        assert_eq!(document.version, SCHEMA_VERSION);
        assert_eq!(document.app, APP_TAG);
        assert_eq!(document.data, snapshot);
    }

    #[test]
    fn test_rejects_non_json_and_truncated_text() {
        let text = export_backup(&rich_snapshot()).unwrap();
        let truncated = &text[..text.len() / 2];

        assert!(matches!(import_backup(truncated), Err(TrackerError::MalformedBackup(_))));
        assert!(matches!(import_backup("hello"), Err(TrackerError::MalformedBackup(_))));
        assert!(matches!(import_backup("[1,2,3]"), Err(TrackerError::MalformedBackup(_))));
    }

    #[test]
    fn test_rejects_missing_version_or_data() {
        let err = import_backup(r#"{"timestamp":"2025-01-01T00:00:00Z","data":{}}"#).unwrap_err();
        assert!(err.to_string().contains("missing version"));

        let err = import_backup(r#"{"version":1}"#).unwrap_err();
        assert!(err.to_string().contains("missing data"));

        let err = import_backup(r#"{"version":"one","data":{}}"#).unwrap_err();
        assert!(matches!(err, TrackerError::MalformedBackup(_)));

        let err = import_backup(r#"{"version":0,"data":{}}"#).unwrap_err();
        assert!(matches!(err, TrackerError::MalformedBackup(_)));
    }

    #[test]
    fn test_tolerates_old_and_new_documents() {
        // Older export: no timestamp, only bank accounts
        let old = r#"{
            "version": 1,
            "data": {
                "bank_accounts": [{
                    "id": "acc-1",
                    "name": "Chase",
                    "institution": "Chase",
                    "account_type": "checking",
                    "balance": 10.5,
                    "created_at": "2024-01-01T00:00:00Z"
                }]
            }
        }"#;
        let snapshot = import_backup(old).unwrap();
        assert_eq!(snapshot.bank_accounts.len(), 1);
        assert!(!snapshot.bank_accounts[0].is_primary_income);
        assert!(snapshot.assets.is_empty());
        assert!(snapshot.wallets.is_empty());

        // Newer export: unknown fields everywhere
        let new = r#"{
            "version": 7,
            "timestamp": "2030-01-01T00:00:00Z",
            "sync_state": {"cursor": 9},
            "data": {"wallets": [], "goals": [{"name": "Retire"}]}
        }"#;
        let document = parse_backup(new).unwrap();
        assert_eq!(document.version, 7);
        assert!(document.data.is_empty());
    }

    #[test]
    fn test_unknown_enum_values_do_not_fail_import() {
        let newer = r#"{
            "version": 2,
            "data": {
                "bank_accounts": [{
                    "id": "acc-1",
                    "name": "Credit Union",
                    "institution": "Local CU",
                    "account_type": "credit_union",
                    "balance": 10.0,
                    "created_at": "2024-01-01T00:00:00Z"
                }],
                "assets": [{
                    "id": "a1",
                    "name": "Painting",
                    "value": 1200.0,
                    "details": {"category": "collectible", "artist": "Unknown"}
                }]
            }
        }"#;

        let snapshot = import_backup(newer).unwrap();
        assert_eq!(snapshot.bank_accounts[0].account_type, BankAccountType::Other);
        assert_eq!(snapshot.assets[0].details, AssetDetails::Unrecognized);
        assert_eq!(snapshot.total_asset_value(), 1200.0);
    }

    #[test]
    fn test_file_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        let snapshot = rich_snapshot();

        export_to_path(&snapshot, &path).unwrap();
        assert_eq!(import_from_path(&path).unwrap(), snapshot);
    }
}
