// 💾 Local Persistence - durable storage for the profile snapshot
//
// The store writes the whole snapshot after every successful mutation and
// appends one audit event describing it ("Every change is an event").
// SQLite runs in WAL mode for crash recovery; anything stronger than what the
// storage primitive gives is out of scope.

use crate::snapshot::{ProfileSnapshot, SCHEMA_VERSION};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};

// ============================================================================
// STORE EVENT (audit trail)
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoreEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl StoreEvent {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: "profile_store".to_string(),
        }
    }
}

// ============================================================================
// PERSISTENCE COLLABORATOR
// ============================================================================

pub trait SnapshotPersistence: Send {
    /// Last saved snapshot, or None on first run
    fn load(&self) -> Result<Option<ProfileSnapshot>>;

    /// Replace the stored snapshot
    fn save(&self, snapshot: &ProfileSnapshot) -> Result<()>;

    /// Append to the audit trail. Default: not recorded.
    fn record_event(&self, _event: &StoreEvent) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// SQLITE
// ============================================================================

pub struct SqlitePersistence {
    conn: Connection,
}

impl SqlitePersistence {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        setup_database(&conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(Self { conn })
    }

    /// Audit events for one entity, oldest first
    pub fn events_for_entity(&self, entity_id: &str) -> Result<Vec<StoreEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
             FROM events
             WHERE entity_id = ?1
             ORDER BY id ASC",
        )?;

        let rows = stmt
            .query_map(params![entity_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(event_id, timestamp, event_type, entity_type, entity_id, data, actor)| {
                Ok(StoreEvent {
                    event_id,
                    timestamp: DateTime::parse_from_rfc3339(&timestamp)
                        .context("Invalid event timestamp")?
                        .with_timezone(&Utc),
                    event_type,
                    entity_type,
                    entity_id,
                    data: serde_json::from_str(&data).context("Invalid event payload")?,
                    actor,
                })
            })
            .collect()
    }

    pub fn event_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count)
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Snapshot Table (single row: the current profile)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS profile_snapshot (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL,
            data TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

impl SnapshotPersistence for SqlitePersistence {
    fn load(&self) -> Result<Option<ProfileSnapshot>> {
        let data: Option<String> = self
            .conn
            .query_row("SELECT data FROM profile_snapshot WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match data {
            Some(json) => {
                let snapshot = serde_json::from_str(&json).context("Stored snapshot is corrupt")?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &ProfileSnapshot) -> Result<()> {
        let data = serde_json::to_string(snapshot)?;
        self.conn.execute(
            "INSERT INTO profile_snapshot (id, schema_version, data, updated_at)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                schema_version = excluded.schema_version,
                data = excluded.data,
                updated_at = excluded.updated_at",
            params![SCHEMA_VERSION, data, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn record_event(&self, event: &StoreEvent) -> Result<()> {
        let data_json = serde_json::to_string(&event.data)?;

        self.conn.execute(
            "INSERT INTO events (
                event_id, timestamp, event_type, entity_type, entity_id, data, actor
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.event_id,
                event.timestamp.to_rfc3339(),
                event.event_type,
                event.entity_type,
                event.entity_id,
                data_json,
                event.actor,
            ],
        )?;

        Ok(())
    }
}

// ============================================================================
// IN-MEMORY (tests, ephemeral sessions)
// ============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: Option<ProfileSnapshot>,
    events: Vec<StoreEvent>,
    saves: usize,
    failing: bool,
}

/// Cloneable handle; clones share the same storage
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: ProfileSnapshot) -> Self {
        let persistence = Self::new();
        persistence.lock().snapshot = Some(snapshot);
        persistence
    }

    /// Make every subsequent save fail
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn saved(&self) -> Option<ProfileSnapshot> {
        self.lock().snapshot.clone()
    }

    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.lock().events.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotPersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<ProfileSnapshot>> {
        Ok(self.lock().snapshot.clone())
    }

    fn save(&self, snapshot: &ProfileSnapshot) -> Result<()> {
        let mut state = self.lock();
        if state.failing {
            return Err(anyhow!("storage unavailable"));
        }
        state.snapshot = Some(snapshot.clone());
        state.saves += 1;
        Ok(())
    }

    fn record_event(&self, event: &StoreEvent) -> Result<()> {
        self.lock().events.push(event.clone());
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BankAccount, BankAccountType};

    fn sample_snapshot() -> ProfileSnapshot {
        let mut snapshot = ProfileSnapshot::default();
        snapshot.bank_accounts.push(
            BankAccount::new("Chase Checking", "Chase", BankAccountType::Checking, 1000.0)
                .with_primary(true),
        );
        snapshot.wallets.push("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".to_string());
        snapshot
    }

    #[test]
    fn test_sqlite_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.db");

        let snapshot = sample_snapshot();
        {
            let persistence = SqlitePersistence::open(&path).unwrap();
            assert!(persistence.load().unwrap().is_none());
            persistence.save(&snapshot).unwrap();
        }

        let reopened = SqlitePersistence::open(&path).unwrap();
        assert_eq!(reopened.load().unwrap(), Some(snapshot));
    }

    #[test]
    fn test_sqlite_save_overwrites_single_row() {
        let persistence = SqlitePersistence::in_memory().unwrap();
        let mut snapshot = sample_snapshot();
        persistence.save(&snapshot).unwrap();

        snapshot.wallets.clear();
        persistence.save(&snapshot).unwrap();

        let rows: i64 = persistence
            .conn
            .query_row("SELECT COUNT(*) FROM profile_snapshot", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        assert!(persistence.load().unwrap().unwrap().wallets.is_empty());
    }

    #[test]
    fn test_sqlite_events_for_entity() {
        let persistence = SqlitePersistence::in_memory().unwrap();
        let first = StoreEvent::new(
            "bank_account_added",
            "bank_account",
            "acc-1",
            serde_json::json!({"name": "Chase"}),
        );
        let second = StoreEvent::new(
            "bank_account_removed",
            "bank_account",
            "acc-1",
            serde_json::json!({}),
        );
        let other = StoreEvent::new("wallet_connected", "wallet", "w-1", serde_json::json!({}));

        persistence.record_event(&first).unwrap();
        persistence.record_event(&second).unwrap();
        persistence.record_event(&other).unwrap();

        let events = persistence.events_for_entity("acc-1").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "bank_account_added");
        assert_eq!(events[0].data["name"], "Chase");
        assert_eq!(events[1].event_type, "bank_account_removed");
        assert_eq!(persistence.event_count().unwrap(), 3);
    }

    #[test]
    fn test_memory_persistence_failing_mode() {
        let persistence = MemoryPersistence::new();
        let handle = persistence.clone();

        let snapshot = sample_snapshot();
        persistence.save(&snapshot).unwrap();
        assert_eq!(handle.save_count(), 1);

        handle.set_failing(true);
        assert!(persistence.save(&ProfileSnapshot::default()).is_err());
        assert_eq!(handle.save_count(), 1);
        assert_eq!(handle.saved(), Some(snapshot));
    }
}
