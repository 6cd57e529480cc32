// 🔐 Encrypted Backup Service - off-device profile backups only the owning wallet can read
//
//   message  = "{prefix}\nowner:{address}\nversion:1"
//   key      = SHA-256(signer.sign(message))        (never stored)
//   slot     = hex SHA-256("freedom-backup:" + address)
//   blob     = {"version":1,"nonce":b64,"ciphertext":b64}   (AES-256-GCM)
//
// The same wallet signing the same message yields the same key, so a restore
// on a fresh device only needs the wallet. One slot per owner; later saves
// overwrite earlier ones.
//
// Only one save or load may run at a time. Phases:
//   Idle → Signing → Uploading | Downloading → Done | Failed

use crate::backup;
use crate::config::BackupConfig;
use crate::error::{Result, TrackerError};
use crate::snapshot::ProfileSnapshot;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

const ENVELOPE_VERSION: u32 = 1;
const NONCE_LEN: usize = 12;
const SLOT_PREFIX: &str = "freedom-backup:";

// ============================================================================
// COLLABORATORS
// ============================================================================

/// Whatever wallet connection is active. Treated as an opaque async capability.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, message: &[u8]) -> anyhow::Result<Vec<u8>>;
}

/// Remote key/value blob storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `blob` under `key`, replacing any previous blob. Returns an
    /// opaque content/transaction identifier.
    async fn put(&self, key: &str, blob: Vec<u8>) -> anyhow::Result<String>;

    /// None when nothing was ever stored under `key`
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
}

/// In-process blob store; clones share the same slots
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, blob: Vec<u8>) -> anyhow::Result<String> {
        let id = format!("{:x}", Sha256::digest(&blob));
        self.lock().insert(key.to_string(), blob);
        Ok(id)
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.lock().get(key).cloned())
    }
}

// ============================================================================
// PHASE / ENVELOPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupPhase {
    Idle,
    Signing,
    Uploading,
    Downloading,
    Done,
    Failed,
}

impl BackupPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupPhase::Idle => "idle",
            BackupPhase::Signing => "signing",
            BackupPhase::Uploading => "uploading",
            BackupPhase::Downloading => "downloading",
            BackupPhase::Done => "done",
            BackupPhase::Failed => "failed",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            BackupPhase::Signing | BackupPhase::Uploading | BackupPhase::Downloading
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    nonce: String,
    ciphertext: String,
}

/// Hex slot key for an owner; the address itself never reaches the blob store
pub fn slot_key(owner: &str) -> String {
    format!("{:x}", Sha256::digest(format!("{}{}", SLOT_PREFIX, owner).as_bytes()))
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct EncryptedBackupService {
    blobs: Arc<dyn BlobStore>,
    message_prefix: String,
    busy: AtomicBool,
    phase: Mutex<BackupPhase>,
}

/// Clears the busy flag on every exit path, including a dropped future
struct BusyGuard<'a> {
    service: &'a EncryptedBackupService,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.service.phase().is_in_flight() {
            self.service.set_phase(BackupPhase::Failed);
        }
        self.service.busy.store(false, Ordering::Release);
    }
}

impl EncryptedBackupService {
    pub fn new(blobs: Arc<dyn BlobStore>, message_prefix: impl Into<String>) -> Self {
        EncryptedBackupService {
            blobs,
            message_prefix: message_prefix.into(),
            busy: AtomicBool::new(false),
            phase: Mutex::new(BackupPhase::Idle),
        }
    }

    /// Service signing the configured `backup.message_prefix`
    pub fn from_config(blobs: Arc<dyn BlobStore>, config: &BackupConfig) -> Self {
        Self::new(blobs, config.message_prefix.clone())
    }

    pub fn phase(&self) -> BackupPhase {
        *self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// The exact bytes the wallet is asked to sign for `owner`
    pub fn canonical_message(&self, owner: &str) -> Vec<u8> {
        let message = format!(
            "{}\nowner:{}\nversion:{}",
            self.message_prefix, owner, ENVELOPE_VERSION
        );
        message.into_bytes()
    }

    /// Encrypt and upload the profile. Returns the blob store's identifier.
    pub async fn save_backup(
        &self,
        snapshot: &ProfileSnapshot,
        signer: &dyn Signer,
        owner: &str,
    ) -> Result<String> {
        let _guard = self.begin()?;

        let result = async {
            let key = self.derive_key(signer, owner).await?;
            let plaintext = backup::export_backup(snapshot)?;
            let blob = encrypt(&key, plaintext.as_bytes())?;

            self.set_phase(BackupPhase::Uploading);
            self.blobs
                .put(&slot_key(owner), blob)
                .await
                .map_err(|e| TrackerError::external(owner, e))
        }
        .await;

        self.finish(&result);
        if let Ok(id) = &result {
            info!("Encrypted backup saved for {} ({})", owner, id);
        }
        result
    }

    /// Download and decrypt the profile. The caller decides whether to
    /// replace the live store with it.
    pub async fn load_backup(&self, owner: &str, signer: &dyn Signer) -> Result<ProfileSnapshot> {
        let _guard = self.begin()?;

        let result = async {
            let key = self.derive_key(signer, owner).await?;

            self.set_phase(BackupPhase::Downloading);
            let blob = self
                .blobs
                .get(&slot_key(owner))
                .await
                .map_err(|e| TrackerError::external(owner, e))?
                .ok_or_else(|| TrackerError::NoBackupFound {
                    owner: owner.to_string(),
                })?;

            let plaintext = decrypt(&key, &blob)?;
            let text = String::from_utf8(plaintext).map_err(|_| TrackerError::DecryptionFailed)?;
            backup::import_backup(&text)
        }
        .await;

        self.finish(&result);
        if result.is_ok() {
            info!("Encrypted backup restored for {}", owner);
        }
        result
    }

    fn begin(&self) -> Result<BusyGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Backup operation rejected: another one is in progress");
            return Err(TrackerError::BackupBusy);
        }
        self.set_phase(BackupPhase::Signing);
        Ok(BusyGuard { service: self })
    }

    fn finish<T>(&self, result: &Result<T>) {
        match result {
            Ok(_) => self.set_phase(BackupPhase::Done),
            Err(e) => {
                warn!("Backup operation failed: {}", e);
                self.set_phase(BackupPhase::Failed);
            }
        }
    }

    fn set_phase(&self, phase: BackupPhase) {
        debug!("Backup phase → {}", phase.as_str());
        *self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = phase;
    }

    async fn derive_key(&self, signer: &dyn Signer, owner: &str) -> Result<[u8; 32]> {
        let signature = signer
            .sign(&self.canonical_message(owner))
            .await
            .map_err(|e| TrackerError::SignatureUnavailable(format!("{:#}", e)))?;
        if signature.is_empty() {
            return Err(TrackerError::SignatureUnavailable(
                "wallet returned an empty signature".into(),
            ));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&Sha256::digest(&signature));
        Ok(key)
    }
}

// ============================================================================
// AES-256-GCM
// ============================================================================

fn encrypt(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| TrackerError::Validation("profile could not be encrypted".into()))?;

    let envelope = Envelope {
        version: ENVELOPE_VERSION,
        nonce: STANDARD.encode(nonce),
        ciphertext: STANDARD.encode(ciphertext),
    };
    serde_json::to_vec(&envelope)
        .map_err(|e| TrackerError::Validation(format!("backup envelope: {}", e)))
}

/// Any corruption of the envelope is indistinguishable from a wrong key
fn decrypt(key: &[u8; 32], blob: &[u8]) -> Result<Vec<u8>> {
    let envelope: Envelope =
        serde_json::from_slice(blob).map_err(|_| TrackerError::DecryptionFailed)?;
    if envelope.version != ENVELOPE_VERSION {
        warn!("Unknown backup envelope version {}", envelope.version);
        return Err(TrackerError::DecryptionFailed);
    }

    let nonce = STANDARD
        .decode(&envelope.nonce)
        .map_err(|_| TrackerError::DecryptionFailed)?;
    if nonce.len() != NONCE_LEN {
        return Err(TrackerError::DecryptionFailed);
    }
    let ciphertext = STANDARD
        .decode(&envelope.ciphertext)
        .map_err(|_| TrackerError::DecryptionFailed)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
        .map_err(|_| TrackerError::DecryptionFailed)
}

// ============================================================================
// TESTS
// ============================================================================
