use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use gedenk_types::reaction::ReactionType;

/// How long a deferred action stays replayable. Older records are discarded
/// unread.
pub const VALIDITY_WINDOW_SECS: i64 = 5 * 60;

/// An engagement action captured while the visitor was unauthenticated,
/// persisted across the authentication redirect and replayed at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeferredAction {
    pub memorial_id: Uuid,
    #[serde(flatten)]
    pub kind: DeferredKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "kebab-case")]
pub enum DeferredKind {
    ToggleReaction(ReactionType),
}

impl DeferredAction {
    pub fn toggle_reaction(memorial_id: Uuid, ty: ReactionType) -> Self {
        Self {
            memorial_id,
            kind: DeferredKind::ToggleReaction(ty),
            created_at: Utc::now(),
        }
    }
}

/// Single-slot durable storage for the one pending deferred action. The slot
/// must survive a full navigation/redirect, hence the file-backed impl.
pub trait SlotStore {
    fn load(&self) -> Result<Option<DeferredAction>>;
    fn save(&self, action: &DeferredAction) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// In-process slot, for tests and embedded callers that do not cross a
/// redirect boundary.
#[derive(Debug, Default)]
pub struct MemorySlot {
    slot: Mutex<Option<DeferredAction>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemorySlot {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<DeferredAction>>> {
        self.slot
            .lock()
            .map_err(|e| anyhow::anyhow!("slot lock poisoned: {}", e))
    }
}

impl SlotStore for MemorySlot {
    fn load(&self) -> Result<Option<DeferredAction>> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, action: &DeferredAction) -> Result<()> {
        *self.lock()? = Some(action.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}

/// JSON file slot. A missing file means an empty slot; an unreadable record
/// is dropped rather than trusted.
#[derive(Debug)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SlotStore for FileSlot {
    fn load(&self) -> Result<Option<DeferredAction>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).context("reading deferred action slot"),
        };

        match serde_json::from_slice(&raw) {
            Ok(action) => Ok(Some(action)),
            Err(err) => {
                warn!("Discarding corrupt deferred action record: {}", err);
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn save(&self, action: &DeferredAction) -> Result<()> {
        let raw = serde_json::to_vec(action)?;
        fs::write(&self.path, raw).context("writing deferred action slot")
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).context("clearing deferred action slot"),
        }
    }
}

/// The deferred action queue: one pending action at a time, consumed the
/// moment a replay is considered.
#[derive(Debug)]
pub struct DeferredQueue<S: SlotStore> {
    store: S,
}

impl<S: SlotStore> DeferredQueue<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record an action for replay after authentication. A previous pending
    /// action, if any, is overwritten — the newest intent wins.
    pub fn enqueue(&self, action: &DeferredAction) -> Result<()> {
        self.store.save(action)
    }

    /// Take the pending action if it is still valid for `current_memorial`.
    ///
    /// The slot is cleared as soon as a record is read, before any validity
    /// check or replay attempt, so a crash mid-replay can never cause a
    /// second replay. Returns None when the slot is empty, the record is
    /// older than the validity window, or it targets a different memorial.
    pub fn take_for(&self, current_memorial: Uuid) -> Option<DeferredAction> {
        self.take_for_at(current_memorial, Utc::now())
    }

    fn take_for_at(&self, current_memorial: Uuid, now: DateTime<Utc>) -> Option<DeferredAction> {
        let record = match self.store.load() {
            Ok(record) => record?,
            Err(err) => {
                warn!("Failed to load deferred action slot: {:#}", err);
                return None;
            }
        };

        // Consume first, decide later.
        if let Err(err) = self.store.clear() {
            warn!("Failed to clear deferred action slot: {:#}", err);
            return None;
        }

        if now - record.created_at > Duration::seconds(VALIDITY_WINDOW_SECS) {
            debug!("Deferred action expired, discarding");
            return None;
        }

        if record.memorial_id != current_memorial {
            debug!(
                "Deferred action targets memorial {}, current is {}; discarding",
                record.memorial_id, current_memorial
            );
            return None;
        }

        Some(record)
    }
}
