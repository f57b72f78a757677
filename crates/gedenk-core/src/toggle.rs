use std::sync::Mutex;

use anyhow::Result;
use tracing::warn;
use uuid::Uuid;

use gedenk_types::reaction::{ReactionSnapshot, ReactionType};

use crate::deferred::{DeferredAction, DeferredKind, DeferredQueue, SlotStore};

/// The store side of the toggle protocol. The backend decides flip direction
/// itself from current presence; callers never choose add-vs-remove.
pub trait ReactionBackend {
    fn toggle(
        &self,
        memorial_id: Uuid,
        ty: ReactionType,
    ) -> impl Future<Output = Result<ReactionSnapshot>>;

    fn fetch(&self, memorial_id: Uuid) -> impl Future<Output = Result<ReactionSnapshot>>;
}

/// What happened to a reaction click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Toggle reached the store; local state now holds the authoritative
    /// post-toggle snapshot.
    Applied,
    /// A toggle for this type was already in flight; the click was dropped.
    Ignored,
    /// No actor present. A deferred action was recorded and the caller must
    /// route the visitor through authentication.
    AuthRequired,
    /// The toggle failed; the optimistic prediction was discarded and local
    /// state was refetched from the store.
    RolledBack,
}

#[derive(Debug, Default)]
struct PanelState {
    snapshot: ReactionSnapshot,
    in_flight: Vec<ReactionType>,
}

impl PanelState {
    /// Flip one type locally: presence and count move together so the
    /// prediction stays self-consistent.
    fn flip(&mut self, ty: ReactionType) {
        if let Some(pos) = self.snapshot.user_reactions.iter().position(|t| *t == ty) {
            self.snapshot.user_reactions.remove(pos);
            let count = self.snapshot.counts.entry(ty).or_insert(0);
            *count = count.saturating_sub(1);
        } else {
            self.snapshot.user_reactions.push(ty);
            *self.snapshot.counts.entry(ty).or_insert(0) += 1;
        }
    }
}

/// Client-side reaction panel for one memorial: optimistic prediction,
/// authoritative reconciliation, per-type in-flight guarding, and the
/// unauthenticated deferral path.
pub struct ReactionPanel<B, S: SlotStore> {
    memorial_id: Uuid,
    backend: B,
    queue: DeferredQueue<S>,
    state: Mutex<PanelState>,
}

impl<B: ReactionBackend, S: SlotStore> ReactionPanel<B, S> {
    pub fn new(memorial_id: Uuid, backend: B, queue: DeferredQueue<S>) -> Self {
        Self {
            memorial_id,
            backend,
            queue,
            state: Mutex::new(PanelState::default()),
        }
    }

    /// Load the authoritative snapshot, e.g. on page load.
    pub async fn load(&self) -> Result<()> {
        let snapshot = self.backend.fetch(self.memorial_id).await?;
        self.lock_state().snapshot = snapshot;
        Ok(())
    }

    /// The locally held view: authoritative, except while a toggle is in
    /// flight, when it carries the optimistic prediction.
    pub fn snapshot(&self) -> ReactionSnapshot {
        self.lock_state().snapshot.clone()
    }

    /// Handle a click on reaction `ty`.
    ///
    /// Anonymous visitors never reach the store: the attempt is written to
    /// the deferred queue and `AuthRequired` tells the caller to start the
    /// authentication round-trip. Authenticated clicks are predicted locally,
    /// sent to the store, and reconciled with its reply; on failure the
    /// prediction is dropped and state is refetched rather than patched.
    pub async fn click(&self, actor: Option<Uuid>, ty: ReactionType) -> Result<ClickOutcome> {
        if actor.is_none() {
            self.queue
                .enqueue(&DeferredAction::toggle_reaction(self.memorial_id, ty))?;
            return Ok(ClickOutcome::AuthRequired);
        }

        {
            let mut state = self.lock_state();
            if state.in_flight.contains(&ty) {
                return Ok(ClickOutcome::Ignored);
            }
            state.in_flight.push(ty);
            state.flip(ty);
        }

        match self.backend.toggle(self.memorial_id, ty).await {
            Ok(snapshot) => {
                let mut state = self.lock_state();
                state.in_flight.retain(|t| *t != ty);
                // The store's reply wins over the prediction, even when they
                // agree.
                state.snapshot = snapshot;
                Ok(ClickOutcome::Applied)
            }
            Err(err) => {
                warn!("Reaction toggle failed, refetching: {:#}", err);
                {
                    let mut state = self.lock_state();
                    state.in_flight.retain(|t| *t != ty);
                    state.flip(ty);
                }
                let snapshot = self.backend.fetch(self.memorial_id).await?;
                self.lock_state().snapshot = snapshot;
                Ok(ClickOutcome::RolledBack)
            }
        }
    }

    /// Run on every transition into "authenticated, viewing this memorial":
    /// consume the deferred action, if any, and replay it through the normal
    /// authenticated path. Returns whether a record was consumed.
    ///
    /// Replay failures are logged and swallowed — the originating interaction
    /// is long past, and the record is already gone, so the action is lost
    /// rather than risked twice.
    pub async fn on_authenticated(&self, actor: Uuid) -> bool {
        let Some(action) = self.queue.take_for(self.memorial_id) else {
            return false;
        };

        let DeferredKind::ToggleReaction(ty) = action.kind;
        if let Err(err) = self.click(Some(actor), ty).await {
            warn!("Deferred reaction replay failed: {:#}", err);
        }
        true
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, PanelState> {
        self.state.lock().expect("panel state lock poisoned")
    }
}
