//! The access-control and engagement core of Gedenk.
//!
//! Everything here is independent of HTTP and SQLite: the access resolver is
//! a pure function over explicit inputs, and the toggle protocol / deferred
//! queue talk to the outside world only through the [`toggle::ReactionBackend`]
//! and [`deferred::SlotStore`] traits.

pub mod access;
pub mod deferred;
pub mod toggle;

pub use access::{AccessDecision, DenyReason, resolve_access};
pub use deferred::{DeferredAction, DeferredKind, DeferredQueue, FileSlot, MemorySlot, SlotStore};
pub use toggle::{ClickOutcome, ReactionBackend, ReactionPanel};
