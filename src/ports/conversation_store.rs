//! Conversation Store Port - Interface for per-conversation memory.
//!
//! The default adapter is an in-process map, but the contract is written so a
//! persistent store can replace it without touching handler logic. Two rules
//! matter for correctness:
//!
//! - `append_turn` is atomic: a turn is written whole or not at all, so an
//!   abandoned request never leaves partial state.
//! - `turn_guard` serializes turns per conversation id. The dispatcher holds
//!   the guard from before its first memory read until after the append, and
//!   guards are granted in acquisition order, which is what gives turns their
//!   arrival-order guarantee.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

use crate::domain::conversation::{ConversationState, ConversationTurn};
use crate::domain::foundation::ConversationId;

/// Errors surfaced by the memory backing store.
#[derive(Debug, Clone, Error)]
pub enum MemoryError {
    /// The backing store failed.
    #[error("Memory store failure: {0}")]
    Backend(String),
}

impl MemoryError {
    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Port for the per-conversation memory store.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Returns a snapshot of the conversation's state.
    ///
    /// Unknown ids are new conversations, never "not found": the snapshot is
    /// simply empty. Snapshots taken without the turn guard may observe a
    /// state mid-update, which is acceptable for advisory reads.
    async fn snapshot(&self, id: &ConversationId) -> ConversationState;

    /// Appends a completed turn atomically, applying its project update.
    async fn append_turn(
        &self,
        id: &ConversationId,
        turn: ConversationTurn,
    ) -> Result<(), MemoryError>;

    /// Deletes the conversation's state. Returns whether state existed.
    async fn clear(&self, id: &ConversationId) -> bool;

    /// Ids of every conversation with recorded state.
    async fn list_ids(&self) -> Vec<ConversationId>;

    /// Acquires the conversation's turn guard.
    ///
    /// Waiters are granted the guard in acquisition order.
    async fn turn_guard(&self, id: &ConversationId) -> OwnedMutexGuard<()>;
}
