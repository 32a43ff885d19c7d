//! In-process conversation store.
//!
//! State lives in a `HashMap` behind a `std::sync::RwLock`; the lock is only
//! held for synchronous map access, never across an await. Each conversation
//! owns a `tokio::sync::Mutex` turn guard, acquired through the port so the
//! dispatcher can serialize turns per id while other conversations proceed
//! concurrently.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::conversation::{ConversationState, ConversationTurn};
use crate::domain::foundation::ConversationId;
use crate::ports::{ConversationStore, MemoryError};

#[derive(Debug, Default)]
struct Entry {
    state: ConversationState,
    guard: GuardHandle,
}

#[derive(Debug, Clone)]
struct GuardHandle(Arc<Mutex<()>>);

impl Default for GuardHandle {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(())))
    }
}

/// In-memory implementation of the `ConversationStore` port.
///
/// There is no eviction: conversations live until explicitly cleared, which
/// is the documented resource-management gap a deployment must cover.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    inner: RwLock<HashMap<ConversationId, Entry>>,
}

impl InMemoryConversationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations with recorded state.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    /// Whether no conversation has state yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn snapshot(&self, id: &ConversationId) -> ConversationState {
        self.inner
            .read()
            .unwrap()
            .get(id)
            .map(|entry| entry.state.clone())
            .unwrap_or_default()
    }

    async fn append_turn(
        &self,
        id: &ConversationId,
        turn: ConversationTurn,
    ) -> Result<(), MemoryError> {
        let mut map = self.inner.write().unwrap();
        map.entry(*id).or_default().state.record(turn);
        Ok(())
    }

    async fn clear(&self, id: &ConversationId) -> bool {
        self.inner.write().unwrap().remove(id).is_some()
    }

    async fn list_ids(&self) -> Vec<ConversationId> {
        self.inner.read().unwrap().keys().copied().collect()
    }

    async fn turn_guard(&self, id: &ConversationId) -> OwnedMutexGuard<()> {
        // Clone the Arc inside the lock, await outside it.
        let handle = {
            let mut map = self.inner.write().unwrap();
            map.entry(*id).or_default().guard.clone()
        };
        handle.0.lock_owned().await
    }
}
