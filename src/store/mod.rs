//! Conversation stores: how history is externalized between invocations.
//!
//! A [`ConversationStore`] opens a [`ConversationSession`] per turn. The session
//! loads previous history into runtime memory, stores it back at the end of the
//! turn (returning a context whose conversation handle points at the new state)
//! and gets a chance to roll back when the caller fails to commit the turn.

pub mod document;
pub mod documents;
pub mod in_process;

pub use document::DocumentConversationStore;
pub use documents::{DocumentCreationRequest, DocumentStore, FileDocumentStore, InMemoryDocumentStore};
pub use in_process::InProcessConversationStore;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::{AgentContext, ConversationContext};
use crate::error::{AgentError, Result};
use crate::memory::RuntimeMemory;
use crate::request::{AgentExecutionContext, MemoryStorageConfiguration};

/// Factory for per-turn conversation sessions.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Storage type this store serves, matched against the request's memory storage type.
    fn store_type(&self) -> &str;

    async fn session(
        &self,
        execution: &AgentExecutionContext,
        agent_context: &AgentContext,
    ) -> Result<Box<dyn ConversationSession>>;
}

/// Conversation access scoped to one turn.
#[async_trait]
pub trait ConversationSession: Send + Sync {
    async fn load_into_runtime_memory(
        &self,
        agent_context: &AgentContext,
        memory: &mut dyn RuntimeMemory,
    ) -> Result<()>;

    /// Persist the retained history and return a context pointing at it.
    async fn store_from_runtime_memory(
        &self,
        agent_context: AgentContext,
        memory: &dyn RuntimeMemory,
    ) -> Result<AgentContext>;

    /// Called when history was stored but the caller's own commit failed afterwards.
    async fn compensate_failed_job_completion(
        &self,
        execution: &AgentExecutionContext,
        agent_context: &AgentContext,
        error: &AgentError,
    ) -> Result<()>;
}

/// Conversation stores keyed by storage type.
#[derive(Clone)]
pub struct ConversationStoreRegistry {
    stores: HashMap<String, Arc<dyn ConversationStore>>,
}

impl std::fmt::Debug for ConversationStoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.stores.keys().collect();
        types.sort();
        f.debug_struct("ConversationStoreRegistry")
            .field("stores", &types)
            .finish()
    }
}

impl Default for ConversationStoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStoreRegistry {
    /// Registry with the in-process store.
    pub fn new() -> Self {
        let mut registry = Self {
            stores: HashMap::new(),
        };
        registry.register(Arc::new(InProcessConversationStore));
        registry
    }

    /// Register (or replace) the store for its storage type.
    pub fn register(&mut self, store: Arc<dyn ConversationStore>) {
        self.stores.insert(store.store_type().to_string(), store);
    }

    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.register(store);
        self
    }

    pub fn store(&self, config: &MemoryStorageConfiguration) -> Result<Arc<dyn ConversationStore>> {
        let store_type = config.store_type();
        self.stores.get(store_type).cloned().ok_or_else(|| {
            AgentError::Configuration(format!(
                "No conversation store registered for memory storage type '{store_type}'"
            ))
        })
    }
}

/// Reject handles written by a different store type.
pub(crate) fn ensure_store_type<'a>(
    agent_context: &'a AgentContext,
    expected: &str,
) -> Result<Option<&'a ConversationContext>> {
    match &agent_context.conversation {
        Some(conversation) if conversation.store_type() != expected => {
            Err(AgentError::InvalidState(format!(
                "Conversation was stored by a '{}' store and cannot be loaded by the '{expected}' store",
                conversation.store_type()
            )))
        }
        other => Ok(other.as_ref()),
    }
}
