//! Store persisting each turn's history as a document.
//!
//! Every store writes a new document and keeps a short tail of previous documents
//! so that a context from an earlier turn can still be resumed if the caller never
//! committed the latest one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::context::{AgentContext, ConversationContext};
use crate::error::{AgentError, Result};
use crate::memory::RuntimeMemory;
use crate::request::{AgentExecutionContext, MemoryStorageConfiguration};
use crate::types::{Document, Message};

use super::documents::{DocumentCreationRequest, DocumentStore};
use super::{ensure_store_type, ConversationSession, ConversationStore};

pub const STORE_TYPE: &str = "document";
pub const DEFAULT_PREVIOUS_DOCUMENTS_RETENTION: usize = 2;

/// Serialized form of a conversation document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct DocumentContent {
    messages: Vec<Message>,
}

/// Conversation store writing history documents to a [`DocumentStore`].
#[derive(Clone)]
pub struct DocumentConversationStore {
    documents: Arc<dyn DocumentStore>,
    previous_documents_retention: usize,
}

impl std::fmt::Debug for DocumentConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentConversationStore")
            .field(
                "previous_documents_retention",
                &self.previous_documents_retention,
            )
            .finish_non_exhaustive()
    }
}

impl DocumentConversationStore {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            documents,
            previous_documents_retention: DEFAULT_PREVIOUS_DOCUMENTS_RETENTION,
        }
    }

    /// Number of previous documents kept besides the current one.
    pub fn with_previous_documents_retention(mut self, retention: usize) -> Self {
        self.previous_documents_retention = retention;
        self
    }
}

#[async_trait]
impl ConversationStore for DocumentConversationStore {
    fn store_type(&self) -> &str {
        STORE_TYPE
    }

    async fn session(
        &self,
        execution: &AgentExecutionContext,
        _agent_context: &AgentContext,
    ) -> Result<Box<dyn ConversationSession>> {
        let (time_to_live, custom_properties) = match execution.memory_storage() {
            MemoryStorageConfiguration::Document {
                time_to_live_secs,
                custom_properties,
            } => (
                time_to_live_secs.map(Duration::from_secs),
                custom_properties.clone(),
            ),
            _ => (None, Map::new()),
        };
        let file_name = format!(
            "{}_conversation.json",
            execution.metadata.element_id.as_deref().unwrap_or("agent")
        );

        Ok(Box::new(DocumentConversationSession {
            documents: Arc::clone(&self.documents),
            previous_documents_retention: self.previous_documents_retention,
            time_to_live,
            custom_properties,
            file_name,
        }))
    }
}

struct DocumentConversationSession {
    documents: Arc<dyn DocumentStore>,
    previous_documents_retention: usize,
    time_to_live: Option<Duration>,
    custom_properties: Map<String, Value>,
    file_name: String,
}

/// Borrowed view of a document conversation handle.
struct PreviousConversation<'a> {
    conversation_id: &'a str,
    document: &'a Document,
    previous_documents: &'a [Document],
}

fn previous_conversation(agent_context: &AgentContext) -> Result<Option<PreviousConversation<'_>>> {
    Ok(match ensure_store_type(agent_context, STORE_TYPE)? {
        Some(ConversationContext::Document {
            conversation_id,
            document,
            previous_documents,
        }) => Some(PreviousConversation {
            conversation_id,
            document,
            previous_documents,
        }),
        _ => None,
    })
}

impl DocumentConversationSession {
    async fn create_document(&self, memory: &dyn RuntimeMemory, conversation_id: &str) -> Result<Document> {
        let content = DocumentContent {
            messages: memory.messages().to_vec(),
        };
        let serialized = serde_json::to_vec_pretty(&content)?;

        let mut custom_properties = self.custom_properties.clone();
        custom_properties.insert(
            "conversationId".to_string(),
            Value::String(conversation_id.to_string()),
        );

        self.documents
            .create(DocumentCreationRequest {
                content: serialized,
                content_type: Some("application/json".to_string()),
                file_name: Some(self.file_name.clone()),
                custom_properties,
                time_to_live: self.time_to_live,
            })
            .await
    }

    /// Delete the oldest documents beyond the retention size. Failed deletions stay listed.
    async fn purge_previous_documents(&self, previous: Vec<Document>) -> Vec<Document> {
        if previous.len() <= self.previous_documents_retention {
            return previous;
        }

        let removal_count = previous.len() - self.previous_documents_retention;
        let mut retained = Vec::with_capacity(previous.len());
        for (index, document) in previous.into_iter().enumerate() {
            if index >= removal_count {
                retained.push(document);
                continue;
            }
            match self.documents.delete(&document).await {
                Ok(()) => debug!(document_id = %document.id, "purged previous conversation document"),
                Err(err) => {
                    warn!(document_id = %document.id, error = %err, "failed to delete previous conversation document");
                    retained.push(document);
                }
            }
        }
        retained
    }
}

#[async_trait]
impl ConversationSession for DocumentConversationSession {
    async fn load_into_runtime_memory(
        &self,
        agent_context: &AgentContext,
        memory: &mut dyn RuntimeMemory,
    ) -> Result<()> {
        let Some(previous) = previous_conversation(agent_context)? else {
            return Ok(());
        };

        let raw = self.documents.read(previous.document).await.map_err(|err| {
            AgentError::Storage(format!(
                "Failed to load conversation from document '{}': {err}",
                previous.document.id
            ))
        })?;
        let content: DocumentContent = serde_json::from_slice(&raw)?;
        memory.add_messages(content.messages);
        Ok(())
    }

    async fn store_from_runtime_memory(
        &self,
        agent_context: AgentContext,
        memory: &dyn RuntimeMemory,
    ) -> Result<AgentContext> {
        let previous = previous_conversation(&agent_context)?;
        let conversation_id = previous
            .as_ref()
            .map(|p| p.conversation_id.to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let previous_documents = previous.map(|p| {
            let mut documents = p.previous_documents.to_vec();
            documents.push(p.document.clone());
            documents
        });

        let document = self.create_document(memory, &conversation_id).await?;
        debug!(conversation_id = %conversation_id, document_id = %document.id, "stored conversation document");

        // purge only after the new document was written
        let previous_documents = match previous_documents {
            Some(documents) => self.purge_previous_documents(documents).await,
            None => Vec::new(),
        };

        Ok(agent_context.with_conversation(ConversationContext::Document {
            conversation_id,
            document,
            previous_documents,
        }))
    }

    async fn compensate_failed_job_completion(
        &self,
        _execution: &AgentExecutionContext,
        agent_context: &AgentContext,
        error: &AgentError,
    ) -> Result<()> {
        let Some(stored) = previous_conversation(agent_context)? else {
            return Ok(());
        };
        warn!(
            conversation_id = %stored.conversation_id,
            document_id = %stored.document.id,
            error = %error,
            "job completion failed, deleting stored conversation document"
        );
        self.documents.delete(stored.document).await
    }
}
