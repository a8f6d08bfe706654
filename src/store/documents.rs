//! Document stores backing the document conversation store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::types::{checksum, Document, DocumentMetadata};

/// Metadata key under which stores record the expiry of a document.
pub const PROPERTY_EXPIRES_AT: &str = "expiresAt";

/// Content and metadata of a document to create.
#[derive(Debug, Clone, Default)]
pub struct DocumentCreationRequest {
    pub content: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub custom_properties: Map<String, Value>,
    pub time_to_live: Option<Duration>,
}

impl DocumentCreationRequest {
    fn into_parts(self, id: &str) -> (Document, Vec<u8>) {
        let mut custom_properties = self.custom_properties;
        if let Some(ttl) = self.time_to_live {
            if let Ok(ttl) = chrono::Duration::from_std(ttl) {
                custom_properties.insert(
                    PROPERTY_EXPIRES_AT.to_string(),
                    Value::String((Utc::now() + ttl).to_rfc3339()),
                );
            }
        }
        let metadata = DocumentMetadata {
            content_type: self.content_type,
            file_name: self.file_name,
            size: Some(self.content.len() as u64),
            checksum: Some(checksum(&self.content)),
            custom_properties,
        };
        (Document::reference(id, metadata), self.content)
    }
}

/// Storage abstraction for documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, request: DocumentCreationRequest) -> Result<Document>;
    async fn read(&self, document: &Document) -> Result<Vec<u8>>;
    async fn delete(&self, document: &Document) -> Result<()>;
}

fn ensure_not_expired(document: &Document) -> Result<()> {
    let expires_at = document
        .metadata
        .custom_properties
        .get(PROPERTY_EXPIRES_AT)
        .and_then(Value::as_str)
        .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
        .map(|at| at.with_timezone(&Utc));
    match expires_at {
        Some(at) if at < Utc::now() => Err(AgentError::Storage(format!(
            "Document '{}' expired at {at}",
            document.id
        ))),
        _ => Ok(()),
    }
}

/// Documents held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, document: &Document) -> bool {
        self.documents
            .lock()
            .map(|docs| docs.contains_key(&document.id))
            .unwrap_or(false)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.documents
            .lock()
            .map_err(|_| AgentError::Storage("document store lock poisoned".into()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, request: DocumentCreationRequest) -> Result<Document> {
        let (document, content) = request.into_parts(&Uuid::new_v4().to_string());
        self.lock()?.insert(document.id.clone(), content);
        Ok(document)
    }

    async fn read(&self, document: &Document) -> Result<Vec<u8>> {
        ensure_not_expired(document)?;
        let content = self
            .lock()?
            .get(&document.id)
            .cloned()
            .ok_or_else(|| AgentError::Storage(format!("Document '{}' not found", document.id)))?;
        document.verify(&content)?;
        Ok(content)
    }

    async fn delete(&self, document: &Document) -> Result<()> {
        self.lock()?.remove(&document.id);
        Ok(())
    }
}

/// One file per document under a base directory.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    base_dir: PathBuf,
}

impl FileDocumentStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Store under `~/.agentic/documents`.
    pub fn new_default() -> Self {
        Self::new(default_documents_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn document_path(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(AgentError::Storage(format!("Invalid document id '{id}'")));
        }
        Ok(self.base_dir.join(format!("{id}.bin")))
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn create(&self, request: DocumentCreationRequest) -> Result<Document> {
        let (document, content) = request.into_parts(&Uuid::new_v4().to_string());
        let path = self.document_path(&document.id)?;
        tokio::fs::create_dir_all(&self.base_dir).await.map_err(|err| {
            AgentError::Storage(format!(
                "failed to create `{}`: {err}",
                self.base_dir.display()
            ))
        })?;
        tokio::fs::write(&path, &content).await.map_err(|err| {
            AgentError::Storage(format!("failed to write `{}`: {err}", path.display()))
        })?;
        Ok(document)
    }

    async fn read(&self, document: &Document) -> Result<Vec<u8>> {
        ensure_not_expired(document)?;
        let path = self.document_path(&document.id)?;
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AgentError::Storage(format!(
                    "Document '{}' not found",
                    document.id
                )))
            }
            Err(err) => {
                return Err(AgentError::Storage(format!(
                    "failed to read `{}`: {err}",
                    path.display()
                )))
            }
        };
        document.verify(&content)?;
        Ok(content)
    }

    async fn delete(&self, document: &Document) -> Result<()> {
        let path = self.document_path(&document.id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AgentError::Storage(format!(
                "failed to delete `{}`: {err}",
                path.display()
            ))),
        }
    }
}

/// `~/.agentic/documents`, or a relative fallback without a home directory.
pub fn default_documents_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".agentic").join("documents"))
        .unwrap_or_else(|| PathBuf::from(".agentic").join("documents"))
}
