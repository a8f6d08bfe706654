//! Document references attached to prompts or holding persisted conversations.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AgentError, Result};

/// A document known to a document store, optionally with inline content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Store-assigned identifier.
    pub id: String,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    /// Base64-encoded inline content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Hex-encoded SHA-256 of the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub custom_properties: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// A reference to a stored document, without inline content.
    pub fn reference(id: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            id: id.into(),
            metadata,
            data: None,
        }
    }

    /// A document carrying its content inline.
    pub fn inline(id: impl Into<String>, content_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            id: id.into(),
            metadata: DocumentMetadata {
                content_type: Some(content_type.into()),
                size: Some(bytes.len() as u64),
                checksum: Some(checksum(bytes)),
                ..Default::default()
            },
            data: Some(STANDARD.encode(bytes)),
        }
    }

    /// Decode inline content, if present.
    pub fn bytes(&self) -> Result<Option<Vec<u8>>> {
        self.data
            .as_deref()
            .map(|encoded| {
                STANDARD.decode(encoded).map_err(|e| {
                    AgentError::InvalidArgument(format!(
                        "Document '{}' has invalid inline content: {e}",
                        self.id
                    ))
                })
            })
            .transpose()
    }

    /// Check `bytes` against the recorded checksum. Documents without one always pass.
    pub fn verify(&self, bytes: &[u8]) -> Result<()> {
        match self.metadata.checksum.as_deref() {
            Some(expected) if expected != checksum(bytes) => Err(AgentError::Storage(format!(
                "Checksum mismatch for document '{}'",
                self.id
            ))),
            _ => Ok(()),
        }
    }
}

/// Hex-encoded SHA-256 digest.
pub fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
