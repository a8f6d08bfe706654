//! Engine configuration (layered: defaults < TOML file < environment).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::limits::DEFAULT_MAX_MODEL_CALLS;
use crate::memory::DEFAULT_CONTEXT_WINDOW_SIZE;
use crate::request::{validate_context_window_size, validate_max_model_calls};
use crate::store::documents::default_documents_dir;
use crate::store::{ConversationStoreRegistry, DocumentConversationStore, FileDocumentStore};

pub const ENV_CONTEXT_WINDOW_SIZE: &str = "AGENTIC_CONTEXT_WINDOW_SIZE";
pub const ENV_MAX_MODEL_CALLS: &str = "AGENTIC_MAX_MODEL_CALLS";
pub const ENV_DOCUMENTS_DIR: &str = "AGENTIC_DOCUMENTS_DIR";
pub const ENV_PREVIOUS_DOCUMENTS_RETENTION: &str = "AGENTIC_PREVIOUS_DOCUMENTS_RETENTION";
pub const ENV_OPENAI_MODEL: &str = "AGENTIC_OPENAI_MODEL";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";

/// Every environment variable read by [`EngineConfig::apply_env`].
pub const ENV_VARS: [&str; 7] = [
    ENV_CONTEXT_WINDOW_SIZE,
    ENV_MAX_MODEL_CALLS,
    ENV_DOCUMENTS_DIR,
    ENV_PREVIOUS_DOCUMENTS_RETENTION,
    ENV_OPENAI_MODEL,
    ENV_OPENAI_API_KEY,
    ENV_OPENAI_BASE_URL,
];

const DEFAULT_PREVIOUS_DOCUMENTS_RETENTION: usize = 2;

/// Engine-wide defaults. Request configuration overrides the window size and model call limit.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub context_window_size: usize,
    pub max_model_calls: u32,
    pub documents_dir: PathBuf,
    pub previous_documents_retention: usize,
    pub openai_base_url: Option<String>,
    pub openai_model: Option<String>,
    pub openai_api_key: Option<String>,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("context_window_size", &self.context_window_size)
            .field("max_model_calls", &self.max_model_calls)
            .field("documents_dir", &self.documents_dir)
            .field("previous_documents_retention", &self.previous_documents_retention)
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| ".."))
            .finish()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context_window_size: DEFAULT_CONTEXT_WINDOW_SIZE,
            max_model_calls: DEFAULT_MAX_MODEL_CALLS,
            documents_dir: default_documents_dir(),
            previous_documents_retention: DEFAULT_PREVIOUS_DOCUMENTS_RETENTION,
            openai_base_url: None,
            openai_model: None,
            openai_api_key: None,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML file; missing keys keep their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw).map_err(|err| {
            AgentError::Configuration(format!("Invalid config file {}: {err}", path.display()))
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|err| AgentError::Configuration(err.to_string()))?;
        config.validated()
    }

    fn validated(self) -> Result<Self> {
        validate_context_window_size(self.context_window_size)
            .and_then(|()| validate_max_model_calls(self.max_model_calls))
            .map_err(|err| match err {
                AgentError::InvalidArgument(message) => AgentError::Configuration(message),
                other => other,
            })?;
        Ok(self)
    }

    /// Defaults, then the optional TOML file, then `.env` and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())
    }

    /// Override fields from environment-style variables looked up through `lookup`.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = lookup(ENV_CONTEXT_WINDOW_SIZE) {
            self.context_window_size = parse_env(ENV_CONTEXT_WINDOW_SIZE, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_MODEL_CALLS) {
            self.max_model_calls = parse_env(ENV_MAX_MODEL_CALLS, &value)?;
        }
        if let Some(value) = lookup(ENV_DOCUMENTS_DIR) {
            self.documents_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_PREVIOUS_DOCUMENTS_RETENTION) {
            self.previous_documents_retention = parse_env(ENV_PREVIOUS_DOCUMENTS_RETENTION, &value)?;
        }
        if let Some(value) = lookup(ENV_OPENAI_MODEL) {
            self.openai_model = Some(value);
        }
        if let Some(value) = lookup(ENV_OPENAI_API_KEY) {
            self.openai_api_key = Some(value);
        }
        if let Some(value) = lookup(ENV_OPENAI_BASE_URL) {
            self.openai_base_url = Some(value);
        }
        self.validated()
    }

    /// In-process store plus a document store backed by files under `documents_dir`.
    pub fn conversation_stores(&self) -> ConversationStoreRegistry {
        let documents = Arc::new(FileDocumentStore::new(self.documents_dir.clone()));
        ConversationStoreRegistry::new().with_store(Arc::new(
            DocumentConversationStore::new(documents)
                .with_previous_documents_retention(self.previous_documents_retention),
        ))
    }

    #[cfg(feature = "openai")]
    pub fn openai_adapter(&self) -> Result<crate::framework::OpenAiChatAdapter> {
        crate::framework::OpenAiChatAdapter::new(
            self.openai_api_key.clone().unwrap_or_default(),
            self.openai_model
                .clone()
                .unwrap_or_else(|| crate::framework::openai::DEFAULT_MODEL.to_string()),
            self.openai_base_url.clone(),
        )
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| AgentError::Configuration(format!("Invalid value for {key} ('{value}'): {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_engine_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.context_window_size, 20);
        assert_eq!(config.max_model_calls, 10);
        assert_eq!(config.previous_documents_retention, 2);
        assert!(config.documents_dir.ends_with(".agentic/documents"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("max_model_calls = 3\nopenai_model = \"gpt-4o\"\n").unwrap();
        assert_eq!(config.max_model_calls, 3);
        assert_eq!(config.openai_model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.context_window_size, 20);
    }

    #[test]
    fn invalid_toml_is_a_configuration_error() {
        let err = EngineConfig::from_toml_str("max_model_calls = \"many\"").unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn toml_file_is_read_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "context_window_size = 8\ndocuments_dir = \"/tmp/agentic-docs\"\n").unwrap();

        let config = EngineConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.context_window_size, 8);
        assert_eq!(config.documents_dir, PathBuf::from("/tmp/agentic-docs"));
    }

    #[test]
    fn environment_overrides_file_values() {
        let config = EngineConfig::from_toml_str("max_model_calls = 3")
            .unwrap()
            .apply_env(env(&[
                (ENV_MAX_MODEL_CALLS, "7"),
                (ENV_OPENAI_API_KEY, "sk-env"),
                (ENV_OPENAI_BASE_URL, "http://localhost:11434/v1"),
                (ENV_CONTEXT_WINDOW_SIZE, " "),
            ]))
            .unwrap();

        assert_eq!(config.max_model_calls, 7);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.openai_base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(config.context_window_size, 20);
    }

    #[test]
    fn out_of_range_window_and_limit_fail() {
        let err = EngineConfig::from_toml_str("context_window_size = 2").unwrap_err();
        assert!(matches!(&err, AgentError::Configuration(m) if m.contains("contextWindowSize")));

        let err = EngineConfig::default()
            .apply_env(env(&[(ENV_MAX_MODEL_CALLS, "0")]))
            .unwrap_err();
        assert!(matches!(&err, AgentError::Configuration(m) if m.contains("maxModelCalls")));
    }

    #[test]
    fn unparsable_environment_value_fails() {
        let err = EngineConfig::default()
            .apply_env(env(&[(ENV_CONTEXT_WINDOW_SIZE, "twenty")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_CONTEXT_WINDOW_SIZE));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = EngineConfig {
            openai_api_key: Some("sk-secret".into()),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("sk-secret"));
    }

    #[test]
    fn registry_serves_document_storage() {
        let stores = EngineConfig::default().conversation_stores();
        let config = crate::request::MemoryStorageConfiguration::Document {
            time_to_live_secs: None,
            custom_properties: serde_json::Map::new(),
        };
        assert!(stores.store(&config).is_ok());
    }

    #[cfg(feature = "openai")]
    #[test]
    fn adapter_requires_api_key() {
        let err = EngineConfig::default().openai_adapter().unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: OpenAI API key is not set");
    }
}
