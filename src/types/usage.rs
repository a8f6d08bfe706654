//! Token usage and per-conversation metrics.

use serde::{Deserialize, Serialize};

/// Token usage reported by the model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    /// Merge another usage into this one (accumulate).
    pub fn merge(&mut self, other: &TokenUsage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

/// Accumulated metrics of a conversation. Counters only ever grow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetrics {
    #[serde(default)]
    pub model_calls: u32,
    #[serde(default)]
    pub token_usage: TokenUsage,
}

impl AgentMetrics {
    pub fn new(model_calls: u32, token_usage: TokenUsage) -> Self {
        Self {
            model_calls,
            token_usage,
        }
    }

    pub fn increment_model_calls(self, by: u32) -> Self {
        Self {
            model_calls: self.model_calls.saturating_add(by),
            ..self
        }
    }

    pub fn increment_token_usage(self, usage: TokenUsage) -> Self {
        let mut token_usage = self.token_usage;
        token_usage.merge(&usage);
        Self {
            token_usage,
            ..self
        }
    }
}
