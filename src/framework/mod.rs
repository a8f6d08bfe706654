//! Framework adapters: the seam between the engine and a chat model API.

#[cfg(feature = "openai")]
pub(crate) mod http;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAiChatAdapter;

use async_trait::async_trait;

use crate::context::AgentContext;
use crate::error::Result;
use crate::memory::RuntimeMemory;
use crate::request::AgentExecutionContext;
use crate::types::AssistantMessage;

/// Reply of one chat request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    /// Context with metrics incremented for this call.
    pub agent_context: AgentContext,
    pub assistant_message: AssistantMessage,
}

/// Executes one chat request against a model.
///
/// Implementations send `memory.filtered_messages()` together with the context's
/// tool definitions, and return the context with `model_calls` increased by one
/// and the reported token usage added.
#[async_trait]
pub trait FrameworkAdapter: Send + Sync {
    async fn execute_chat_request(
        &self,
        execution: &AgentExecutionContext,
        agent_context: AgentContext,
        memory: &dyn RuntimeMemory,
    ) -> Result<ChatResponse>;
}
