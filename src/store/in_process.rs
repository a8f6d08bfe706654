//! Store keeping the whole history inside the agent context.

use async_trait::async_trait;

use crate::context::{AgentContext, ConversationContext};
use crate::error::{AgentError, Result};
use crate::memory::RuntimeMemory;
use crate::request::AgentExecutionContext;

use super::{ensure_store_type, ConversationSession, ConversationStore};

pub const STORE_TYPE: &str = "in-process";

/// History travels with the context; nothing is written elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessConversationStore;

#[async_trait]
impl ConversationStore for InProcessConversationStore {
    fn store_type(&self) -> &str {
        STORE_TYPE
    }

    async fn session(
        &self,
        _execution: &AgentExecutionContext,
        _agent_context: &AgentContext,
    ) -> Result<Box<dyn ConversationSession>> {
        Ok(Box::new(InProcessConversationSession))
    }
}

#[derive(Debug, Clone, Copy)]
struct InProcessConversationSession;

#[async_trait]
impl ConversationSession for InProcessConversationSession {
    async fn load_into_runtime_memory(
        &self,
        agent_context: &AgentContext,
        memory: &mut dyn RuntimeMemory,
    ) -> Result<()> {
        if let Some(ConversationContext::InProcess { messages }) =
            ensure_store_type(agent_context, STORE_TYPE)?
        {
            memory.add_messages(messages.clone());
        }
        Ok(())
    }

    async fn store_from_runtime_memory(
        &self,
        agent_context: AgentContext,
        memory: &dyn RuntimeMemory,
    ) -> Result<AgentContext> {
        ensure_store_type(&agent_context, STORE_TYPE)?;
        Ok(agent_context.with_conversation(ConversationContext::InProcess {
            messages: memory.messages().to_vec(),
        }))
    }

    async fn compensate_failed_job_completion(
        &self,
        _execution: &AgentExecutionContext,
        _agent_context: &AgentContext,
        _error: &AgentError,
    ) -> Result<()> {
        // nothing was written outside the context
        Ok(())
    }
}
