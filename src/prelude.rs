//! Convenience re-exports for common use.

pub use crate::agent::{
    AgentRequestHandler, AgentResponse, JobClient, JobCompletion, JobWorkerCompletion, OutboundCompletion,
    ProceedPolicy,
};
pub use crate::config::EngineConfig;
pub use crate::context::{AgentContext, AgentState, ConversationContext};
pub use crate::error::{AgentError, ErrorCode, Result};
pub use crate::framework::{ChatResponse, FrameworkAdapter};
pub use crate::gateway::{GatewayToolHandlerRegistry, McpClientGatewayToolHandler};
pub use crate::memory::{MessageWindowRuntimeMemory, RuntimeMemory};
pub use crate::request::{
    AgentExecutionContext, AgentRequest, MemoryStorageConfiguration, ResponseConfiguration,
    ResponseFormatConfiguration, UserPromptConfiguration,
};
pub use crate::store::ConversationStoreRegistry;
pub use crate::tools::{AdHocToolsSchema, StaticToolsSchemaResolver};
pub use crate::types::{AssistantMessage, Content, Message, ToolCall, ToolCallResult, ToolDefinition};
