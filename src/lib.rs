//! Agentic: conversational agent execution engine
//!
//! Runs one tool-using turn per invocation. All conversation state travels in an
//! [`AgentContext`](context::AgentContext) that the caller hands back on the next
//! call, so turns can be driven by stateless workers: initialize tools (including
//! gateway discovery), load history into a bounded runtime memory, call the model
//! through a [`FrameworkAdapter`](framework::FrameworkAdapter), store the history
//! and return either a final answer or tool calls to execute.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentic::prelude::*;
//!
//! # async fn example() -> agentic::error::Result<()> {
//! let config = EngineConfig::load(None)?;
//! let handler = AgentRequestHandler::new(
//!     Arc::new(config.openai_adapter()?),
//!     Arc::new(StaticToolsSchemaResolver::new()),
//!     OutboundCompletion,
//! );
//! let execution = AgentExecutionContext::new(AgentRequest {
//!     user_prompt: UserPromptConfiguration::new("Hello!"),
//!     ..Default::default()
//! });
//! if let Some(response) = handler.handle_request(&execution).await? {
//!     println!("{:?}", response.response_text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod context;
pub mod error;
pub mod framework;
pub mod gateway;
pub mod limits;
pub mod memory;
pub mod prelude;
pub mod request;
pub mod store;
pub mod template;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
