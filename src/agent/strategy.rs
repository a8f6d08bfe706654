//! How a turn proceeds without new input, and how its outcome is handed back to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::request::AgentExecutionContext;
use crate::types::ToolCall;

use super::response::AgentResponse;

/// What to do when a turn has no user content or tool call results to send to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProceedPolicy {
    /// Fail the turn: the caller requested no useful work.
    #[default]
    RequireUserContent,
    /// Return no response and wait for the next invocation.
    AwaitMoreInput,
}

/// Result of a turn before it is handed to a [`TurnCompleter`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TurnOutcome {
    pub response: Option<AgentResponse>,
    /// A pending tool call was cancelled by an event.
    pub cancel_remaining_instances: bool,
}

impl TurnOutcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn response(response: AgentResponse) -> Self {
        Self {
            response: Some(response),
            cancel_remaining_instances: false,
        }
    }
}

/// Hands the outcome of a turn to the caller.
///
/// Runs after the conversation was stored. An error here triggers the session's
/// compensation hook.
#[async_trait]
pub trait TurnCompleter: Send + Sync {
    type Output: Send;

    async fn complete(&self, execution: &AgentExecutionContext, outcome: TurnOutcome) -> Result<Self::Output>;
}

/// Returns the response as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutboundCompletion;

#[async_trait]
impl TurnCompleter for OutboundCompletion {
    type Output = Option<AgentResponse>;

    async fn complete(&self, _execution: &AgentExecutionContext, outcome: TurnOutcome) -> Result<Self::Output> {
        Ok(outcome.response)
    }
}

pub const VARIABLE_AGENT: &str = "agent";
pub const VARIABLE_AGENT_CONTEXT: &str = "agentContext";
pub const VARIABLE_TOOL_CALL_RESULTS: &str = "toolCallResults";
pub const VARIABLE_TOOL_CALL: &str = "toolCall";
const TOOL_CALL_META: &str = "_meta";

/// Activation of one process element, running a tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementActivation {
    pub element_id: String,
    pub variables: Map<String, Value>,
}

impl ElementActivation {
    /// Activation of the element named like the tool, carrying the call id, name and arguments.
    pub fn for_tool_call(tool_call: &ToolCall) -> Self {
        let mut call = Map::new();
        call.insert(
            TOOL_CALL_META.to_string(),
            json!({"id": tool_call.id, "name": tool_call.name}),
        );
        call.extend(tool_call.arguments.clone());

        let mut variables = Map::new();
        variables.insert(VARIABLE_TOOL_CALL.to_string(), Value::Object(call));
        Self {
            element_id: tool_call.name.clone(),
            variables,
        }
    }
}

/// Completion command for the job that ran the turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct JobCompletion {
    pub variables: Map<String, Value>,
    pub completion_condition_fulfilled: bool,
    pub cancel_remaining_instances: bool,
    pub element_activations: Vec<ElementActivation>,
}

impl JobCompletion {
    pub fn from_outcome(outcome: &TurnOutcome) -> Result<Self> {
        let mut completion = Self {
            cancel_remaining_instances: outcome.cancel_remaining_instances,
            ..Self::default()
        };
        let Some(response) = &outcome.response else {
            return Ok(completion);
        };

        if response.has_tool_calls() {
            completion.variables.insert(
                VARIABLE_AGENT_CONTEXT.to_string(),
                serde_json::to_value(&response.context)?,
            );
            completion
                .variables
                .insert(VARIABLE_TOOL_CALL_RESULTS.to_string(), Value::Array(Vec::new()));
            completion.element_activations = response.tool_calls.iter().map(ElementActivation::for_tool_call).collect();
        } else {
            completion
                .variables
                .insert(VARIABLE_AGENT.to_string(), serde_json::to_value(response)?);
            completion.completion_condition_fulfilled = true;
        }
        Ok(completion)
    }
}

/// Commits job completions to the process engine.
#[async_trait]
pub trait JobClient: Send + Sync {
    async fn complete_job(&self, execution: &AgentExecutionContext, completion: JobCompletion) -> Result<()>;
}

/// Completes the job that triggered the turn.
#[derive(Clone)]
pub struct JobWorkerCompletion {
    client: Arc<dyn JobClient>,
}

impl std::fmt::Debug for JobWorkerCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobWorkerCompletion").finish_non_exhaustive()
    }
}

impl JobWorkerCompletion {
    pub fn new(client: Arc<dyn JobClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TurnCompleter for JobWorkerCompletion {
    type Output = JobCompletion;

    async fn complete(&self, execution: &AgentExecutionContext, outcome: TurnOutcome) -> Result<Self::Output> {
        let completion = JobCompletion::from_outcome(&outcome)?;
        self.client.complete_job(execution, completion.clone()).await?;
        Ok(completion)
    }
}
