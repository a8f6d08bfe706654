//! The per-invocation turn: initialize, load history, call the model, store, complete.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::context::{AgentContext, AgentState};
use crate::error::{AgentError, ErrorCode, Result};
use crate::framework::FrameworkAdapter;
use crate::gateway::GatewayToolHandlerRegistry;
use crate::limits::{DefaultLimitsValidator, LimitsValidator};
use crate::memory::{MessageWindowRuntimeMemory, RuntimeMemory, DEFAULT_CONTEXT_WINDOW_SIZE};
use crate::request::{validate_context_window_size, AgentExecutionContext};
use crate::store::{ConversationSession, ConversationStoreRegistry};
use crate::tools::{AdHocToolsSchemaResolver, AgentToolsResolver};
use crate::types::{Message, ToolCallResult};

use super::initializer::{AgentInitializationResult, AgentInitializer};
use super::messages::AgentMessagesHandler;
use super::response::AgentResponseHandler;
use super::strategy::{ProceedPolicy, TurnCompleter, TurnOutcome};

/// Runs agent turns against a model through a [`FrameworkAdapter`].
pub struct AgentRequestHandler<C> {
    initializer: AgentInitializer,
    gateways: Arc<GatewayToolHandlerRegistry>,
    stores: ConversationStoreRegistry,
    limits: Arc<dyn LimitsValidator>,
    messages: AgentMessagesHandler,
    adapter: Arc<dyn FrameworkAdapter>,
    responses: AgentResponseHandler,
    policy: ProceedPolicy,
    completer: C,
    context_window_size: usize,
}

impl<C> std::fmt::Debug for AgentRequestHandler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRequestHandler")
            .field("stores", &self.stores)
            .field("gateways", &self.gateways.handler_types())
            .field("policy", &self.policy)
            .field("context_window_size", &self.context_window_size)
            .finish_non_exhaustive()
    }
}

impl<C: TurnCompleter> AgentRequestHandler<C> {
    /// Handler without gateways, with the in-process store and default limits.
    pub fn new(
        adapter: Arc<dyn FrameworkAdapter>,
        tools_schema: Arc<dyn AdHocToolsSchemaResolver>,
        completer: C,
    ) -> Self {
        Self::with_gateways(adapter, tools_schema, GatewayToolHandlerRegistry::new(), completer)
    }

    pub fn with_gateways(
        adapter: Arc<dyn FrameworkAdapter>,
        tools_schema: Arc<dyn AdHocToolsSchemaResolver>,
        gateways: GatewayToolHandlerRegistry,
        completer: C,
    ) -> Self {
        let gateways = Arc::new(gateways);
        let tools = Arc::new(AgentToolsResolver::new(tools_schema, Arc::clone(&gateways)));
        Self {
            initializer: AgentInitializer::new(tools, Arc::clone(&gateways)),
            messages: AgentMessagesHandler::new(Arc::clone(&gateways)),
            gateways,
            stores: ConversationStoreRegistry::new(),
            limits: Arc::new(DefaultLimitsValidator::default()),
            adapter,
            responses: AgentResponseHandler::new(),
            policy: ProceedPolicy::default(),
            completer,
            context_window_size: DEFAULT_CONTEXT_WINDOW_SIZE,
        }
    }

    pub fn with_stores(mut self, stores: ConversationStoreRegistry) -> Self {
        self.stores = stores;
        self
    }

    pub fn with_limits(mut self, limits: Arc<dyn LimitsValidator>) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_policy(mut self, policy: ProceedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Window size used when a request configures none.
    pub fn with_context_window_size(mut self, size: usize) -> Self {
        self.context_window_size = size;
        self
    }

    /// Run one turn and hand its outcome to the completer.
    pub async fn handle_request(&self, execution: &AgentExecutionContext) -> Result<C::Output> {
        execution.request.validate()?;
        let (agent_context, tool_call_results) = match self.initializer.initialize(execution).await? {
            AgentInitializationResult::Ready {
                agent_context,
                tool_call_results,
            } => (agent_context, tool_call_results),
            AgentInitializationResult::DirectResponse(response) => {
                debug!(tool_calls = response.tool_calls.len(), "returning initialization response");
                return self.completer.complete(execution, TurnOutcome::response(response)).await;
            }
            AgentInitializationResult::DiscoveryInProgress => {
                return self.completer.complete(execution, TurnOutcome::none()).await;
            }
        };

        let store = self.stores.store(execution.memory_storage())?;
        let session = store.session(execution, &agent_context).await?;

        let Some((outcome, agent_context)) = self
            .execute_turn(execution, session.as_ref(), agent_context, tool_call_results)
            .await?
        else {
            return self.completer.complete(execution, TurnOutcome::none()).await;
        };

        match self.completer.complete(execution, outcome).await {
            Ok(output) => Ok(output),
            Err(err) => {
                warn!(error = %err, "turn completion failed, compensating stored conversation");
                if let Err(compensation_err) = session
                    .compensate_failed_job_completion(execution, &agent_context, &err)
                    .await
                {
                    warn!(error = %compensation_err, "failed to compensate stored conversation");
                }
                Err(err)
            }
        }
    }

    /// Returns `None` when there was nothing to send to the model under an awaiting policy.
    async fn execute_turn(
        &self,
        execution: &AgentExecutionContext,
        session: &dyn ConversationSession,
        agent_context: AgentContext,
        tool_call_results: Vec<ToolCallResult>,
    ) -> Result<Option<(TurnOutcome, AgentContext)>> {
        let window = execution
            .request
            .memory
            .context_window_size
            .unwrap_or(self.context_window_size);
        validate_context_window_size(window)?;
        let mut memory = MessageWindowRuntimeMemory::new(window);
        session.load_into_runtime_memory(&agent_context, &mut memory).await?;
        trace!(messages = memory.messages().len(), "loaded conversation into runtime memory");

        self.limits.validate(execution, &agent_context)?;

        self.messages.add_system_message(execution, &mut memory)?;
        let results_supplied = !tool_call_results.is_empty();
        let added = self
            .messages
            .add_user_messages(execution, &agent_context, &mut memory, tool_call_results)?;
        if added.is_empty() {
            return match self.policy {
                ProceedPolicy::AwaitMoreInput => {
                    debug!("no user content to add, waiting for more input");
                    Ok(None)
                }
                ProceedPolicy::RequireUserContent => Err(no_content_error(&memory, results_supplied)),
            };
        }
        let cancel_remaining_instances = added.iter().any(has_interrupted_results);

        let chat = self
            .adapter
            .execute_chat_request(execution, agent_context, &memory)
            .await
            .map_err(AgentError::model_call)?;
        let agent_context = chat.agent_context;
        debug!(
            model_calls = agent_context.metrics.model_calls,
            tool_calls = chat.assistant_message.tool_calls.len(),
            "executed chat request"
        );

        memory.add_message(Message::Assistant(chat.assistant_message.clone()));
        let tool_calls = self
            .gateways
            .transform_tool_calls(&agent_context, chat.assistant_message.tool_calls.clone());
        let state = if tool_calls.is_empty() {
            AgentState::Ready
        } else {
            AgentState::WaitingForToolInput
        };

        let agent_context = session
            .store_from_runtime_memory(agent_context.with_state(state), &memory)
            .await?;
        debug!(state = %agent_context.state, "stored conversation");

        let response = self
            .responses
            .create_response(execution, agent_context.clone(), chat.assistant_message, tool_calls)?;
        Ok(Some((
            TurnOutcome {
                response: Some(response),
                cancel_remaining_instances,
            },
            agent_context,
        )))
    }
}

fn no_content_error(memory: &dyn RuntimeMemory, results_supplied: bool) -> AgentError {
    let waiting_for_results = memory
        .last_message()
        .and_then(Message::as_assistant)
        .is_some_and(|assistant| assistant.has_tool_calls());

    if waiting_for_results && !results_supplied {
        AgentError::agent(
            ErrorCode::WaitingForToolInputEmptyResults,
            "Agent is waiting for tool input, but tool call results were empty. \
             Is the tool feedback loop configured correctly?",
        )
    } else {
        AgentError::agent(
            ErrorCode::NoUserMessageContent,
            "Agent cannot proceed as no user message content (user message, tool call results) is left to add.",
        )
    }
}

fn has_interrupted_results(message: &Message) -> bool {
    match message {
        Message::ToolCallResult(results) => results.results.iter().any(ToolCallResult::is_interrupted),
        _ => false,
    }
}
