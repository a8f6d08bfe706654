//! Registry composing all gateway tool handlers.

use std::sync::Arc;

use tracing::debug;

use crate::context::AgentContext;
use crate::error::{AgentError, Result};
use crate::types::{ToolCall, ToolCallResult};

use super::{
    GatewayToolDefinition, GatewayToolDefinitionUpdates, GatewayToolDiscoveryInitiationResult,
    GatewayToolHandler,
};

const RESERVED_TYPE: &str = "_default";

/// Ordered set of gateway handlers. Every operation fans out to all handlers.
#[derive(Clone, Default)]
pub struct GatewayToolHandlerRegistry {
    handlers: Vec<Arc<dyn GatewayToolHandler>>,
}

impl std::fmt::Debug for GatewayToolHandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayToolHandlerRegistry")
            .field("types", &self.handler_types())
            .finish()
    }
}

impl GatewayToolHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the given handlers, in order.
    pub fn with_handlers(handlers: Vec<Arc<dyn GatewayToolHandler>>) -> Result<Self> {
        let mut registry = Self::new();
        for handler in handlers {
            registry.register(handler)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, handler: Arc<dyn GatewayToolHandler>) -> Result<()> {
        let gateway_type = handler.gateway_type();
        if gateway_type.trim().is_empty() || gateway_type == RESERVED_TYPE {
            return Err(AgentError::InvalidArgument(format!(
                "Invalid gateway tool handler type: '{gateway_type}'"
            )));
        }
        if self.handlers.iter().any(|h| h.gateway_type() == gateway_type) {
            return Err(AgentError::InvalidArgument(format!(
                "Duplicate gateway tool handler type: '{gateway_type}'"
            )));
        }
        self.handlers.push(handler);
        Ok(())
    }

    pub fn handler_types(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.gateway_type()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn is_gateway_managed(&self, agent_context: &AgentContext, tool_name: &str) -> bool {
        self.handlers
            .iter()
            .any(|h| h.is_gateway_managed(agent_context, tool_name))
    }

    /// Fold the context through every handler and collect all discovery calls.
    pub fn initiate_tool_discovery(
        &self,
        agent_context: AgentContext,
        gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> GatewayToolDiscoveryInitiationResult {
        let mut agent_context = agent_context;
        let mut tool_discovery_tool_calls = Vec::new();
        for handler in &self.handlers {
            let result = handler.initiate_tool_discovery(agent_context, gateway_tool_definitions);
            agent_context = result.agent_context;
            tool_discovery_tool_calls.extend(result.tool_discovery_tool_calls);
        }
        GatewayToolDiscoveryInitiationResult {
            agent_context,
            tool_discovery_tool_calls,
        }
    }

    /// True when every handler has all its discovery results (or there are no handlers).
    pub fn all_tool_discovery_results_present(
        &self,
        agent_context: &AgentContext,
        tool_call_results: &[ToolCallResult],
    ) -> bool {
        self.handlers
            .iter()
            .all(|h| h.all_tool_discovery_results_present(agent_context, tool_call_results))
    }

    /// Consume discovery results, appending the discovered tools to the context.
    ///
    /// Returns the updated context and the results no handler claimed.
    pub fn handle_tool_discovery_results(
        &self,
        agent_context: AgentContext,
        tool_call_results: Vec<ToolCallResult>,
    ) -> Result<(AgentContext, Vec<ToolCallResult>)> {
        let mut remaining = tool_call_results;
        let mut tool_definitions = agent_context.tool_definitions.clone();

        for handler in &self.handlers {
            let (discovery, rest): (Vec<_>, Vec<_>) = remaining
                .into_iter()
                .partition(|result| handler.handles_tool_discovery_result(result));
            remaining = rest;
            if discovery.is_empty() {
                continue;
            }
            let discovered = handler.handle_tool_discovery_results(&agent_context, &discovery)?;
            debug!(
                gateway_type = handler.gateway_type(),
                discovered = discovered.len(),
                "handled tool discovery results"
            );
            tool_definitions.extend(discovered);
        }

        Ok((
            agent_context.with_tool_definitions(tool_definitions),
            remaining,
        ))
    }

    pub fn transform_tool_calls(&self, agent_context: &AgentContext, tool_calls: Vec<ToolCall>) -> Vec<ToolCall> {
        self.handlers
            .iter()
            .fold(tool_calls, |calls, h| h.transform_tool_calls(agent_context, calls))
    }

    pub fn transform_tool_call_results(
        &self,
        agent_context: &AgentContext,
        tool_call_results: Vec<ToolCallResult>,
    ) -> Vec<ToolCallResult> {
        self.handlers.iter().fold(tool_call_results, |results, h| {
            h.transform_tool_call_results(agent_context, results)
        })
    }

    /// Non-empty updates keyed by gateway type, in registration order.
    pub fn resolve_updated_gateway_tool_definitions(
        &self,
        agent_context: &AgentContext,
        gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> Vec<(String, GatewayToolDefinitionUpdates)> {
        self.handlers
            .iter()
            .map(|h| {
                (
                    h.gateway_type().to_string(),
                    h.resolve_updated_gateway_tool_definitions(agent_context, gateway_tool_definitions),
                )
            })
            .filter(|(_, updates)| !updates.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolDefinition;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map};

    /// Handler claiming results whose id starts with `<type>_`.
    struct PrefixHandler {
        gateway_type: String,
        discovery_present: bool,
        updates: GatewayToolDefinitionUpdates,
    }

    impl PrefixHandler {
        fn new(gateway_type: &str) -> Self {
            Self {
                gateway_type: gateway_type.to_string(),
                discovery_present: true,
                updates: GatewayToolDefinitionUpdates::empty(),
            }
        }

        fn prefix(&self) -> String {
            format!("{}_", self.gateway_type)
        }
    }

    impl GatewayToolHandler for PrefixHandler {
        fn gateway_type(&self) -> &str {
            &self.gateway_type
        }

        fn is_gateway_managed(&self, _: &AgentContext, tool_name: &str) -> bool {
            tool_name.starts_with(&self.prefix())
        }

        fn initiate_tool_discovery(
            &self,
            agent_context: AgentContext,
            _gateway_tool_definitions: &[GatewayToolDefinition],
        ) -> GatewayToolDiscoveryInitiationResult {
            GatewayToolDiscoveryInitiationResult {
                agent_context: agent_context.with_property(self.gateway_type.clone(), true),
                tool_discovery_tool_calls: vec![ToolCall::new(
                    format!("{}discover", self.prefix()),
                    self.gateway_type.clone(),
                    Map::new(),
                )],
            }
        }

        fn all_tool_discovery_results_present(&self, _: &AgentContext, _: &[ToolCallResult]) -> bool {
            self.discovery_present
        }

        fn handles_tool_discovery_result(&self, result: &ToolCallResult) -> bool {
            result
                .id
                .as_deref()
                .is_some_and(|id| id.starts_with(&self.prefix()))
        }

        fn handle_tool_discovery_results(
            &self,
            _: &AgentContext,
            results: &[ToolCallResult],
        ) -> Result<Vec<ToolDefinition>> {
            Ok(results
                .iter()
                .map(|r| {
                    ToolDefinition::builder()
                        .name(format!("{}{}", self.prefix(), r.content.as_str().unwrap_or("tool")))
                        .build()
                })
                .collect())
        }

        fn transform_tool_calls(&self, _: &AgentContext, calls: Vec<ToolCall>) -> Vec<ToolCall> {
            calls
                .into_iter()
                .map(|mut c| {
                    c.name = format!("{}({})", self.gateway_type, c.name);
                    c
                })
                .collect()
        }

        fn transform_tool_call_results(
            &self,
            _: &AgentContext,
            results: Vec<ToolCallResult>,
        ) -> Vec<ToolCallResult> {
            results
                .into_iter()
                .map(|r| r.with_property(self.gateway_type.clone(), true))
                .collect()
        }

        fn resolve_updated_gateway_tool_definitions(
            &self,
            _: &AgentContext,
            _: &[GatewayToolDefinition],
        ) -> GatewayToolDefinitionUpdates {
            self.updates.clone()
        }
    }

    fn registry(handlers: Vec<PrefixHandler>) -> GatewayToolHandlerRegistry {
        GatewayToolHandlerRegistry::with_handlers(
            handlers
                .into_iter()
                .map(|h| Arc::new(h) as Arc<dyn GatewayToolHandler>)
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_blank_and_reserved_types() {
        for bad in ["", " ", "_default"] {
            let err = GatewayToolHandlerRegistry::with_handlers(vec![Arc::new(PrefixHandler::new(bad))])
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Invalid argument: Invalid gateway tool handler type: '{bad}'")
            );
        }
    }

    #[test]
    fn rejects_duplicate_types() {
        let err = GatewayToolHandlerRegistry::with_handlers(vec![
            Arc::new(PrefixHandler::new("A")),
            Arc::new(PrefixHandler::new("A")),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: Duplicate gateway tool handler type: 'A'"
        );
    }

    #[test]
    fn initiation_folds_context_and_concatenates_calls() {
        let registry = registry(vec![PrefixHandler::new("a"), PrefixHandler::new("b")]);
        let result = registry.initiate_tool_discovery(AgentContext::empty(), &[]);

        assert_eq!(result.agent_context.properties["a"], json!(true));
        assert_eq!(result.agent_context.properties["b"], json!(true));
        let ids: Vec<_> = result
            .tool_discovery_tool_calls
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a_discover", "b_discover"]);
    }

    #[test]
    fn discovery_results_present_requires_all_handlers() {
        let mut incomplete = PrefixHandler::new("b");
        incomplete.discovery_present = false;
        let registry_with_missing = registry(vec![PrefixHandler::new("a"), incomplete]);
        assert!(!registry_with_missing.all_tool_discovery_results_present(&AgentContext::empty(), &[]));

        let complete = registry(vec![PrefixHandler::new("a"), PrefixHandler::new("b")]);
        assert!(complete.all_tool_discovery_results_present(&AgentContext::empty(), &[]));
        assert!(GatewayToolHandlerRegistry::new().all_tool_discovery_results_present(&AgentContext::empty(), &[]));
    }

    #[test]
    fn handles_discovery_results_and_passes_on_the_rest() {
        let registry = registry(vec![PrefixHandler::new("a"), PrefixHandler::new("b")]);
        let context = AgentContext::empty().with_tool_definitions(vec![ToolDefinition::builder()
            .name("local")
            .build()]);
        let results = vec![
            ToolCallResult::new("a_1", "a", "alpha"),
            ToolCallResult::new("other", "tool", "x"),
            ToolCallResult::new("b_1", "b", "beta"),
        ];

        let (context, remaining) = registry
            .handle_tool_discovery_results(context, results)
            .unwrap();

        let names: Vec<_> = context
            .tool_definitions
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["local", "a_alpha", "b_beta"]);
        assert_eq!(remaining, vec![ToolCallResult::new("other", "tool", "x")]);
    }

    #[test]
    fn transformations_chain_through_handlers() {
        let registry = registry(vec![PrefixHandler::new("a"), PrefixHandler::new("b")]);
        let calls = registry.transform_tool_calls(
            &AgentContext::empty(),
            vec![ToolCall::new("1", "t", Map::new())],
        );
        assert_eq!(calls[0].name, "b(a(t))");

        let results = registry.transform_tool_call_results(
            &AgentContext::empty(),
            vec![ToolCallResult::new("1", "t", "ok")],
        );
        assert_eq!(results[0].properties["a"], json!(true));
        assert_eq!(results[0].properties["b"], json!(true));
    }

    #[test]
    fn gateway_management_is_any_handler() {
        let registry = registry(vec![PrefixHandler::new("a")]);
        assert!(registry.is_gateway_managed(&AgentContext::empty(), "a_tool"));
        assert!(!registry.is_gateway_managed(&AgentContext::empty(), "tool"));
    }

    #[test]
    fn updates_exclude_handlers_without_changes() {
        let mut changed = PrefixHandler::new("type2");
        changed.updates = GatewayToolDefinitionUpdates::new(vec![], vec!["gone".into()]);
        let registry = registry(vec![PrefixHandler::new("type1"), changed]);

        let updates = registry.resolve_updated_gateway_tool_definitions(&AgentContext::empty(), &[]);
        assert_eq!(
            updates,
            vec![(
                "type2".to_string(),
                GatewayToolDefinitionUpdates::new(vec![], vec!["gone".into()])
            )]
        );
    }
}
