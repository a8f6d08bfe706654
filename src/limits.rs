//! Limits enforced before any model call of a turn.

use crate::context::AgentContext;
use crate::error::{AgentError, ErrorCode, Result};
use crate::request::AgentExecutionContext;

pub const DEFAULT_MAX_MODEL_CALLS: u32 = 10;

/// Checks configured ceilings against accumulated metrics.
pub trait LimitsValidator: Send + Sync {
    fn validate(&self, execution: &AgentExecutionContext, agent_context: &AgentContext) -> Result<()>;
}

/// Enforces the maximum number of model calls per conversation.
#[derive(Debug, Clone, Copy)]
pub struct DefaultLimitsValidator {
    default_max_model_calls: u32,
}

impl Default for DefaultLimitsValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MODEL_CALLS)
    }
}

impl DefaultLimitsValidator {
    /// `default_max_model_calls` applies when a request configures no limit.
    pub fn new(default_max_model_calls: u32) -> Self {
        Self {
            default_max_model_calls,
        }
    }
}

impl LimitsValidator for DefaultLimitsValidator {
    fn validate(&self, execution: &AgentExecutionContext, agent_context: &AgentContext) -> Result<()> {
        let max_model_calls = execution
            .request
            .limits
            .max_model_calls
            .unwrap_or(self.default_max_model_calls);
        let model_calls = agent_context.metrics.model_calls;

        if model_calls >= max_model_calls {
            return Err(AgentError::agent(
                ErrorCode::MaximumNumberOfModelCallsReached,
                format!(
                    "Maximum number of model calls reached (modelCalls: {model_calls}, limit: {max_model_calls})"
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{AgentRequest, LimitsConfiguration};
    use crate::types::AgentMetrics;

    fn execution(max_model_calls: Option<u32>) -> AgentExecutionContext {
        AgentExecutionContext::new(AgentRequest {
            limits: LimitsConfiguration { max_model_calls },
            ..Default::default()
        })
    }

    fn context_with_calls(model_calls: u32) -> AgentContext {
        AgentContext::empty().with_metrics(AgentMetrics {
            model_calls,
            ..Default::default()
        })
    }

    #[test]
    fn passes_one_below_limit() {
        let validator = DefaultLimitsValidator::default();
        assert!(validator
            .validate(&execution(Some(5)), &context_with_calls(4))
            .is_ok());
    }

    #[test]
    fn fails_exactly_at_limit() {
        let validator = DefaultLimitsValidator::default();
        let err = validator
            .validate(&execution(Some(5)), &context_with_calls(5))
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::MaximumNumberOfModelCallsReached));
        assert_eq!(
            err.to_string(),
            "Maximum number of model calls reached (modelCalls: 5, limit: 5)"
        );
    }

    #[test]
    fn falls_back_to_default_limit() {
        let validator = DefaultLimitsValidator::default();
        assert!(validator
            .validate(&execution(None), &context_with_calls(9))
            .is_ok());
        assert!(validator
            .validate(&execution(None), &context_with_calls(10))
            .is_err());
    }

    #[test]
    fn engine_default_can_be_overridden() {
        let validator = DefaultLimitsValidator::new(2);
        assert!(validator
            .validate(&execution(None), &context_with_calls(2))
            .is_err());
    }
}
