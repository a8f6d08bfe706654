//! Machine-readable error codes and classification.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Request-level failure code surfaced to the caller.
///
/// Codes serialize in `SCREAMING_SNAKE_CASE`, which is the form callers match on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Nothing left to send to the model.
    NoUserMessageContent,
    /// Tool call results supplied without a prior conversation.
    ToolCallResultsOnEmptyContext,
    /// Pending tool calls exist but no results were supplied.
    WaitingForToolInputEmptyResults,
    MaximumNumberOfModelCallsReached,
    FailedToParseResponseContent,
    FailedModelCall,
    MigrationMissingTools,
    MigrationGatewayToolDefinitionsChanged,
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller wiring or request content problem.
    Request,
    Limits,
    Migration,
    Model,
    Network,
    Configuration,
    Storage,
    Serialization,
    Unknown,
}

impl ErrorCode {
    /// Category this code belongs to.
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::NoUserMessageContent
            | Self::ToolCallResultsOnEmptyContext
            | Self::WaitingForToolInputEmptyResults => ErrorCategory::Request,
            Self::MaximumNumberOfModelCallsReached => ErrorCategory::Limits,
            Self::FailedToParseResponseContent | Self::FailedModelCall => ErrorCategory::Model,
            Self::MigrationMissingTools | Self::MigrationGatewayToolDefinitionsChanged => {
                ErrorCategory::Migration
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn codes_render_in_screaming_snake_case() {
        assert_eq!(
            ErrorCode::MaximumNumberOfModelCallsReached.to_string(),
            "MAXIMUM_NUMBER_OF_MODEL_CALLS_REACHED"
        );
        assert_eq!(
            serde_json::to_value(ErrorCode::MigrationGatewayToolDefinitionsChanged).unwrap(),
            "MIGRATION_GATEWAY_TOOL_DEFINITIONS_CHANGED"
        );
    }

    #[test]
    fn codes_parse_from_wire_form() {
        assert_eq!(
            ErrorCode::from_str("TOOL_CALL_RESULTS_ON_EMPTY_CONTEXT").unwrap(),
            ErrorCode::ToolCallResultsOnEmptyContext
        );
        assert!(ErrorCode::from_str("NOT_A_CODE").is_err());
    }
}
