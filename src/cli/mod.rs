//! Command line interface: run a single agent turn from JSON files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::agent::{AgentRequestHandler, AgentResponse, OutboundCompletion};
use crate::config::EngineConfig;
use crate::error::{AgentError, Result};
use crate::gateway::{GatewayToolHandlerRegistry, McpClientGatewayToolHandler};
use crate::limits::DefaultLimitsValidator;
use crate::request::{AgentExecutionContext, AgentRequest, InvocationMetadata};
use crate::tools::{AdHocToolsSchema, StaticToolsSchemaResolver};

/// Agent turn runner
#[derive(Parser, Debug)]
#[command(name = "agentic", version, about = "Run tool-using agent turns against an OpenAI-compatible model")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one turn and print the agent response as JSON
    Turn(TurnArgs),
}

#[derive(Parser, Debug)]
pub struct TurnArgs {
    /// Agent request (JSON)
    #[arg(short, long)]
    pub request: PathBuf,

    /// Engine configuration (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Tools schema offered for any container element (JSON)
    #[arg(short, long)]
    pub tools: Option<PathBuf>,

    /// Definition version the tools schema belongs to
    #[arg(long)]
    pub definition_version: Option<String>,
}

/// Install the global subscriber. `AGENTIC_LOG` wins over `RUST_LOG`; default `warn`.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("AGENTIC_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

pub fn load_request(path: &Path) -> Result<AgentRequest> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn load_tools_schema(path: &Path) -> Result<AdHocToolsSchema> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Run the turn described by `args` and return the response rendered as JSON.
pub async fn handle_turn(args: TurnArgs) -> Result<String> {
    let config = EngineConfig::load(args.config.as_deref())?;
    debug!(?config, "loaded engine configuration");

    let schema = args
        .tools
        .as_deref()
        .map(load_tools_schema)
        .transpose()?
        .unwrap_or_default();
    let execution = AgentExecutionContext {
        request: load_request(&args.request)?,
        metadata: InvocationMetadata {
            definition_version: args.definition_version,
            ..Default::default()
        },
    };

    let gateways = GatewayToolHandlerRegistry::with_handlers(vec![Arc::new(McpClientGatewayToolHandler)])?;
    let handler = AgentRequestHandler::with_gateways(
        Arc::new(config.openai_adapter()?),
        Arc::new(StaticToolsSchemaResolver::for_any_container(schema)),
        gateways,
        OutboundCompletion,
    )
    .with_stores(config.conversation_stores())
    .with_limits(Arc::new(DefaultLimitsValidator::new(config.max_model_calls)))
    .with_context_window_size(config.context_window_size);

    render_response(handler.handle_request(&execution).await?.as_ref())
}

/// Pretty JSON of the response, or `null` when the agent is waiting for more input.
pub fn render_response(response: Option<&AgentResponse>) -> Result<String> {
    serde_json::to_string_pretty(&response).map_err(AgentError::from)
}
