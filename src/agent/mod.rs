//! Agent turns: lifecycle initialization, message handling, model call, response.

pub mod handler;
pub mod initializer;
pub mod messages;
pub mod response;
pub mod strategy;

pub use handler::AgentRequestHandler;
pub use initializer::{AgentInitializationResult, AgentInitializer};
pub use messages::AgentMessagesHandler;
pub use response::{AgentResponse, AgentResponseHandler};
pub use strategy::{
    ElementActivation, JobClient, JobCompletion, JobWorkerCompletion, OutboundCompletion, ProceedPolicy,
    TurnCompleter, TurnOutcome,
};
