//! Runtime memory: the bounded message buffer of a single invocation.

pub mod window;

pub use window::MessageWindowRuntimeMemory;

use crate::types::Message;

/// Default number of non-system messages kept in the window.
pub const DEFAULT_CONTEXT_WINDOW_SIZE: usize = 20;

/// Ordered message buffer used while executing one turn.
///
/// Created fresh per invocation, filled from the conversation store, mutated during
/// the turn and flushed back to the store. Never persisted directly.
pub trait RuntimeMemory: Send + Sync {
    /// Append a message. A system message replaces any existing one.
    fn add_message(&mut self, message: Message);

    fn add_messages(&mut self, messages: Vec<Message>) {
        for message in messages {
            self.add_message(message);
        }
    }

    fn last_message(&self) -> Option<&Message>;

    /// Every message retained in the buffer.
    fn messages(&self) -> &[Message];

    /// The view sent to the model.
    fn filtered_messages(&self) -> Vec<Message>;

    fn clear(&mut self);
}
