//! Sliding-window memory keeping at most one system message.

use crate::types::Message;

use super::{RuntimeMemory, DEFAULT_CONTEXT_WINDOW_SIZE};

/// Runtime memory bounded to `max_messages` non-system messages.
///
/// When the bound is exceeded the oldest non-system messages are evicted first;
/// the system message is never evicted. Tool call result messages whose assistant
/// tool call request was evicted are hidden from the filtered view.
#[derive(Debug, Clone)]
pub struct MessageWindowRuntimeMemory {
    max_messages: usize,
    messages: Vec<Message>,
}

impl Default for MessageWindowRuntimeMemory {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_WINDOW_SIZE)
    }
}

impl MessageWindowRuntimeMemory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages,
            messages: Vec::new(),
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    fn non_system_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.is_system()).count()
    }

    fn evict(&mut self) {
        let mut excess = self.non_system_count().saturating_sub(self.max_messages);
        if excess == 0 {
            return;
        }
        self.messages.retain(|message| {
            if excess > 0 && !message.is_system() {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }
}

impl RuntimeMemory for MessageWindowRuntimeMemory {
    fn add_message(&mut self, message: Message) {
        if message.is_system() {
            if let Some(existing) = self.messages.iter_mut().find(|m| m.is_system()) {
                *existing = message;
                return;
            }
            self.messages.insert(0, message);
        } else {
            self.messages.push(message);
        }
        self.evict();
    }

    fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn filtered_messages(&self) -> Vec<Message> {
        let system = self.messages.iter().filter(|m| m.is_system());
        let rest = self
            .messages
            .iter()
            .filter(|m| !m.is_system())
            .skip_while(|m| matches!(m, Message::ToolCallResult(_)));
        system.chain(rest).cloned().collect()
    }

    fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssistantMessage, ToolCall, ToolCallResult};
    use pretty_assertions::assert_eq;
    use serde_json::Map;

    fn texts(messages: &[Message]) -> Vec<String> {
        messages
            .iter()
            .map(|m| m.text().unwrap_or("<none>").to_string())
            .collect()
    }

    #[test]
    fn keeps_single_system_message_and_replaces_it() {
        let mut memory = MessageWindowRuntimeMemory::new(5);
        memory.add_message(Message::system("first"));
        memory.add_message(Message::user("hi"));
        memory.add_message(Message::system("second"));

        assert_eq!(texts(memory.messages()), vec!["second", "hi"]);
    }

    #[test]
    fn system_message_added_late_goes_first() {
        let mut memory = MessageWindowRuntimeMemory::new(5);
        memory.add_message(Message::user("hi"));
        memory.add_message(Message::system("sys"));

        assert_eq!(texts(&memory.filtered_messages()), vec!["sys", "hi"]);
    }

    #[test]
    fn evicts_oldest_non_system_messages() {
        let mut memory = MessageWindowRuntimeMemory::new(2);
        memory.add_message(Message::system("sys"));
        for text in ["one", "two", "three", "four"] {
            memory.add_message(Message::user(text));
        }

        assert_eq!(texts(memory.messages()), vec!["sys", "three", "four"]);
        assert_eq!(memory.last_message().and_then(Message::text), Some("four"));
    }

    #[test]
    fn window_bound_holds_for_every_prefix() {
        let mut memory = MessageWindowRuntimeMemory::new(3);
        for i in 0..20 {
            if i % 7 == 0 {
                memory.add_message(Message::system(format!("sys{i}")));
            } else {
                memory.add_message(Message::user(format!("m{i}")));
            }
            let system = memory.messages().iter().filter(|m| m.is_system()).count();
            assert!(system <= 1);
            assert!(memory.messages().len() - system <= 3);
        }
    }

    #[test]
    fn hides_tool_results_orphaned_by_eviction() {
        let mut memory = MessageWindowRuntimeMemory::new(2);
        memory.add_message(Message::user("question"));
        memory.add_message(Message::Assistant(AssistantMessage {
            tool_calls: vec![ToolCall::new("c1", "lookup", Map::new())],
            ..Default::default()
        }));
        memory.add_message(Message::tool_call_results(vec![ToolCallResult::new(
            "c1", "lookup", "found",
        )]));
        memory.add_message(Message::assistant("answer"));

        assert_eq!(memory.messages().len(), 2);
        let filtered = memory.filtered_messages();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].text(), Some("answer"));
    }

    #[test]
    fn add_messages_and_clear() {
        let mut memory = MessageWindowRuntimeMemory::default();
        memory.add_messages(vec![Message::user("a"), Message::assistant("b")]);
        assert_eq!(memory.messages().len(), 2);
        memory.clear();
        assert!(memory.last_message().is_none());
    }
}
