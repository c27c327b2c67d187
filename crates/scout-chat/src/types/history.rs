use scout_llm::{Message, Role};

/// The turn list sent to the server during one send.
///
/// It starts as the displayed conversation plus the new user turn and grows
/// by search exchanges between rounds. The system turn is not stored here;
/// it is rebuilt for every request.
#[derive(Debug, Clone, Default)]
pub struct RequestHistory {
    messages: Vec<Message>,
}

impl RequestHistory {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append the assistant turn that asked for a search together with the
    /// turn carrying its result. The pair is never split.
    pub fn add_search_exchange(&mut self, request: Message, result: Message) {
        debug_assert_eq!(request.role, Role::Assistant);
        self.messages.reserve(2);
        self.messages.push(request);
        self.messages.push(result);
    }

    /// Full request list: the given system turn, then the history
    pub fn with_system(&self, system: Message) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.push(system);
        messages.extend(self.messages.iter().cloned());
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_exchange_is_appended_in_order() {
        let mut history = RequestHistory::new(vec![Message::user("q")]);
        history.add_search_exchange(
            Message::assistant("[SEARCH: \"q\"]"),
            Message::user("SEARCH_RESULTS:\nr"),
        );

        let roles: Vec<Role> = history.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
    }

    #[test]
    fn test_system_turn_comes_first() {
        let history = RequestHistory::new(vec![Message::user("hi")]);
        let messages = history.with_system(Message::system("sys"));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(history.len(), 1);
    }
}
