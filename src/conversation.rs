//! Conversation state and the transitions that drive a chat turn.

use anyhow::Result;
use chrono::{DateTime, Utc};

/// Greeting seeded into every fresh conversation.
pub const GREETING: &str = "Hello! I'm your vendor assistant. How can I help you today? \
You can ask about **invoices**, **payments**, or your **statement of account**.";

/// Reply shown in place of the assistant when a turn cannot be delivered.
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble connecting to the server. Please try again later.";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

/// A single immutable entry in the conversation sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub author: Author,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            author: Author::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            author: Author::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    #[allow(dead_code)]
    pub fn is_assistant(&self) -> bool {
        self.author == Author::Assistant
    }
}

/// Append-only conversation state.
///
/// Transitions never mutate in place: each one returns a new state value,
/// so every turn moves through `IDLE -> SENDING -> IDLE` on the single
/// cooperative thread that owns the value. While `busy` is set, further
/// submissions are rejected; a turn in flight always settles back to idle.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    draft: String,
    busy: bool,
}

impl Conversation {
    /// Fresh conversation seeded with the assistant greeting.
    pub fn initialize() -> Self {
        Self {
            messages: vec![Message::assistant(GREETING)],
            draft: String::new(),
            busy: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[allow(dead_code)]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Replace the draft input. No other effect.
    pub fn update_input(&self, text: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.draft = text.into();
        next
    }

    /// Submit a user message.
    ///
    /// Returns the new state plus the text to put on the wire when the
    /// submission was accepted. Blank input and submissions made while a
    /// turn is already in flight leave the state untouched and return
    /// `None`, so the contract holds even when the UI gate is bypassed.
    pub fn submit(&self, text: &str) -> (Self, Option<String>) {
        if text.trim().is_empty() || self.busy {
            return (self.clone(), None);
        }

        let mut next = self.clone();
        next.messages.push(Message::user(text));
        next.draft.clear();
        next.busy = true;
        (next, Some(text.to_string()))
    }

    /// Settle the turn in flight.
    ///
    /// A successful delivery appends the reply body verbatim; any failure
    /// appends the fixed fallback reply instead. Both paths clear the busy
    /// gate. From the sequence alone a delivery failure is indistinguishable
    /// from the assistant choosing to say the fallback text.
    pub fn settle(&self, outcome: Result<String>) -> Self {
        let mut next = self.clone();
        let content = outcome.unwrap_or_else(|_| FALLBACK_REPLY.to_string());
        next.messages.push(Message::assistant(content));
        next.busy = false;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn starts_with_a_single_greeting() {
        let conversation = Conversation::initialize();
        assert_eq!(conversation.messages().len(), 1);
        let greeting = &conversation.messages()[0];
        assert!(greeting.is_assistant());
        assert!(greeting.content.contains("invoices"));
        assert!(greeting.content.contains("payments"));
        assert!(!conversation.is_busy());
        assert_eq!(conversation.draft(), "");
    }

    #[test]
    fn submit_appends_user_message_and_raises_busy_gate() {
        let (conversation, outbound) = Conversation::initialize().submit("What is my balance?");
        assert_eq!(outbound.as_deref(), Some("What is my balance?"));
        assert_eq!(conversation.messages().len(), 2);
        let last = conversation.messages().last().unwrap();
        assert_eq!(last.author, Author::User);
        assert_eq!(last.content, "What is my balance?");
        assert!(conversation.is_busy());
    }

    #[test]
    fn submit_clears_the_draft_on_acceptance() {
        let conversation = Conversation::initialize().update_input("hi there");
        assert_eq!(conversation.draft(), "hi there");
        let (conversation, outbound) = conversation.submit("hi there");
        assert!(outbound.is_some());
        assert_eq!(conversation.draft(), "");
    }

    #[test]
    fn blank_submissions_are_rejected() {
        let initial = Conversation::initialize();
        for text in ["", "   ", "\n\t "] {
            let (conversation, outbound) = initial.submit(text);
            assert!(outbound.is_none());
            assert_eq!(conversation.messages().len(), 1);
            assert!(!conversation.is_busy());
        }
    }

    #[test]
    fn submissions_while_busy_are_rejected() {
        let (pending, _) = Conversation::initialize().submit("first");
        let (conversation, outbound) = pending.submit("second");
        assert!(outbound.is_none());
        assert_eq!(conversation.messages().len(), pending.messages().len());
        assert_eq!(conversation.messages().last().unwrap().content, "first");
        assert!(conversation.is_busy());
    }

    #[test]
    fn successful_turn_grows_the_sequence_by_two() {
        let (pending, _) = Conversation::initialize().submit("What is my balance?");
        let settled = pending.settle(Ok("Your balance is **$100**.".to_string()));
        assert_eq!(settled.messages().len(), 3);
        let reply = settled.messages().last().unwrap();
        assert!(reply.is_assistant());
        assert_eq!(reply.content, "Your balance is **$100**.");
        assert!(!settled.is_busy());
    }

    #[test]
    fn failed_turn_settles_with_the_fallback_reply() {
        let (pending, _) = Conversation::initialize().submit("hi");
        let settled = pending.settle(Err(anyhow!("connection refused")));
        assert_eq!(settled.messages().len(), 3);
        let reply = settled.messages().last().unwrap();
        assert!(reply.is_assistant());
        assert_eq!(reply.content, FALLBACK_REPLY);
        assert!(!settled.is_busy());
    }

    #[test]
    fn conversation_stays_usable_after_repeated_failures() {
        let mut conversation = Conversation::initialize();
        for attempt in 0..3 {
            let (pending, outbound) = conversation.submit("retry");
            assert!(outbound.is_some());
            conversation = pending.settle(Err(anyhow!("down")));
            assert!(!conversation.is_busy());
            assert_eq!(conversation.messages().len(), 3 + attempt * 2);
        }
    }

    #[test]
    fn records_are_never_edited_or_removed() {
        let (pending, _) = Conversation::initialize().submit("hello");
        let before: Vec<Message> = pending.messages().to_vec();
        let settled = pending.settle(Ok("hi".to_string()));
        assert_eq!(&settled.messages()[..before.len()], &before[..]);
    }
}
