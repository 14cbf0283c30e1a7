use crate::api::ChatClient;
use crate::conversation::Conversation;
use crate::ui::chat::commands::{SlashCommand, help_text};
use crate::ui::chat::{Composer, ComposerResult, HistoryView, TypingIndicator};
use anyhow::{Result, anyhow};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};
use tokio::sync::mpsc;

const PLACEHOLDER: &str = "Ask about invoices, payments, or statements...";

/// Actions that can be requested by the chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    None,
    Exit,
}

/// Owns the conversation state and wires it to the composer, the history
/// pane, and the chat backend.
///
/// An accepted submission spawns exactly one task for the round trip; its
/// settlement arrives over `reply_rx`, which is `Some` precisely while a
/// turn is in flight. The receiver is polled from the event loop, so every
/// state transition happens on the same cooperative thread.
pub struct ChatSession {
    conversation: Conversation,
    composer: Composer,
    typing: TypingIndicator,
    client: ChatClient,
    reply_rx: Option<mpsc::UnboundedReceiver<Result<String>>>,
    notice: Option<String>,
}

impl ChatSession {
    pub fn new(client: ChatClient) -> Self {
        Self {
            conversation: Conversation::initialize(),
            composer: Composer::new(PLACEHOLDER),
            typing: TypingIndicator::new(),
            client,
            reply_rx: None,
            notice: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> SessionAction {
        match self.composer.handle_key(key) {
            ComposerResult::Submitted(text) => {
                self.notice = None;
                self.submit(&text);
            }
            ComposerResult::Command(command) => {
                self.conversation = self.conversation.update_input(self.composer.content());
                return self.handle_slash_command(command);
            }
            ComposerResult::None => {}
        }

        // keep the store's draft mirroring the live input
        self.conversation = self.conversation.update_input(self.composer.content());
        SessionAction::None
    }

    /// Submit a user message and start the round trip.
    pub fn submit(&mut self, text: &str) {
        let (next, outbound) = self.conversation.submit(text);
        self.conversation = next;

        match outbound {
            Some(outgoing) => {
                let (tx, rx) = mpsc::unbounded_channel();
                let client = self.client.clone();
                tokio::spawn(async move {
                    let outcome = client.send(&outgoing).await;
                    let _ = tx.send(outcome);
                });
                self.reply_rx = Some(rx);
                self.typing.set_active(true);
            }
            None => {
                // rejected while a turn is in flight; keep what the user typed
                self.composer.set_content(text);
            }
        }
    }

    /// Poll the turn in flight, if any (called from the main loop).
    pub fn poll_reply(&mut self) {
        let Some(reply_rx) = self.reply_rx.as_mut() else {
            return;
        };

        let outcome = match reply_rx.try_recv() {
            Ok(outcome) => outcome,
            Err(mpsc::error::TryRecvError::Empty) => return,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Err(anyhow!("reply task dropped without settling"))
            }
        };

        if let Err(error) = &outcome {
            tracing::error!("chat delivery failed: {error:#}");
        }

        self.conversation = self.conversation.settle(outcome);
        self.reply_rx = None;
        self.typing.set_active(false);
    }

    fn handle_slash_command(&mut self, command: SlashCommand) -> SessionAction {
        match command {
            SlashCommand::Help => {
                self.notice = Some(help_text());
                SessionAction::None
            }
            SlashCommand::Bye => SessionAction::Exit,
        }
    }
}

/// Chat UI layout: history on top, a one-line status bar, composer at the
/// bottom.
impl Widget for &ChatSession {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(area);

        HistoryView::new(self.conversation.messages()).render(chunks[0], buf);

        if self.typing.is_active() {
            self.typing.clone().render(chunks[1], buf);
        } else if let Some(notice) = &self.notice {
            let line = Line::from(Span::styled(
                notice.clone(),
                Style::default().fg(Color::DarkGray),
            ));
            buf.set_line(chunks[1].x, chunks[1].y, &line, chunks[1].width);
        }

        self.composer.clone().render(chunks[2], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::FALLBACK_REPLY;
    use tokio::net::TcpListener;
    use tokio::time::{Duration, sleep};

    /// Endpoint with nothing listening, so every turn fails fast.
    async fn dead_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    async fn settled(session: &mut ChatSession) {
        for _ in 0..200 {
            session.poll_reply();
            if !session.conversation().is_busy() {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("turn never settled");
    }

    #[tokio::test]
    async fn failed_turn_ends_in_the_fallback_reply() {
        let endpoint = dead_endpoint().await;
        let mut session =
            ChatSession::new(ChatClient::new(&endpoint, Duration::from_secs(2)));

        session.submit("hi");
        assert!(session.conversation().is_busy());
        assert_eq!(session.conversation().messages().len(), 2);

        settled(&mut session).await;
        let messages = session.conversation().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages.last().unwrap().content, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn second_submission_while_pending_is_ignored() {
        let endpoint = dead_endpoint().await;
        let mut session =
            ChatSession::new(ChatClient::new(&endpoint, Duration::from_secs(2)));

        session.submit("first");
        session.submit("second");

        // only the first submission's user record is in the sequence
        let user_messages: Vec<_> = session
            .conversation()
            .messages()
            .iter()
            .filter(|m| !m.is_assistant())
            .collect();
        assert_eq!(user_messages.len(), 1);
        assert_eq!(user_messages[0].content, "first");
        // the rejected text is handed back to the composer
        assert_eq!(session.composer.content(), "second");

        settled(&mut session).await;
        assert_eq!(session.conversation().messages().len(), 3);
    }
}
