//! Top-level application state and the main event loop.

use crate::api::ChatClient;
use crate::config::Config;
use crate::tui::{AppEvent, EventHandler, Tui};
use crate::ui::chat::{ChatSession, SessionAction};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::time::Duration;

pub struct App {
    session: ChatSession,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Self {
        let client = ChatClient::new(
            &config.endpoint,
            Duration::from_secs(config.request_timeout_secs),
        );

        Self {
            session: ChatSession::new(client),
            should_quit: false,
        }
    }

    /// Run until the user quits. Every iteration polls the turn in flight,
    /// redraws, then waits for the next terminal event or tick, so all
    /// state transitions happen between suspension points of this loop.
    pub async fn run(&mut self, terminal: &mut Tui) -> Result<()> {
        let mut events = EventHandler::new();

        while !self.should_quit {
            self.session.poll_reply();
            terminal.draw(|frame| {
                let area = frame.size();
                frame.render_widget(&self.session, area);
            })?;

            match events.next().await {
                Some(AppEvent::Key(key)) => self.handle_key(key),
                Some(AppEvent::Tick) | Some(AppEvent::Resize(..)) => {}
                None => break,
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.session.handle_key(key) == SessionAction::Exit {
            self.should_quit = true;
        }
    }
}
