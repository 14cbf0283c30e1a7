//! Message composer for user input

use crate::ui::chat::commands::{CommandEntry, SlashCommand, command_entries, parse_slash_command};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(SlashCommand),
    None,
}

/// Single-line input with cursor editing and a slash-command palette.
#[derive(Clone)]
pub struct Composer {
    content: String,
    /// Cursor position as a character index into `content`.
    cursor: usize,
    placeholder: String,
    entries: Vec<CommandEntry>,
    filtered: Vec<CommandEntry>,
    palette_open: bool,
    selected: usize,
}

impl Composer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            placeholder: placeholder.into(),
            entries: command_entries(),
            filtered: Vec::new(),
            palette_open: false,
            selected: 0,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Put text back into the composer, cursor at the end.
    pub fn set_content(&mut self, text: &str) {
        self.content = text.to_string();
        self.cursor = self.content.chars().count();
        self.sync_palette();
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.sync_palette();
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if self.palette_open {
                    self.apply_selected();
                    return ComposerResult::None;
                }
                if self.content.trim().is_empty() {
                    return ComposerResult::None;
                }
                let content = std::mem::take(&mut self.content);
                self.cursor = 0;
                self.sync_palette();
                if let Some(command) = parse_slash_command(&content) {
                    return ComposerResult::Command(command);
                }
                if content.starts_with('/') {
                    // unknown command; hand it back rather than sending it
                    self.set_content(&content);
                    return ComposerResult::None;
                }
                return ComposerResult::Submitted(content);
            }
            KeyCode::Up if self.palette_open => self.move_selection(-1),
            KeyCode::Down if self.palette_open => self.move_selection(1),
            KeyCode::Tab if self.palette_open => self.apply_selected(),
            KeyCode::Esc => {
                if self.palette_open {
                    self.palette_open = false;
                } else {
                    self.clear();
                }
            }
            KeyCode::Char(c) => {
                self.insert_char(c);
                self.sync_palette();
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_at_cursor();
                    self.sync_palette();
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.content.chars().count() {
                    self.remove_at_cursor();
                    self.sync_palette();
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => {
                if self.cursor < self.content.chars().count() {
                    self.cursor += 1;
                }
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.content.chars().count(),
            _ => {}
        }

        ComposerResult::None
    }

    fn insert_char(&mut self, c: char) {
        let at = char_to_byte_index(&self.content, self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    fn remove_at_cursor(&mut self) {
        let at = char_to_byte_index(&self.content, self.cursor);
        self.content.remove(at);
    }

    /// The palette is open exactly while the draft is a bare `/query`.
    fn sync_palette(&mut self) {
        let query = match self.content.strip_prefix('/') {
            Some(rest) if !rest.contains(char::is_whitespace) => rest.to_lowercase(),
            _ => {
                self.palette_open = false;
                self.filtered.clear();
                return;
            }
        };

        self.filtered = self
            .entries
            .iter()
            .filter(|entry| entry.keyword.starts_with(&query))
            .copied()
            .collect();
        self.palette_open = !self.filtered.is_empty();
        self.selected = self.selected.min(self.filtered.len().saturating_sub(1));
    }

    fn move_selection(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let len = self.filtered.len() as isize;
        let next = (self.selected as isize + delta).rem_euclid(len);
        self.selected = next as usize;
    }

    fn apply_selected(&mut self) {
        if let Some(entry) = self.filtered.get(self.selected) {
            // trailing space closes the palette and leaves room for arguments
            self.set_content(&format!("/{} ", entry.keyword));
        }
    }
}

impl Widget for Composer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("✉ Message")
            .style(Style::default().fg(Color::Gray));

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.content.is_empty() {
            let placeholder_line = Line::from(Span::styled(
                self.placeholder.clone(),
                Style::default().fg(Color::DarkGray),
            ));
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.content.clone();
            let at = char_to_byte_index(&content, self.cursor);
            content.insert(at, '▌');
            let line = Line::from(Span::raw(content));
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
        }

        if self.palette_open {
            self.render_palette(inner_area, buf);
        }
    }
}

impl Composer {
    fn render_palette(&self, inner_area: Rect, buf: &mut Buffer) {
        let palette_height = (self.filtered.len() + 2) as u16;
        let palette_area = Rect {
            x: inner_area.x,
            y: inner_area.y.saturating_sub(palette_height),
            width: inner_area.width,
            height: palette_height,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Commands")
            .style(Style::default().fg(Color::Blue));
        let inner = block.inner(palette_area);
        block.render(palette_area, buf);

        for (index, entry) in self.filtered.iter().enumerate() {
            if index >= inner.height as usize {
                break;
            }

            let style = if index == self.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let line = Line::from(vec![
                Span::styled(format!("/{}", entry.keyword), style),
                Span::styled(" - ", Style::default().fg(Color::DarkGray)),
                Span::styled(entry.description, Style::default().fg(Color::Gray)),
            ]);
            buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(composer: &mut Composer, code: KeyCode) -> ComposerResult {
        composer.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(composer: &mut Composer, text: &str) {
        for c in text.chars() {
            press(composer, KeyCode::Char(c));
        }
    }

    #[test]
    fn enter_submits_trimmed_nonempty_content() {
        let mut composer = Composer::new("...");
        type_text(&mut composer, "hello there");
        assert_eq!(
            press(&mut composer, KeyCode::Enter),
            ComposerResult::Submitted("hello there".to_string())
        );
        assert_eq!(composer.content(), "");
    }

    #[test]
    fn enter_on_blank_content_does_nothing() {
        let mut composer = Composer::new("...");
        type_text(&mut composer, "   ");
        assert_eq!(press(&mut composer, KeyCode::Enter), ComposerResult::None);
    }

    #[test]
    fn slash_input_becomes_a_command_not_a_message() {
        let mut composer = Composer::new("...");
        // the palette swallows the first Enter to complete the keyword
        type_text(&mut composer, "/bye");
        assert_eq!(press(&mut composer, KeyCode::Enter), ComposerResult::None);
        assert_eq!(
            press(&mut composer, KeyCode::Enter),
            ComposerResult::Command(SlashCommand::Bye)
        );
    }

    #[test]
    fn command_aliases_skip_the_palette() {
        let mut composer = Composer::new("...");
        type_text(&mut composer, "/q");
        assert_eq!(
            press(&mut composer, KeyCode::Enter),
            ComposerResult::Command(SlashCommand::Bye)
        );
    }

    #[test]
    fn palette_opens_on_slash_and_applies_selection() {
        let mut composer = Composer::new("...");
        type_text(&mut composer, "/");
        assert!(composer.palette_open);
        press(&mut composer, KeyCode::Tab);
        assert!(composer.content().starts_with('/'));
    }

    #[test]
    fn cursor_editing_is_utf8_safe() {
        let mut composer = Composer::new("...");
        type_text(&mut composer, "héllo");
        press(&mut composer, KeyCode::Left);
        press(&mut composer, KeyCode::Backspace);
        assert_eq!(composer.content(), "hélo");
    }

    #[test]
    fn esc_clears_the_draft() {
        let mut composer = Composer::new("...");
        type_text(&mut composer, "draft");
        press(&mut composer, KeyCode::Esc);
        assert_eq!(composer.content(), "");
    }
}
