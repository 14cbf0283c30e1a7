//! Conversation history display component

use crate::conversation::{Author, Message};
use crate::ui::markdown::render_markdown;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Read-only view over the conversation sequence, newest message anchored
/// to the bottom of the pane.
pub struct HistoryView<'a> {
    messages: &'a [Message],
}

impl<'a> HistoryView<'a> {
    pub fn new(messages: &'a [Message]) -> Self {
        Self { messages }
    }
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("💬 Vendor Chat");
        let inner_area = block.inner(area);
        block.render(area, buf);

        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.messages {
            all_lines.extend(message_lines(message, inner_area.width));
            // spacing between messages
            all_lines.push(Line::default());
        }

        // Show the tail that fits, like the original view auto-scrolling to
        // the newest message.
        let height = inner_area.height as usize;
        let start = all_lines.len().saturating_sub(height);
        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Render a single message into lines.
///
/// Assistant messages are interpreted as markdown; user messages are shown
/// verbatim, so markdown control characters in user input never turn into
/// formatting. Pure function of the record: the same record always yields
/// the same lines.
pub(crate) fn message_lines(message: &Message, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let icon = match message.author {
        Author::User => "👤",
        Author::Assistant => "🤖",
    };
    let timestamp = message.timestamp.format("%H:%M:%S");
    let header = format!("{icon} {timestamp} {}", "─".repeat(20));
    lines.push(Line::from(Span::styled(
        header,
        Style::default().fg(Color::DarkGray),
    )));

    let body_width = width.saturating_sub(2) as usize;
    match message.author {
        Author::Assistant => {
            for line in render_markdown(&message.content) {
                for wrapped in wrap_line(line, body_width) {
                    lines.push(indent(wrapped));
                }
            }
        }
        Author::User => {
            let style = Style::default().fg(Color::Blue);
            for raw_line in message.content.lines() {
                for piece in wrap_text(raw_line, body_width) {
                    lines.push(indent(Line::from(Span::styled(piece, style))));
                }
            }
        }
    }

    lines
}

fn indent(line: Line<'static>) -> Line<'static> {
    if line.spans.is_empty() {
        return line;
    }
    let mut spans = vec![Span::raw("  ")];
    spans.extend(line.spans);
    Line::from(spans)
}

/// Wrap plain text to fit within the given width.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.width() + word.width() + 1 <= width || current_line.is_empty() {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line.push_str(word);
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Word-wrap a styled line, carrying each span's style across breaks.
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    let max = width.max(1);
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut used = 0usize;

    for span in line.spans {
        let style = span.style;
        let mut buf = String::new();

        for token in tokenize(&span.content) {
            let token_width = token.width();
            if used + token_width > max && used > 0 {
                if !buf.is_empty() {
                    current.push(Span::styled(std::mem::take(&mut buf), style));
                }
                lines.push(Line::from(std::mem::take(&mut current)));
                used = 0;
                // drop the whitespace the break replaced
                if token.trim().is_empty() {
                    continue;
                }
            }
            buf.push_str(token);
            used += token_width;
        }

        if !buf.is_empty() {
            current.push(Span::styled(buf, style));
        }
    }

    if !current.is_empty() {
        lines.push(Line::from(current));
    }
    if lines.is_empty() {
        lines.push(Line::default());
    }
    lines
}

/// Split text into alternating runs of whitespace and non-whitespace.
fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space = None;

    for (i, c) in text.char_indices() {
        let is_space = c.is_whitespace();
        if in_space.is_some_and(|prev| prev != is_space) {
            tokens.push(&text[start..i]);
            start = i;
        }
        in_space = Some(is_space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}
