//! Markdown rendering for assistant replies.
//!
//! Converts a markdown document into styled lines for the history pane.
//! Handles headings, bold/italic, paragraphs, tables, lists, blockquotes,
//! links, and code. Raw HTML and anything malformed degrades to literal
//! text rather than failing. The renderer is a pure function of its input.

use pulldown_cmark::{Alignment, Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// Render a markdown document into owned, styled lines.
pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut renderer = Renderer::default();
    for event in Parser::new_ext(text, options) {
        renderer.handle(event);
    }
    renderer.finish()
}

fn heading_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn code_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn chrome_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn quote_style() -> Style {
    Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::ITALIC)
}

fn link_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::UNDERLINED)
}

/// Cell grid collected while walking a table's events.
struct TableBuilder {
    alignments: Vec<Alignment>,
    rows: Vec<Vec<String>>,
    current_row: Vec<String>,
    current_cell: String,
    in_cell: bool,
}

impl TableBuilder {
    fn new(alignments: Vec<Alignment>) -> Self {
        Self {
            alignments,
            rows: Vec::new(),
            current_row: Vec::new(),
            current_cell: String::new(),
            in_cell: false,
        }
    }
}

#[derive(Default)]
struct Renderer {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    bold: bool,
    italic: bool,
    strike: bool,
    heading: bool,
    quote_depth: usize,
    code_block: bool,
    link_url: Option<String>,
    list_stack: Vec<Option<u64>>,
    table: Option<TableBuilder>,
}

impl Renderer {
    fn handle(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                if let Some(table) = self.table.as_mut().filter(|t| t.in_cell) {
                    table.current_cell.push_str(&code);
                } else {
                    self.current.push(Span::styled(code.into_string(), code_style()));
                }
            }
            // Raw HTML is never interpreted; show it literally.
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines
                    .push(Line::from(Span::styled("─".repeat(40), chrome_style())));
                self.blank();
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.current.push(Span::styled(marker, chrome_style()));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { .. } => {
                self.flush();
                self.heading = true;
            }
            Tag::BlockQuote => self.quote_depth += 1,
            Tag::CodeBlock(_) => {
                self.flush();
                self.code_block = true;
            }
            Tag::List(start) => self.list_stack.push(start),
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.list_stack.len().saturating_sub(1));
                let marker = match self.list_stack.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{indent}{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.current.push(Span::styled(marker, chrome_style()));
            }
            Tag::Table(alignments) => {
                self.flush();
                self.table = Some(TableBuilder::new(alignments));
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.in_cell = true;
                    table.current_cell.clear();
                }
            }
            Tag::Emphasis => self.italic = true,
            Tag::Strong => self.bold = true,
            Tag::Strikethrough => self.strike = true,
            Tag::Link { dest_url, .. } => self.link_url = Some(dest_url.into_string()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                self.blank();
            }
            TagEnd::Heading(_) => {
                self.heading = false;
                self.flush();
                self.blank();
            }
            TagEnd::BlockQuote => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank();
            }
            TagEnd::CodeBlock => {
                self.flush();
                self.code_block = false;
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::HtmlBlock => {
                self.flush();
                self.blank();
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.lines.extend(table_lines(&table.alignments, &table.rows));
                    self.blank();
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.rows.push(std::mem::take(&mut table.current_row));
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.in_cell = false;
                    let cell = std::mem::take(&mut table.current_cell);
                    table.current_row.push(cell.trim().to_string());
                }
            }
            TagEnd::Emphasis => self.italic = false,
            TagEnd::Strong => self.bold = false,
            TagEnd::Strikethrough => self.strike = false,
            TagEnd::Link => {
                if let Some(url) = self.link_url.take() {
                    self.current
                        .push(Span::styled(format!(" ({url})"), chrome_style()));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(table) = self.table.as_mut().filter(|t| t.in_cell) {
            table.current_cell.push_str(text);
            return;
        }

        if self.code_block {
            for (i, piece) in text.split('\n').enumerate() {
                if i > 0 {
                    self.flush_code_line();
                }
                if !piece.is_empty() {
                    self.current.push(Span::styled(piece.to_string(), code_style()));
                }
            }
            return;
        }

        self.current
            .push(Span::styled(text.to_string(), self.inline_style()));
    }

    /// Style of running text under the currently open inline tags.
    fn inline_style(&self) -> Style {
        if self.heading {
            return heading_style();
        }

        let mut style = Style::default();
        if self.quote_depth > 0 {
            style = style.patch(quote_style());
        }
        if self.link_url.is_some() {
            style = style.patch(link_style());
        }
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.strike {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        style
    }

    /// Close the line under construction, if any.
    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }

        let mut spans = Vec::new();
        if self.quote_depth > 0 {
            spans.push(Span::styled("│ ".repeat(self.quote_depth), chrome_style()));
        }
        if self.code_block {
            spans.push(Span::raw("  "));
        }
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    /// Code blocks keep their blank lines, so flush even when empty.
    fn flush_code_line(&mut self) {
        let mut spans = vec![Span::raw("  ")];
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    /// Separate blocks with a single empty line.
    fn blank(&mut self) {
        if matches!(self.lines.last(), Some(line) if !line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while matches!(self.lines.last(), Some(line) if line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Table layout
// ─────────────────────────────────────────────────────────────────────────────

/// Lay a collected cell grid out with box-drawing borders. The first row is
/// the header.
fn table_lines(alignments: &[Alignment], rows: &[Vec<String>]) -> Vec<Line<'static>> {
    let num_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if num_cols == 0 {
        return Vec::new();
    }

    let mut widths = vec![3usize; num_cols];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let mut lines = Vec::new();
    lines.push(border_line(&widths, '┌', '┬', '┐'));

    for (row_idx, row) in rows.iter().enumerate() {
        let mut spans = vec![Span::styled("│", chrome_style())];
        for (i, width) in widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            let align = alignments.get(i).copied().unwrap_or(Alignment::None);
            let style = if row_idx == 0 {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(format!(" {} ", pad_cell(cell, *width, align)), style));
            spans.push(Span::styled("│", chrome_style()));
        }
        lines.push(Line::from(spans));

        if row_idx == 0 && rows.len() > 1 {
            lines.push(border_line(&widths, '├', '┼', '┤'));
        }
    }

    lines.push(border_line(&widths, '└', '┴', '┘'));
    lines
}

fn border_line(widths: &[usize], left: char, mid: char, right: char) -> Line<'static> {
    let mut border = String::new();
    border.push(left);
    for (i, width) in widths.iter().enumerate() {
        border.push_str(&"─".repeat(width + 2));
        border.push(if i < widths.len() - 1 { mid } else { right });
    }
    Line::from(Span::styled(border, chrome_style()))
}

/// Pad a cell to the column width under the column's alignment.
fn pad_cell(cell: &str, width: usize, align: Alignment) -> String {
    let padding = width.saturating_sub(cell.width());
    match align {
        Alignment::Right => format!("{}{}", " ".repeat(padding), cell),
        Alignment::Center => {
            let left = padding / 2;
            format!("{}{}{}", " ".repeat(left), cell, " ".repeat(padding - left))
        }
        _ => format!("{}{}", cell, " ".repeat(padding)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
