//! Markdown layout for the response panel.
//!
//! Replies are parsed with `pulldown-cmark` and laid out into [`Row`]s no
//! wider than the panel.  Widths are terminal columns, so CJK text and emoji
//! count double.  Markup characters never reach the terminal: with colour on,
//! headings, emphasis and code are styled with ANSI codes; with colour off
//! only their text remains.

use std::mem;

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ANSI_RESET: &str = "\x1b[0m";

/// Non-breaking space, so list indentation survives word wrapping.
const INDENT: &str = "\u{a0}\u{a0}";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Style {
    bold: bool,
    italic: bool,
    underline: bool,
    code: bool,
}

impl Style {
    fn sgr(&self) -> Option<String> {
        let mut codes = Vec::new();
        if self.bold {
            codes.push("1");
        }
        if self.italic {
            codes.push("3");
        }
        if self.underline {
            codes.push("4");
        }
        if self.code {
            codes.push("36");
        }
        if codes.is_empty() {
            None
        } else {
            Some(format!("\x1b[{}m", codes.join(";")))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    text: String,
    style: Style,
}

/// One line of the panel's contents.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Row {
    spans: Vec<Span>,
}

impl Row {
    /// Display width in terminal columns.
    pub(crate) fn width(&self) -> usize {
        self.spans.iter().map(|span| span.text.width()).sum()
    }

    /// The text without styling.
    #[cfg(test)]
    pub(crate) fn plain(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    /// The text, with ANSI styling when `use_color` is set.
    pub(crate) fn render(&self, use_color: bool) -> String {
        let mut out = String::new();
        for span in &self.spans {
            match span.style.sgr() {
                Some(sgr) if use_color => {
                    out.push_str(&sgr);
                    out.push_str(&span.text);
                    out.push_str(ANSI_RESET);
                }
                _ => out.push_str(&span.text),
            }
        }
        out
    }

    fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    fn push(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.spans.push(Span {
                text: text.to_string(),
                style,
            }),
        }
    }

    fn append(&mut self, other: Row) {
        for span in other.spans {
            self.push(&span.text, span.style);
        }
    }

    /// Splits off the longest prefix that fits in `width` columns.  The
    /// prefix always holds at least one character.
    fn split_at_width(self, width: usize) -> (Row, Row) {
        let mut head = Row::default();
        let mut tail = Row::default();
        let mut used = 0;
        for span in self.spans {
            for c in span.text.chars() {
                let w = c.width().unwrap_or(0);
                if tail.is_empty() && (used + w <= width || head.is_empty()) {
                    used += w;
                    head.push(c.encode_utf8(&mut [0; 4]), span.style);
                } else {
                    tail.push(c.encode_utf8(&mut [0; 4]), span.style);
                }
            }
        }
        (head, tail)
    }
}

enum Block {
    Text(Row),
    Code(String),
    Rule,
    Blank,
}

#[derive(Default)]
struct Builder {
    blocks: Vec<Block>,
    current: Row,
    bold: usize,
    italic: usize,
    heading: bool,
    code_block: bool,
    lists: Vec<Option<u64>>,
}

impl Builder {
    fn style(&self) -> Style {
        Style {
            bold: self.bold > 0 || self.heading,
            italic: self.italic > 0,
            underline: self.heading,
            code: false,
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.blocks.push(Block::Text(mem::take(&mut self.current)));
        }
    }

    fn separate(&mut self) {
        self.flush();
        if !matches!(self.blocks.last(), None | Some(Block::Blank)) {
            self.blocks.push(Block::Blank);
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) if self.code_block => {
                for line in text.lines() {
                    self.blocks.push(Block::Code(line.replace('\t', "    ")));
                }
            }
            Event::Text(text) => {
                let style = self.style();
                self.current.push(&text, style);
            }
            Event::Code(text) => {
                let style = Style {
                    code: true,
                    ..self.style()
                };
                self.current.push(&text, style);
            }
            Event::Html(text) | Event::InlineHtml(text) => {
                self.current.push(text.trim_end(), Style::default());
            }
            Event::SoftBreak => self.current.push(" ", Style::default()),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.separate();
                self.blocks.push(Block::Rule);
                self.blocks.push(Block::Blank);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => {
                self.flush();
                self.heading = true;
            }
            Tag::Emphasis => self.italic += 1,
            Tag::Strong => self.bold += 1,
            Tag::CodeBlock(_) => {
                self.flush();
                self.code_block = true;
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let indent = INDENT.repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.current
                    .push(&format!("{indent}{marker}"), Style::default());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph if self.lists.is_empty() => self.separate(),
            TagEnd::Paragraph | TagEnd::Item => self.flush(),
            TagEnd::Heading(_) => {
                self.heading = false;
                self.separate();
            }
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::CodeBlock => {
                self.code_block = false;
                self.separate();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.separate();
                }
            }
            _ => {}
        }
    }
}

/// Lays out Markdown `text` in rows of at most `width` columns.
///
/// Always returns at least one row.
pub(crate) fn layout(text: &str, width: usize) -> Vec<Row> {
    let mut builder = Builder::default();
    for event in Parser::new(text) {
        builder.event(event);
    }
    builder.flush();
    while matches!(builder.blocks.last(), Some(Block::Blank)) {
        builder.blocks.pop();
    }

    let mut rows = Vec::new();
    for block in builder.blocks {
        match block {
            Block::Text(row) => rows.extend(wrap(row, width)),
            Block::Code(line) => {
                let mut row = Row::default();
                let style = Style {
                    code: true,
                    ..Style::default()
                };
                row.push(&line, style);
                rows.extend(hard_wrap(row, width));
            }
            Block::Rule => {
                let mut row = Row::default();
                row.push(&"─".repeat(width), Style::default());
                rows.push(row);
            }
            Block::Blank => rows.push(Row::default()),
        }
    }
    if rows.is_empty() {
        rows.push(Row::default());
    }
    rows
}

/// Greedy word wrap.  Words wider than `width` are split.
fn wrap(row: Row, width: usize) -> Vec<Row> {
    let mut words = Vec::new();
    let mut word = Row::default();
    for span in row.spans {
        for (idx, piece) in span.text.split(' ').enumerate() {
            if idx > 0 && !word.is_empty() {
                words.push(mem::take(&mut word));
            }
            word.push(piece, span.style);
        }
    }
    if !word.is_empty() {
        words.push(word);
    }

    let mut rows = Vec::new();
    let mut line = Row::default();
    for mut word in words {
        let line_width = line.width();
        if line_width > 0 && line_width + 1 + word.width() <= width {
            line.push(" ", Style::default());
            line.append(word);
            continue;
        }
        if !line.is_empty() {
            rows.push(mem::take(&mut line));
        }
        while word.width() > width {
            let (head, tail) = word.split_at_width(width);
            rows.push(head);
            word = tail;
        }
        line = word;
    }
    if !line.is_empty() || rows.is_empty() {
        rows.push(line);
    }
    rows
}

/// Splits without reflowing, for preformatted text.
fn hard_wrap(mut row: Row, width: usize) -> Vec<Row> {
    let mut rows = Vec::new();
    while row.width() > width {
        let (head, tail) = row.split_at_width(width);
        rows.push(head);
        row = tail;
    }
    rows.push(row);
    rows
}
