//! Output rendering for the chat.
//!
//! This module provides the [`Renderer`] trait and a plain-text
//! implementation that writes to stdout/stderr (or any pair of writers) with
//! optional ANSI styling.

use std::io::{self, Stderr, Stdout, Write};

use crate::markdown;

/// ANSI escape code for bold magenta text (used for the banner).
const ANSI_BANNER: &str = "\x1b[1;35m";

/// ANSI escape code for bold cyan text (used for greetings and farewells).
const ANSI_CYAN: &str = "\x1b[1;36m";

/// ANSI escape code for bold yellow text (used for the prompt and warnings).
const ANSI_YELLOW: &str = "\x1b[1;33m";

/// ANSI escape code for bold red text (used for errors).
const ANSI_RED: &str = "\x1b[1;31m";

/// ANSI escape code for dim text (used for the waiting indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Return to the start of the line and erase it.
const ANSI_CLEAR_LINE: &str = "\r\x1b[2K";

/// Default width of the response panel, borders included.
pub const DEFAULT_PANEL_WIDTH: usize = 80;

const BANNER: &str = r#"
   ___                 __        _   ___
  / __|___ _ __  _ __  \_\_     /_\ |_ _|
 | (__/ _ \ '  \| '_ \/ _` |   / _ \ | |
  \___\___/_|_|_| .__/\__,_|  /_/ \_\___|
                |_|
"#;

const PROMPT: &str = "> ";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Capturing output in tests
pub trait Renderer: Send {
    /// Print the startup banner.
    fn print_banner(&mut self);

    /// Print a greeting or farewell line.
    fn print_greeting(&mut self, text: &str);

    /// The prompt shown when waiting for a line of input.
    fn prompt(&self) -> String;

    /// Show that a request is in flight.
    fn start_waiting(&mut self);

    /// Remove the in-flight indicator.
    fn stop_waiting(&mut self);

    /// Print a complete response, formatted as Markdown.
    fn print_response(&mut self, text: &str);

    /// Print a chunk of a streamed response.
    ///
    /// This is called incrementally as chunks arrive from the API.
    fn print_text(&mut self, text: &str);

    /// Called when a streamed response is complete.
    fn finish_response(&mut self);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print a warning.
    fn print_warning(&mut self, warning: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);
}

/// Plain text renderer with optional ANSI styling.
///
/// Regular output goes to `out`; warnings and errors go to `err`.  Without
/// colour the waiting indicator cannot be erased, so it goes to `err` as well.
pub struct PlainTextRenderer<O: Write + Send = Stdout, E: Write + Send = Stderr> {
    out: O,
    err: E,
    use_color: bool,
    width: usize,
    waiting: bool,
    line_start: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writers(io::stdout(), io::stderr(), use_color)
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Write + Send, E: Write + Send> PlainTextRenderer<O, E> {
    /// Creates a renderer over arbitrary writers.
    pub fn with_writers(out: O, err: E, use_color: bool) -> Self {
        Self {
            out,
            err,
            use_color,
            width: DEFAULT_PANEL_WIDTH,
            waiting: false,
            line_start: true,
        }
    }

    /// Sets the panel width, borders included.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(8);
        self
    }

    /// Consumes the renderer, returning its writers.
    pub fn into_writers(self) -> (O, E) {
        (self.out, self.err)
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn write_out(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
        if let Some(last) = text.chars().last() {
            self.line_start = last == '\n';
        }
    }

    fn write_err(&mut self, text: &str) {
        let _ = self.err.write_all(text.as_bytes());
        let _ = self.err.flush();
    }

    fn panel(&self, text: &str) -> String {
        let inner = self.width - 4;
        let mut panel = String::new();
        panel.push('╭');
        panel.push_str(&"─".repeat(inner + 2));
        panel.push_str("╮\n");
        for row in markdown::layout(text, inner) {
            let pad = inner.saturating_sub(row.width());
            panel.push_str("│ ");
            panel.push_str(&row.render(self.use_color));
            panel.push_str(&" ".repeat(pad));
            panel.push_str(" │\n");
        }
        panel.push('╰');
        panel.push_str(&"─".repeat(inner + 2));
        panel.push_str("╯\n");
        panel
    }
}

impl<O: Write + Send, E: Write + Send> Renderer for PlainTextRenderer<O, E> {
    fn print_banner(&mut self) {
        let banner = self.styled(ANSI_BANNER, BANNER);
        self.write_out(&format!("{banner}\n"));
    }

    fn print_greeting(&mut self, text: &str) {
        let text = self.styled(ANSI_CYAN, text);
        self.write_out(&format!("{text}\n"));
    }

    fn prompt(&self) -> String {
        self.styled(ANSI_YELLOW, PROMPT)
    }

    fn start_waiting(&mut self) {
        self.waiting = true;
        if self.use_color {
            self.write_out(&format!("{ANSI_DIM}Thinking...{ANSI_RESET}"));
        } else {
            self.write_err("Thinking...\n");
        }
    }

    fn stop_waiting(&mut self) {
        if self.waiting && self.use_color {
            self.write_out(ANSI_CLEAR_LINE);
            self.line_start = true;
        }
        self.waiting = false;
    }

    fn print_response(&mut self, text: &str) {
        let panel = self.panel(text);
        self.write_out(&panel);
    }

    fn print_text(&mut self, text: &str) {
        self.write_out(text);
    }

    fn finish_response(&mut self) {
        if !self.line_start {
            self.write_out("\n");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.write_out(&format!("{info}\n"));
    }

    fn print_warning(&mut self, warning: &str) {
        let warning = self.styled(ANSI_YELLOW, warning);
        self.write_err(&format!("{warning}\n"));
    }

    fn print_error(&mut self, error: &str) {
        let error = self.styled(ANSI_RED, error);
        self.write_err(&format!("{error}\n"));
    }
}

#[cfg(test)]
mod tests {
    use unicode_width::UnicodeWidthStr;

    use super::*;

    fn plain() -> PlainTextRenderer<Vec<u8>, Vec<u8>> {
        PlainTextRenderer::with_writers(Vec::new(), Vec::new(), false)
    }

    fn output(renderer: PlainTextRenderer<Vec<u8>, Vec<u8>>) -> (String, String) {
        let (out, err) = renderer.into_writers();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
        assert!(renderer.prompt().contains(ANSI_YELLOW));
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
        assert_eq!(renderer.prompt(), "> ");
    }

    #[test]
    fn errors_and_warnings_go_to_err() {
        let mut renderer = plain();
        renderer.print_info("info");
        renderer.print_warning("careful");
        renderer.print_error("broken");
        let (out, err) = output(renderer);
        assert_eq!(out, "info\n");
        assert_eq!(err, "careful\nbroken\n");
    }

    #[test]
    fn response_panel() {
        let mut renderer = plain().with_width(12);
        renderer.print_response("hello world again");
        let (out, _) = output(renderer);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "╭──────────╮",
                "│ hello    │",
                "│ world    │",
                "│ again    │",
                "╰──────────╯",
            ]
        );
    }

    #[test]
    fn streamed_text_ends_with_newline() {
        let mut renderer = plain();
        renderer.print_text("Hel");
        renderer.print_text("lo");
        renderer.finish_response();
        renderer.print_text("done\n");
        renderer.finish_response();
        let (out, _) = output(renderer);
        assert_eq!(out, "Hello\ndone\n");
    }

    #[test]
    fn colored_waiting_indicator_is_erased() {
        let mut renderer = PlainTextRenderer::with_writers(Vec::new(), Vec::new(), true);
        renderer.start_waiting();
        renderer.stop_waiting();
        let (out, _) = renderer.into_writers();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Thinking..."));
        assert!(out.ends_with(ANSI_CLEAR_LINE));
    }

    #[test]
    fn uncoloured_waiting_indicator_stays_off_stdout() {
        let mut renderer = plain();
        renderer.start_waiting();
        renderer.stop_waiting();
        renderer.print_response("answer");
        let (out, err) = output(renderer);
        assert!(!out.contains("Thinking..."));
        assert!(out.contains("│ answer"));
        assert_eq!(err, "Thinking...\n");
    }

    #[test]
    fn panel_borders_line_up_with_wide_characters() {
        let mut renderer = plain().with_width(14);
        renderer.print_response("你好世界 ok 🎉");
        let (out, _) = output(renderer);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "│ 你好世界   │");
        assert!(lines.iter().all(|line| line.width() == 14), "{out}");
    }

    #[test]
    fn panel_renders_markdown() {
        let mut renderer = plain().with_width(30);
        renderer.print_response("## Plan\n\n- **first** step\n- `second`");
        let (out, _) = output(renderer);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "│ Plan                       │");
        assert_eq!(lines[2], "│                            │");
        assert_eq!(lines[3], "│ • first step               │");
        assert_eq!(lines[4], "│ • second                   │");
        assert!(!out.contains("**"));

        let mut renderer = PlainTextRenderer::with_writers(Vec::new(), Vec::new(), true);
        renderer.print_response("**bold**");
        let (out, _) = renderer.into_writers();
        assert!(String::from_utf8(out).unwrap().contains("\x1b[1mbold\x1b[0m"));
    }
}
