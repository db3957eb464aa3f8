//! Line input for the chat loop.

use std::io;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::{Error, Result};

/// What a read from the terminal produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A line of text, without its line terminator.
    Line(String),
    /// Ctrl-C at the prompt; the partial line was discarded.
    Interrupted,
    /// Ctrl-D or end of piped input.
    Eof,
}

/// A source of input lines.
pub trait LineSource {
    /// Shows `prompt` and waits for the next line.
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent>;
}

/// Terminal input with line editing and in-memory history.
pub struct TerminalInput {
    editor: DefaultEditor,
}

impl TerminalInput {
    /// Creates a line editor attached to the terminal.
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(readline_error)?;
        Ok(Self { editor })
    }
}

impl LineSource for TerminalInput {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(InputEvent::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(err) => Err(readline_error(err)),
        }
    }
}

fn readline_error(err: ReadlineError) -> Error {
    match err {
        ReadlineError::Io(err) => Error::io("terminal input failed", err),
        err => Error::io("terminal input failed", io::Error::other(err.to_string())),
    }
}
