//! Classification of lines typed at the chat prompt.
//!
//! Exactly one control command exists: `!exit`.  It must match exactly
//! (case-sensitive) once surrounding whitespace is trimmed.  Everything else
//! that is not blank is a message for the model.

/// The sentinel command that ends the chat.
pub const EXIT_COMMAND: &str = "!exit";

/// A classified line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatInput<'a> {
    /// End the chat.
    Exit,
    /// Nothing but whitespace; re-prompt.
    Empty,
    /// Send this text to the model.
    Message(&'a str),
}

/// Classifies one line of user input.
///
/// # Examples
///
/// ```
/// # use compa::chat::{ChatInput, parse_input};
/// assert_eq!(parse_input("  !exit \n"), ChatInput::Exit);
/// assert_eq!(parse_input("   "), ChatInput::Empty);
/// assert_eq!(parse_input(" hello "), ChatInput::Message("hello"));
/// ```
pub fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        ChatInput::Empty
    } else if line == EXIT_COMMAND {
        ChatInput::Exit
    } else {
        ChatInput::Message(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_is_exact_after_trimming() {
        assert_eq!(parse_input("!exit"), ChatInput::Exit);
        assert_eq!(parse_input("\t!exit  "), ChatInput::Exit);
        assert_eq!(parse_input("!EXIT"), ChatInput::Message("!EXIT"));
        assert_eq!(parse_input("!exit now"), ChatInput::Message("!exit now"));
        assert_eq!(parse_input("! exit"), ChatInput::Message("! exit"));
    }

    #[test]
    fn blank_lines_are_empty() {
        assert_eq!(parse_input(""), ChatInput::Empty);
        assert_eq!(parse_input(" \t \r\n"), ChatInput::Empty);
    }

    #[test]
    fn messages_are_trimmed() {
        assert_eq!(
            parse_input("  What is Rust?\n"),
            ChatInput::Message("What is Rust?")
        );
    }
}
