//! Opening contexts ("personas") the user can start a chat from.
//!
//! A personas file is a JSON array of `{"name": ..., "context": ...}`
//! objects.  The user picks one by its 1-based number and its context becomes
//! the opening user turn of the conversation.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named opening context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Shown in the selection menu.
    pub name: String,
    /// Primed into the conversation when chosen.
    pub context: String,
}

/// Reads personas from `path`.
pub fn load_personas<P: AsRef<Path>>(path: P) -> Result<Vec<Persona>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|err| Error::io(format!("cannot read {}", path.display()), err))?;
    parse_personas(&text)
}

/// Parses a personas document.
pub fn parse_personas(text: &str) -> Result<Vec<Persona>> {
    serde_json::from_str(text).map_err(|err| {
        Error::configuration(format!("invalid personas file: {err}"), None)
    })
}

/// The numbered menu shown before chatting.
pub fn menu(personas: &[Persona]) -> String {
    let mut menu = String::from("Who do you want to chat with?\n");
    for (idx, persona) in personas.iter().enumerate() {
        menu.push_str(&format!("{}. {}\n", idx + 1, persona.name));
    }
    menu
}

/// Why a menu choice was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    /// The input was not a number.
    NotANumber,
    /// The number is not on the menu.
    OutOfRange,
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::NotANumber => write!(f, "Invalid input. Please enter a number."),
            SelectionError::OutOfRange => write!(f, "Invalid context index. Please try again."),
        }
    }
}

/// Turns a 1-based menu choice into an index into a list of `count` personas.
pub fn parse_selection(input: &str, count: usize) -> std::result::Result<usize, SelectionError> {
    let choice: i64 = input
        .trim()
        .parse()
        .map_err(|_| SelectionError::NotANumber)?;
    if choice >= 1 && (choice as u64) <= count as u64 {
        Ok(choice as usize - 1)
    } else {
        Err(SelectionError::OutOfRange)
    }
}
