//! Interactive chat with a Gemini model.
//!
//! This module provides the REPL built on top of the compa client library.
//! It supports:
//!
//! - Batched responses rendered in a panel, or streamed responses printed as
//!   they arrive
//! - An optional menu of opening contexts ("personas")
//! - The `!exit` command to leave
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: the [`Connector`]/[`Conversation`] seams and their Gemini
//!   implementation
//! - [`commands`]: classification of input lines
//! - [`input`]: terminal line input
//! - [`personas`]: the opening-context file and menu
//! - [`repl`]: the loop and the startup sequence around it

pub mod commands;
pub mod config;
pub mod input;
pub mod personas;
pub mod repl;
pub mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatInput, EXIT_COMMAND, parse_input};
pub use config::{ChatArgs, ChatConfig};
pub use input::{InputEvent, LineSource, TerminalInput};
pub use personas::{Persona, SelectionError, load_personas, parse_personas, parse_selection};
pub use repl::{
    DEFAULTS_WARNING, ExitStatus, FAREWELL, GREETING, LoopExit, chat_loop, run, select_persona,
};
pub use session::{Connector, Conversation, GeminiConnector, GeminiSession, Reply};
