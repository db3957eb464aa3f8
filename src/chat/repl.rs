//! The interactive loop and the startup sequence around it.

use std::time::Instant;

use crate::chat::commands::{ChatInput, parse_input};
use crate::chat::config::ChatConfig;
use crate::chat::input::{InputEvent, LineSource};
use crate::chat::personas::{Persona, load_personas, menu, parse_selection};
use crate::chat::session::{Connector, Conversation};
use crate::config::{ConfigSource, Credentials, GenerationConfig};
use crate::error::ChatError;
use crate::observability::{CHAT_TURN_DURATION, CHAT_TURN_ERRORS, CHAT_TURNS};
use crate::render::Renderer;

/// Printed once the session is ready.
pub const GREETING: &str =
    "Hi, how can I assist you today? Feel free to ask anything! (Type '!exit' to quit)";

/// Printed when the chat ends normally.
pub const FAREWELL: &str = "Goodbye!";

/// Printed when there is no sampling parameters file.
pub const DEFAULTS_WARNING: &str = "Configuration file not found. Using default values.";

/// How the chat loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The user typed the exit command.
    Command,
    /// Input ran out.
    EndOfInput,
}

/// Process outcome of [`run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The chat ended normally.
    Success,
    /// Startup or terminal input failed.
    Failure,
}

impl ExitStatus {
    /// The process exit code.
    pub fn code(&self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

/// Reads lines and exchanges them with `session` until the user leaves.
///
/// Failed exchanges are reported and the loop carries on; only a failure to
/// read input ends it with an error.
pub async fn chat_loop<C, L>(
    session: &mut C,
    generation: &GenerationConfig,
    input: &mut L,
    renderer: &mut dyn Renderer,
) -> Result<LoopExit, ChatError>
where
    C: Conversation + ?Sized,
    L: LineSource + ?Sized,
{
    loop {
        let prompt = renderer.prompt();
        let line = match input.read_line(&prompt).map_err(ChatError::Input)? {
            InputEvent::Line(line) => line,
            InputEvent::Interrupted => continue,
            InputEvent::Eof => {
                renderer.print_greeting(FAREWELL);
                return Ok(LoopExit::EndOfInput);
            }
        };
        let text = match parse_input(&line) {
            ChatInput::Exit => {
                renderer.print_greeting(FAREWELL);
                return Ok(LoopExit::Command);
            }
            ChatInput::Empty => continue,
            ChatInput::Message(text) => text,
        };

        CHAT_TURNS.click();
        let start = Instant::now();
        let result = session.send_message(text, generation, renderer).await;
        CHAT_TURN_DURATION.add(start.elapsed().as_secs_f64());
        match result {
            Ok(reply) if reply.streamed => renderer.finish_response(),
            Ok(reply) => renderer.print_response(&reply.text),
            Err(err) => {
                CHAT_TURN_ERRORS.click();
                renderer.print_error(&ChatError::Generation(err).to_string());
            }
        }
    }
}

/// Shows the persona menu until the user makes a valid choice.
///
/// Returns `None` when input runs out first.
pub fn select_persona<L>(
    personas: &[Persona],
    input: &mut L,
    renderer: &mut dyn Renderer,
) -> Result<Option<usize>, ChatError>
where
    L: LineSource + ?Sized,
{
    renderer.print_info(menu(personas).trim_end());
    loop {
        let prompt = renderer.prompt();
        match input.read_line(&prompt).map_err(ChatError::Input)? {
            InputEvent::Line(line) => match parse_selection(&line, personas.len()) {
                Ok(idx) => return Ok(Some(idx)),
                Err(err) => renderer.print_error(&err.to_string()),
            },
            InputEvent::Interrupted => continue,
            InputEvent::Eof => return Ok(None),
        }
    }
}

/// Runs the whole chat: configuration, session, persona choice, then the
/// loop.  Errors are printed through `renderer`.
///
/// `env` looks up environment variables; the binary passes the process
/// environment.
pub async fn run<C, L, F>(
    connector: &C,
    config: &ChatConfig,
    env: F,
    input: &mut L,
    renderer: &mut dyn Renderer,
) -> ExitStatus
where
    C: Connector,
    L: LineSource + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    renderer.print_banner();
    match start_and_chat(connector, config, env, input, renderer).await {
        Ok(_) => ExitStatus::Success,
        Err(err) => {
            renderer.print_error(&err.to_string());
            ExitStatus::Failure
        }
    }
}

async fn start_and_chat<C, L, F>(
    connector: &C,
    config: &ChatConfig,
    env: F,
    input: &mut L,
    renderer: &mut dyn Renderer,
) -> Result<LoopExit, ChatError>
where
    C: Connector,
    L: LineSource + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    let credentials = Credentials::from_lookup(env).map_err(ChatError::Configuration)?;
    let (generation, source) = GenerationConfig::load_or_default(&config.config_path)
        .map_err(ChatError::Configuration)?;
    if source == ConfigSource::Defaults {
        renderer.print_warning(DEFAULTS_WARNING);
    }
    let personas = match &config.contexts_path {
        Some(path) => match load_personas(path) {
            Ok(personas) => personas,
            Err(err) => {
                renderer.print_warning(&format!("Ignoring contexts file: {err}"));
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let mut session = connector
        .open_session(&credentials)
        .await
        .map_err(ChatError::Session)?;

    if !personas.is_empty() {
        match select_persona(&personas, input, renderer)? {
            Some(idx) => session.prime(&personas[idx].context),
            None => {
                renderer.print_greeting(FAREWELL);
                return Ok(LoopExit::EndOfInput);
            }
        }
    }

    renderer.print_greeting(GREETING);
    chat_loop(&mut session, &generation, input, renderer).await
}
