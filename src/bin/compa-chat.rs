//! Interactive chat with a Gemini model from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # API_KEY and MODEL_NAME come from the environment or a .env file
//! compa-chat
//!
//! # Stream answers and offer the personas in contexts.json
//! compa-chat --stream --contexts contexts.json
//!
//! # Disable colors (useful for piping output)
//! compa-chat --no-color
//! ```
//!
//! Type `!exit` to leave.

use std::process::ExitCode;
use std::sync::Arc;

use arrrg::CommandLine;

use compa::chat::{ChatArgs, ChatConfig, GeminiConnector, TerminalInput, run};
use compa::{ChatError, JsonLinesLogger, PlainTextRenderer, Renderer};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let (args, _) = ChatArgs::from_command_line_relaxed("compa-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let _ = dotenvy::dotenv();

    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut input = match TerminalInput::new() {
        Ok(input) => input,
        Err(err) => {
            renderer.print_error(&ChatError::Input(err).to_string());
            return ExitCode::FAILURE;
        }
    };

    let mut connector = GeminiConnector::from(&config);
    if let Some(path) = &config.wire_log {
        match JsonLinesLogger::open(path) {
            Ok(logger) => connector = connector.with_logger(Arc::new(logger)),
            Err(err) => renderer.print_warning(&format!("Wire log disabled: {err}")),
        }
    }

    let status = run(
        &connector,
        &config,
        |name| std::env::var(name).ok(),
        &mut input,
        &mut renderer,
    )
    .await;
    ExitCode::from(status.code())
}
