//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! [`ChatConfig`] the chat runs with.  Running without arguments is the
//! normal case; every option has a default.

use std::path::PathBuf;

use arrrg_derive::CommandLine;

use crate::config::DEFAULT_CONFIG_PATH;

/// Command-line arguments for the compa-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Path of the sampling parameters file.
    #[arrrg(optional, "Sampling parameters file (default: config.json)", "PATH")]
    pub config: Option<String>,

    /// Path of a personas file to choose an opening context from.
    #[arrrg(optional, "Personas file offering opening contexts", "PATH")]
    pub contexts: Option<String>,

    /// Stream responses as they are generated.
    #[arrrg(flag, "Stream responses as they are generated")]
    pub stream: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Override the API root.
    #[arrrg(optional, "API root URL (default: Gemini v1beta)", "URL")]
    pub base_url: Option<String>,

    /// Append every request and response to this file as JSON lines.
    #[arrrg(optional, "Append API traffic to this file as JSON lines", "PATH")]
    pub wire_log: Option<String>,
}

/// Configuration for a chat run.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Where the sampling parameters are read from.
    pub config_path: PathBuf,

    /// Optional personas file.
    pub contexts_path: Option<PathBuf>,

    /// Whether to stream responses.
    pub streaming: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// API root override.
    pub base_url: Option<String>,

    /// Wire log destination.
    pub wire_log: Option<PathBuf>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Sampling parameters: `config.json`
    /// - Personas: none
    /// - Streaming: disabled
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            contexts_path: None,
            streaming: false,
            use_color: true,
            base_url: None,
            wire_log: None,
        }
    }

    /// Sets the sampling parameters path.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    /// Sets the personas path.
    pub fn with_contexts_path(mut self, path: Option<PathBuf>) -> Self {
        self.contexts_path = path;
        self
    }

    /// Enables or disables streaming.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the API root override.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            config_path: args
                .config
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            contexts_path: args.contexts.map(PathBuf::from),
            streaming: args.stream,
            use_color: !args.no_color,
            base_url: args.base_url,
            wire_log: args.wire_log.map(PathBuf::from),
        }
    }
}
