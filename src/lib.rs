// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod config;
pub mod error;
pub mod render;
pub mod sse;
pub mod types;

mod markdown;
mod observability;

// Re-exports
pub use client::{Gemini, ResponseStream};
pub use client_logger::{ClientLogger, JsonLinesLogger};
pub use config::{ConfigSource, Credentials, GenerationConfig};
pub use error::{ChatError, Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
