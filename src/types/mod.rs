// Public modules
pub mod content;
pub mod model;
pub mod model_info;
pub mod request;
pub mod response;
pub mod usage;

// Re-exports
pub use content::{Content, Part, Role};
pub use model::{KnownModel, Model, ModelParseError};
pub use model_info::{GENERATE_CONTENT, ModelInfo};
pub use request::{GenerateContentRequest, GenerationParams};
pub use response::{Candidate, FinishReason, GenerateContentResponse, PromptFeedback};
pub use usage::UsageMetadata;
