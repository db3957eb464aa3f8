use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prefix the Gemini API puts in front of model resource names.
const MODEL_RESOURCE_PREFIX: &str = "models/";

/// Represents a Gemini model identifier.
///
/// This can be a published model or a custom string for models that may be
/// added in the future (or tuned models).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier (for future models or tuned models)
    Custom(String),
}

/// Known Gemini model versions
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    /// Gemini 2.5 Pro
    #[serde(rename = "gemini-2.5-pro")]
    Gemini25Pro,

    /// Gemini 2.5 Flash
    #[serde(rename = "gemini-2.5-flash")]
    Gemini25Flash,

    /// Gemini 2.5 Flash-Lite
    #[serde(rename = "gemini-2.5-flash-lite")]
    Gemini25FlashLite,

    /// Gemini 2.0 Flash
    #[serde(rename = "gemini-2.0-flash")]
    Gemini20Flash,

    /// Gemini 2.0 Flash-Lite
    #[serde(rename = "gemini-2.0-flash-lite")]
    Gemini20FlashLite,

    /// Gemini 1.5 Pro
    #[serde(rename = "gemini-1.5-pro")]
    Gemini15Pro,

    /// Gemini 1.5 Flash
    #[serde(rename = "gemini-1.5-flash")]
    Gemini15Flash,
}

impl KnownModel {
    /// Every known model, newest first.
    pub const ALL: [KnownModel; 7] = [
        KnownModel::Gemini25Pro,
        KnownModel::Gemini25Flash,
        KnownModel::Gemini25FlashLite,
        KnownModel::Gemini20Flash,
        KnownModel::Gemini20FlashLite,
        KnownModel::Gemini15Pro,
        KnownModel::Gemini15Flash,
    ];

    /// The identifier the API uses for this model.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownModel::Gemini25Pro => "gemini-2.5-pro",
            KnownModel::Gemini25Flash => "gemini-2.5-flash",
            KnownModel::Gemini25FlashLite => "gemini-2.5-flash-lite",
            KnownModel::Gemini20Flash => "gemini-2.0-flash",
            KnownModel::Gemini20FlashLite => "gemini-2.0-flash-lite",
            KnownModel::Gemini15Pro => "gemini-1.5-pro",
            KnownModel::Gemini15Flash => "gemini-1.5-flash",
        }
    }
}

impl Model {
    /// The bare identifier, without the `models/` resource prefix.
    pub fn id(&self) -> &str {
        match self {
            Model::Known(known) => known.as_str(),
            Model::Custom(custom) => custom,
        }
    }

    /// The resource name used in request paths, e.g. `models/gemini-2.0-flash`.
    pub fn resource_name(&self) -> String {
        format!("{MODEL_RESOURCE_PREFIX}{}", self.id())
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string is not a usable model name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelParseError {
    /// Nothing left after trimming and removing `models/`.
    Empty,
    /// The name holds characters that would change the request path.
    Invalid(String),
}

impl fmt::Display for ModelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelParseError::Empty => write!(f, "model name is empty"),
            ModelParseError::Invalid(name) => write!(
                f,
                "invalid model name {name:?}: only letters, digits, '-', '_' and '.' are allowed"
            ),
        }
    }
}

impl std::error::Error for ModelParseError {}

impl FromStr for Model {
    type Err = ModelParseError;

    /// Parses a model name, accepting the `models/` resource prefix.
    ///
    /// The name becomes a path segment, so anything but letters, digits,
    /// `-`, `_` and `.` is rejected, as is `..`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix(MODEL_RESOURCE_PREFIX).unwrap_or(s);
        if s.is_empty() {
            return Err(ModelParseError::Empty);
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
        if !s.chars().all(allowed) || s.contains("..") {
            return Err(ModelParseError::Invalid(s.to_string()));
        }
        Ok(KnownModel::ALL
            .iter()
            .find(|known| known.as_str() == s)
            .map(|known| Model::Known(*known))
            .unwrap_or_else(|| Model::Custom(s.to_string())))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}
