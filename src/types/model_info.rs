use serde::{Deserialize, Serialize};

/// Generation method the chat loop relies on.
pub const GENERATE_CONTENT: &str = "generateContent";

/// Information about a specific model, as returned by `GET models/{model}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Resource name, e.g. `models/gemini-2.0-flash`.
    pub name: String,

    /// A human-readable name for the model.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Maximum number of input tokens.
    #[serde(default)]
    pub input_token_limit: Option<u32>,

    /// Maximum number of output tokens.
    #[serde(default)]
    pub output_token_limit: Option<u32>,

    /// The API methods this model can serve.
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Returns true if the model can serve `generateContent`.
    ///
    /// An empty method list is taken to mean the API did not say.
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods.is_empty()
            || self
                .supported_generation_methods
                .iter()
                .any(|method| method == GENERATE_CONTENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_info_deserialization() {
        let json = serde_json::json!({
            "name": "models/gemini-2.0-flash",
            "version": "2.0",
            "displayName": "Gemini 2.0 Flash",
            "inputTokenLimit": 1048576,
            "outputTokenLimit": 8192,
            "supportedGenerationMethods": ["generateContent", "countTokens"]
        });
        let info: ModelInfo = serde_json::from_value(json).unwrap();
        assert_eq!(info.name, "models/gemini-2.0-flash");
        assert_eq!(info.display_name.as_deref(), Some("Gemini 2.0 Flash"));
        assert_eq!(info.output_token_limit, Some(8192));
        assert!(info.supports_generate_content());
    }

    #[test]
    fn embedding_model_does_not_generate() {
        let info = ModelInfo {
            name: "models/text-embedding-004".to_string(),
            supported_generation_methods: vec!["embedContent".to_string()],
            ..ModelInfo::default()
        };
        assert!(!info.supports_generate_content());
    }
}
