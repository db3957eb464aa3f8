use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::types::Content;

/// Sampling parameters as the API expects them on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    /// Sampling temperature.
    pub temperature: f64,

    /// Maximum tokens in the response.
    pub max_output_tokens: u32,

    /// Top-k sampling limit.
    pub top_k: u32,

    /// Nucleus sampling threshold.
    pub top_p: f64,
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_tokens,
            top_k: config.top_k,
            top_p: config.top_p,
        }
    }
}

/// Body of a `generateContent` or `streamGenerateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The conversation so far, ending with the newest user turn.
    pub contents: Vec<Content>,

    /// Sampling parameters for this call.
    pub generation_config: GenerationParams,
}

impl GenerateContentRequest {
    /// Create a request for the given conversation.
    pub fn new(contents: Vec<Content>, config: &GenerationConfig) -> Self {
        Self {
            contents,
            generation_config: GenerationParams::from(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_wire_format() {
        let config = GenerationConfig {
            temperature: 0.5,
            max_tokens: 200,
            top_k: 40,
            top_p: 0.25,
        };
        let request = GenerateContentRequest::new(vec![Content::user("hello")], &config);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "generationConfig": {
                    "temperature": 0.5,
                    "maxOutputTokens": 200,
                    "topK": 40,
                    "topP": 0.25
                }
            })
        );
    }

    #[test]
    fn sampling_values_reach_the_wire_unchanged() {
        let config = GenerationConfig {
            temperature: 0.123456789,
            max_tokens: 200,
            top_k: 40,
            top_p: 0.987654321,
        };
        let request = GenerateContentRequest::new(vec![Content::user("hi")], &config);
        let text = serde_json::to_string(&request).unwrap();
        assert!(text.contains(r#""temperature":0.123456789"#), "{text}");
        assert!(text.contains(r#""topP":0.987654321"#), "{text}");
    }
}
