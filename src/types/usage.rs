use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Token accounting reported with each response.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt, including earlier turns.
    #[serde(default)]
    pub prompt_token_count: u32,

    /// Tokens across all generated candidates.
    #[serde(default)]
    pub candidates_token_count: u32,

    /// Prompt plus candidates.
    #[serde(default)]
    pub total_token_count: u32,
}

impl UsageMetadata {
    /// Create a new `UsageMetadata` with the given prompt and candidate counts.
    pub fn new(prompt_token_count: u32, candidates_token_count: u32) -> Self {
        Self {
            prompt_token_count,
            candidates_token_count,
            total_token_count: prompt_token_count.saturating_add(candidates_token_count),
        }
    }
}

impl Add for UsageMetadata {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            prompt_token_count: self.prompt_token_count.saturating_add(rhs.prompt_token_count),
            candidates_token_count: self
                .candidates_token_count
                .saturating_add(rhs.candidates_token_count),
            total_token_count: self.total_token_count.saturating_add(rhs.total_token_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_partial() {
        let usage: UsageMetadata =
            serde_json::from_str(r#"{"promptTokenCount": 7, "totalTokenCount": 7}"#).unwrap();
        assert_eq!(usage.prompt_token_count, 7);
        assert_eq!(usage.candidates_token_count, 0);
        assert_eq!(usage.total_token_count, 7);
    }

    #[test]
    fn add_usage() {
        let total = UsageMetadata::new(10, 5) + UsageMetadata::new(3, 2);
        assert_eq!(total, UsageMetadata::new(13, 7));
    }
}
