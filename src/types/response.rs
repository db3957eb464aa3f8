use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::types::{Content, UsageMetadata};

/// Reasons why the model stopped generating a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FinishReason {
    /// Default value; unused by the API in practice.
    Unspecified,

    /// Natural stop point or a stop sequence.
    Stop,

    /// The response reached the maximum token limit.
    MaxTokens,

    /// The candidate was flagged for safety reasons.
    Safety,

    /// The candidate was flagged for recitation.
    Recitation,

    /// The candidate used an unsupported language.
    Language,

    /// The candidate contained forbidden terms.
    Blocklist,

    /// The candidate contained prohibited content.
    ProhibitedContent,

    /// The candidate contained sensitive personally identifiable information.
    Spii,

    /// Unknown reason.
    Other(String),
}

impl FinishReason {
    /// Returns true if this reason means the provider withheld the text.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            FinishReason::Safety
                | FinishReason::Recitation
                | FinishReason::Blocklist
                | FinishReason::ProhibitedContent
                | FinishReason::Spii
        )
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::Unspecified => write!(f, "FINISH_REASON_UNSPECIFIED"),
            FinishReason::Stop => write!(f, "STOP"),
            FinishReason::MaxTokens => write!(f, "MAX_TOKENS"),
            FinishReason::Safety => write!(f, "SAFETY"),
            FinishReason::Recitation => write!(f, "RECITATION"),
            FinishReason::Language => write!(f, "LANGUAGE"),
            FinishReason::Blocklist => write!(f, "BLOCKLIST"),
            FinishReason::ProhibitedContent => write!(f, "PROHIBITED_CONTENT"),
            FinishReason::Spii => write!(f, "SPII"),
            FinishReason::Other(other) => write!(f, "{other}"),
        }
    }
}

impl FromStr for FinishReason {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "FINISH_REASON_UNSPECIFIED" => FinishReason::Unspecified,
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" => FinishReason::Safety,
            "RECITATION" => FinishReason::Recitation,
            "LANGUAGE" => FinishReason::Language,
            "BLOCKLIST" => FinishReason::Blocklist,
            "PROHIBITED_CONTENT" => FinishReason::ProhibitedContent,
            "SPII" => FinishReason::Spii,
            other => FinishReason::Other(other.to_string()),
        })
    }
}

impl Serialize for FinishReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FinishReason {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.parse() {
            Ok(reason) => Ok(reason),
            Err(never) => match never {},
        }
    }
}

/// One generated answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The generated turn.  Absent when the candidate was blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    /// Why generation stopped.  Absent on intermediate stream chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,

    /// Position of the candidate in the response.
    #[serde(default)]
    pub index: u32,
}

/// Feedback about the prompt itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Set when the prompt was refused outright.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

/// Response of `generateContent`, and of each `streamGenerateContent` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated candidates.
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    /// Feedback on the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,

    /// Token accounting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,

    /// The model version that served the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, which may be empty.
    pub fn chunk_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(Content::text)
            .unwrap_or_default()
    }

    /// Finish reason of the first candidate, if any.
    pub fn finish_reason(&self) -> Option<&FinishReason> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.finish_reason.as_ref())
    }

    /// Returns an error if the provider refused the prompt.
    pub fn check_prompt_feedback(&self) -> Result<()> {
        match self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_ref())
        {
            Some(reason) => Err(Error::blocked(reason.clone())),
            None => Ok(()),
        }
    }

    /// The answer text, or the reason there is none.
    pub fn text(&self) -> Result<String> {
        self.check_prompt_feedback()?;
        if self.candidates.is_empty() {
            return Err(Error::empty_response("the response contained no candidates"));
        }
        let text = self.chunk_text();
        if !text.is_empty() {
            return Ok(text);
        }
        match self.finish_reason() {
            Some(reason) if reason.is_blocking() => Err(Error::blocked(reason.to_string())),
            Some(reason) => Err(Error::empty_response(format!(
                "no text in the response (finish reason {reason})"
            ))),
            None => Err(Error::empty_response("no text in the response")),
        }
    }
}
