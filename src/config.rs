//! Sampling parameters and credentials.
//!
//! The sampling parameters live in a small JSON file (`config.json` by
//! default).  The credentials come from the process environment.  Both are
//! validated once, up front, and reported field by field when they are wrong.

use std::fmt;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::types::Model;

/// Default location of the sampling parameters file.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "API_KEY";

/// Environment variable holding the model name.
pub const MODEL_NAME_VAR: &str = "MODEL_NAME";

const TEMPERATURE: &str = "temperature";
const MAX_TOKENS: &str = "max_tokens";
const TOP_K: &str = "top_k";
const TOP_P: &str = "top_p";

/// Sampling parameters sent with every message.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Sampling temperature in `[0.0, 1.0]`.
    pub temperature: f64,
    /// Maximum tokens per response.
    pub max_tokens: u32,
    /// Top-k sampling limit.
    pub top_k: u32,
    /// Nucleus sampling threshold in `[0.0, 1.0]`.
    pub top_p: f64,
}

/// Where a [`GenerationConfig`] came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from the configuration file.
    File,
    /// The file did not exist; defaults were used.
    Defaults,
}

impl GenerationConfig {
    /// Parses and validates the JSON text of a configuration file.
    ///
    /// All four keys are required.  Unknown keys are ignored.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|err| {
            Error::configuration(format!("configuration is not valid JSON: {err}"), None)
        })?;
        let Value::Object(object) = value else {
            return Err(Error::configuration(
                "configuration must be a JSON object",
                None,
            ));
        };
        let config = Self {
            temperature: float_field(&object, TEMPERATURE)?,
            max_tokens: positive_int_field(&object, MAX_TOKENS)?,
            top_k: positive_int_field(&object, TOP_K)?,
            top_p: float_field(&object, TOP_P)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::configuration(
                format!("could not read {}: {err}", path.display()),
                None,
            )
        })?;
        Self::from_json(&text)
    }

    /// Reads the configuration file at `path`, falling back to the defaults
    /// when the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<(Self, ConfigSource)> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Ok((Self::from_json(&text)?, ConfigSource::File)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Ok((Self::default(), ConfigSource::Defaults))
            }
            Err(err) => Err(Error::configuration(
                format!("could not read {}: {err}", path.display()),
                None,
            )),
        }
    }

    /// Checks the ranges of every field.
    pub fn validate(&self) -> Result<()> {
        check_unit_interval(TEMPERATURE, self.temperature)?;
        check_unit_interval(TOP_P, self.top_p)?;
        if self.max_tokens == 0 {
            return Err(invalid(MAX_TOKENS, "must be a positive integer"));
        }
        if self.top_k == 0 {
            return Err(invalid(TOP_K, "must be a positive integer"));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            max_tokens: 200,
            top_k: 40,
            top_p: 0.9,
        }
    }
}

fn invalid(field: &str, what: &str) -> Error {
    Error::configuration(format!("`{field}` {what}"), Some(field.to_string()))
}

fn require<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a Value> {
    object
        .get(field)
        .ok_or_else(|| invalid(field, "is missing"))
}

fn float_field(object: &Map<String, Value>, field: &str) -> Result<f64> {
    require(object, field)?
        .as_f64()
        .ok_or_else(|| invalid(field, "must be a number"))
}

fn positive_int_field(object: &Map<String, Value>, field: &str) -> Result<u32> {
    let value = require(object, field)?;
    if !value.is_number() {
        return Err(invalid(field, "must be a number"));
    }
    value
        .as_u64()
        .and_then(|value| u32::try_from(value).ok())
        .filter(|value| *value > 0)
        .ok_or_else(|| invalid(field, "must be a positive integer"))
}

fn check_unit_interval(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, "must be between 0.0 and 1.0"))
    }
}

//////////////////////////////////////////// Credentials ///////////////////////////////////////////

/// API key and model read from the environment.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    api_key: String,
    model: Model,
}

impl Credentials {
    /// Create credentials directly.
    pub fn new(api_key: impl Into<String>, model: Model) -> Self {
        Self {
            api_key: api_key.into(),
            model,
        }
    }

    /// Reads `API_KEY` and `MODEL_NAME` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads `API_KEY` and `MODEL_NAME` through `lookup`.
    ///
    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| {
                    Error::configuration(
                        format!(
                            "{API_KEY_VAR} and {MODEL_NAME_VAR} must be set in .env file or environment variables"
                        ),
                        Some(name.to_string()),
                    )
                })
        };
        let api_key = read(API_KEY_VAR)?;
        let model_name = read(MODEL_NAME_VAR)?;
        let model = model_name
            .parse::<Model>()
            .map_err(|err| Error::configuration(err.to_string(), Some(MODEL_NAME_VAR.to_string())))?;
        Ok(Self { api_key, model })
    }

    /// The API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The model to chat with.
    pub fn model(&self) -> &Model {
        &self.model
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::types::KnownModel;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn parse_exact_values() {
        let config = GenerationConfig::from_json(
            r#"{"temperature": 0.7, "max_tokens": 200, "top_k": 40, "top_p": 0.9}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            GenerationConfig {
                temperature: 0.7,
                max_tokens: 200,
                top_k: 40,
                top_p: 0.9,
            }
        );
    }

    #[test]
    fn fractional_values_are_kept_and_checked_at_full_precision() {
        let config = GenerationConfig::from_json(
            r#"{"temperature": 0.123456789, "max_tokens": 1, "top_k": 1, "top_p": 0.987654321}"#,
        )
        .unwrap();
        assert_eq!(config.temperature, 0.123456789);
        assert_eq!(config.top_p, 0.987654321);

        let err = GenerationConfig::from_json(
            r#"{"temperature": 1.00000001, "max_tokens": 1, "top_k": 1, "top_p": 0.5}"#,
        )
        .unwrap_err();
        assert_eq!(err.field(), Some(TEMPERATURE));
        let err = GenerationConfig::from_json(
            r#"{"temperature": 0.5, "max_tokens": 1, "top_k": 1, "top_p": 1.00000001}"#,
        )
        .unwrap_err();
        assert_eq!(err.field(), Some(TOP_P));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = GenerationConfig::from_json(
            r#"{"temperature": 0, "max_tokens": 1, "top_k": 1, "top_p": 1, "seed": 3}"#,
        )
        .unwrap();
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.top_p, 1.0);
    }

    #[test]
    fn each_missing_key_is_named() {
        for field in [TEMPERATURE, MAX_TOKENS, TOP_K, TOP_P] {
            let mut object = serde_json::json!({
                "temperature": 0.7, "max_tokens": 200, "top_k": 40, "top_p": 0.9
            });
            object.as_object_mut().unwrap().remove(field);
            let err = GenerationConfig::from_json(&object.to_string()).unwrap_err();
            assert!(err.is_configuration());
            assert_eq!(err.field(), Some(field));
            assert!(err.to_string().contains("is missing"), "{err}");
        }
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        for field in [TEMPERATURE, MAX_TOKENS, TOP_K, TOP_P] {
            let mut object = serde_json::json!({
                "temperature": 0.7, "max_tokens": 200, "top_k": 40, "top_p": 0.9
            });
            object[field] = serde_json::json!("high");
            let err = GenerationConfig::from_json(&object.to_string()).unwrap_err();
            assert_eq!(err.field(), Some(field));
            assert!(err.to_string().contains("must be a number"), "{err}");
        }
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = GenerationConfig::from_json(
            r#"{"temperature": 1.5, "max_tokens": 200, "top_k": 40, "top_p": 0.9}"#,
        )
        .unwrap_err();
        assert_eq!(err.field(), Some(TEMPERATURE));

        let err = GenerationConfig::from_json(
            r#"{"temperature": 0.5, "max_tokens": 0, "top_k": 40, "top_p": 0.9}"#,
        )
        .unwrap_err();
        assert_eq!(err.field(), Some(MAX_TOKENS));

        let err = GenerationConfig::from_json(
            r#"{"temperature": 0.5, "max_tokens": 10, "top_k": 2.5, "top_p": 0.9}"#,
        )
        .unwrap_err();
        assert_eq!(err.field(), Some(TOP_K));

        let err = GenerationConfig::from_json(
            r#"{"temperature": 0.5, "max_tokens": 10, "top_k": 2, "top_p": -0.1}"#,
        )
        .unwrap_err();
        assert_eq!(err.field(), Some(TOP_P));
    }

    #[test]
    fn malformed_documents() {
        assert!(GenerationConfig::from_json("{").unwrap_err().is_configuration());
        assert!(GenerationConfig::from_json("[1, 2]").unwrap_err().is_configuration());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("compa-config-does-not-exist.json");
        let (config, source) = GenerationConfig::load_or_default(&path).unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config, GenerationConfig::default());
        assert!(GenerationConfig::from_file(&path).is_err());
    }

    #[test]
    fn existing_file_is_read() {
        let path = std::env::temp_dir().join(format!("compa-config-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"temperature": 0.2, "max_tokens": 64, "top_k": 8, "top_p": 0.5}"#,
        )
        .unwrap();
        let (config, source) = GenerationConfig::load_or_default(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(source, ConfigSource::File);
        assert_eq!(config.max_tokens, 64);
        assert_eq!(config.top_k, 8);
    }

    #[test]
    fn credentials_from_lookup() {
        let creds =
            Credentials::from_lookup(env(&[("API_KEY", "k"), ("MODEL_NAME", "models/gemini-2.0-flash")]))
                .unwrap();
        assert_eq!(creds.api_key(), "k");
        assert_eq!(creds.model(), &Model::Known(KnownModel::Gemini20Flash));
    }

    #[test]
    fn missing_credentials() {
        let err = Credentials::from_lookup(env(&[("MODEL_NAME", "m")])).unwrap_err();
        assert_eq!(err.field(), Some(API_KEY_VAR));

        let err = Credentials::from_lookup(env(&[("API_KEY", "k"), ("MODEL_NAME", "  ")]))
            .unwrap_err();
        assert_eq!(err.field(), Some(MODEL_NAME_VAR));
    }

    #[test]
    fn model_name_with_url_syntax_is_a_configuration_error() {
        let err = Credentials::from_lookup(env(&[("API_KEY", "k"), ("MODEL_NAME", "flash?key=x")]))
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.field(), Some(MODEL_NAME_VAR));
        assert!(err.to_string().contains("invalid model name"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let creds = Credentials::new("secret-key", Model::Custom("m".to_string()));
        let debug = format!("{creds:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }
}
