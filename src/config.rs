//! Generation options. Every field has a default, so `{}` is a valid config file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::union::EncodePolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {message}")]
    Invalid { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenConfig {
    pub encode_policy: EncodePolicy,
    /// Extra derives for emitted union structs, after the built-in ones.
    pub derives: Vec<String>,
    /// Emit doc comments from schema descriptions.
    pub emit_docs: bool,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            encode_policy: EncodePolicy::FirstMatch,
            derives: Vec::new(),
            emit_docs: true,
        }
    }
}

impl GenConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&src).map_err(|message| ConfigError::Invalid { path: display, message })
    }

    pub fn from_json(src: &str) -> Result<Self, String> {
        crate::path_de::from_str_with_path(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(GenConfig::from_json("{}").unwrap(), GenConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let cfg = GenConfig::from_json(r#"{ "encode_policy": "strict", "derives": ["Eq"] }"#).unwrap();
        assert_eq!(cfg.encode_policy, EncodePolicy::Strict);
        assert_eq!(cfg.derives, ["Eq"]);
        assert!(cfg.emit_docs);
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        let err = GenConfig::from_json(r#"{ "encode_policy": "lenient" }"#).unwrap_err();
        assert!(err.contains("encode_policy"), "{err}");
        assert!(GenConfig::from_json(r#"{ "strict": true }"#).is_err());
    }
}
