//! Compiler configuration (lakeql.toml)

use serde::{Deserialize, Serialize};

fn default_placeholder_prefix() -> String {
    "lakeql_val".to_string()
}

fn default_storage_function() -> String {
    "s3Cluster".to_string()
}

/// Settings that shape the execution-dialect output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Prefix of generated placeholders (`%(<prefix>_<n>)s`)
    #[serde(default = "default_placeholder_prefix")]
    pub placeholder_prefix: String,

    /// Backend function that reads external object storage
    #[serde(default = "default_storage_function")]
    pub storage_function: String,

    /// Row cap applied to the top-level LIMIT of execution statements
    #[serde(default)]
    pub max_limit: Option<u64>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            placeholder_prefix: default_placeholder_prefix(),
            storage_function: default_storage_function(),
            max_limit: None,
        }
    }
}

impl CompilerConfig {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Set the row cap
    pub fn with_max_limit(mut self, max_limit: u64) -> Self {
        self.max_limit = Some(max_limit);
        self
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CompilerConfig::default();
        assert_eq!(config.placeholder_prefix, "lakeql_val");
        assert_eq!(config.storage_function, "s3Cluster");
        assert_eq!(config.max_limit, None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = CompilerConfig::from_toml("max_limit = 100").unwrap();
        assert_eq!(config.max_limit, Some(100));
        assert_eq!(config.placeholder_prefix, "lakeql_val");
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = CompilerConfig {
            placeholder_prefix: "p".to_string(),
            storage_function: "s3".to_string(),
            max_limit: Some(50),
        };
        let toml = toml::to_string(&config).unwrap();
        let parsed = CompilerConfig::from_toml(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = CompilerConfig::from_toml("max_limit = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CompilerConfig::from_file(std::path::Path::new("/nonexistent/lakeql.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
