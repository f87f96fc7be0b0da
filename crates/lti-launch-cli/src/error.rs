//! Error types for CLI operations

use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific errors with context
#[derive(Error, Debug)]
pub enum CliError {
    /// Launch failed
    #[error("Launch error: {0}")]
    Launch(#[from] lti_launch::AuthenticationError),

    /// Platform configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] lti_launch::ConfigError),

    /// Key set could not be produced
    #[error("Token error: {0}")]
    Token(#[from] lti_launch::TokenError),

    /// Content items could not be converted
    #[error("Content item error: {0}")]
    ContentItems(#[from] lti_launch::ContentItemError),

    /// Input file could not be read
    #[error("Cannot read {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid command arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Get user-friendly suggestions for resolving the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Config(_) => vec![
                "Check that the config file exists and ends in .toml, .yaml or .json",
                "Check that private_key_path points to a readable PEM file",
                "Environment overrides use the LTI_LAUNCH__ prefix",
            ],
            Self::Launch(_) => vec![
                "Check that the registration lists the redirect URI",
                "Check that the registration client_id matches",
            ],
            Self::Json(_) | Self::ContentItems(_) => vec![
                "Flat parameters must be a JSON object of strings",
                "Claims must be a JSON object",
            ],
            Self::Input { .. } => vec!["Use '-' to read from stdin"],
            _ => vec![],
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions_for_config_errors() {
        let error = CliError::Config(lti_launch::ConfigError::UnsupportedFormat);
        assert!(!error.suggestions().is_empty());
        assert!(CliError::InvalidArguments("x".into()).suggestions().is_empty());
    }
}
