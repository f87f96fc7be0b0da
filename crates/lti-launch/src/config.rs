//! Platform configuration
//!
//! Loaded from TOML, YAML or JSON. Environment variables with the `LTI_LAUNCH` prefix
//! override file settings, using `__` for nesting
//! (`LTI_LAUNCH__INSTANCE__NAME=Campus`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Default environment prefix.
pub const ENV_PREFIX: &str = "LTI_LAUNCH";

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported file format
    #[error("Unsupported configuration file format. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat,

    /// Configuration parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),

    /// Key file could not be read
    #[error("Failed to read key file {path}: {source}")]
    KeyFile {
        /// Path that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Key material was rejected
    #[error("Invalid signing key: {0}")]
    InvalidKey(#[from] TokenError),
}

/// Which kind of private key the platform signs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SigningAlgorithm {
    /// RSA PKCS#1 v1.5 with SHA-256
    #[default]
    RS256,
    /// ECDSA P-256 with SHA-256
    ES256,
}

/// Identity of this platform instance, sent as `tool_platform`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Instance name
    pub name: Option<String>,
    /// Globally unique instance id
    pub guid: Option<String>,
    /// Product family code
    pub product_family_code: Option<String>,
    /// Product version
    pub version: Option<String>,
    /// Contact email
    pub contact_email: Option<String>,
    /// Instance URL
    pub url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines
    pub structured: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            structured: false,
        }
    }
}

/// Platform configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Issuer placed in every token
    pub issuer: String,
    /// Key id published with the signing key
    pub key_id: String,
    /// PEM file holding the private key
    pub private_key_path: PathBuf,
    /// Key kind
    #[serde(default)]
    pub key_algorithm: SigningAlgorithm,
    /// Lifetime of `lti_message_hint` tokens in seconds
    #[serde(default = "default_hint_lifetime")]
    pub hint_lifetime_secs: u64,
    /// Lifetime of `id_token`s in seconds
    #[serde(default = "default_id_token_lifetime")]
    pub id_token_lifetime_secs: u64,
    /// Clock skew tolerance in seconds
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
    /// Platform instance details
    #[serde(default)]
    pub instance: InstanceConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_hint_lifetime() -> u64 {
    600
}

fn default_id_token_lifetime() -> u64 {
    60
}

fn default_leeway() -> u64 {
    60
}

impl PlatformConfig {
    /// Load configuration from a file (TOML, YAML, or JSON)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file doesn't exist
    /// - The file format is unsupported
    /// - The file contains invalid configuration
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_file_with_prefix(path, ENV_PREFIX)
    }

    /// Load configuration from a file with a custom environment prefix
    ///
    /// # Errors
    ///
    /// Same as [`PlatformConfig::from_file`].
    pub fn from_file_with_prefix(
        path: impl AsRef<Path>,
        env_prefix: &str,
    ) -> Result<Self, ConfigError> {
        use config::{Config, File, FileFormat};

        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => return Err(ConfigError::UnsupportedFormat),
        };

        let config = Config::builder()
            .add_source(File::new(
                path.to_str().ok_or(ConfigError::UnsupportedFormat)?,
                format,
            ))
            .add_source(
                config::Environment::with_prefix(env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Read the private key file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KeyFile`] if the file cannot be read.
    pub fn read_private_key(&self) -> Result<String, ConfigError> {
        std::fs::read_to_string(&self.private_key_path).map_err(|source| ConfigError::KeyFile {
            path: self.private_key_path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_file_toml_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
issuer = "https://lms.example"
key_id = "k1"
private_key_path = "/etc/lti/key.pem"
key_algorithm = "ES256"

[instance]
name = "Campus LMS"
"#
        )
        .unwrap();

        let config = PlatformConfig::from_file_with_prefix(file.path(), "LTI_LAUNCH_TEST_NONE")
            .unwrap();
        assert_eq!(config.issuer, "https://lms.example");
        assert_eq!(config.key_algorithm, SigningAlgorithm::ES256);
        assert_eq!(config.hint_lifetime_secs, 600);
        assert_eq!(config.id_token_lifetime_secs, 60);
        assert_eq!(config.instance.name.as_deref(), Some("Campus LMS"));
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_missing_and_unsupported_files() {
        assert!(matches!(
            PlatformConfig::from_file("/nonexistent/lti.toml"),
            Err(ConfigError::FileNotFound(_))
        ));

        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            PlatformConfig::from_file(file.path()),
            Err(ConfigError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_unreadable_key_file() {
        let config = PlatformConfig {
            issuer: "i".into(),
            key_id: "k".into(),
            private_key_path: "/nonexistent/key.pem".into(),
            key_algorithm: SigningAlgorithm::RS256,
            hint_lifetime_secs: 600,
            id_token_lifetime_secs: 60,
            leeway_secs: 60,
            instance: InstanceConfig::default(),
            logging: LoggingConfig::default(),
        };
        assert!(matches!(
            config.read_private_key(),
            Err(ConfigError::KeyFile { .. })
        ));
    }
}
