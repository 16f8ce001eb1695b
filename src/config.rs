//! Configuration loading via `ortho-config`.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Stratus account configuration derived from environment variables,
/// configuration files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "STRATUS")]
pub struct StratusConfig {
    /// Account that owns the machines. This value is required.
    pub account: String,
    /// User name exchanged for a session token. This value is required.
    pub user: String,
    /// Password exchanged for a session token. This value is required.
    pub password: String,
    /// Group new machines are created in. Defaults to `default`.
    #[ortho_config(default = "default".to_owned())]
    pub group: String,
    /// Zone new machines are created in. Defaults to `york`.
    #[ortho_config(default = "york".to_owned())]
    pub zone: String,
    /// Base URL of the machine API. Overridable so tests can point the
    /// client at a local mock server.
    #[ortho_config(default = "https://uk0.stratus.cloud".to_owned())]
    pub api_url: String,
    /// Base URL of the authentication service issuing session tokens.
    #[ortho_config(default = "https://auth.stratus.cloud".to_owned())]
    pub auth_url: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
    section: &'static str,
}

impl FieldMetadata {
    const fn new(
        description: &'static str,
        env_var: &'static str,
        toml_key: &'static str,
        section: &'static str,
    ) -> Self {
        Self {
            description,
            env_var,
            toml_key,
            section,
        }
    }
}

impl StratusConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to [{}] in stratus.toml",
                metadata.description, metadata.env_var, metadata.toml_key, metadata.section
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("stratus")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.account,
            &FieldMetadata::new("account name", "STRATUS_ACCOUNT", "account", "stratus"),
        )?;
        Self::require_field(
            &self.user,
            &FieldMetadata::new("user name", "STRATUS_USER", "user", "stratus"),
        )?;
        Self::require_field(
            &self.password,
            &FieldMetadata::new("password", "STRATUS_PASSWORD", "password", "stratus"),
        )?;
        Self::require_field(
            &self.group,
            &FieldMetadata::new("machine group", "STRATUS_GROUP", "group", "stratus"),
        )?;
        Self::require_field(
            &self.zone,
            &FieldMetadata::new("zone", "STRATUS_ZONE", "zone", "stratus"),
        )?;
        Self::require_field(
            &self.api_url,
            &FieldMetadata::new("machine API URL", "STRATUS_API_URL", "api_url", "stratus"),
        )?;
        Self::require_field(
            &self.auth_url,
            &FieldMetadata::new(
                "authentication URL",
                "STRATUS_AUTH_URL",
                "auth_url",
                "stratus",
            ),
        )?;
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
