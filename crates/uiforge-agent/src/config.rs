//! Agent configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no
//! file) yields a working deterministic setup. The `[policy]` table
//! overrides the policy catalog.
//!
//! ```toml
//! model = "gpt-5"
//! code_source = "model"
//! model_timeout_secs = 30
//!
//! [policy]
//! allowed_imports = ["./ui-kit"]
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uiforge_policy::PolicyCatalog;

/// Where generated source comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeSource {
    /// Render with the code generator
    #[default]
    Deterministic,
    /// Ask the model, then validate its output
    Model,
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model identifier passed to the client
    pub model: String,
    /// Temperature for the planner call
    pub planner_temperature: f32,
    /// Temperature for the generator call
    pub generator_temperature: f32,
    /// Temperature for the explainer call
    pub explainer_temperature: f32,
    /// Timeout applied to every model call
    pub model_timeout_secs: u64,
    /// Source of generated code when a model is configured
    pub code_source: CodeSource,
    /// Characters of intent passed to prompts
    pub intent_limit: usize,
    /// Characters of current code passed to the planner
    pub code_limit: usize,
    /// Characters of current code passed to the generator
    pub generator_code_limit: usize,
    /// Directory of prompt templates; embedded templates when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_dir: Option<PathBuf>,
    /// Maximum number of cached templates
    pub prompt_cache_capacity: u64,
    /// Policy catalog
    pub policy: PolicyCatalog,
}

impl AgentConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] on out-of-range values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`AgentConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first bad field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(invalid("model", "must not be empty"));
        }
        for (field, value) in [
            ("planner_temperature", self.planner_temperature),
            ("generator_temperature", self.generator_temperature),
            ("explainer_temperature", self.explainer_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(invalid(field, format!("{value} is outside 0.0..=2.0")));
            }
        }
        if self.model_timeout_secs == 0 {
            return Err(invalid("model_timeout_secs", "must be at least 1"));
        }
        if self.prompt_cache_capacity == 0 {
            return Err(invalid("prompt_cache_capacity", "must be at least 1"));
        }
        if self.policy.component_kinds.is_empty() {
            return Err(invalid("policy.component_kinds", "must list at least one kind"));
        }
        Ok(())
    }

    /// Model call timeout
    #[inline]
    #[must_use]
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    /// With model identifier
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// With code source
    #[inline]
    #[must_use]
    pub fn with_code_source(mut self, source: CodeSource) -> Self {
        self.code_source = source;
        self
    }

    /// With model call timeout in seconds
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.model_timeout_secs = secs;
        self
    }

    /// With prompt template directory
    #[inline]
    #[must_use]
    pub fn with_prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// With policy catalog
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: PolicyCatalog) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-5".to_string(),
            planner_temperature: 0.1,
            generator_temperature: 0.2,
            explainer_temperature: 0.2,
            model_timeout_secs: 60,
            code_source: CodeSource::Deterministic,
            intent_limit: 4000,
            code_limit: 4000,
            generator_code_limit: 6000,
            prompt_dir: None,
            prompt_cache_capacity: 64,
            policy: PolicyCatalog::standard(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
