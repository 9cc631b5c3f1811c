//! Error types for the run pipeline
//!
//! Every variant of [`AgentError`] is fatal for the request it occurred in:
//! the caller gets one descriptive message and no partial plan or code.
//! Explainer failures never surface here; they degrade to placeholder text.

use crate::stage::StageError;
use std::fmt;
use std::path::PathBuf;
use uiforge_plan::ApplyError;
use uiforge_policy::{CodeViolation, PlanViolation, PolicyError, ValidationReport};

/// Pipeline step that talks to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Plan or change-plan production
    Planner,
    /// Source generation
    Generator,
    /// Explanation narration
    Explainer,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Planner => "Planner",
            Self::Generator => "Generator",
            Self::Explainer => "Explainer",
        })
    }
}

/// Request inputs that must be present
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MissingInput {
    /// `modify` without a previous plan
    #[error("Modify requested without an existing plan.")]
    LastPlan,

    /// Empty or whitespace-only intent
    #[error("Missing user intent.")]
    Intent,
}

/// Main pipeline error
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A required input is absent
    #[error(transparent)]
    MissingInput(#[from] MissingInput),

    /// The plan tree left the policy envelope
    #[error("Plan validation failed: {}", .0.joined())]
    PlanValidation(ValidationReport<PlanViolation>),

    /// The generated source left the policy envelope
    #[error("Code validation failed: {}", .0.joined())]
    CodeValidation(ValidationReport<CodeViolation>),

    /// One or more change-plan operations failed
    #[error("Change plan failed: {}", join_errors(.0))]
    ChangeApply(Vec<ApplyError>),

    /// Model call failed
    #[error("{step} failed: {source}")]
    Model {
        step: Step,
        #[source]
        source: ModelError,
    },

    /// Model output could not be turned into a document
    #[error("{step} failed: {source}")]
    Parse {
        step: Step,
        #[source]
        source: ParseError,
    },

    /// Prompt template could not be loaded
    #[error("{step} failed: {source}")]
    Prompt {
        step: Step,
        #[source]
        source: PromptError,
    },

    /// Policy tables failed to compile
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Configuration is unusable
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The pipeline attempted an illegal stage transition
    #[error("pipeline error: {0}")]
    Stage(#[from] StageError),
}

impl AgentError {
    /// Model failure during `step`
    #[inline]
    #[must_use]
    pub fn model(step: Step, source: ModelError) -> Self {
        Self::Model { step, source }
    }

    /// Parse failure during `step`
    #[inline]
    #[must_use]
    pub fn parse(step: Step, source: impl Into<ParseError>) -> Self {
        Self::Parse {
            step,
            source: source.into(),
        }
    }

    /// Prompt failure during `step`
    #[inline]
    #[must_use]
    pub fn prompt(step: Step, source: PromptError) -> Self {
        Self::Prompt { step, source }
    }

    /// Check if the error came from user input rather than a pipeline step
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::MissingInput(_))
    }
}

fn join_errors(errors: &[ApplyError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Failure reported by a model client
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Network or connection failure
    #[error("{0}")]
    Transport(String),

    /// The service answered with an error
    #[error("{0}")]
    Api(String),

    /// The call did not finish in time
    #[error("model call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// No response was available
    #[error("model returned no response")]
    Empty,
}

/// Failure turning model output into a document
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// No `{ ... }` span in the text
    #[error("No JSON object found in response.")]
    NoJsonObject,

    /// JSON syntax or shape error
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Failure loading a prompt template
#[derive(Debug, Clone, thiserror::Error)]
pub enum PromptError {
    /// Template name is unknown to the source
    #[error("prompt template {name} not found")]
    NotFound { name: String },

    /// Template file could not be read
    #[error("failed to read prompt template {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for the schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
