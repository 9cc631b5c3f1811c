//! Request and response documents
//!
//! Field names are camelCase on the wire to match the presentation layer.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use uiforge_plan::{ChangePlan, Plan};

/// Run mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Build a new plan from the intent
    #[default]
    Generate,
    /// Edit the last plan with a change plan
    Modify,
    /// Build a new plan, ignoring the last one
    Regenerate,
}

impl Mode {
    /// Mode from its wire name; anything unknown is `Generate`
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "modify" => Self::Modify,
            "regenerate" => Self::Regenerate,
            _ => Self::Generate,
        }
    }

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Modify => "modify",
            Self::Regenerate => "regenerate",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_str().map_or(Self::Generate, Self::from_name))
    }
}

/// Run request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    /// Run mode
    #[serde(default)]
    pub mode: Mode,
    /// Free-text description of the desired UI or change
    #[serde(default)]
    pub user_intent: String,
    /// Source currently shown to the user
    #[serde(default)]
    pub current_code: String,
    /// Previously accepted plan; required for `modify`
    #[serde(default)]
    pub last_plan: Option<Plan>,
}

impl AgentRequest {
    /// Request for `mode` with `intent`
    #[must_use]
    pub fn new(mode: Mode, intent: impl Into<String>) -> Self {
        Self {
            mode,
            user_intent: intent.into(),
            ..Self::default()
        }
    }

    /// With the previously accepted plan
    #[inline]
    #[must_use]
    pub fn with_last_plan(mut self, plan: Plan) -> Self {
        self.last_plan = Some(plan);
        self
    }

    /// With the currently displayed source
    #[inline]
    #[must_use]
    pub fn with_current_code(mut self, code: impl Into<String>) -> Self {
        self.current_code = code.into();
        self
    }
}

/// Successful run payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    /// Accepted plan
    pub plan: Plan,
    /// Validated source
    pub code: String,
    /// Narration of what was built
    pub explanation: String,
    /// Change plan that produced `plan` (modify only)
    pub change_plan: Option<ChangePlan>,
    /// Set when the deterministic planner ran instead of a model
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

/// Response document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AgentResponse {
    /// Run succeeded
    Success(RunOutput),
    /// Run failed; no partial plan or code
    Failure {
        /// Descriptive message
        error: String,
        /// Effective mode of the run
        mode: Mode,
    },
}

impl AgentResponse {
    /// Check if the run succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Error message, if the run failed
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}
