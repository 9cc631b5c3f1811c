//! Pipeline stages
//!
//! A run moves `Idle -> Planning -> ValidatingPlan -> GeneratingCode ->
//! ValidatingCode -> Explaining -> Done`. `Error` is reachable from every
//! non-terminal stage except `Explaining`, whose failures degrade to
//! placeholder text. No stage is retried.

use serde::Serialize;
use std::fmt;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Planning,
    ValidatingPlan,
    GeneratingCode,
    ValidatingCode,
    Explaining,
    Done,
    Error,
}

impl PipelineStage {
    /// Check if no transition leaves this stage
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::ValidatingPlan => "validating_plan",
            Self::GeneratingCode => "generating_code",
            Self::ValidatingCode => "validating_code",
            Self::Explaining => "explaining",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Illegal stage transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal stage transition {from} -> {to}")]
pub struct StageError {
    pub from: PipelineStage,
    pub to: PipelineStage,
}

/// Stages reachable in one step from `from`
#[must_use]
pub fn allowed_transitions(from: PipelineStage) -> Vec<PipelineStage> {
    use PipelineStage::*;
    match from {
        Idle => vec![Planning, Error],
        Planning => vec![ValidatingPlan, Error],
        ValidatingPlan => vec![GeneratingCode, Error],
        GeneratingCode => vec![ValidatingCode, Error],
        ValidatingCode => vec![Explaining, Error],
        Explaining => vec![Done],
        Done | Error => vec![],
    }
}

/// Check a single transition
///
/// # Errors
/// Returns [`StageError`] if `to` is not reachable from `from`
pub fn validate_transition(from: PipelineStage, to: PipelineStage) -> Result<(), StageError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StageError { from, to })
    }
}

/// Current stage plus every stage visited so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTrail {
    stages: Vec<PipelineStage>,
}

impl StageTrail {
    /// Trail starting at `Idle`
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: vec![PipelineStage::Idle],
        }
    }

    /// Current stage
    #[inline]
    #[must_use]
    pub fn current(&self) -> PipelineStage {
        self.stages.last().copied().unwrap_or(PipelineStage::Idle)
    }

    /// Move to `to`
    ///
    /// # Errors
    /// Returns [`StageError`] and leaves the trail unchanged if the move is illegal
    pub fn advance(&mut self, to: PipelineStage) -> Result<(), StageError> {
        let from = self.current();
        validate_transition(from, to)?;
        tracing::debug!(%from, %to, "stage transition");
        self.stages.push(to);
        Ok(())
    }

    /// Move to `Error`, unless already terminal
    pub fn fail(&mut self) {
        if !self.current().is_terminal() && self.advance(PipelineStage::Error).is_err() {
            tracing::warn!(stage = %self.current(), "failure reported from a stage that cannot fail");
        }
    }

    /// Visited stages, in order
    #[inline]
    #[must_use]
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// Consume into visited stages
    #[inline]
    #[must_use]
    pub fn into_stages(self) -> Vec<PipelineStage> {
        self.stages
    }
}

impl Default for StageTrail {
    fn default() -> Self {
        Self::new()
    }
}
