//! uiforge Agent
//!
//! Turns a natural-language intent into a validated plan, component source
//! and a short explanation. Every model call is optional: without a
//! [`ModelClient`] the deterministic fallbacks produce the same document
//! shapes, and their output passes the same validators.
//!
//! # Core Concepts
//!
//! - **Request**: mode, intent, current source and the last accepted plan
//! - **Stages**: `Idle -> Planning -> ValidatingPlan -> GeneratingCode ->
//!   ValidatingCode -> Explaining -> Done`, or `Error`
//! - **Change plans**: `modify` runs edit the last plan through
//!   add/remove/update operations and never rebuild it
//! - **Response**: either `{plan, code, explanation, changePlan}` or
//!   `{error, mode}`; nothing partial is returned
//!
//! # Example
//!
//! ```rust
//! use uiforge_agent::{Agent, AgentConfig, AgentRequest, Mode};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let agent = Agent::new(AgentConfig::default()).unwrap();
//! let run = runtime.block_on(agent.run(&AgentRequest::new(Mode::Generate, "a table")));
//! let output = run.result.unwrap();
//! assert!(output.code.contains("<Table"));
//! assert!(output.fallback);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod request;
pub mod stage;

pub use config::{AgentConfig, CodeSource};
pub use error::{
    AgentError, ConfigError, MissingInput, ModelError, ParseError, PromptError, Step,
};
pub use extract::ResponseParser;
pub use model::{complete_with_timeout, ModelClient};
pub use pipeline::{Agent, AgentRun};
pub use prompts::{
    DirTemplates, EmbeddedTemplates, PromptCache, TemplateName, TemplateSource,
};
pub use request::{AgentRequest, AgentResponse, Mode, RunOutput};
pub use stage::{allowed_transitions, validate_transition, PipelineStage, StageError, StageTrail};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
