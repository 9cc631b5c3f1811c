//! Run pipeline
//!
//! [`Agent::run`] takes one [`AgentRequest`] through planning, plan
//! validation, code generation, code validation and explanation. Without a
//! model client every step uses the deterministic fallbacks; with one, the
//! model's output is held to the same validators.

use crate::config::{AgentConfig, CodeSource};
use crate::error::{AgentError, MissingInput, ModelError, Step};
use crate::extract::ResponseParser;
use crate::fallback;
use crate::model::{complete_with_timeout, ModelClient};
use crate::prompts::{fill, truncate, DirTemplates, EmbeddedTemplates, PromptCache, TemplateName, TemplateSource};
use crate::request::{AgentRequest, AgentResponse, Mode, RunOutput};
use crate::stage::{PipelineStage, StageTrail};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uiforge_codegen::CodeGenerator;
use uiforge_plan::{apply_change_plan, normalize_ids, ChangePlan, Plan};
use uiforge_policy::{policy_notes, Policy};

/// Placeholder for absent plan or change-plan prompt values
const NONE_PLACEHOLDER: &str = "(none)";

/// Outcome of one run, with the stages it went through
#[derive(Debug)]
pub struct AgentRun {
    /// Effective mode
    pub mode: Mode,
    /// Visited stages, ending in `Done` or `Error`
    pub stages: Vec<PipelineStage>,
    /// Run result
    pub result: Result<RunOutput, AgentError>,
}

impl AgentRun {
    /// Wire response for this run
    #[must_use]
    pub fn into_response(self) -> AgentResponse {
        match self.result {
            Ok(output) => AgentResponse::Success(output),
            Err(err) => AgentResponse::Failure {
                error: err.to_string(),
                mode: self.mode,
            },
        }
    }
}

/// A plan produced by the planning stage, before validation
enum Draft {
    /// Model output, still untyped
    Raw(Value),
    /// Typed plan from the fallback planner or the apply engine
    Typed(Plan),
}

/// Request-scoped pipeline over shared, read-only policy and templates
#[derive(Debug, Clone)]
pub struct Agent {
    config: AgentConfig,
    policy: Policy,
    generator: CodeGenerator,
    parser: ResponseParser,
    prompts: PromptCache,
    model: Option<Arc<dyn ModelClient>>,
}

impl Agent {
    /// Build an agent from `config`
    ///
    /// Templates come from `config.prompt_dir` when set, otherwise from the
    /// embedded set. No model is attached; see [`Agent::with_model`].
    ///
    /// # Errors
    /// Returns [`AgentError::Config`] for out-of-range values and
    /// [`AgentError::Policy`] if a catalog pattern fails to compile
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        config.validate()?;
        let policy = Policy::new(config.policy.clone())?;
        let source: Arc<dyn TemplateSource> = match &config.prompt_dir {
            Some(dir) => Arc::new(DirTemplates::new(dir)),
            None => Arc::new(EmbeddedTemplates),
        };
        Ok(Self {
            generator: CodeGenerator::new(policy.catalog().clone()),
            parser: ResponseParser::new()?,
            prompts: PromptCache::new(source, config.prompt_cache_capacity),
            policy,
            config,
            model: None,
        })
    }

    /// With a model client for planning, generation and explanation
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn ModelClient>) -> Self {
        self.model = Some(model);
        self
    }

    /// With a different template source
    #[must_use]
    pub fn with_templates(mut self, source: Arc<dyn TemplateSource>) -> Self {
        self.prompts = PromptCache::new(source, self.config.prompt_cache_capacity);
        self
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Compiled policy in use
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Check if a model client is attached
    #[inline]
    #[must_use]
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Run one request to completion
    pub async fn run(&self, request: &AgentRequest) -> AgentRun {
        let mode = request.mode;
        info!(%mode, model = self.has_model(), "run started");

        let mut trail = StageTrail::new();
        let result = self.execute(request, &mut trail).await;
        match &result {
            Ok(_) => info!(%mode, "run finished"),
            Err(err) => {
                trail.fail();
                warn!(%mode, error = %err, "run failed");
            }
        }

        AgentRun {
            mode,
            stages: trail.into_stages(),
            result,
        }
    }

    /// Run one request and return its wire response
    pub async fn respond(&self, request: &AgentRequest) -> AgentResponse {
        self.run(request).await.into_response()
    }

    async fn execute(
        &self,
        request: &AgentRequest,
        trail: &mut StageTrail,
    ) -> Result<RunOutput, AgentError> {
        let mode = request.mode;
        if mode == Mode::Modify && request.last_plan.is_none() {
            return Err(MissingInput::LastPlan.into());
        }
        if request.user_intent.trim().is_empty() {
            return Err(MissingInput::Intent.into());
        }

        let notes = policy_notes(&self.policy.intent().screen(&request.user_intent));

        trail.advance(PipelineStage::Planning)?;
        let (draft, change_plan) = self.plan(request, &notes).await?;

        trail.advance(PipelineStage::ValidatingPlan)?;
        let plan = self.accept_plan(draft)?;

        trail.advance(PipelineStage::GeneratingCode)?;
        let code = self.generate_code(request, &plan, change_plan.as_ref()).await?;

        trail.advance(PipelineStage::ValidatingCode)?;
        let report = self.policy.code().validate(&code);
        if !report.ok() {
            return Err(AgentError::CodeValidation(report));
        }

        trail.advance(PipelineStage::Explaining)?;
        let explanation = self
            .explain(request, &plan, change_plan.as_ref(), &notes)
            .await;

        trail.advance(PipelineStage::Done)?;
        Ok(RunOutput {
            plan,
            code,
            explanation,
            change_plan,
            fallback: self.model.is_none(),
        })
    }

    async fn plan(
        &self,
        request: &AgentRequest,
        notes: &str,
    ) -> Result<(Draft, Option<ChangePlan>), AgentError> {
        let Some(model) = &self.model else {
            return Ok(match (request.mode, &request.last_plan) {
                (Mode::Modify, Some(last)) => {
                    let change = fallback::build_change_plan(&request.user_intent, Some(last));
                    (Draft::Typed(self.apply(last, &change)?), Some(change))
                }
                _ => (Draft::Typed(fallback::build_plan(&request.user_intent)), None),
            });
        };

        let last_plan = match &request.last_plan {
            Some(plan) => pretty(plan, Step::Planner)?,
            None => NONE_PLACEHOLDER.to_string(),
        };
        let template = self
            .prompts
            .get(TemplateName::Planner)
            .await
            .map_err(|err| AgentError::prompt(Step::Planner, err))?;
        let intent = truncate(&request.user_intent, self.config.intent_limit);
        let current_code = truncate(&request.current_code, self.config.code_limit);
        let prompt = fill(
            &template,
            &[
                ("MODE", request.mode.as_str()),
                ("USER_INTENT", intent.as_str()),
                ("CURRENT_CODE", current_code.as_str()),
                ("LAST_PLAN", last_plan.as_str()),
                ("POLICY_NOTES", notes),
            ],
        );

        let output = self
            .call(model.as_ref(), &prompt, self.config.planner_temperature)
            .await
            .map_err(|err| AgentError::model(Step::Planner, err))?;
        let document = self
            .parser
            .extract_json(&output)
            .map_err(|err| AgentError::parse(Step::Planner, err))?;

        match (request.mode, &request.last_plan) {
            (Mode::Modify, Some(last)) => {
                let change: ChangePlan = serde_json::from_value(document)
                    .map_err(|err| AgentError::parse(Step::Planner, err))?;
                debug!(operations = change.operations.len(), "model change plan decoded");
                Ok((Draft::Typed(self.apply(last, &change)?), Some(change)))
            }
            _ => Ok((Draft::Raw(document), None)),
        }
    }

    /// Apply `change` to `last`, discarding the result if any operation failed
    fn apply(&self, last: &Plan, change: &ChangePlan) -> Result<Plan, AgentError> {
        let mut plan = apply_change_plan(last, change)
            .into_result()
            .map_err(AgentError::ChangeApply)?;
        if let Some(tree) = &plan.tree {
            plan.components = self.policy.catalog().used_components(tree);
        }
        Ok(plan)
    }

    fn accept_plan(&self, draft: Draft) -> Result<Plan, AgentError> {
        let plan = match draft {
            Draft::Typed(plan) => plan,
            Draft::Raw(document) => {
                let report = self.policy.plans().validate_value(&document);
                if !report.ok() {
                    return Err(AgentError::PlanValidation(report));
                }
                let mut plan: Plan = serde_json::from_value(document)
                    .map_err(|err| AgentError::parse(Step::Planner, err))?;
                if let Some(tree) = plan.tree.as_mut() {
                    normalize_ids(tree);
                    plan.components = self.policy.catalog().used_components(tree);
                }
                plan
            }
        };

        let report = self.policy.plans().validate(&plan);
        if !report.ok() {
            return Err(AgentError::PlanValidation(report));
        }
        Ok(plan)
    }

    async fn generate_code(
        &self,
        request: &AgentRequest,
        plan: &Plan,
        change_plan: Option<&ChangePlan>,
    ) -> Result<String, AgentError> {
        let model = match (&self.model, self.config.code_source) {
            (Some(model), CodeSource::Model) => model,
            _ => return Ok(self.generator.generate(plan)),
        };

        let template = self
            .prompts
            .get(TemplateName::Generator)
            .await
            .map_err(|err| AgentError::prompt(Step::Generator, err))?;
        let plan_text = pretty(plan, Step::Generator)?;
        let change_text = pretty_opt(change_plan, Step::Generator)?;
        let current_code = truncate(&request.current_code, self.config.generator_code_limit);
        let prompt = fill(
            &template,
            &[
                ("MODE", request.mode.as_str()),
                ("PLAN", plan_text.as_str()),
                ("CHANGE_PLAN", change_text.as_str()),
                ("CURRENT_CODE", current_code.as_str()),
            ],
        );

        let output = self
            .call(model.as_ref(), &prompt, self.config.generator_temperature)
            .await
            .map_err(|err| AgentError::model(Step::Generator, err))?;
        Ok(self.parser.strip_code_fences(&output))
    }

    /// Explanation text; failures become placeholder text instead of errors
    async fn explain(
        &self,
        request: &AgentRequest,
        plan: &Plan,
        change_plan: Option<&ChangePlan>,
        notes: &str,
    ) -> String {
        let Some(model) = &self.model else {
            return fallback::build_explanation(request.mode, plan, change_plan, notes);
        };

        match self.explain_with_model(model.as_ref(), request, plan, change_plan, notes).await {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "explainer failed, returning placeholder");
                err.to_string()
            }
        }
    }

    async fn explain_with_model(
        &self,
        model: &dyn ModelClient,
        request: &AgentRequest,
        plan: &Plan,
        change_plan: Option<&ChangePlan>,
        notes: &str,
    ) -> Result<String, AgentError> {
        let template = self
            .prompts
            .get(TemplateName::Explainer)
            .await
            .map_err(|err| AgentError::prompt(Step::Explainer, err))?;
        let plan_text = pretty(plan, Step::Explainer)?;
        let change_text = pretty_opt(change_plan, Step::Explainer)?;
        let intent = truncate(&request.user_intent, self.config.intent_limit);
        let prompt = fill(
            &template,
            &[
                ("MODE", request.mode.as_str()),
                ("USER_INTENT", intent.as_str()),
                ("POLICY_NOTES", notes),
                ("PLAN", plan_text.as_str()),
                ("CHANGE_PLAN", change_text.as_str()),
            ],
        );

        let text = self
            .call(model, &prompt, self.config.explainer_temperature)
            .await
            .map_err(|err| AgentError::model(Step::Explainer, err))?;
        Ok(with_notes(text, notes))
    }

    async fn call(
        &self,
        model: &dyn ModelClient,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, ModelError> {
        complete_with_timeout(
            model,
            prompt,
            &self.config.model,
            temperature,
            self.config.model_timeout(),
        )
        .await
    }
}

/// Append advisory notes to model-written narration
fn with_notes(text: String, notes: &str) -> String {
    if notes == uiforge_policy::NO_NOTES {
        text
    } else {
        format!("{}\n\nIgnored requests: {notes}", text.trim_end())
    }
}

fn pretty<T: serde::Serialize>(value: &T, step: Step) -> Result<String, AgentError> {
    serde_json::to_string_pretty(value).map_err(|err| AgentError::parse(step, err))
}

fn pretty_opt<T: serde::Serialize>(value: Option<&T>, step: Step) -> Result<String, AgentError> {
    value.map_or_else(|| Ok(NONE_PLACEHOLDER.to_string()), |value| pretty(value, step))
}
