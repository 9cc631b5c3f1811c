//! Runs with a scripted model client

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uiforge_agent::{
    Agent, AgentConfig, AgentRequest, CodeSource, Mode, ModelError, PipelineStage,
};
use uiforge_plan::{has_unique_ids, Node, Plan};
use uiforge_test_utils::{fenced_reply, sample_plan, ScriptedModel};

fn agent_with(model: &Arc<ScriptedModel>, config: AgentConfig) -> Agent {
    Agent::new(config).unwrap().with_model(model.clone())
}

fn two_card_plan() -> serde_json::Value {
    json!({
        "kind": "plan",
        "layout": "Two cards side by side",
        "components": ["Chart"],
        "tree": {
            "type": "div",
            "children": [
                { "id": "a", "type": "Card", "props": { "title": "One" } },
                { "id": "a", "type": "Card", "props": { "title": "Two" } },
                "Footer note"
            ]
        }
    })
}

#[tokio::test]
async fn model_plan_is_normalized_and_recounted() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply(fenced_reply(&two_card_plan()))
            .reply("Two cards were placed."),
    );
    let agent = agent_with(&model, AgentConfig::default());
    let output = agent
        .run(&AgentRequest::new(Mode::Generate, "two cards"))
        .await
        .result
        .unwrap();

    assert!(!output.fallback);
    assert_eq!(output.plan.components, vec!["Card"]);
    assert!(has_unique_ids(output.plan.tree.as_ref().unwrap()));
    assert_eq!(output.explanation, "Two cards were placed.");
    assert!(output.code.contains("<Card title={\"Two\"}></Card>"));

    let calls = model.calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].model, "gpt-5");
    assert!((calls[0].temperature - 0.1).abs() < f32::EPSILON);
    assert!((calls[1].temperature - 0.2).abs() < f32::EPSILON);
    assert!(calls[0].prompt.contains("two cards"));
    assert!(calls[0].prompt.contains("(none)"));
}

#[tokio::test]
async fn planner_without_json_fails() {
    let model = Arc::new(ScriptedModel::new().reply("I would rather not."));
    let run = agent_with(&model, AgentConfig::default())
        .run(&AgentRequest::new(Mode::Generate, "a card"))
        .await;
    assert_eq!(
        run.stages,
        vec![PipelineStage::Idle, PipelineStage::Planning, PipelineStage::Error]
    );
    assert_eq!(
        run.result.unwrap_err().to_string(),
        "Planner failed: No JSON object found in response."
    );
}

#[tokio::test]
async fn model_error_names_the_step() {
    let model = Arc::new(ScriptedModel::new().fail(ModelError::Api("rate limited".to_string())));
    let response = agent_with(&model, AgentConfig::default())
        .respond(&AgentRequest::new(Mode::Generate, "a card"))
        .await;
    assert_eq!(response.error(), Some("Planner failed: rate limited"));
}

#[tokio::test]
async fn disallowed_plan_type_fails_validation() {
    let plan = json!({
        "layout": "grid",
        "tree": { "id": "root", "type": "div", "children": [ { "id": "g", "type": "Grid" } ] }
    });
    let model = Arc::new(ScriptedModel::new().reply(plan.to_string()));
    let run = agent_with(&model, AgentConfig::default())
        .run(&AgentRequest::new(Mode::Generate, "a grid"))
        .await;
    assert_eq!(run.stages.last(), Some(&PipelineStage::Error));
    assert_eq!(
        run.result.unwrap_err().to_string(),
        "Plan validation failed: Invalid node type Grid at root.div[0]"
    );
}

#[tokio::test]
async fn styling_props_in_plan_fail_validation() {
    let plan = json!({
        "tree": {
            "id": "root", "type": "div",
            "children": [ { "id": "c", "type": "Card", "props": { "className": "big" } } ]
        }
    });
    let model = Arc::new(ScriptedModel::new().reply(plan.to_string()));
    let response = agent_with(&model, AgentConfig::default())
        .respond(&AgentRequest::new(Mode::Generate, "a big card"))
        .await;
    assert_eq!(
        response.error(),
        Some("Plan validation failed: Disallowed styling props at root.div[0]")
    );
}

#[tokio::test]
async fn explainer_failure_becomes_placeholder() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply(two_card_plan().to_string())
            .fail(ModelError::Transport("connection reset".to_string())),
    );
    let run = agent_with(&model, AgentConfig::default())
        .run(&AgentRequest::new(Mode::Generate, "two cards"))
        .await;
    assert_eq!(run.stages.last(), Some(&PipelineStage::Done));
    assert_eq!(run.result.unwrap().explanation, "Explainer failed: connection reset");
}

#[tokio::test]
async fn explainer_gets_notes_appended() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply(two_card_plan().to_string())
            .reply("Two cards."),
    );
    let output = agent_with(&model, AgentConfig::default())
        .run(&AgentRequest::new(Mode::Generate, "two cards using bootstrap"))
        .await
        .result
        .unwrap();
    assert_eq!(
        output.explanation,
        "Two cards.\n\nIgnored requests: Styling or external UI library request ignored."
    );
    let calls = model.calls().await;
    assert!(calls[0].prompt.contains("Styling or external UI library request ignored."));
}

#[tokio::test]
async fn slow_model_times_out() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply(two_card_plan().to_string())
            .with_delay(Duration::from_secs(3)),
    );
    let config = AgentConfig::default().with_timeout_secs(1);
    let response = agent_with(&model, config)
        .respond(&AgentRequest::new(Mode::Generate, "two cards"))
        .await;
    assert_eq!(
        response.error(),
        Some("Planner failed: model call timed out after 1s")
    );
}

#[tokio::test]
async fn modify_applies_model_change_plan_with_clamped_position() {
    let mut base = sample_plan();
    base.tree
        .as_mut()
        .and_then(|tree| tree.find_mut("node-1"))
        .and_then(Node::children_mut)
        .unwrap()
        .push(Node::element("node-4", "Chart").with_prop("title", "Trend"));
    let change = json!({
        "kind": "change_plan",
        "summary": "Added a table.",
        "operations": [{
            "op": "add",
            "parentId": "node-1",
            "position": 5,
            "node": { "id": "node-2", "type": "Table", "props": { "columns": ["A"] } }
        }]
    });
    let model = Arc::new(
        ScriptedModel::new()
            .reply(fenced_reply(&change))
            .reply("A table now closes the section."),
    );
    let request = AgentRequest::new(Mode::Modify, "add a table at the end").with_last_plan(base);
    let output = agent_with(&model, AgentConfig::default())
        .run(&request)
        .await
        .result
        .unwrap();

    let section = output.plan.find("node-1").unwrap();
    assert_eq!(section.children().len(), 3);
    assert_eq!(section.children()[2].node_type(), "Table");
    assert!(has_unique_ids(output.plan.tree.as_ref().unwrap()));
    assert_eq!(output.plan.components, vec!["Button", "Card", "Table", "Chart"]);
    assert_eq!(output.change_plan.unwrap().summary, "Added a table.");

    let calls = model.calls().await;
    assert!(calls[0].prompt.contains("\"node-4\""));
}

#[tokio::test]
async fn modify_with_unknown_target_fails() {
    let change = json!({
        "summary": "Removed it.",
        "operations": [{ "op": "remove", "targetId": "ghost" }]
    });
    let model = Arc::new(ScriptedModel::new().reply(change.to_string()));
    let request = AgentRequest::new(Mode::Modify, "remove the ghost").with_last_plan(sample_plan());
    let run = agent_with(&model, AgentConfig::default()).run(&request).await;
    assert_eq!(run.stages.last(), Some(&PipelineStage::Error));
    assert!(run
        .result
        .unwrap_err()
        .to_string()
        .starts_with("Change plan failed:"));
}

#[tokio::test]
async fn model_generated_code_is_fence_stripped_and_validated() {
    let code = "import { Card } from \"./ui-kit\";\n\nexport default function GeneratedUI() {\n  return <Card title={\"One\"}></Card>;\n}\n";
    let model = Arc::new(
        ScriptedModel::new()
            .reply(two_card_plan().to_string())
            .reply(format!("```jsx\n{code}```"))
            .reply("Done."),
    );
    let config = AgentConfig::default().with_code_source(CodeSource::Model);
    let output = agent_with(&model, config)
        .run(&AgentRequest::new(Mode::Generate, "two cards"))
        .await
        .result
        .unwrap();
    assert_eq!(output.code, code);
    assert!(model.calls().await[1].prompt.contains("\"Two cards side by side\""));
}

#[tokio::test]
async fn model_generated_code_with_class_names_is_rejected() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply(two_card_plan().to_string())
            .reply("import { Card } from './ui-kit';\n<Card className=\"x\" />"),
    );
    let config = AgentConfig::default().with_code_source(CodeSource::Model);
    let run = agent_with(&model, config)
        .run(&AgentRequest::new(Mode::Generate, "two cards"))
        .await;
    assert_eq!(run.stages.last(), Some(&PipelineStage::Error));
    assert_eq!(
        run.result.unwrap_err().to_string(),
        "Code validation failed: className is not allowed"
    );
    assert_eq!(model.remaining().await, 0);
}

#[tokio::test]
async fn empty_generator_reply_has_no_code() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply(two_card_plan().to_string())
            .reply("```\n```"),
    );
    let config = AgentConfig::default().with_code_source(CodeSource::Model);
    let response = agent_with(&model, config)
        .respond(&AgentRequest::new(Mode::Generate, "two cards"))
        .await;
    assert_eq!(response.error(), Some("Code validation failed: No code to validate."));
}

#[test]
fn plan_fixture_is_valid() {
    let plan: Plan = sample_plan();
    assert!(uiforge_policy::Policy::standard()
        .unwrap()
        .plans()
        .validate(&plan)
        .ok());
}
