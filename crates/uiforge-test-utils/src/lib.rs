//! Testing utilities for the uiforge workspace
//!
//! Shared fixtures and a scripted [`ModelClient`] for pipeline tests.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use uiforge_agent::{ModelClient, ModelError};
use uiforge_plan::{Node, Plan};

/// One recorded model call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
}

/// Model client that replays queued replies in order
///
/// Once the queue is empty every call fails with [`ModelError::Empty`].
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    #[must_use]
    pub fn reply(mut self, text: impl Into<String>) -> Self {
        self.replies.get_mut().push_back(Ok(text.into()));
        self
    }

    /// Queue a failed reply
    #[must_use]
    pub fn fail(mut self, error: ModelError) -> Self {
        self.replies.get_mut().push_back(Err(error));
        self
    }

    /// Sleep for `delay` before answering each call
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls made so far
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// Number of replies not yet consumed
    pub async fn remaining(&self) -> usize {
        self.replies.lock().await.len()
    }
}

#[async_trait::async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<String, ModelError> {
        self.calls.lock().await.push(RecordedCall {
            prompt: prompt.to_string(),
            model: model.to_string(),
            temperature,
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(ModelError::Empty))
    }
}

/// Small valid plan: a section holding one card with a button
///
/// Ids: `root`, `node-1` (section), `node-2` (Card), `node-3` (Button),
/// `text-1` (button label).
pub fn sample_plan() -> Plan {
    let button = Node::element("node-3", "Button").with_child(Node::text("text-1", "Go"));
    let card = Node::element("node-2", "Card")
        .with_prop("title", "Summary")
        .with_child(button);
    let tree = Node::element("root", "div").with_child(Node::element("node-1", "section").with_child(card));
    Plan::new(
        "Single card with an action",
        vec!["Card".to_string(), "Button".to_string()],
        tree,
    )
}

/// Plan whose only component is a button with id `button_id`
pub fn plan_with_button(button_id: &str) -> Plan {
    let tree = Node::element("root", "div").with_child(
        Node::element("node-1", "section").with_child(
            Node::element(button_id, "Button").with_child(Node::text("text-1", "Save")),
        ),
    );
    Plan::new("One button", vec!["Button".to_string()], tree)
}

/// Planner reply wrapping `plan` in a fenced JSON block with chatter around it
pub fn fenced_reply(document: &serde_json::Value) -> String {
    format!(
        "Here is the plan:\n```json\n{}\n```\nLet me know if you need changes.",
        serde_json::to_string_pretty(document).unwrap()
    )
}
