//! Models and canned actions offered to the host
//!
//! Action prompts are embedded markdown templates. The review prompt places
//! the gathered code with the `{{patch}}` placeholder; the commit prompt
//! relies on the appended code section instead.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MODEL;

const REVIEW_CHANGE_PROMPT: &str = include_str!("prompts/review_change.md");
const REVIEW_COMMIT_PROMPT: &str = include_str!("prompts/review_commit.md");

/// API reference linked from the host's model picker
pub const DOCUMENTATION_URL: &str = "https://ai.google.dev/api/generate-content";

/// Action selected when the host has no preference
pub const DEFAULT_ACTION_ID: &str = "review";

/// One selectable model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: String,
    pub short_text: String,
    pub full_display_text: String,
}

impl ModelInfo {
    /// Describe a Gemini model by id
    pub fn gemini(model_id: impl Into<String>) -> Self {
        let model_id = model_id.into();
        Self {
            full_display_text: format!("Gemini ({})", model_id),
            short_text: "Gemini".to_string(),
            model_id,
        }
    }
}

/// A named action with its canned instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub display_text: String,
    pub enable_send_without_input: bool,
    pub initial_user_prompt: String,
}

impl Action {
    fn canned(id: &str, display_text: &str, prompt: &str) -> Self {
        Self {
            id: id.to_string(),
            display_text: display_text.to_string(),
            enable_send_without_input: true,
            initial_user_prompt: prompt.to_string(),
        }
    }
}

/// Answer to the host's model query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Models {
    pub models: Vec<ModelInfo>,
    pub default_model_id: String,
    pub documentation_url: String,
    pub custom_actions: Vec<Action>,
}

/// Answer to the host's action query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actions {
    pub actions: Vec<Action>,
    pub default_action_id: String,
}

impl Actions {
    /// Look an action up by id
    pub fn find(&self, id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }
}

/// The fixed action menu
pub fn default_actions() -> Vec<Action> {
    vec![
        Action::canned("review-change", "Help me with review", REVIEW_CHANGE_PROMPT),
        Action::canned("review-commit", "Improve commit message", REVIEW_COMMIT_PROMPT),
    ]
}

/// Models offered when `default_model` is the provider's default
///
/// The built-in model is always listed; a configured model that differs
/// from it is listed too and becomes the default.
pub fn models_for(default_model: &str) -> Models {
    let mut models = vec![ModelInfo::gemini(DEFAULT_MODEL)];
    if default_model != DEFAULT_MODEL {
        models.push(ModelInfo::gemini(default_model));
    }

    Models {
        models,
        default_model_id: default_model.to_string(),
        documentation_url: DOCUMENTATION_URL.to_string(),
        custom_actions: default_actions(),
    }
}

/// The action menu with its default
pub fn actions() -> Actions {
    Actions {
        actions: default_actions(),
        default_action_id: DEFAULT_ACTION_ID.to_string(),
    }
}
