//! Prompt templates for modplan.
//!
//! The system prompt can be replaced from the config file; custom variables
//! are substituted as `{{name}}`.

use super::Settings;
use std::collections::HashMap;

/// Built-in system prompt for the planning assistant.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an academic planning assistant for university students choosing modules.

Always review the full chat history so follow-up questions stay consistent.
Break complex requests into sub-questions, plan the sequence of tool calls, and call several tools when needed before answering.
If a student's question is ambiguous or missing critical details, ask for clarification before committing to a tool plan.
If a question does not specify an academic year, assume the current one: {{acad_year}}.

Guidelines:
- Use 'module_overview' for general facts about a module (title, credits, description)
- Use 'module_prerequisites' for prerequisite, preclusion and fulfilment questions
- Use 'module_timetable' for lesson times, venues and semester availability
- Use 'module_search' to discover modules by keyword or level

Ground every module fact in tool results and cross-check conflicting data.
If a question falls outside academic planning, politely steer the student back to relevant topics.
If a module cannot be located, apologise and suggest verifying the code or academic year. If the tools cannot answer, explain the limitation instead of guessing."#;

/// Prompt templates used by the assistant.
#[derive(Debug, Clone)]
pub struct Prompts {
    /// Unrendered system prompt template.
    pub system: String,
    /// Custom variables from config, available in all prompts.
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            variables: HashMap::new(),
        }
    }
}

impl Prompts {
    /// Build prompts from settings, applying the configured override and variables.
    pub fn from_settings(settings: &Settings) -> Self {
        let system = match settings.prompts.system.as_deref() {
            Some(custom) if !custom.trim().is_empty() => custom.to_string(),
            _ => DEFAULT_SYSTEM_PROMPT.to_string(),
        };

        Self {
            system,
            variables: settings.prompts.variables.clone(),
        }
    }

    /// Render the system prompt for the given default academic year.
    pub fn system_prompt(&self, acad_year: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("acad_year".to_string(), acad_year.to_string());
        self.render_with_custom(&self.system, &vars)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
