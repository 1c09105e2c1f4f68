//! Configuration module for modplan.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, DEFAULT_SYSTEM_PROMPT};
pub use settings::{
    CatalogueSettings, GeneralSettings, GraderSettings, HistorySettings, PlannerSettings,
    PromptSettings, ServerSettings, Settings,
};
