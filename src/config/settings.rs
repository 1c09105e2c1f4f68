//! Configuration settings for modplan.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub catalogue: CatalogueSettings,
    pub planner: PlannerSettings,
    pub grader: GraderSettings,
    pub history: HistorySettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Course catalogue API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogueSettings {
    /// Base URL of the versioned catalogue API (without the year segment).
    pub base_url: String,
    /// Academic year used when a request does not name one (YYYY-YYYY).
    pub acad_year: String,
    /// HTTP timeout for catalogue requests.
    pub timeout_secs: u64,
    /// Default number of lessons returned per semester by the timetable capability.
    pub max_lessons: usize,
}

impl Default for CatalogueSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.nusmods.com/v2".to_string(),
            acad_year: "2025-2026".to_string(),
            timeout_secs: 30,
            max_lessons: 20,
        }
    }
}

/// Planning model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// Chat model used for planning and answering.
    pub model: String,
    /// OpenAI-compatible API base (e.g. "http://localhost:11434/v1" for Ollama).
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum capability rounds per turn before the turn is abandoned.
    pub max_tool_rounds: usize,
    /// HTTP timeout for planner requests.
    pub timeout_secs: u64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.2,
            max_tool_rounds: 10,
            timeout_secs: 300,
        }
    }
}

impl PlannerSettings {
    /// Whether the planner talks to a self-hosted endpoint that needs no key.
    pub fn is_local(&self) -> bool {
        self.api_base.as_deref().is_some_and(|base| {
            base.contains("localhost") || base.contains("127.0.0.1")
        })
    }
}

/// Judge model used by `eval --grade` and the grading endpoint.
///
/// Shares the planner's endpoint, key and timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraderSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for GraderSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
        }
    }
}

/// Conversation memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Number of human/assistant pairs kept between turns.
    pub max_pairs: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { max_pairs: 5 }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Replacement for the built-in system prompt.
    pub system: Option<String>,
    /// Custom variables available in the system prompt as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Endpoint settings for the judge model.
    pub fn grader_endpoint(&self) -> PlannerSettings {
        PlannerSettings {
            model: self.grader.model.clone(),
            temperature: self.grader.temperature,
            ..self.planner.clone()
        }
    }

    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ModplanError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("modplan")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.catalogue.acad_year, "2025-2026");
        assert_eq!(settings.history.max_pairs, 5);
        assert_eq!(settings.planner.max_tool_rounds, 10);
        assert!(!settings.planner.is_local());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [planner]
            model = "qwen3:14b"
            api_base = "http://localhost:11434/v1"

            [history]
            max_pairs = 3
            "#,
        )
        .unwrap();

        assert_eq!(settings.planner.model, "qwen3:14b");
        assert!(settings.planner.is_local());
        assert_eq!(settings.planner.temperature, 0.2);
        assert_eq!(settings.history.max_pairs, 3);
        assert_eq!(settings.catalogue.base_url, "https://api.nusmods.com/v2");
    }

    #[test]
    fn test_grader_shares_planner_endpoint() {
        let settings: Settings = toml::from_str(
            r#"
            [planner]
            api_base = "http://localhost:11434/v1"

            [grader]
            model = "qwen3:32b"
            "#,
        )
        .unwrap();

        let endpoint = settings.grader_endpoint();
        assert_eq!(endpoint.model, "qwen3:32b");
        assert_eq!(endpoint.temperature, 0.0);
        assert!(endpoint.is_local());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.catalogue.acad_year = "2024-2025".to_string();
        settings.server.port = 8080;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.catalogue.acad_year, "2024-2025");
        assert_eq!(loaded.server.port, 8080);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 5000);
    }
}
