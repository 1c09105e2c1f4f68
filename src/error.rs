//! Error types for modplan.

use thiserror::Error;

/// Library-level error type for modplan operations.
#[derive(Error, Debug)]
pub enum ModplanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Module not found: {0}")]
    NotFound(String),

    #[error("Catalogue fetch failed: {0}")]
    TransientFetch(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Planner error: {0}")]
    Planner(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ModplanError {
    /// Stable machine-readable kind, used in capability error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ModplanError::Config(_) => "config",
            ModplanError::NotFound(_) => "not_found",
            ModplanError::TransientFetch(_) | ModplanError::Http(_) => "transient_fetch",
            ModplanError::Validation(_) => "validation",
            ModplanError::Planner(_) | ModplanError::OpenAI(_) => "planner",
            ModplanError::Io(_) => "io",
            ModplanError::Json(_) => "json",
            ModplanError::TomlParse(_) => "config",
        }
    }
}

/// Result type alias for modplan operations.
pub type Result<T> = std::result::Result<T, ModplanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ModplanError::NotFound("ZZ9999".into()).kind(), "not_found");
        assert_eq!(
            ModplanError::TransientFetch("503".into()).kind(),
            "transient_fetch"
        );
        assert_eq!(ModplanError::Validation("bad".into()).kind(), "validation");
    }

    #[test]
    fn test_error_display() {
        let err = ModplanError::NotFound("ZZ9999".to_string());
        assert_eq!(err.to_string(), "Module not found: ZZ9999");
    }
}
