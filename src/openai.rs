//! OpenAI-compatible client configuration.

use crate::config::PlannerSettings;
use crate::error::{ModplanError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Placeholder key for self-hosted endpoints that ignore authentication.
const LOCAL_API_KEY: &str = "local";

/// Create a chat client for the configured endpoint, key and timeout.
pub fn create_client(settings: &PlannerSettings) -> Result<Client<OpenAIConfig>> {
    let mut config = OpenAIConfig::new();

    if let Some(base) = settings.api_base.as_deref() {
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    match std::env::var(&settings.api_key_env) {
        Ok(key) if !key.is_empty() => config = config.with_api_key(key),
        _ if settings.is_local() => config = config.with_api_key(LOCAL_API_KEY),
        _ => {
            return Err(ModplanError::Config(format!(
                "{} not set. Set it with: export {}='sk-...'",
                settings.api_key_env, settings.api_key_env
            )))
        }
    }

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;

    Ok(Client::with_config(config).with_http_client(http_client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_endpoint_needs_no_key() {
        let settings = PlannerSettings {
            api_base: Some("http://localhost:11434/v1/".to_string()),
            api_key_env: "MODPLAN_TEST_UNSET_KEY".to_string(),
            ..PlannerSettings::default()
        };
        assert!(create_client(&settings).is_ok());
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let settings = PlannerSettings {
            api_key_env: "MODPLAN_TEST_UNSET_KEY".to_string(),
            ..PlannerSettings::default()
        };
        assert!(matches!(
            create_client(&settings),
            Err(ModplanError::Config(_))
        ));
    }
}
