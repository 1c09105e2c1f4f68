//! Doctor command - verify configuration and external services.

use crate::catalogue::{validate_acad_year, CatalogueClient};
use crate::cli::Output;
use crate::config::{PlannerSettings, Settings};
use console::style;
use std::path::PathBuf;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: Option<&PathBuf>) -> anyhow::Result<()> {
    Output::header("Modplan Doctor");
    println!();
    println!("Checking configuration and services...\n");

    let mut checks = Vec::new();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![
        check_config_file(config_path),
        check_acad_year(&settings.catalogue.acad_year),
    ];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    println!("{}", style("Planner").bold());
    let api_check = check_api_key(&settings.planner);
    api_check.print();
    checks.push(api_check);
    Output::kv("Model", &settings.planner.model);
    if let Some(base) = &settings.planner.api_base {
        Output::kv("Endpoint", base);
    }

    println!();

    println!("{}", style("Catalogue").bold());
    let catalogue_check = check_catalogue(settings).await;
    catalogue_check.print();
    checks.push(catalogue_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Modplan.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Modplan is ready to use.");
    }

    Ok(())
}

/// Check the planner API key, or that a local endpoint is configured.
fn check_api_key(planner: &PlannerSettings) -> CheckResult {
    let name = planner.api_key_env.as_str();
    if planner.is_local() {
        return CheckResult::ok(name, "not required for local endpoint");
    }

    let hint = format!("Set with: export {}='sk-...'", name);
    match std::env::var(name) {
        Ok(key) if key.starts_with("sk-") && key.len() > 20 => {
            CheckResult::ok(name, &format!("configured ({})", mask_key(&key)))
        }
        Ok(key) if key.is_empty() => CheckResult::error(name, "empty", &hint),
        Ok(_) => CheckResult::warning(
            name,
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(name, "not set", &hint),
    }
}

fn check_acad_year(year: &str) -> CheckResult {
    match validate_acad_year(year) {
        Ok(()) => CheckResult::ok("Academic year", year),
        Err(e) => CheckResult::error(
            "Academic year",
            &e.to_string(),
            "Set catalogue.acad_year, e.g. \"2025-2026\"",
        ),
    }
}

/// Fetch the module list for the default year.
async fn check_catalogue(settings: &Settings) -> CheckResult {
    let client = match CatalogueClient::new(&settings.catalogue) {
        Ok(client) => client,
        Err(e) => {
            return CheckResult::error(
                "Catalogue API",
                &e.to_string(),
                "Check catalogue.base_url and catalogue.acad_year",
            )
        }
    };

    let spinner = Output::spinner("Contacting catalogue...");
    let result = client.list_catalogue(None).await;
    spinner.finish_and_clear();

    match result {
        Ok(index) => CheckResult::ok(
            "Catalogue API",
            &format!(
                "{} modules for {} at {}",
                index.len(),
                client.default_year(),
                settings.catalogue.base_url
            ),
        ),
        Err(e) => CheckResult::error(
            "Catalogue API",
            &e.to_string(),
            "Check network access and catalogue.base_url",
        ),
    }
}

/// Check if config file exists.
fn check_config_file(config_path: Option<&PathBuf>) -> CheckResult {
    let config_path = config_path
        .cloned()
        .unwrap_or_else(Settings::default_config_path);
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: modplan config edit",
        )
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(7).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_check_acad_year() {
        assert_eq!(check_acad_year("2025-2026").status, CheckStatus::Ok);
        assert_eq!(check_acad_year("2025/26").status, CheckStatus::Error);
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-abcdefghijklmnopqrstuvwxyz"), "sk-abcd...wxyz");
    }

    #[test]
    fn test_local_endpoint_skips_key() {
        let planner = PlannerSettings {
            api_base: Some("http://localhost:11434/v1".to_string()),
            ..PlannerSettings::default()
        };
        assert_eq!(check_api_key(&planner).status, CheckStatus::Ok);
    }
}
