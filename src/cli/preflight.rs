//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::PlannerSettings;
use crate::error::{ModplanError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Conversations need a planner endpoint and, unless it is local, an API key.
    Converse,
    /// Direct catalogue lookups only need network access.
    Lookup,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, planner: &PlannerSettings) -> Result<()> {
    match operation {
        Operation::Converse => check_api_key(planner),
        Operation::Lookup => Ok(()),
    }
}

/// Check that the planner API key is configured. Local endpoints need none.
fn check_api_key(planner: &PlannerSettings) -> Result<()> {
    if planner.is_local() {
        return Ok(());
    }

    let var = &planner.api_key_env;
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(ModplanError::Config(format!(
            "{} is empty. Set it with: export {}='sk-...'",
            var, var
        ))),
        Err(_) => Err(ModplanError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            var, var
        ))),
    }
}
