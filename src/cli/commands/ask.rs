//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::conversation::{Assistant, Session};
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, trace: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Converse, &settings.planner) {
        Output::error(&format!("{}", e));
        Output::info("Run 'modplan doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let assistant = Assistant::from_settings(&settings)?;
    let mut session = Session::new();

    let spinner = Output::spinner("Planning...");

    match assistant.run_turn(&mut session, question).await {
        Ok(outcome) => {
            spinner.finish_and_clear();

            println!("\n{}\n", outcome.answer);

            if trace && !outcome.capability_calls.is_empty() {
                Output::header(&format!(
                    "Capability calls ({})",
                    outcome.capability_calls.len()
                ));
                for call in &outcome.capability_calls {
                    Output::capability_call(&call.to_string(), call.succeeded);
                }
                println!();
                Output::info(&format!(
                    "Completed in {} planning round(s)",
                    outcome.planning_rounds
                ));
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
