//! Interactive chat command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::conversation::{Assistant, Session};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Converse, &settings.planner) {
        Output::error(&format!("{}", e));
        Output::info("Run 'modplan doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let assistant = Assistant::from_settings(&settings)?;
    let mut session = Session::new();

    println!("\n{}", style("Modplan Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about modules, prerequisites or timetables. Type 'exit' to quit, 'clear' to start over.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session.reset();
            Output::info("Conversation history cleared.");
            continue;
        }

        match assistant.run_turn(&mut session, input).await {
            Ok(outcome) => {
                for call in &outcome.capability_calls {
                    Output::capability_call(&call.to_string(), call.succeeded);
                }
                println!("\n{} {}\n", style("Modplan:").cyan().bold(), outcome.answer);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
