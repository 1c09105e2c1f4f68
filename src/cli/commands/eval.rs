//! Eval command - run a batch of questions in isolated sessions, optionally grading them.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::conversation::{Assistant, CapabilityCallRecord};
use crate::grading::{Evaluation, Grader, OpenAIGrader};
use anyhow::{bail, Context, Result};
use console::style;
use serde::{Deserialize, Serialize};

/// One line of an eval file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct EvalCase {
    question: String,
    #[serde(default)]
    ground_truth: Option<String>,
}

#[derive(Serialize)]
struct EvalRecord {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ground_truth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    capability_calls: Vec<CapabilityCallRecord>,
    planning_rounds: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    evaluation: Option<Evaluation>,
}

/// Run the eval command.
pub async fn run_eval(file: &str, json: bool, grade: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Converse, &settings.planner) {
        Output::error(&format!("{}", e));
        Output::info("Run 'modplan doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read prompts from {}", file))?;
    let cases = parse_cases(&contents)?;
    if cases.is_empty() {
        Output::warning("No prompts found.");
        return Ok(());
    }

    let assistant = Assistant::from_settings(&settings)?;
    let grader = if grade {
        Some(OpenAIGrader::new(&settings.grader_endpoint())?)
    } else {
        None
    };

    let prompts: Vec<String> = cases.iter().map(|c| c.question.clone()).collect();
    let spinner = Output::spinner(&format!("Running {} prompts...", prompts.len()));
    let outcomes = assistant.evaluate(&prompts).await;
    spinner.finish_and_clear();

    let mut records = Vec::with_capacity(cases.len());
    for (case, (prompt, outcome)) in cases.into_iter().zip(outcomes) {
        let mut record = match outcome {
            Ok(outcome) => EvalRecord {
                prompt,
                ground_truth: case.ground_truth,
                answer: Some(outcome.answer),
                error: None,
                capability_calls: outcome.capability_calls,
                planning_rounds: outcome.planning_rounds,
                evaluation: None,
            },
            Err(e) => EvalRecord {
                prompt,
                ground_truth: case.ground_truth,
                answer: None,
                error: Some(e.to_string()),
                capability_calls: Vec::new(),
                planning_rounds: 0,
                evaluation: None,
            },
        };

        if let (Some(grader), Some(answer)) = (&grader, &record.answer) {
            let spinner = Output::spinner(&format!("Grading: {}", record.prompt));
            record.evaluation = Some(
                grader
                    .grade(&record.prompt, record.ground_truth.as_deref(), answer)
                    .await,
            );
            spinner.finish_and_clear();
        }

        records.push(record);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for (i, record) in records.iter().enumerate() {
        Output::header(&format!("[{}] {}", i + 1, record.prompt));
        for call in &record.capability_calls {
            Output::capability_call(&call.to_string(), call.succeeded);
        }
        match (&record.answer, &record.error) {
            (Some(answer), _) => println!("\n{}", answer),
            (None, Some(error)) => Output::error(error),
            (None, None) => {}
        }
        if let Some(evaluation) = &record.evaluation {
            print_evaluation(evaluation);
        }
    }

    let failed = records.iter().filter(|r| r.error.is_some()).count();
    println!();
    if failed > 0 {
        Output::warning(&format!(
            "{} of {} prompts failed",
            failed,
            records.len()
        ));
    } else {
        Output::success(&format!(
            "All {} prompts answered {}",
            records.len(),
            style("✓").green()
        ));
    }

    if let Some(mean) = mean_total(&records) {
        Output::kv("Mean score", &format!("{:.2} / 3.0", mean));
    }

    Ok(())
}

fn print_evaluation(evaluation: &Evaluation) {
    println!();
    for (key, score) in &evaluation.scores {
        Output::kv(key, &format!("{:.1}", score));
    }
    if let Some(total) = evaluation.total {
        Output::kv("total", &format!("{:.1}", total));
    }
    if let Some(error) = &evaluation.error {
        Output::warning(error);
    }
}

fn mean_total(records: &[EvalRecord]) -> Option<f64> {
    let totals: Vec<f64> = records
        .iter()
        .filter_map(|r| r.evaluation.as_ref()?.total)
        .collect();
    (!totals.is_empty()).then(|| totals.iter().sum::<f64>() / totals.len() as f64)
}

/// Parse an eval file.
///
/// Lines starting with `{` are JSON cases; any other line is a bare question.
/// Blank lines, `#` comments and cases with a blank question are skipped.
fn parse_cases(contents: &str) -> Result<Vec<EvalCase>> {
    let mut cases = Vec::new();

    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let case = if line.starts_with('{') {
            match serde_json::from_str::<EvalCase>(line) {
                Ok(case) => case,
                Err(e) => bail!("Invalid eval case on line {}: {}", number + 1, e),
            }
        } else {
            EvalCase {
                question: line.to_string(),
                ground_truth: None,
            }
        };

        if !case.question.trim().is_empty() {
            cases.push(EvalCase {
                question: case.question.trim().to_string(),
                ground_truth: case.ground_truth.filter(|g| !g.trim().is_empty()),
            });
        }
    }

    Ok(cases)
}
