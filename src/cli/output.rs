//! CLI output formatting utilities.

use crate::catalogue::{ModuleSummary, ScheduleBlock};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print one search hit.
    pub fn module_summary(summary: &ModuleSummary) {
        println!(
            "  {} {} {}{}",
            style("*").cyan(),
            style(&summary.module_code).bold(),
            summary.title,
            style(format_semesters(&summary.semesters)).dim()
        );
    }

    /// Print one timetable slot.
    pub fn lesson(block: &ScheduleBlock) {
        println!(
            "  {} {:<10} {:<4} {:<10} {}-{}  {}",
            style("*").cyan(),
            block.lesson_type,
            block.class_no,
            block.day,
            block.start_time,
            block.end_time,
            style(&block.venue).dim()
        );
    }

    /// Print a capability call from a turn trace.
    pub fn capability_call(call: &str, succeeded: bool) {
        let icon = if succeeded {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {} {}", icon, style(content_preview(call, 100)).dim());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format offered semesters, e.g. " (Sem 1, 2)".
fn format_semesters(semesters: &[u8]) -> String {
    if semesters.is_empty() {
        return String::new();
    }
    let list = semesters
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(" (Sem {})", list)
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_len: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_len {
        content
    } else {
        let truncated: String = content.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_semesters() {
        assert_eq!(format_semesters(&[]), "");
        assert_eq!(format_semesters(&[1, 2]), " (Sem 1, 2)");
    }

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short", 10), "short");
        assert_eq!(content_preview("line one\nline two", 8), "line one...");
        assert_eq!(content_preview("éééé", 2), "éé...");
    }
}
