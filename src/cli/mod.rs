//! CLI module for Modplan.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Modplan - a module-planning assistant
///
/// Ask questions about university modules, their prerequisites and timetables.
/// Answers are grounded in the NUSMods catalogue.
#[derive(Parser, Debug)]
#[command(name = "modplan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "MODPLAN_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,

        /// Show the capability calls made while answering
        #[arg(short, long)]
        trace: bool,
    },

    /// Start an interactive planning conversation
    Chat,

    /// Search the module list by code or title
    Search {
        /// Search query
        query: String,

        /// Only modules of this level (first digit of the code)
        #[arg(short = 'L', long, value_parser = clap::value_parser!(u8).range(0..=9))]
        level: Option<u8>,

        /// Maximum number of results
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Academic year (e.g. 2025-2026)
        #[arg(short, long)]
        year: Option<String>,
    },

    /// Show a module's details and prerequisites
    Module {
        /// Module code (e.g. CS2040)
        code: String,

        /// Academic year (e.g. 2025-2026)
        #[arg(short, long)]
        year: Option<String>,
    },

    /// Show a module's lessons
    Timetable {
        /// Module code (e.g. DSA4213)
        code: String,

        /// Only this semester (1-4)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=4))]
        semester: Option<u8>,

        /// Academic year (e.g. 2025-2026)
        #[arg(short, long)]
        year: Option<String>,
    },

    /// Run a batch of questions, each in a fresh session
    Eval {
        /// JSONL file of {"question", "ground_truth"} cases, or one question per line
        file: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Score each answer with the judge model
        #[arg(long)]
        grade: bool,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration, API key and catalogue reachability
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from(["modplan", "search", "data", "--level", "2", "-l", "5"]).unwrap();
        match cli.command {
            Commands::Search { query, level, limit, year } => {
                assert_eq!(query, "data");
                assert_eq!(level, Some(2));
                assert_eq!(limit, 5);
                assert!(year.is_none());
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_out_of_range_semester() {
        assert!(Cli::try_parse_from(["modplan", "timetable", "DSA4213", "-s", "5"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["modplan", "-vv", "ask", "hi", "--trace"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Ask { trace: true, .. }));
    }

    #[test]
    fn test_parse_eval_grade() {
        let cli = Cli::try_parse_from(["modplan", "eval", "cases.jsonl", "--grade", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Eval { json: true, grade: true, .. }
        ));
    }
}
