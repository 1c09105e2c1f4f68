//! Modplan - a conversational module-planning assistant
//!
//! Answers students' questions about university modules by letting a
//! language model call a small set of catalogue capabilities backed by the
//! NUSMods API.
//!
//! # Architecture
//!
//! - `catalogue` - catalogue client with per-year caching and code normalisation
//! - `capability` - capability descriptors, argument parsing and execution
//! - `conversation` - history rules, sessions, the planner seam and the turn loop
//! - `config` - settings and prompt templates
//! - `grading` - judge-model scoring of answers
//! - `cli` - command-line interface and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use modplan::config::Settings;
//! use modplan::conversation::{Assistant, Session};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let assistant = Assistant::from_settings(&settings)?;
//!
//!     let mut session = Session::new();
//!     let outcome = assistant
//!         .run_turn(&mut session, "When are the DSA4213 lectures in semester 1?")
//!         .await?;
//!     println!("{}", outcome.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod capability;
pub mod catalogue;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod grading;
pub mod openai;

pub use error::{ModplanError, Result};
