//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod eval;
mod module;
mod search;
mod serve;
mod timetable;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use eval::run_eval;
pub use module::run_module;
pub use search::run_search;
pub use serve::{router, run_serve};
pub use timetable::run_timetable;
