//! Conversation handling: history rules, sessions, the planner seam and the turn loop.

mod history;
mod planner;
mod runner;
mod session;

pub use history::{condense, trim, Message, Role};
pub use planner::{to_request_messages, tool_definitions, OpenAIPlanner, PlanStep, Planner};
pub use runner::{Assistant, AssistantConfiguration, CapabilityCallRecord, TurnOutcome};
pub use session::{Session, SessionHandle, SessionStore};
