//! The assistant: a planning loop over capabilities with per-session memory.

use super::history::{trim, Message};
use super::planner::{OpenAIPlanner, PlanStep, Planner};
use super::session::Session;
use crate::capability::{CapabilityExecutor, CapabilityRequest, CapabilitySet};
use crate::catalogue::CatalogueClient;
use crate::config::{Prompts, Settings};
use crate::error::{ModplanError, Result};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Where the loop is within a turn.
#[derive(Debug)]
enum LoopState {
    Planning,
    ExecutingCapabilities(Vec<CapabilityRequest>),
    Done(String),
}

/// Answers questions by alternating between the planner and capability calls.
pub struct Assistant {
    planner: Arc<dyn Planner>,
    executor: CapabilityExecutor,
    capabilities: Arc<CapabilitySet>,
    system_prompt: String,
    max_pairs: usize,
    max_tool_rounds: usize,
}

impl Assistant {
    pub fn new(
        planner: Arc<dyn Planner>,
        executor: CapabilityExecutor,
        capabilities: Arc<CapabilitySet>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            planner,
            executor,
            capabilities,
            system_prompt: system_prompt.into(),
            max_pairs: 5,
            max_tool_rounds: 10,
        }
    }

    /// Wire up the catalogue client, OpenAI planner and prompts from configuration.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let catalogue = Arc::new(CatalogueClient::new(&settings.catalogue)?);
        let planner: Arc<dyn Planner> = Arc::new(OpenAIPlanner::new(&settings.planner)?);
        let executor = CapabilityExecutor::new(catalogue, settings.catalogue.max_lessons);
        let capabilities = Arc::new(CapabilitySet::standard(settings.catalogue.max_lessons));
        let system_prompt =
            Prompts::from_settings(settings).system_prompt(&settings.catalogue.acad_year);

        Ok(Self::new(planner, executor, capabilities, system_prompt)
            .with_max_pairs(settings.history.max_pairs)
            .with_max_tool_rounds(settings.planner.max_tool_rounds))
    }

    /// Number of human/assistant pairs kept between turns.
    pub fn with_max_pairs(mut self, max_pairs: usize) -> Self {
        self.max_pairs = max_pairs;
        self
    }

    /// Maximum capability rounds per turn.
    pub fn with_max_tool_rounds(mut self, max: usize) -> Self {
        self.max_tool_rounds = max;
        self
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn catalogue(&self) -> &Arc<CatalogueClient> {
        self.executor.catalogue()
    }

    /// Settings that shape a turn, for diagnostics.
    pub fn configuration(&self) -> AssistantConfiguration {
        self.configuration_with_prompt(None)
    }

    /// Like [`configuration`](Self::configuration), reporting a per-turn prompt override.
    pub fn configuration_with_prompt(&self, system_prompt: Option<&str>) -> AssistantConfiguration {
        AssistantConfiguration {
            model: self.planner.model().to_string(),
            system_prompt: system_prompt.unwrap_or(&self.system_prompt).to_string(),
            max_pairs: self.max_pairs,
            max_tool_rounds: self.max_tool_rounds,
        }
    }

    /// Run one user turn against a session.
    ///
    /// The planner sees the trimmed session history followed by the live turn.
    /// Session memory is only updated when the turn completes.
    pub async fn run_turn(&self, session: &mut Session, user_message: &str) -> Result<TurnOutcome> {
        self.run_turn_with_prompt(session, user_message, None).await
    }

    /// Run one turn, replacing the configured system prompt when `system_prompt` is set.
    #[instrument(skip(self, session, system_prompt), fields(session_id = %session.id()))]
    pub async fn run_turn_with_prompt(
        &self,
        session: &mut Session,
        user_message: &str,
        system_prompt: Option<&str>,
    ) -> Result<TurnOutcome> {
        let system_prompt = system_prompt.unwrap_or(&self.system_prompt);
        let user_message = user_message.trim();
        if user_message.is_empty() {
            return Err(ModplanError::Validation("Message must not be empty".to_string()));
        }

        let prior = trim(session.history(), self.max_pairs);
        let mut turn = vec![Message::human(user_message)];
        let mut capability_calls = Vec::new();
        let mut model_input = Vec::new();
        let mut planning_rounds = 0;
        let mut tool_rounds = 0;
        let mut state = LoopState::Planning;

        let answer = loop {
            state = match state {
                LoopState::Planning => {
                    planning_rounds += 1;
                    debug!("Planning round {}", planning_rounds);

                    let mut input = prior.clone();
                    input.extend_from_slice(&turn);
                    if planning_rounds == 1 {
                        model_input = input.clone();
                    }

                    match self
                        .planner
                        .plan(system_prompt, &input, &self.capabilities)
                        .await?
                    {
                        PlanStep::Answer(text) => LoopState::Done(text),
                        PlanStep::Invoke { requests, .. } if requests.is_empty() => {
                            LoopState::Done(String::new())
                        }
                        PlanStep::Invoke { content, requests } => {
                            tool_rounds += 1;
                            if tool_rounds > self.max_tool_rounds {
                                return Err(ModplanError::Validation(format!(
                                    "Exceeded maximum capability rounds ({})",
                                    self.max_tool_rounds
                                )));
                            }
                            turn.push(Message::planning(
                                content.unwrap_or_default(),
                                requests.clone(),
                            ));
                            LoopState::ExecutingCapabilities(requests)
                        }
                    }
                }
                LoopState::ExecutingCapabilities(requests) => {
                    for request in &requests {
                        let result = self.executor.invoke(request).await;
                        capability_calls.push(CapabilityCallRecord {
                            name: request.name.clone(),
                            arguments: request.arguments.clone(),
                            succeeded: !result.is_error(),
                        });
                        turn.push(Message::tool(result));
                    }
                    LoopState::Planning
                }
                LoopState::Done(text) => break text,
            };
        };

        turn.push(Message::assistant(answer.clone()));
        session.commit(&turn, self.max_pairs);
        info!(
            "Turn complete after {} planning rounds and {} capability calls",
            planning_rounds,
            capability_calls.len()
        );

        Ok(TurnOutcome {
            answer,
            trace: turn,
            model_input,
            capability_calls,
            planning_rounds,
        })
    }

    /// Run each non-blank prompt in its own fresh session.
    pub async fn evaluate(&self, prompts: &[String]) -> Vec<(String, Result<TurnOutcome>)> {
        let mut outcomes = Vec::new();
        for prompt in prompts.iter().filter(|p| !p.trim().is_empty()) {
            let mut session = Session::new();
            let outcome = self.run_turn(&mut session, prompt).await;
            outcomes.push((prompt.clone(), outcome));
        }
        outcomes
    }
}

/// Result of one completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The final answer text.
    pub answer: String,
    /// Every message of the turn: human, planning, tool and final assistant.
    pub trace: Vec<Message>,
    /// What the planner saw on its first round.
    pub model_input: Vec<Message>,
    pub capability_calls: Vec<CapabilityCallRecord>,
    pub planning_rounds: usize,
}

impl TurnOutcome {
    /// The final assistant message of the trace.
    pub fn final_message(&self) -> Option<&Message> {
        self.trace.iter().rev().find(|m| m.is_final_answer())
    }
}

/// Record of a capability call made during a turn.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityCallRecord {
    pub name: String,
    pub arguments: Value,
    pub succeeded: bool,
}

impl std::fmt::Display for CapabilityCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// Turn-shaping settings of an assistant.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantConfiguration {
    pub model: String,
    pub system_prompt: String,
    pub max_pairs: usize,
    pub max_tool_rounds: usize,
}
