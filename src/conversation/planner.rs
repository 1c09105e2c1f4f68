//! The planning step: a language model that either answers or asks for capabilities.

use super::history::{Message, Role};
use crate::capability::{CapabilityRequest, CapabilitySet};
use crate::config::PlannerSettings;
use crate::error::{ModplanError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// What the planner decided to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanStep {
    /// Final answer for the user.
    Answer(String),
    /// Run these capabilities, then plan again.
    Invoke {
        content: Option<String>,
        requests: Vec<CapabilityRequest>,
    },
}

/// A planning model.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Decide the next step given the system prompt, the visible history and the available capabilities.
    async fn plan(
        &self,
        system_prompt: &str,
        history: &[Message],
        capabilities: &CapabilitySet,
    ) -> Result<PlanStep>;

    /// Model identifier, for diagnostics.
    fn model(&self) -> &str;
}

/// Planner backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAIPlanner {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIPlanner {
    pub fn new(settings: &PlannerSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }
}

#[async_trait]
impl Planner for OpenAIPlanner {
    async fn plan(
        &self,
        system_prompt: &str,
        history: &[Message],
        capabilities: &CapabilitySet,
    ) -> Result<PlanStep> {
        let messages = to_request_messages(system_prompt, history)?;
        debug!("Planning with {} messages", messages.len());

        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature);
        if !capabilities.is_empty() {
            request.tools(tool_definitions(capabilities));
        }
        let request = request
            .build()
            .map_err(|e| ModplanError::Planner(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ModplanError::OpenAI(format!("Planner API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModplanError::Planner("No response from model".to_string()))?;

        Ok(plan_step(choice.message.content, choice.message.tool_calls))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// OpenAI function definitions for a capability set.
pub fn tool_definitions(capabilities: &CapabilitySet) -> Vec<ChatCompletionTool> {
    capabilities
        .descriptors()
        .iter()
        .map(|d| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: d.name.clone(),
                description: Some(d.planner_description()),
                parameters: Some(d.parameters.clone()),
                strict: None,
            },
        })
        .collect()
}

/// Convert the system prompt and history to chat completion messages.
pub fn to_request_messages(
    system_prompt: &str,
    history: &[Message],
) -> Result<Vec<ChatCompletionRequestMessage>> {
    let build_err = |e: async_openai::error::OpenAIError| ModplanError::Planner(e.to_string());

    let mut messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()
            .map_err(build_err)?
            .into(),
    ];

    for message in history {
        let converted: ChatCompletionRequestMessage = match message.role {
            Role::Human => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(build_err)?
                .into(),
            Role::Assistant if message.requests.is_empty() => {
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(build_err)?
                    .into()
            }
            Role::Assistant => {
                let tool_calls = message
                    .requests
                    .iter()
                    .map(|r| ChatCompletionMessageToolCall {
                        id: r.id.clone(),
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall {
                            name: r.name.clone(),
                            arguments: match &r.arguments {
                                Value::String(raw) => raw.clone(),
                                other => other.to_string(),
                            },
                        },
                    })
                    .collect::<Vec<_>>();

                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                args.tool_calls(tool_calls);
                if !message.content.is_empty() {
                    args.content(message.content.clone());
                }
                args.build().map_err(build_err)?.into()
            }
            Role::Tool => {
                let call_id = message
                    .result
                    .as_ref()
                    .map(|r| r.call_id.clone())
                    .ok_or_else(|| {
                        ModplanError::Planner("Tool message without a capability result".to_string())
                    })?;
                ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(call_id)
                    .content(message.content.clone())
                    .build()
                    .map_err(build_err)?
                    .into()
            }
        };
        messages.push(converted);
    }

    Ok(messages)
}

/// Interpret a model reply as a plan step.
pub fn plan_step(
    content: Option<String>,
    tool_calls: Option<Vec<ChatCompletionMessageToolCall>>,
) -> PlanStep {
    let tool_calls = tool_calls.unwrap_or_default();
    if tool_calls.is_empty() {
        return PlanStep::Answer(content.unwrap_or_default());
    }

    let requests = tool_calls
        .into_iter()
        .map(|call| {
            let arguments = serde_json::from_str(&call.function.arguments)
                .unwrap_or(Value::String(call.function.arguments));
            CapabilityRequest::new(call.id, call.function.name, arguments)
        })
        .collect();

    PlanStep::Invoke {
        content: content.filter(|c| !c.trim().is_empty()),
        requests,
    }
}
