//! Judge model seam and its OpenAI-compatible implementation.

use super::{grader_prompt, Evaluation, GRADER_SYSTEM_PROMPT};
use crate::config::PlannerSettings;
use crate::error::{ModplanError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{info, warn};

/// Scores an answer. Judge failures are reported inside the evaluation.
#[async_trait]
pub trait Grader: Send + Sync {
    async fn grade(&self, question: &str, ground_truth: Option<&str>, answer: &str) -> Evaluation;

    fn model(&self) -> &str;
}

/// Judge backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAIGrader {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIGrader {
    /// Create a judge for the given endpoint settings.
    pub fn new(settings: &PlannerSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    async fn complete(&self, user_prompt: &str) -> Result<String> {
        let build_err = |e: async_openai::error::OpenAIError| ModplanError::Planner(e.to_string());

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(GRADER_SYSTEM_PROMPT)
                    .build()
                    .map_err(build_err)?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt)
                    .build()
                    .map_err(build_err)?
                    .into(),
            ])
            .temperature(self.temperature)
            .build()
            .map_err(build_err)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ModplanError::OpenAI(format!("Grader API error: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ModplanError::Planner("Empty response from grader".to_string()))
    }
}

#[async_trait]
impl Grader for OpenAIGrader {
    async fn grade(&self, question: &str, ground_truth: Option<&str>, answer: &str) -> Evaluation {
        let prompt = grader_prompt(question, ground_truth, answer);

        match self.complete(&prompt).await {
            Ok(raw) => {
                let evaluation = Evaluation::from_response(prompt, &raw);
                info!("Graded answer: total {:?}", evaluation.total);
                evaluation
            }
            Err(e) => {
                warn!("Grading failed: {}", e);
                Evaluation::failed(prompt, e.to_string())
            }
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
