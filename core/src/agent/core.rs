//! Core agent implementation

use super::base::{Agent, AgentResult};
use super::config::AgentConfig;
use super::execution::AgentExecution;
use crate::error::{AgentError, Result};
use crate::llm::{ChatOptions, ContentBlock, LlmClient, LlmMessage, MessageRole};
use crate::shaping::Figure;
use crate::tools::{ToolCall, ToolExecutor};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Conversational agent that answers questions with the help of tools.
///
/// The conversation is kept across turns. A turn that fails is rolled back
/// so the history never ends with unanswered tool calls.
pub struct AgentCore {
    config: AgentConfig,
    llm_client: Arc<dyn LlmClient>,
    tool_executor: ToolExecutor,
    system_prompt: String,
    conversation_history: Vec<LlmMessage>,
}

/// Outcome of a single model round trip
enum StepOutcome {
    /// Tools ran and the model must see their results
    Continue,
    /// The model answered without requesting tools
    Answer(String),
}

impl AgentCore {
    pub fn new(
        config: AgentConfig,
        llm_client: Arc<dyn LlmClient>,
        tool_executor: ToolExecutor,
        system_prompt: String,
    ) -> Self {
        Self {
            config,
            llm_client,
            tool_executor,
            system_prompt,
            conversation_history: Vec::new(),
        }
    }

    /// Messages exchanged so far, starting with the system prompt
    pub fn history(&self) -> &[LlmMessage] {
        &self.conversation_history
    }

    /// Forget the conversation
    pub fn reset(&mut self) {
        self.conversation_history.clear();
    }

    pub fn tool_executor(&self) -> &ToolExecutor {
        &self.tool_executor
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn llm_client(&self) -> &Arc<dyn LlmClient> {
        &self.llm_client
    }

    async fn run_turn(&mut self, task: &str, artifacts: &mut Vec<Figure>) -> Result<(String, usize)> {
        if !matches!(
            self.conversation_history.first(),
            Some(message) if message.role == MessageRole::System
        ) {
            self.conversation_history
                .insert(0, LlmMessage::system(self.system_prompt.clone()));
        }
        self.conversation_history.push(LlmMessage::user(task));

        for step in 1..=self.config.max_steps {
            tracing::debug!(step, "Agent step");
            if let StepOutcome::Answer(answer) = self.execute_step(artifacts).await? {
                return Ok((answer, step));
            }
        }

        Err(AgentError::MaxStepsExceeded {
            max_steps: self.config.max_steps,
        }
        .into())
    }

    async fn execute_step(&mut self, artifacts: &mut Vec<Figure>) -> Result<StepOutcome> {
        let tool_definitions = self.tool_executor.get_tool_definitions();
        let tools = if tool_definitions.is_empty() {
            None
        } else {
            Some(tool_definitions)
        };
        let options = ChatOptions {
            parallel_tool_calls: tools.as_ref().map(|_| false),
            ..Default::default()
        };

        let response = self
            .llm_client
            .chat_completion(self.conversation_history.clone(), tools, Some(options))
            .await?;

        let message = response.message;
        let calls: Vec<ToolCall> = message
            .get_tool_uses()
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    parameters: input.clone(),
                }),
                _ => None,
            })
            .collect();
        let answer = message.get_text().unwrap_or_default();
        self.conversation_history.push(message);

        if calls.is_empty() {
            return Ok(StepOutcome::Answer(answer));
        }

        // One call at a time, in the order the model asked for them.
        for call in calls {
            tracing::info!(tool = %call.name, "Calling tool");
            let result = self.tool_executor.execute(call).await?;
            self.conversation_history.push(LlmMessage::tool_result(
                result.tool_call_id,
                result.content,
                result.failed,
            ));
            if let Some(figure) = result.artifact {
                artifacts.push(figure);
            }
        }

        Ok(StepOutcome::Continue)
    }
}

#[async_trait]
impl Agent for AgentCore {
    async fn execute_task(&mut self, task: &str) -> AgentResult<AgentExecution> {
        let start_time = Instant::now();
        let checkpoint = self.conversation_history.len();
        let mut artifacts = Vec::new();

        match self.run_turn(task, &mut artifacts).await {
            Ok((answer, steps)) => Ok(AgentExecution::success(
                answer,
                steps,
                start_time.elapsed().as_millis() as u64,
            )
            .with_artifacts(artifacts)),
            Err(e) => {
                tracing::error!(error = %e, "Agent turn failed");
                let steps = self.conversation_history[checkpoint..]
                    .iter()
                    .filter(|m| m.role == MessageRole::Assistant)
                    .count();
                self.conversation_history.truncate(checkpoint);
                Ok(AgentExecution::failure(
                    e.to_string(),
                    steps,
                    start_time.elapsed().as_millis() as u64,
                ))
            }
        }
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn agent_type(&self) -> &str {
        "ecotoxfred"
    }
}
