//! Agents and how they produce replies.
//!
//! An [`Agent`] is a plain record: a unique name, fixed instructions and the names of the
//! tools it may call. It holds no conversation state. Producing a reply is delegated to an
//! [`AgentInvoker`], so the group chat can be driven by a real completion service
//! ([`ChatCompletionInvoker`]) or by a scripted stand-in in tests.
//!
//! # Tool calls
//!
//! [`ChatCompletionInvoker`] advertises the agent's allowed tools in the system prompt and
//! asks the model to answer with
//!
//! ```json
//! {"tool_call": {"name": "GenerateFibonacci", "parameters": {"count": 10}}}
//! ```
//!
//! when it wants a tool. The invoker executes the call, feeds the result back as a user
//! message and asks again, up to [`DEFAULT_MAX_TOOL_ITERATIONS`] times.

use crate::fibchat::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
use crate::fibchat::event::{AgentEvent, EventHandler};
use crate::fibchat::tool_protocol::{ToolError, ToolRegistry};
use crate::fibchat::transcript::{AuthorRole, ChatMessage};
use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;

pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 5;

/// A named conversational role with fixed instructions and a tool subset.
///
/// ```
/// use fibchat::agent::Agent;
///
/// let agent = Agent::new("FibonacciGenerator", "Generate Fibonacci numbers.")
///     .with_description("Generates Fibonacci sequences")
///     .with_tools(["GenerateFibonacci", "IsFibonacciNumber"]);
/// assert!(agent.can_use("GenerateFibonacci"));
/// assert!(!agent.can_use("ValidateFibonacci"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub name: String,
    pub description: Option<String>,
    pub instructions: String,
    pub tools: Vec<String>,
}

impl Agent {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            instructions: instructions.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn can_use(&self, tool_name: &str) -> bool {
        self.tools.iter().any(|t| t == tool_name)
    }

    /// Name plus description, for startup logging.
    pub fn summary(&self) -> String {
        match &self.description {
            Some(description) => format!("{} ({})", self.name, description),
            None => self.name.clone(),
        }
    }
}

/// A tool call made while producing a reply.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub name: String,
    pub parameters: serde_json::Value,
    /// Tool output on success.
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl ToolInvocation {
    pub fn succeeded(&self) -> bool {
        self.output.is_some()
    }
}

/// What an agent contributed in one turn.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub message: ChatMessage,
    pub tool_invocations: Vec<ToolInvocation>,
    pub tokens_used: Option<TokenUsage>,
}

impl AgentReply {
    /// Reply without tool calls or usage data.
    pub fn text(agent_name: &str, content: impl Into<String>) -> Self {
        Self {
            message: ChatMessage::agent(agent_name, content),
            tool_invocations: Vec::new(),
            tokens_used: None,
        }
    }
}

/// Produces an agent's reply to the current transcript.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(
        &self,
        agent: &Agent,
        history: &[ChatMessage],
    ) -> Result<AgentReply, Box<dyn Error + Send + Sync>>;
}

#[derive(Debug, Clone, PartialEq)]
struct ToolCall {
    name: String,
    parameters: serde_json::Value,
}

/// [`AgentInvoker`] backed by a [`ClientWrapper`] and a shared [`ToolRegistry`].
pub struct ChatCompletionInvoker {
    client: Arc<dyn ClientWrapper>,
    registry: Arc<ToolRegistry>,
    event_handler: Option<Arc<dyn EventHandler>>,
    max_tool_iterations: usize,
}

impl ChatCompletionInvoker {
    pub fn new(client: Arc<dyn ClientWrapper>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            client,
            registry,
            event_handler: None,
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    async fn emit(&self, event: AgentEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_agent_event(&event).await;
        }
    }

    /// Agent instructions followed by the tools it may call and the call convention.
    pub fn build_system_prompt(&self, agent: &Agent) -> String {
        let mut prompt = agent.instructions.clone();
        let tools: Vec<_> = self
            .registry
            .list_tools()
            .into_iter()
            .filter(|t| agent.can_use(&t.name))
            .collect();
        if tools.is_empty() {
            return prompt;
        }

        prompt.push_str("\n\nYou have access to the following tools:\n");
        for tool in tools {
            prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
            if !tool.parameters.is_empty() {
                prompt.push_str("  Parameters:\n");
                for param in &tool.parameters {
                    prompt.push_str(&format!(
                        "    - {} ({:?}): {}\n",
                        param.name,
                        param.param_type,
                        param.description.as_deref().unwrap_or("No description")
                    ));
                }
            }
        }
        prompt.push_str(
            "\nTo use a tool, respond with a JSON object in the following format:\n\
             {\"tool_call\": {\"name\": \"tool_name\", \"parameters\": {...}}}\n\
             After tool execution, I'll provide the result and you can continue.\n",
        );
        prompt
    }

    fn build_messages(&self, agent: &Agent, history: &[ChatMessage]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::new(Role::System, self.build_system_prompt(agent)));
        for msg in history {
            match msg.role {
                AuthorRole::User => messages.push(Message::new(Role::User, msg.content.clone())),
                AuthorRole::Agent => messages.push(Message::new(
                    Role::Assistant,
                    format!(
                        "[{}]: {}",
                        msg.author.as_deref().unwrap_or("agent"),
                        msg.content
                    ),
                )),
            }
        }
        messages
    }

    async fn run_tool(
        &self,
        agent: &Agent,
        call: &ToolCall,
    ) -> Result<serde_json::Value, Box<dyn Error + Send + Sync>> {
        if !agent.can_use(&call.name) {
            return Err(Box::new(ToolError::NotPermitted {
                agent: agent.name.clone(),
                tool: call.name.clone(),
            }));
        }
        let result = self
            .registry
            .execute_tool(&call.name, call.parameters.clone())
            .await?;
        Ok(result.output)
    }
}

#[async_trait]
impl AgentInvoker for ChatCompletionInvoker {
    async fn invoke(
        &self,
        agent: &Agent,
        history: &[ChatMessage],
    ) -> Result<AgentReply, Box<dyn Error + Send + Sync>> {
        let mut messages = self.build_messages(agent, history);
        let mut invocations = Vec::new();
        let mut usage: Option<TokenUsage> = None;
        let mut llm_iteration = 0;
        let final_response;

        loop {
            llm_iteration += 1;
            self.emit(AgentEvent::LLMCallStarted {
                agent_name: agent.name.clone(),
                iteration: llm_iteration,
            })
            .await;

            let response = self.client.send_message(&messages).await?;
            if let Some(last) = self.client.get_last_usage() {
                usage.get_or_insert_with(TokenUsage::default).accumulate(&last);
            }

            self.emit(AgentEvent::LLMCallCompleted {
                agent_name: agent.name.clone(),
                iteration: llm_iteration,
                tokens_used: usage.clone(),
                response_length: response.content.len(),
            })
            .await;

            let Some(call) = parse_tool_call(&response.content) else {
                final_response = response.content;
                break;
            };

            if invocations.len() >= self.max_tool_iterations {
                self.emit(AgentEvent::ToolMaxIterationsReached {
                    agent_name: agent.name.clone(),
                })
                .await;
                final_response = format!(
                    "{}\n\n[Warning: Maximum tool iterations reached]",
                    response.content
                );
                break;
            }

            let tool_iteration = invocations.len() + 1;
            self.emit(AgentEvent::ToolCallDetected {
                agent_name: agent.name.clone(),
                tool_name: call.name.clone(),
                parameters: call.parameters.clone(),
                iteration: tool_iteration,
            })
            .await;

            let outcome = self.run_tool(agent, &call).await;
            let (feedback, invocation) = match outcome {
                Ok(output) => (
                    format!(
                        "Tool '{}' executed successfully. Result: {}",
                        call.name,
                        serde_json::to_string_pretty(&output)
                            .unwrap_or_else(|_| output.to_string())
                    ),
                    ToolInvocation {
                        name: call.name.clone(),
                        parameters: call.parameters.clone(),
                        output: Some(output),
                        error: None,
                    },
                ),
                Err(e) => {
                    let feedback = match e.downcast_ref::<ToolError>() {
                        Some(ToolError::ExecutionFailed(msg)) => {
                            format!("Tool '{}' failed. Error: {}", call.name, msg)
                        }
                        _ => format!("Tool execution error: {}", e),
                    };
                    (
                        feedback,
                        ToolInvocation {
                            name: call.name.clone(),
                            parameters: call.parameters.clone(),
                            output: None,
                            error: Some(e.to_string()),
                        },
                    )
                }
            };

            self.emit(AgentEvent::ToolExecutionCompleted {
                agent_name: agent.name.clone(),
                tool_name: call.name.clone(),
                success: invocation.succeeded(),
                error: invocation.error.clone(),
                iteration: tool_iteration,
            })
            .await;

            invocations.push(invocation);
            messages.push(Message::new(Role::Assistant, response.content));
            messages.push(Message::new(Role::User, feedback));
        }

        self.emit(AgentEvent::ReplyCompleted {
            agent_name: agent.name.clone(),
            tokens_used: usage.clone(),
            tool_calls_made: invocations.len(),
            response_length: final_response.len(),
        })
        .await;

        Ok(AgentReply {
            message: ChatMessage::agent(agent.name.clone(), final_response),
            tool_invocations: invocations,
            tokens_used: usage,
        })
    }
}

/// Extract the first `{"tool_call": {"name": ..., "parameters": ...}}` fragment.
///
/// Brace counting finds the end of the fragment, so the call may be wrapped in prose.
/// Braces inside JSON strings are not special-cased.
fn parse_tool_call(response: &str) -> Option<ToolCall> {
    let start = response.find("{\"tool_call\"")?;
    let mut depth = 0usize;
    let mut end = None;
    for (offset, ch) in response[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    end = Some(start + offset + ch.len_utf8());
                    break;
                }
            }
            _ => {}
        }
    }

    let parsed: serde_json::Value = serde_json::from_str(&response[start..end?]).ok()?;
    let call = parsed.get("tool_call")?;
    let name = call.get("name")?.as_str()?;
    let parameters = call
        .get("parameters")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));
    Some(ToolCall {
        name: name.to_string(),
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_call_with_surrounding_prose() {
        let text = "Sure ✅ let me check. {\"tool_call\": {\"name\": \"IsFibonacciNumber\", \"parameters\": {\"number\": 21}}} thanks";
        let call = parse_tool_call(text).unwrap();
        assert_eq!(call.name, "IsFibonacciNumber");
        assert_eq!(call.parameters["number"], 21);
    }

    #[test]
    fn test_parse_tool_call_rejects_incomplete_json() {
        assert!(parse_tool_call("{\"tool_call\": {\"name\": \"X\"").is_none());
        assert!(parse_tool_call("no tools here").is_none());
    }

    #[test]
    fn test_parse_tool_call_defaults_parameters() {
        let call = parse_tool_call("{\"tool_call\": {\"name\": \"GenerateFibonacci\"}}").unwrap();
        assert_eq!(call.parameters, serde_json::json!({}));
    }

    #[test]
    fn test_agent_tool_permissions() {
        let agent = Agent::new("GeneralAssistant", "help").with_tools(vec!["IsFibonacciNumber"]);
        assert!(agent.can_use("IsFibonacciNumber"));
        assert!(!agent.can_use("GenerateFibonacci"));
        assert!(agent.description.is_none());
        assert_eq!(agent.summary(), "GeneralAssistant");
    }

    #[test]
    fn test_summary_includes_description() {
        let agent = Agent::new("FibonacciValidator", "check")
            .with_description("Validates Fibonacci sequences");
        assert_eq!(
            agent.summary(),
            "FibonacciValidator (Validates Fibonacci sequences)"
        );
    }
}
