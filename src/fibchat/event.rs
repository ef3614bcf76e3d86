//! Agent and group-chat event system.
//!
//! Provides a callback-based observability layer. Implement [`EventHandler`] to receive
//! notifications about:
//!
//! - **LLM round-trips**: when an agent sends to and receives from the completion service
//! - **Tool operations**: tool call detection, execution outcomes, iteration limits
//! - **Group chat lifecycle**: exchange start/end, agent selection, termination checks
//!
//! Both trait methods have default no-op implementations, so you only override what you
//! care about. [`LoggingEventHandler`] forwards everything to the `log` facade.
//!
//! # Example
//!
//! ```rust,no_run
//! use fibchat::event::{AgentEvent, EventHandler, GroupChatEvent};
//! use async_trait::async_trait;
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl EventHandler for Printer {
//!     async fn on_agent_event(&self, event: &AgentEvent) {
//!         if let AgentEvent::ToolCallDetected { agent_name, tool_name, .. } = event {
//!             println!("{} is calling {}", agent_name, tool_name);
//!         }
//!     }
//!     async fn on_group_chat_event(&self, event: &GroupChatEvent) {
//!         println!("group chat: {:?}", event);
//!     }
//! }
//! ```

use crate::fibchat::client_wrapper::TokenUsage;
use crate::fibchat::termination::TerminationState;
use async_trait::async_trait;

/// Events emitted while a single agent produces its reply.
///
/// # Event Flow
///
/// ```text
/// LLMCallStarted { iteration: 1 }
/// LLMCallCompleted { iteration: 1 }
/// (if a tool call is detected)
///   ToolCallDetected { iteration: 1 }
///   ToolExecutionCompleted { iteration: 1 }
///   LLMCallStarted { iteration: 2 }
///   ...
/// ReplyCompleted
/// ```
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Fired before each completion call. Iteration 1 is the initial call.
    LLMCallStarted { agent_name: String, iteration: usize },

    LLMCallCompleted {
        agent_name: String,
        iteration: usize,
        /// Cumulative token usage up to and including this call.
        tokens_used: Option<TokenUsage>,
        response_length: usize,
    },

    /// A `{"tool_call": ...}` fragment was found in the model output.
    ToolCallDetected {
        agent_name: String,
        tool_name: String,
        parameters: serde_json::Value,
        iteration: usize,
    },

    ToolExecutionCompleted {
        agent_name: String,
        tool_name: String,
        success: bool,
        error: Option<String>,
        iteration: usize,
    },

    /// The tool loop hit its cap; the reply carries a warning suffix.
    ToolMaxIterationsReached { agent_name: String },

    ReplyCompleted {
        agent_name: String,
        tokens_used: Option<TokenUsage>,
        tool_calls_made: usize,
        response_length: usize,
    },
}

/// Events emitted by the group chat driver.
#[derive(Debug, Clone)]
pub enum GroupChatEvent {
    /// A user question was appended and a new exchange begins.
    ExchangeStarted {
        /// First ~120 characters of the question.
        question_preview: String,
        transcript_reset: bool,
    },

    AgentSelected { agent_name: String, iteration: usize },

    AgentResponded {
        agent_name: String,
        iteration: usize,
        response_length: usize,
        tool_calls_made: usize,
    },

    /// The agent could not produce a reply. The exchange is marked complete.
    AgentFailed { agent_name: String, error: String },

    TerminationEvaluated {
        iteration: usize,
        state: TerminationState,
        indicator: Option<&'static str>,
        ceiling_reached: bool,
        terminate: bool,
    },

    ExchangeCompleted { iterations: usize },
}

/// Receives [`AgentEvent`]s and [`GroupChatEvent`]s.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_agent_event(&self, _event: &AgentEvent) {}

    async fn on_group_chat_event(&self, _event: &GroupChatEvent) {}
}

/// Forwards every event to the `log` facade.
///
/// LLM round-trips and tool details go to `debug`, group chat progress to `info`,
/// failures to `warn`/`error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventHandler;

#[async_trait]
impl EventHandler for LoggingEventHandler {
    async fn on_agent_event(&self, event: &AgentEvent) {
        match event {
            AgentEvent::LLMCallStarted {
                agent_name,
                iteration,
            } => log::debug!("{} calling model (round {})", agent_name, iteration),
            AgentEvent::LLMCallCompleted {
                agent_name,
                iteration,
                tokens_used,
                response_length,
            } => log::debug!(
                "{} model round {} done ({} chars, {} tokens so far)",
                agent_name,
                iteration,
                response_length,
                tokens_used.as_ref().map_or(0, |u| u.total_tokens)
            ),
            AgentEvent::ToolCallDetected {
                agent_name,
                tool_name,
                parameters,
                ..
            } => log::debug!("{} requested tool {} {}", agent_name, tool_name, parameters),
            AgentEvent::ToolExecutionCompleted {
                agent_name,
                tool_name,
                success,
                error,
                ..
            } => {
                if *success {
                    log::debug!("{}: tool {} succeeded", agent_name, tool_name);
                } else {
                    log::warn!(
                        "{}: tool {} failed: {}",
                        agent_name,
                        tool_name,
                        error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
            AgentEvent::ToolMaxIterationsReached { agent_name } => {
                log::warn!("{} hit the tool iteration limit", agent_name)
            }
            AgentEvent::ReplyCompleted {
                agent_name,
                tool_calls_made,
                response_length,
                ..
            } => log::debug!(
                "{} replied ({} chars, {} tool calls)",
                agent_name,
                response_length,
                tool_calls_made
            ),
        }
    }

    async fn on_group_chat_event(&self, event: &GroupChatEvent) {
        match event {
            GroupChatEvent::ExchangeStarted {
                question_preview,
                transcript_reset,
            } => log::info!(
                "New question (reset: {}): {}",
                transcript_reset,
                question_preview
            ),
            GroupChatEvent::AgentSelected {
                agent_name,
                iteration,
            } => log::info!("Turn {}: {} selected", iteration, agent_name),
            GroupChatEvent::AgentResponded {
                agent_name,
                response_length,
                ..
            } => log::debug!("{} responded with {} chars", agent_name, response_length),
            GroupChatEvent::AgentFailed { agent_name, error } => {
                log::error!("{} failed: {}", agent_name, error)
            }
            GroupChatEvent::TerminationEvaluated {
                iteration,
                state,
                indicator,
                ceiling_reached,
                terminate,
            } => log::debug!(
                "Termination after turn {}: {:?} (indicator {:?}, ceiling {}) -> {}",
                iteration,
                state,
                indicator,
                ceiling_reached,
                terminate
            ),
            GroupChatEvent::ExchangeCompleted { iterations } => {
                log::info!("Exchange complete after {} turns", iterations)
            }
        }
    }
}
