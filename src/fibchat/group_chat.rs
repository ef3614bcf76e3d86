//! Group conversation driver.
//!
//! [`AgentGroupChat`] owns the transcript. For every user question it repeatedly picks the
//! next agent, asks the [`AgentInvoker`] for that agent's reply, appends it, and consults
//! the [`TerminationStrategy`] until the exchange is complete.
//!
//! ```text
//! add_user_message ─► next_turn ─► SelectionStrategy::next
//!                        │          AgentInvoker::invoke
//!                        │          Transcript::push
//!                        │          TerminationStrategy::evaluate
//!                        └──────── repeat until complete
//! ```
//!
//! Replies can be pulled one at a time with [`next_turn`](AgentGroupChat::next_turn),
//! consumed as a stream with [`invoke_stream`](AgentGroupChat::invoke_stream), or collected
//! with [`invoke`](AgentGroupChat::invoke).

use crate::fibchat::agent::{Agent, AgentInvoker, AgentReply};
use crate::fibchat::event::{EventHandler, GroupChatEvent};
use crate::fibchat::selection::{RoundRobinSelection, SelectionStrategy};
use crate::fibchat::termination::{FibonacciTerminationStrategy, TerminationStrategy};
use crate::fibchat::tools::fibonacci::GENERATE_TOOL;
use crate::fibchat::transcript::{ChatMessage, Transcript};
use futures_util::stream::{self, Stream};
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Errors raised by [`AgentGroupChat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupChatError {
    /// A group chat needs at least one agent.
    EmptyRoster,
    DuplicateAgentName(String),
    /// The agent could not produce a reply; the exchange has been closed.
    AgentFailed { agent: String, message: String },
}

impl fmt::Display for GroupChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupChatError::EmptyRoster => write!(f, "Group chat requires at least one agent"),
            GroupChatError::DuplicateAgentName(name) => {
                write!(f, "Agent name '{}' is used more than once", name)
            }
            GroupChatError::AgentFailed { agent, message } => {
                write!(f, "Agent '{}' failed: {}", agent, message)
            }
        }
    }
}

impl Error for GroupChatError {}

pub struct AgentGroupChat {
    agents: Vec<Agent>,
    invoker: Arc<dyn AgentInvoker>,
    selection: Box<dyn SelectionStrategy>,
    termination: Box<dyn TerminationStrategy>,
    transcript: Transcript,
    iteration: usize,
    complete: bool,
    last_sequence: Option<Vec<i64>>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl AgentGroupChat {
    /// Create a group chat with round-robin selection and the default Fibonacci policy.
    ///
    /// Fails on an empty roster or when two agents share a name.
    pub fn new(
        agents: Vec<Agent>,
        invoker: Arc<dyn AgentInvoker>,
    ) -> Result<Self, GroupChatError> {
        if agents.is_empty() {
            return Err(GroupChatError::EmptyRoster);
        }
        let mut seen = HashSet::new();
        for agent in &agents {
            if !seen.insert(agent.name.as_str()) {
                return Err(GroupChatError::DuplicateAgentName(agent.name.clone()));
            }
        }

        Ok(Self {
            agents,
            invoker,
            selection: Box::new(RoundRobinSelection::new()),
            termination: Box::new(FibonacciTerminationStrategy::default()),
            transcript: Transcript::new(),
            iteration: 0,
            complete: true,
            last_sequence: None,
            event_handler: None,
        })
    }

    pub fn with_selection_strategy(mut self, selection: Box<dyn SelectionStrategy>) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_termination_strategy(mut self, termination: Box<dyn TerminationStrategy>) -> Self {
        self.termination = termination;
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    async fn emit(&self, event: GroupChatEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_group_chat_event(&event).await;
        }
    }

    /// Start a new exchange with `text` as the user's question.
    ///
    /// With automatic reset the previous transcript and selection state are dropped first.
    /// The iteration counter and completion flag are always reset.
    pub async fn add_user_message(&mut self, text: impl Into<String>) {
        let text = text.into();
        let reset = self.termination.automatic_reset();
        if reset {
            self.transcript.reset();
            self.selection.reset();
        }
        self.iteration = 0;
        self.complete = false;

        let preview: String = text.chars().take(120).collect();
        self.transcript.push(ChatMessage::user(text));
        self.emit(GroupChatEvent::ExchangeStarted {
            question_preview: preview,
            transcript_reset: reset,
        })
        .await;
    }

    /// Run one agent turn. Returns `Ok(None)` once the exchange is complete.
    ///
    /// On failure nothing is appended to the transcript and the exchange is closed.
    pub async fn next_turn(&mut self) -> Result<Option<ChatMessage>, GroupChatError> {
        if self.complete {
            return Ok(None);
        }

        let Some(index) = self.selection.next(&self.agents, self.transcript.messages()) else {
            log::warn!("Selection strategy returned no agent; closing exchange");
            self.complete = true;
            return Ok(None);
        };
        let Some(agent) = self.agents.get(index).cloned() else {
            log::warn!("Selection strategy returned out-of-range index {}", index);
            self.complete = true;
            return Ok(None);
        };

        self.emit(GroupChatEvent::AgentSelected {
            agent_name: agent.name.clone(),
            iteration: self.iteration + 1,
        })
        .await;

        let reply = match self.invoker.invoke(&agent, self.transcript.messages()).await {
            Ok(reply) => reply,
            Err(e) => {
                self.complete = true;
                self.emit(GroupChatEvent::AgentFailed {
                    agent_name: agent.name.clone(),
                    error: e.to_string(),
                })
                .await;
                return Err(GroupChatError::AgentFailed {
                    agent: agent.name,
                    message: e.to_string(),
                });
            }
        };

        self.iteration += 1;
        self.record_sequence(&reply);
        let message = reply.message;

        self.emit(GroupChatEvent::AgentResponded {
            agent_name: agent.name.clone(),
            iteration: self.iteration,
            response_length: message.content.len(),
            tool_calls_made: reply.tool_invocations.len(),
        })
        .await;

        self.transcript.push(message.clone());

        let decision = self
            .termination
            .evaluate(self.transcript.messages(), self.iteration);
        self.emit(GroupChatEvent::TerminationEvaluated {
            iteration: self.iteration,
            state: decision.state,
            indicator: decision.indicator,
            ceiling_reached: decision.ceiling_reached,
            terminate: decision.terminate,
        })
        .await;

        if decision.terminate {
            self.complete = true;
            self.emit(GroupChatEvent::ExchangeCompleted {
                iterations: self.iteration,
            })
            .await;
        }

        Ok(Some(message))
    }

    fn record_sequence(&mut self, reply: &AgentReply) {
        let produced = reply
            .tool_invocations
            .iter()
            .rev()
            .filter(|inv| inv.name == GENERATE_TOOL)
            .find_map(|inv| inv.output.as_ref()?.get("sequence")?.as_array().cloned());
        if let Some(values) = produced {
            self.last_sequence = Some(values.iter().filter_map(|v| v.as_i64()).collect());
        }
    }

    /// Stream of agent replies for the current exchange, one item per turn.
    ///
    /// An error item closes the exchange, so the stream ends right after it.
    pub fn invoke_stream(
        &mut self,
    ) -> impl Stream<Item = Result<ChatMessage, GroupChatError>> + '_ {
        stream::unfold(self, |chat| async move {
            match chat.next_turn().await {
                Ok(Some(message)) => Some((Ok(message), chat)),
                Ok(None) => None,
                Err(e) => Some((Err(e), chat)),
            }
        })
    }

    /// Run the exchange to completion and return every reply.
    pub async fn invoke(&mut self) -> Result<Vec<ChatMessage>, GroupChatError> {
        let mut replies = Vec::new();
        while let Some(message) = self.next_turn().await? {
            replies.push(message);
        }
        Ok(replies)
    }

    /// Drop the transcript, selection state and remembered sequence.
    pub fn reset(&mut self) {
        self.transcript.reset();
        self.selection.reset();
        self.iteration = 0;
        self.complete = true;
        self.last_sequence = None;
    }

    pub fn history(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Agent turns taken in the current exchange.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Most recent sequence produced by a `GenerateFibonacci` call, kept across questions.
    pub fn last_sequence(&self) -> Option<&[i64]> {
        self.last_sequence.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl AgentInvoker for Echo {
        async fn invoke(
            &self,
            agent: &Agent,
            _history: &[ChatMessage],
        ) -> Result<AgentReply, Box<dyn Error + Send + Sync>> {
            Ok(AgentReply::text(&agent.name, "thinking"))
        }
    }

    #[test]
    fn test_rejects_empty_and_duplicate_rosters() {
        assert_eq!(
            AgentGroupChat::new(vec![], Arc::new(Echo)).err(),
            Some(GroupChatError::EmptyRoster)
        );
        let dup = vec![Agent::new("A", "x"), Agent::new("A", "y")];
        assert_eq!(
            AgentGroupChat::new(dup, Arc::new(Echo)).err(),
            Some(GroupChatError::DuplicateAgentName("A".to_string()))
        );
    }

    #[tokio::test]
    async fn test_no_turns_before_first_question() {
        let mut chat = AgentGroupChat::new(vec![Agent::new("A", "x")], Arc::new(Echo)).unwrap();
        assert!(chat.is_complete());
        assert!(chat.next_turn().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_single_bucket_runs_to_ceiling() {
        let policy = FibonacciTerminationStrategy::default().with_maximum_iterations(3);
        let roster = vec![Agent::new("FibonacciGenerator", "x")];
        let mut chat = AgentGroupChat::new(roster, Arc::new(Echo))
            .unwrap()
            .with_termination_strategy(Box::new(policy));

        chat.add_user_message("go").await;
        let replies = chat.invoke().await.unwrap();
        assert_eq!(replies.len(), 3);
        assert_eq!(chat.iteration(), 3);
        assert!(chat.is_complete());
    }
}
