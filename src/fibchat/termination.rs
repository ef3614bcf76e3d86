//! Termination policy for the Fibonacci group chat.
//!
//! After every agent turn the group chat asks its [`TerminationStrategy`] whether the
//! exchange is finished. The default [`FibonacciTerminationStrategy`] stops when
//!
//! 1. the latest agent message reads like a final answer (see [`COMPLETION_INDICATORS`]), or
//! 2. agents from at least two distinct role buckets have replied, or
//! 3. the iteration ceiling is reached.
//!
//! Indicator matching is a lowercase substring search, not a word match, so a reply such
//! as "the list is incomplete" also counts as complete.
//!
//! ```
//! use fibchat::termination::{FibonacciTerminationStrategy, TerminationState, TerminationStrategy};
//! use fibchat::transcript::ChatMessage;
//!
//! let policy = FibonacciTerminationStrategy::default();
//! let history = vec![
//!     ChatMessage::user("Validate 0, 1, 1, 2"),
//!     ChatMessage::agent("FibonacciGenerator", "Let me pass this along."),
//! ];
//! let decision = policy.evaluate(&history, 1);
//! assert!(!decision.terminate);
//! assert_eq!(decision.state, TerminationState::AwaitingSecondDistinctResponder);
//! ```

use crate::fibchat::transcript::ChatMessage;
use std::collections::HashSet;

pub const DEFAULT_MAXIMUM_ITERATIONS: usize = 10;

/// Lowercase phrases that mark an agent reply as a final answer.
pub const COMPLETION_INDICATORS: [&str; 9] = [
    "✅ valid",
    "❌ invalid",
    "correct fibonacci sequence",
    "incorrect sequence",
    "here are the",
    "the fibonacci numbers are",
    "approved",
    "confirmed",
    "complete",
];

/// Where the current exchange stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationState {
    AwaitingFirstResponse,
    AwaitingSecondDistinctResponder,
    ReadyToTerminate,
}

/// Result of a single policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationDecision {
    pub state: TerminationState,
    /// Completion indicator found in the latest agent message, if any.
    pub indicator: Option<&'static str>,
    pub ceiling_reached: bool,
    pub terminate: bool,
}

/// Collapse an agent name into the role bucket used for responder coverage.
///
/// Returns `None` for empty names, which never count as a responder.
pub fn role_bucket(agent_name: &str) -> Option<&str> {
    if agent_name.is_empty() {
        None
    } else if agent_name.contains("Generator") {
        Some("Generator")
    } else if agent_name.contains("Validator") {
        Some("Validator")
    } else {
        Some(agent_name)
    }
}

/// First completion indicator contained in `content`, ignoring case.
pub fn matched_indicator(content: &str) -> Option<&'static str> {
    let lowered = content.to_lowercase();
    COMPLETION_INDICATORS
        .iter()
        .copied()
        .find(|indicator| lowered.contains(indicator))
}

/// Pluggable stop rule for the group chat.
pub trait TerminationStrategy: Send + Sync {
    /// Decide from the transcript alone, without the iteration ceiling.
    fn should_agent_terminate(&self, history: &[ChatMessage]) -> TerminationDecision;

    fn maximum_iterations(&self) -> usize;

    /// Whether the transcript is cleared when a new user question arrives.
    fn automatic_reset(&self) -> bool;

    /// Full decision for the turn numbered `iteration` (1-based), ceiling included.
    fn evaluate(&self, history: &[ChatMessage], iteration: usize) -> TerminationDecision {
        let mut decision = self.should_agent_terminate(history);
        if iteration >= self.maximum_iterations() {
            decision.state = TerminationState::ReadyToTerminate;
            decision.ceiling_reached = true;
            decision.terminate = true;
        }
        decision
    }
}

/// Keyword-plus-coverage policy used by the Fibonacci roster.
#[derive(Debug, Clone)]
pub struct FibonacciTerminationStrategy {
    maximum_iterations: usize,
    automatic_reset: bool,
}

impl Default for FibonacciTerminationStrategy {
    fn default() -> Self {
        Self {
            maximum_iterations: DEFAULT_MAXIMUM_ITERATIONS,
            automatic_reset: true,
        }
    }
}

impl FibonacciTerminationStrategy {
    pub fn new(maximum_iterations: usize, automatic_reset: bool) -> Self {
        Self {
            maximum_iterations,
            automatic_reset,
        }
    }

    pub fn with_maximum_iterations(mut self, maximum_iterations: usize) -> Self {
        self.maximum_iterations = maximum_iterations;
        self
    }

    pub fn with_automatic_reset(mut self, automatic_reset: bool) -> Self {
        self.automatic_reset = automatic_reset;
        self
    }
}

impl TerminationStrategy for FibonacciTerminationStrategy {
    fn should_agent_terminate(&self, history: &[ChatMessage]) -> TerminationDecision {
        let agent_messages: Vec<&ChatMessage> = history.iter().filter(|m| m.is_agent()).collect();
        if agent_messages.is_empty() {
            return TerminationDecision {
                state: TerminationState::AwaitingFirstResponse,
                indicator: None,
                ceiling_reached: false,
                terminate: false,
            };
        }

        let buckets: HashSet<&str> = agent_messages
            .iter()
            .filter_map(|m| m.author.as_deref().and_then(role_bucket))
            .collect();

        let indicator = history
            .last()
            .filter(|m| m.is_agent())
            .and_then(|m| matched_indicator(&m.content));

        let terminate = indicator.is_some() || buckets.len() >= 2;
        log::debug!(
            "Termination check: {} agent messages, buckets {:?}, indicator {:?}",
            agent_messages.len(),
            buckets,
            indicator
        );

        TerminationDecision {
            state: if terminate {
                TerminationState::ReadyToTerminate
            } else {
                TerminationState::AwaitingSecondDistinctResponder
            },
            indicator,
            ceiling_reached: false,
            terminate,
        }
    }

    fn maximum_iterations(&self) -> usize {
        self.maximum_iterations
    }

    fn automatic_reset(&self) -> bool {
        self.automatic_reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_buckets() {
        assert_eq!(role_bucket("FibonacciGenerator"), Some("Generator"));
        assert_eq!(role_bucket("SequenceValidator"), Some("Validator"));
        assert_eq!(role_bucket("GeneralAssistant"), Some("GeneralAssistant"));
        assert_eq!(role_bucket(""), None);
    }

    #[test]
    fn test_indicator_match_is_case_insensitive() {
        assert_eq!(matched_indicator("Request APPROVED."), Some("approved"));
        assert_eq!(
            matched_indicator("✅ VALID: The sequence [0, 1] is a correct Fibonacci sequence."),
            Some("✅ valid")
        );
        assert_eq!(matched_indicator("Working on it"), None);
    }

    #[test]
    fn test_user_message_last_skips_indicator() {
        let policy = FibonacciTerminationStrategy::default();
        let history = vec![
            ChatMessage::agent("FibonacciGenerator", "Working on it"),
            ChatMessage::user("Is it approved?"),
        ];
        let decision = policy.should_agent_terminate(&history);
        assert!(!decision.terminate);
        assert_eq!(decision.indicator, None);
    }

    #[test]
    fn test_empty_author_is_not_a_responder() {
        let policy = FibonacciTerminationStrategy::default();
        let history = vec![
            ChatMessage::agent("", "thinking"),
            ChatMessage::agent("FibonacciGenerator", "still thinking"),
        ];
        assert!(!policy.should_agent_terminate(&history).terminate);
    }
}
