//! Turn-taking strategies for the group chat.

use crate::fibchat::agent::Agent;
use crate::fibchat::transcript::ChatMessage;

/// Chooses which agent speaks next.
pub trait SelectionStrategy: Send + Sync {
    /// Index into `agents` of the next speaker, or `None` if nobody should speak.
    fn next(&mut self, agents: &[Agent], history: &[ChatMessage]) -> Option<usize>;

    /// Forget any per-exchange state.
    fn reset(&mut self);
}

/// Cycles through the roster in order, wrapping around.
#[derive(Debug, Default, Clone)]
pub struct RoundRobinSelection {
    cursor: usize,
}

impl RoundRobinSelection {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for RoundRobinSelection {
    fn next(&mut self, agents: &[Agent], _history: &[ChatMessage]) -> Option<usize> {
        if agents.is_empty() {
            return None;
        }
        let index = self.cursor % agents.len();
        self.cursor = (index + 1) % agents.len();
        Some(index)
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Agent> {
        vec![
            Agent::new("A", "first"),
            Agent::new("B", "second"),
            Agent::new("C", "third"),
        ]
    }

    #[test]
    fn test_round_robin_wraps() {
        let agents = roster();
        let mut selection = RoundRobinSelection::new();
        let picks: Vec<usize> = (0..5)
            .filter_map(|_| selection.next(&agents, &[]))
            .collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_reset_restarts_from_first_agent() {
        let agents = roster();
        let mut selection = RoundRobinSelection::new();
        selection.next(&agents, &[]);
        selection.next(&agents, &[]);
        selection.reset();
        assert_eq!(selection.next(&agents, &[]), Some(0));
    }

    #[test]
    fn test_empty_roster_selects_nobody() {
        let mut selection = RoundRobinSelection::new();
        assert_eq!(selection.next(&[], &[]), None);
    }
}
