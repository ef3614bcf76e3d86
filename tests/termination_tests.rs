use fibchat::termination::{
    FibonacciTerminationStrategy, TerminationState, TerminationStrategy, COMPLETION_INDICATORS,
};
use fibchat::transcript::ChatMessage;

fn question() -> ChatMessage {
    ChatMessage::user("Tell me about Fibonacci numbers")
}

#[test]
fn test_no_agent_messages_is_not_terminal() {
    let policy = FibonacciTerminationStrategy::default();
    let decision = policy.evaluate(&[question()], 0);
    assert!(!decision.terminate);
    assert_eq!(decision.state, TerminationState::AwaitingFirstResponse);
}

#[test]
fn test_generator_then_validator_terminates() {
    let policy = FibonacciTerminationStrategy::default();
    let mut history = vec![
        question(),
        ChatMessage::agent("FibonacciGenerator", "Working on a sequence for you"),
    ];
    let first = policy.evaluate(&history, 1);
    assert!(!first.terminate);
    assert_eq!(first.state, TerminationState::AwaitingSecondDistinctResponder);

    history.push(ChatMessage::agent("FibonacciValidator", "Looks fine to me"));
    let second = policy.evaluate(&history, 2);
    assert!(second.terminate);
    assert_eq!(second.state, TerminationState::ReadyToTerminate);
    assert_eq!(second.indicator, None);
}

#[test]
fn test_valid_marker_from_first_responder_terminates() {
    let policy = FibonacciTerminationStrategy::default();
    let history = vec![
        question(),
        ChatMessage::agent(
            "FibonacciValidator",
            "✅ VALID: The sequence [0, 1, 1, 2] is a correct Fibonacci sequence.",
        ),
    ];
    let decision = policy.evaluate(&history, 1);
    assert!(decision.terminate);
    assert_eq!(decision.indicator, Some("✅ valid"));
    assert!(!decision.ceiling_reached);
}

#[test]
fn test_every_indicator_triggers() {
    let policy = FibonacciTerminationStrategy::default();
    for indicator in COMPLETION_INDICATORS {
        let history = vec![
            question(),
            ChatMessage::agent("FibonacciGenerator", indicator.to_uppercase()),
        ];
        assert!(
            policy.evaluate(&history, 1).terminate,
            "'{}' should terminate",
            indicator
        );
    }
}

#[test]
fn test_same_bucket_does_not_count_twice() {
    let policy = FibonacciTerminationStrategy::default();
    let history = vec![
        question(),
        ChatMessage::agent("FibonacciGenerator", "step one"),
        ChatMessage::agent("SequenceGenerator", "step two"),
    ];
    assert!(!policy.evaluate(&history, 2).terminate);
}

#[test]
fn test_ceiling_forces_termination() {
    let policy = FibonacciTerminationStrategy::default();
    let mut history = vec![question()];
    for turn in 1..=10 {
        history.push(ChatMessage::agent("FibonacciGenerator", "still thinking"));
        let decision = policy.evaluate(&history, turn);
        if turn < 10 {
            assert!(!decision.terminate, "turn {} should continue", turn);
        } else {
            assert!(decision.terminate);
            assert!(decision.ceiling_reached);
            assert_eq!(decision.state, TerminationState::ReadyToTerminate);
            assert_eq!(decision.indicator, None);
        }
    }
}

#[test]
fn test_ceiling_of_one_reports_ready_state() {
    let policy = FibonacciTerminationStrategy::default().with_maximum_iterations(1);
    let history = vec![
        question(),
        ChatMessage::agent("FibonacciGenerator", "working on it"),
    ];
    assert_eq!(
        policy.should_agent_terminate(&history).state,
        TerminationState::AwaitingSecondDistinctResponder
    );
    let decision = policy.evaluate(&history, 1);
    assert!(decision.terminate);
    assert!(decision.ceiling_reached);
    assert_eq!(decision.state, TerminationState::ReadyToTerminate);
}

#[test]
fn test_custom_ceiling() {
    let policy = FibonacciTerminationStrategy::default().with_maximum_iterations(2);
    let history = vec![question(), ChatMessage::agent("FibonacciGenerator", "hmm")];
    assert!(!policy.evaluate(&history, 1).terminate);
    assert!(policy.evaluate(&history, 2).terminate);
}

// Substring matching is kept as-is: "incomplete" contains "complete".
#[test]
fn test_incomplete_is_a_known_false_positive() {
    let policy = FibonacciTerminationStrategy::default();
    let history = vec![
        question(),
        ChatMessage::agent("FibonacciGenerator", "The list so far is incomplete"),
    ];
    let decision = policy.evaluate(&history, 1);
    assert!(decision.terminate);
    assert_eq!(decision.indicator, Some("complete"));
}

#[test]
fn test_indicator_only_checked_on_latest_message() {
    let policy = FibonacciTerminationStrategy::default();
    let history = vec![
        question(),
        ChatMessage::agent("FibonacciGenerator", "Approved earlier"),
        ChatMessage::user("and now?"),
    ];
    let decision = policy.evaluate(&history, 1);
    assert!(!decision.terminate);
}

#[test]
fn test_policy_settings() {
    let policy = FibonacciTerminationStrategy::new(4, false);
    assert_eq!(policy.maximum_iterations(), 4);
    assert!(!policy.automatic_reset());
    assert!(FibonacciTerminationStrategy::default().automatic_reset());
}
