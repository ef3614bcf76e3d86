//! Offline stand-in for a chat-completion service.
//!
//! [`MockChatCompletionClient`] answers with canned Fibonacci replies after a short
//! simulated delay. It reads the same prompt an LLM would see:
//!
//! - the tools advertised in the system prompt decide which tool calls it may emit
//! - the latest user question decides what it wants to do
//! - a trailing `Tool '...' executed successfully` message is turned into prose
//!
//! That is enough to exercise the whole group chat, tool loop included, without network
//! access.

use crate::fibchat::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
use crate::fibchat::tools::fibonacci::{GENERATE_TOOL, MEMBERSHIP_TOOL, STRING_TOOL, VALIDATE_TOOL};
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::error::Error;
use std::sync::Mutex;
use std::time::Duration;

pub const DEFAULT_SEQUENCE: &str = "0, 1, 1, 2, 3, 5, 8, 13, 21, 34";
pub const FALLBACK_REPLY: &str =
    "I'm a Fibonacci specialist. I can generate or validate Fibonacci sequences. How can I help you?";

const DEFAULT_COUNT: i64 = 10;
const TOOL_RESULT_PREFIX: &str = "Tool '";
const TOOL_ERROR_PREFIX: &str = "Tool execution error: ";

fn is_tool_feedback(content: &str) -> bool {
    content.starts_with(TOOL_RESULT_PREFIX) || content.starts_with(TOOL_ERROR_PREFIX)
}

pub struct MockChatCompletionClient {
    delay: Duration,
    usage: Mutex<Option<TokenUsage>>,
}

impl Default for MockChatCompletionClient {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl MockChatCompletionClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            usage: Mutex::new(None),
        }
    }

    /// Produce the reply text for a prompt. Synchronous so it can be tested directly.
    pub fn respond(&self, messages: &[Message]) -> String {
        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or("");
        let advertised = |tool: &str| system.contains(&format!("- {}:", tool));

        if let Some(last) = messages.last() {
            if last.role == Role::User && is_tool_feedback(&last.content) {
                return describe_tool_result(&last.content);
            }
        }

        let Some(question) = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User && !is_tool_feedback(&m.content))
        else {
            return FALLBACK_REPLY.to_string();
        };
        let lowered = question.content.to_lowercase();

        if lowered.contains("validate")
            && lowered.contains("fibonacci")
            && advertised(VALIDATE_TOOL)
        {
            return tool_call(
                VALIDATE_TOOL,
                json!({ "sequence": extract_sequence(&question.content) }),
            );
        }

        if lowered.contains("a fibonacci number") && advertised(MEMBERSHIP_TOOL) {
            if let Some(number) = first_integer(&question.content) {
                return tool_call(MEMBERSHIP_TOOL, json!({ "number": number }));
            }
        }

        let wants_sequence = lowered.contains("fibonacci")
            && (lowered.contains("generate")
                || lowered.contains("first")
                || lowered.contains("list"));
        if wants_sequence {
            let count = first_integer(&question.content).unwrap_or(DEFAULT_COUNT);
            if advertised(GENERATE_TOOL) {
                return tool_call(GENERATE_TOOL, json!({ "count": count }));
            }
            if advertised(STRING_TOOL) {
                return tool_call(STRING_TOOL, json!({ "count": count }));
            }
            // a validator without generation tools checks what a teammate produced
            if advertised(VALIDATE_TOOL) {
                if let Some(previous) = latest_teammate_sequence(messages) {
                    return tool_call(VALIDATE_TOOL, json!({ "sequence": previous }));
                }
            }
        }

        FALLBACK_REPLY.to_string()
    }

    fn record_usage(&self, messages: &[Message], reply: &str) {
        // rough four-characters-per-token estimate
        let input_tokens = messages.iter().map(|m| m.content.len()).sum::<usize>() / 4;
        let output_tokens = reply.len() / 4;
        if let Ok(mut slot) = self.usage.lock() {
            *slot = Some(TokenUsage {
                input_tokens,
                output_tokens,
                total_tokens: input_tokens + output_tokens,
            });
        }
    }
}

#[async_trait]
impl ClientWrapper for MockChatCompletionClient {
    async fn send_message(
        &self,
        messages: &[Message],
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let reply = self.respond(messages);
        self.record_usage(messages, &reply);
        Ok(Message::new(Role::Assistant, reply))
    }

    fn model_name(&self) -> &str {
        "mock-fibonacci"
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.usage)
    }
}

fn tool_call(name: &str, parameters: JsonValue) -> String {
    json!({ "tool_call": { "name": name, "parameters": parameters } }).to_string()
}

/// Text after the first `:` up to the first sentence terminator, or the default sequence.
pub fn extract_sequence(text: &str) -> String {
    let Some((_, rest)) = text.split_once(':') else {
        return DEFAULT_SEQUENCE.to_string();
    };
    let end = rest.find(['.', '?', '!', '\n']).unwrap_or(rest.len());
    let candidate = rest[..end].trim();
    if candidate.is_empty() {
        DEFAULT_SEQUENCE.to_string()
    } else {
        candidate.to_string()
    }
}

fn first_integer(text: &str) -> Option<i64> {
    text.split(|c: char| !(c.is_ascii_digit() || c == '-'))
        .filter(|token| !token.is_empty())
        .find_map(|token| token.parse::<i64>().ok())
}

/// Sequence from the most recent agent message that looks like it contains one.
fn latest_teammate_sequence(messages: &[Message]) -> Option<String> {
    messages
        .iter()
        .rev()
        .filter(|m| m.role == Role::Assistant)
        .map(|m| strip_author(&m.content))
        .find(|content| content.contains(':') && content.contains(','))
        .map(extract_sequence)
}

/// Drop the `[author]: ` prefix the invoker puts on teammate messages.
fn strip_author(content: &str) -> &str {
    if content.starts_with('[') {
        if let Some(idx) = content.find("]: ") {
            return &content[idx + 3..];
        }
    }
    content
}

fn describe_tool_result(feedback: &str) -> String {
    if let Some(reason) = feedback.strip_prefix(TOOL_ERROR_PREFIX) {
        return format!("I couldn't complete that request: {}", reason);
    }
    let Some(rest) = feedback.strip_prefix(TOOL_RESULT_PREFIX) else {
        return FALLBACK_REPLY.to_string();
    };
    let Some((tool, outcome)) = rest.split_once('\'') else {
        return format!("I couldn't complete that request: {}", feedback);
    };
    let Some((_, payload)) = outcome.split_once("Result: ") else {
        let reason = outcome
            .split_once("Error: ")
            .map(|(_, e)| e)
            .unwrap_or(outcome.trim());
        return format!("I couldn't complete that request: {}", reason);
    };
    let Ok(result) = serde_json::from_str::<JsonValue>(payload) else {
        return format!("I couldn't read the {} result.", tool);
    };

    match tool {
        GENERATE_TOOL => {
            let numbers = result["sequence"]
                .as_array()
                .map(|seq| {
                    seq.iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            format!(
                "The first {} Fibonacci numbers are: {}",
                result["count"], numbers
            )
        }
        STRING_TOOL => format!(
            "The first {} Fibonacci numbers are: {}",
            result["count"],
            result["text"].as_str().unwrap_or_default()
        ),
        VALIDATE_TOOL => result["summary"]
            .as_str()
            .unwrap_or("I could not validate that sequence.")
            .to_string(),
        MEMBERSHIP_TOOL => {
            if result["is_fibonacci"].as_bool().unwrap_or(false) {
                format!("Yes, {} is a Fibonacci number.", result["number"])
            } else {
                format!("No, {} is not a Fibonacci number.", result["number"])
            }
        }
        other => format!("The {} tool returned: {}", other, result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_with(tools: &[&str]) -> Message {
        let listing: String = tools.iter().map(|t| format!("- {}: does things\n", t)).collect();
        Message::new(Role::System, format!("You are helpful.\n\n{}", listing))
    }

    #[test]
    fn test_extract_sequence() {
        assert_eq!(
            extract_sequence("Validate this Fibonacci sequence: 0, 1, 1, 2. Thanks"),
            "0, 1, 1, 2"
        );
        assert_eq!(extract_sequence("validate fibonacci please"), DEFAULT_SEQUENCE);
        assert_eq!(extract_sequence("validate:   ?"), DEFAULT_SEQUENCE);
    }

    #[test]
    fn test_generate_request_emits_tool_call() {
        let client = MockChatCompletionClient::new(Duration::ZERO);
        let reply = client.respond(&[
            system_with(&[GENERATE_TOOL]),
            Message::new(Role::User, "Generate the first 7 Fibonacci numbers"),
        ]);
        let parsed: JsonValue = serde_json::from_str(&reply).unwrap();
        assert_eq!(parsed["tool_call"]["name"], GENERATE_TOOL);
        assert_eq!(parsed["tool_call"]["parameters"]["count"], 7);
    }

    #[test]
    fn test_unadvertised_tool_falls_back() {
        let client = MockChatCompletionClient::new(Duration::ZERO);
        let reply = client.respond(&[
            system_with(&[]),
            Message::new(Role::User, "Generate fibonacci numbers"),
        ]);
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[test]
    fn test_tool_result_becomes_prose() {
        let client = MockChatCompletionClient::new(Duration::ZERO);
        let feedback = format!(
            "Tool '{}' executed successfully. Result: {}",
            GENERATE_TOOL,
            json!({"count": 3, "sequence": [0, 1, 1]})
        );
        let reply = client.respond(&[
            system_with(&[GENERATE_TOOL]),
            Message::new(Role::User, "generate 3 fibonacci numbers"),
            Message::new(Role::Assistant, "{\"tool_call\": {}}"),
            Message::new(Role::User, feedback),
        ]);
        assert_eq!(reply, "The first 3 Fibonacci numbers are: 0, 1, 1");
    }

    #[test]
    fn test_validator_checks_teammate_sequence() {
        let client = MockChatCompletionClient::new(Duration::ZERO);
        let reply = client.respond(&[
            system_with(&[VALIDATE_TOOL, MEMBERSHIP_TOOL]),
            Message::new(Role::User, "Generate fibonacci numbers"),
            Message::new(
                Role::Assistant,
                "[FibonacciGenerator]: The first 4 Fibonacci numbers are: 0, 1, 1, 2",
            ),
        ]);
        let parsed: JsonValue = serde_json::from_str(&reply).unwrap();
        assert_eq!(parsed["tool_call"]["name"], VALIDATE_TOOL);
        assert_eq!(parsed["tool_call"]["parameters"]["sequence"], "0, 1, 1, 2");
    }

    #[test]
    fn test_first_integer() {
        assert_eq!(first_integer("is 21 a fibonacci number?"), Some(21));
        assert_eq!(first_integer("is -5 one?"), Some(-5));
        assert_eq!(first_integer("no digits"), None);
    }
}
