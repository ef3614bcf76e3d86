//! Interactive console session.
//!
//! [`FibonacciApp`] reads one question per line, hands it to the [`AgentGroupChat`] and
//! prints each agent reply as soon as it arrives. It is generic over its input and output so
//! it can be driven from stdin/stdout or from in-memory buffers.

use crate::fibchat::group_chat::AgentGroupChat;
use futures_util::{pin_mut, StreamExt};
use std::io::{self, BufRead, Write};

pub const GOODBYE: &str = "Goodbye! Thanks for exploring Fibonacci numbers with me! 🔢";

const BANNER: &str = "\
=== Fibonacci Multi-Agent Assistant ===
Ask me anything about Fibonacci numbers! I can:
• Generate Fibonacci sequences (e.g., 'Generate the first 8 Fibonacci numbers')
• Validate sequences (e.g., 'Validate this Fibonacci sequence: 0, 1, 1, 2, 3, 5')
• Check individual numbers (e.g., 'Is 89 a Fibonacci number?')
• Explain the Fibonacci sequence
• Answer general questions (I'll use my knowledge to help with any topic!)

Type 'exit' to quit.
";

/// Emoji shown next to an agent's name.
pub fn agent_emoji(agent_name: &str) -> &'static str {
    if agent_name.contains("Generator") {
        "🔢"
    } else if agent_name.contains("Validator") {
        "✅"
    } else if agent_name.contains("GeneralAssistant") {
        "🤖"
    } else {
        "💬"
    }
}

pub struct FibonacciApp<R, W> {
    chat: AgentGroupChat,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> FibonacciApp<R, W> {
    pub fn new(chat: AgentGroupChat, input: R, output: W) -> Self {
        Self {
            chat,
            input,
            output,
        }
    }

    /// Run until the user types `exit` or input ends.
    ///
    /// Only console I/O failures are returned; agent failures are reported inline.
    pub async fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n{}", BANNER)?;

        loop {
            write!(self.output, "You: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                log::info!("Input closed, ending session");
                break;
            }

            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if question.eq_ignore_ascii_case("exit") {
                writeln!(self.output, "\n{}", GOODBYE)?;
                break;
            }

            self.process_question(question).await?;
        }

        self.output.flush()
    }

    /// Run one full exchange for `question`, printing replies as they stream in.
    pub async fn process_question(&mut self, question: &str) -> io::Result<()> {
        self.chat.add_user_message(question).await;
        writeln!(self.output)?;

        {
            let replies = self.chat.invoke_stream();
            pin_mut!(replies);
            while let Some(reply) = replies.next().await {
                match reply {
                    Ok(message) => {
                        if message.content.is_empty() {
                            continue;
                        }
                        let author = message.author.as_deref().unwrap_or("Agent");
                        writeln!(
                            self.output,
                            "{} {}: {}",
                            author,
                            agent_emoji(author),
                            message.content
                        )?;
                    }
                    Err(e) => {
                        log::error!("Error processing user question '{}': {}", question, e);
                        writeln!(self.output, "Sorry, I encountered an error: {}", e)?;
                    }
                }
            }
        }

        if let Some(sequence) = self.chat.last_sequence() {
            log::debug!("Last generated sequence has {} numbers", sequence.len());
        }
        Ok(())
    }

    pub fn chat(&self) -> &AgentGroupChat {
        &self.chat
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_emoji() {
        assert_eq!(agent_emoji("FibonacciGenerator"), "🔢");
        assert_eq!(agent_emoji("FibonacciValidator"), "✅");
        assert_eq!(agent_emoji("GeneralAssistant"), "🤖");
        assert_eq!(agent_emoji("Someone"), "💬");
    }
}
