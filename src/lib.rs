//! # fibchat
//!
//! fibchat is a small multi-agent console demo: a group of LLM-backed agents answers
//! questions about the Fibonacci sequence, using a built-in tool set and stopping the
//! conversation with a rule-based termination policy.
//!
//! The crate is layered as follows:
//!
//! * **Tools**: [`tools::fibonacci`] holds the deterministic Fibonacci functions and the
//!   [`tools::FibonacciToolProtocol`] that exposes them through [`tool_protocol::ToolRegistry`]
//! * **Agents**: [`Agent`] records with fixed instructions and a tool subset, plus the
//!   [`AgentInvoker`] seam that turns a transcript into a reply
//! * **Group chat**: [`AgentGroupChat`] drives turn-taking through a
//!   [`selection::SelectionStrategy`] and stops through a [`termination::TerminationStrategy`]
//! * **Providers**: [`ClientWrapper`] implemented for Azure OpenAI and for an offline mock
//!
//! ## Running an exchange
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use fibchat::{AgentGroupChat, ChatCompletionInvoker};
//! use fibchat::clients::mock::MockChatCompletionClient;
//! use fibchat::roster::fibonacci_roster;
//! use fibchat::tool_protocol::ToolRegistry;
//! use fibchat::tools::FibonacciToolProtocol;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let registry = ToolRegistry::from_protocol(Arc::new(FibonacciToolProtocol::new())).await?;
//!     let client = Arc::new(MockChatCompletionClient::new(Duration::ZERO));
//!     let invoker = Arc::new(ChatCompletionInvoker::new(client, Arc::new(registry)));
//!
//!     let mut chat = AgentGroupChat::new(fibonacci_roster(), invoker)?;
//!     chat.add_user_message("Generate the first 10 Fibonacci numbers").await;
//!     for reply in chat.invoke().await? {
//!         println!("{}: {}", reply.author.unwrap_or_default(), reply.content);
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] backend exactly once.
///
/// Verbosity is controlled with `RUST_LOG`, e.g. `RUST_LOG=fibchat=debug`.
///
/// ```rust
/// fibchat::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

pub mod fibchat;

// Re-exporting key items for easier external access.
pub use fibchat::agent::{Agent, AgentInvoker, AgentReply, ChatCompletionInvoker, ToolInvocation};
pub use fibchat::app;
pub use fibchat::client_wrapper;
pub use fibchat::client_wrapper::{ClientError, ClientWrapper, Message, Role, TokenUsage};
pub use fibchat::clients;
pub use fibchat::config;
pub use fibchat::config::{AppConfig, ConfigError};
pub use fibchat::event;
pub use fibchat::event::{AgentEvent, EventHandler, GroupChatEvent, LoggingEventHandler};
pub use fibchat::group_chat::{AgentGroupChat, GroupChatError};
pub use fibchat::roster;
pub use fibchat::selection;
pub use fibchat::termination;
pub use fibchat::tool_protocol;
pub use fibchat::tools;
pub use fibchat::transcript;
pub use fibchat::transcript::ChatMessage;
pub use fibchat::{agent, group_chat};
