//! [`ClientWrapper`](crate::client_wrapper::ClientWrapper) implementations.
//!
//! - [`azure_openai`]: Azure OpenAI chat completions over `reqwest`
//! - [`mock`]: offline canned replies for demos and tests

pub mod azure_openai;
pub mod http_pool;
pub mod mock;
