//! The `AzureOpenAIClient` struct implements `ClientWrapper` for an Azure OpenAI chat
//! deployment, capturing the assistant reply and the token usage of the last call.
//!
//! Requests go to
//! `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={version}`
//! with the key in the `api-key` header.
//!
//! # Example
//!
//! ```rust,no_run
//! use fibchat::clients::azure_openai::AzureOpenAIClient;
//! use fibchat::client_wrapper::{ClientWrapper, Message, Role};
//! use fibchat::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = AppConfig::load()?;
//!     let client = AzureOpenAIClient::from_settings(&config.azure_openai)?;
//!
//!     let reply = client
//!         .send_message(&[
//!             Message::new(Role::System, "You are an assistant."),
//!             Message::new(Role::User, "Hello!"),
//!         ])
//!         .await?;
//!     println!("Assistant: {}", reply.content);
//!
//!     if let Some(usage) = client.get_last_usage() {
//!         println!("Tokens: {}", usage.total_tokens);
//!     }
//!     Ok(())
//! }
//! ```

use crate::fibchat::client_wrapper::{ClientError, ClientWrapper, Message, Role, TokenUsage};
use crate::fibchat::clients::http_pool::get_http_client;
use crate::fibchat::config::AzureOpenAISettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Mutex;

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
    #[serde(default)]
    total_tokens: usize,
}

/// Chat completions against one Azure OpenAI deployment.
pub struct AzureOpenAIClient {
    http: reqwest::Client,
    endpoint: String,
    deployment: String,
    api_key: String,
    api_version: String,
    usage: Mutex<Option<TokenUsage>>,
}

impl AzureOpenAIClient {
    pub fn new(
        endpoint: &str,
        deployment: &str,
        api_key: &str,
        api_version: &str,
    ) -> Result<Self, ClientError> {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        Ok(Self {
            http: get_http_client(&endpoint)?,
            endpoint,
            deployment: deployment.to_string(),
            api_key: api_key.to_string(),
            api_version: api_version.to_string(),
            usage: Mutex::new(None),
        })
    }

    pub fn from_settings(settings: &AzureOpenAISettings) -> Result<Self, ClientError> {
        Self::new(
            &settings.endpoint,
            &settings.deployment_name,
            &settings.api_key,
            &settings.api_version,
        )
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }

    fn record_usage(&self, usage: Option<TokenUsage>) {
        if let Ok(mut slot) = self.usage.lock() {
            *slot = usage;
        }
    }
}

/// Pull the first choice's content and the usage block out of a response body.
pub fn parse_completion(body: &str) -> Result<(String, Option<TokenUsage>), ClientError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ClientError::InvalidResponse(format!("malformed JSON: {}", e)))?;
    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::InvalidResponse("response has no choices".to_string()))?
        .message
        .content
        .unwrap_or_default();
    let usage = response.usage.map(|u| TokenUsage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });
    Ok((content, usage))
}

#[async_trait]
impl ClientWrapper for AzureOpenAIClient {
    async fn send_message(
        &self,
        messages: &[Message],
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        let request = ChatRequest {
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        };

        log::debug!(
            "Azure OpenAI request to deployment '{}' with {} messages",
            self.deployment,
            messages.len()
        );

        let response = self
            .http
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            log::error!("Azure OpenAI returned HTTP {}", status.as_u16());
            self.record_usage(None);
            return Err(Box::new(ClientError::Http {
                status: status.as_u16(),
                body,
            }));
        }

        let (content, usage) = parse_completion(&body)?;
        self.record_usage(usage);
        Ok(Message::new(Role::Assistant, content))
    }

    fn model_name(&self) -> &str {
        &self.deployment
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url_trims_trailing_slash() {
        let client =
            AzureOpenAIClient::new("https://demo.openai.azure.com/", "gpt-4o", "k", "2024-06-01")
                .unwrap();
        assert_eq!(
            client.completions_url(),
            "https://demo.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-06-01"
        );
        assert_eq!(client.model_name(), "gpt-4o");
        assert!(client.get_last_usage().is_none());
    }

    #[test]
    fn test_parse_completion_with_usage() {
        let body = r#"{
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "0, 1, 1"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let (content, usage) = parse_completion(body).unwrap();
        assert_eq!(content, "0, 1, 1");
        assert_eq!(usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_parse_completion_errors() {
        assert!(matches!(
            parse_completion(r#"{"choices": []}"#),
            Err(ClientError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_completion("not json"),
            Err(ClientError::InvalidResponse(_))
        ));
    }
}
