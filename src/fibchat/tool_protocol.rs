//! Tool Protocol Abstraction Layer
//!
//! Agents never call the Fibonacci functions directly. The model asks for a tool by name,
//! the agent routes that request through a [`ToolRegistry`], and the registry hands it to
//! a [`ToolProtocol`] implementation that knows how to execute it.
//!
//! # Architecture
//!
//! ```text
//! ChatCompletionInvoker → ToolRegistry → ToolProtocol (trait) → FibonacciToolProtocol
//! ```
//!
//! # Example
//!
//! ```rust
//! use fibchat::tool_protocol::{ToolParameter, ToolParameterType};
//!
//! let param = ToolParameter::new("count", ToolParameterType::Integer)
//!     .with_description("The number of Fibonacci numbers to generate")
//!     .required();
//! assert!(param.required);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Output of a tool that ran to completion.
///
/// Failures travel as [`ToolError`] in the `Err` arm of [`ToolProtocol::execute`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub output: serde_json::Value,
}

impl ToolResult {
    pub fn success(output: serde_json::Value) -> Self {
        Self { output }
    }
}

/// Defines the type of a tool parameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ToolParameterType {
    String,
    Integer,
}

/// Defines a parameter for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ToolParameterType,
    pub description: Option<String>,
    pub required: bool,
}

impl ToolParameter {
    /// Define a new tool parameter with the provided name and type.
    pub fn new(name: impl Into<String>, param_type: ToolParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            required: false,
        }
    }

    /// Add a human readable description that will surface in the agent's tool listing.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the argument as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Metadata about a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolMetadata {
    /// Create metadata with the supplied identifier and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter definition to the tool metadata.
    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }
}

/// Trait for implementing tool execution protocols
#[async_trait]
pub trait ToolProtocol: Send + Sync {
    /// Execute a tool with the given parameters
    async fn execute(
        &self,
        tool_name: &str,
        parameters: serde_json::Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>>;

    /// Get metadata about available tools
    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>>;

    /// Protocol identifier (e.g., "fibonacci")
    fn protocol_name(&self) -> &str;
}

/// Error types for tool operations
#[derive(Debug, Clone)]
pub enum ToolError {
    /// Requested tool is not registered in the current registry/protocol.
    NotFound(String),
    /// The calling agent is not allowed to use the tool.
    NotPermitted { agent: String, tool: String },
    /// Tool execution completed with an application level failure.
    ExecutionFailed(String),
    /// The provided JSON parameters failed validation or deserialization.
    InvalidParameters(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::NotFound(name) => write!(f, "Tool not found: {}", name),
            ToolError::NotPermitted { agent, tool } => {
                write!(f, "Tool '{}' is not available to agent '{}'", tool, agent)
            }
            ToolError::ExecutionFailed(msg) => write!(f, "Tool execution failed: {}", msg),
            ToolError::InvalidParameters(msg) => write!(f, "Invalid parameters: {}", msg),
        }
    }
}

impl Error for ToolError {}

/// Registry for managing tools available to agents
///
/// The registry caches the metadata of every tool its protocol exposes. Which of those
/// tools a given agent may call is decided by the agent's own tool list, not here.
pub struct ToolRegistry {
    tools: HashMap<String, ToolMetadata>,
    protocol: Arc<dyn ToolProtocol>,
}

impl ToolRegistry {
    /// Build an empty registry powered by the provided protocol implementation.
    ///
    /// Call [`discover_tools`](ToolRegistry::discover_tools) to populate it.
    pub fn new(protocol: Arc<dyn ToolProtocol>) -> Self {
        Self {
            tools: HashMap::new(),
            protocol,
        }
    }

    /// Build a registry and immediately load every tool the protocol advertises.
    pub async fn from_protocol(
        protocol: Arc<dyn ToolProtocol>,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let mut registry = Self::new(protocol);
        registry.discover_tools().await?;
        Ok(registry)
    }

    /// Refresh the cached metadata from the protocol. Returns the number of tools found.
    pub async fn discover_tools(&mut self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        let tools = self.protocol.list_tools().await?;
        self.tools = tools.into_iter().map(|t| (t.name.clone(), t)).collect();
        log::debug!(
            "ToolRegistry: discovered {} tools from protocol '{}'",
            self.tools.len(),
            self.protocol.protocol_name()
        );
        Ok(self.tools.len())
    }

    /// List metadata for registered tools, sorted by name so prompts are stable.
    pub fn list_tools(&self) -> Vec<&ToolMetadata> {
        let mut tools: Vec<&ToolMetadata> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Execute a named tool with serialized parameters.
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        parameters: serde_json::Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        if !self.tools.contains_key(tool_name) {
            return Err(Box::new(ToolError::NotFound(tool_name.to_string())));
        }
        self.protocol.execute(tool_name, parameters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProtocol;

    #[async_trait]
    impl ToolProtocol for MockProtocol {
        async fn execute(
            &self,
            tool_name: &str,
            _parameters: serde_json::Value,
        ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
            Ok(ToolResult::success(serde_json::json!({
                "tool": tool_name,
                "result": "mock_result"
            })))
        }

        async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
            Ok(vec![
                ToolMetadata::new("zeta", "Last alphabetically"),
                ToolMetadata::new("alpha", "First alphabetically"),
            ])
        }

        fn protocol_name(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn test_tool_parameter_builder() {
        let param = ToolParameter::new("test_param", ToolParameterType::String)
            .with_description("A test parameter")
            .required();

        assert_eq!(param.name, "test_param");
        assert_eq!(param.param_type, ToolParameterType::String);
        assert_eq!(param.description, Some("A test parameter".to_string()));
        assert!(param.required);
    }

    #[tokio::test]
    async fn test_tool_registry_discovers_and_sorts() {
        let registry = ToolRegistry::from_protocol(Arc::new(MockProtocol))
            .await
            .unwrap();

        let names: Vec<&str> = registry
            .list_tools()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);

        let result = registry
            .execute_tool("alpha", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(result.output["tool"], "alpha");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let registry = ToolRegistry::from_protocol(Arc::new(MockProtocol))
            .await
            .unwrap();
        let err = registry
            .execute_tool("missing", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Tool not found: missing");
    }
}
