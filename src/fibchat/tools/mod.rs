//! Built-in Tool Implementations
//!
//! # Available Tools
//!
//! - **Fibonacci**: sequence generation, validation, rendering and membership checks
//!   - Pure functions usable directly from Rust
//!   - [`FibonacciToolProtocol`] exposes them to agents through the tool protocol system
//!
//! # Integration with Agents
//!
//! ```rust,no_run
//! use fibchat::tools::FibonacciToolProtocol;
//! use fibchat::tool_protocol::ToolRegistry;
//! use std::sync::Arc;
//!
//! # async {
//! let registry = ToolRegistry::from_protocol(Arc::new(FibonacciToolProtocol::new()))
//!     .await
//!     .unwrap();
//! assert_eq!(registry.list_tools().len(), 4);
//! # };
//! ```

pub mod fibonacci;

pub use fibonacci::{
    generate_sequence, is_fibonacci_number, parse_sequence, render_sequence, validate_sequence,
    FibonacciToolProtocol, SequenceParseError, ValidationFailure, ValidationResult,
};
