// src/fibchat/mod.rs

pub mod agent;
pub mod app;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod event;
pub mod group_chat;
pub mod roster;
pub mod selection;
pub mod termination;
pub mod tool_protocol;
pub mod tools;
pub mod transcript;

// Re-export the driver so callers can write fibchat::fibchat::AgentGroupChat
pub use group_chat::AgentGroupChat;
