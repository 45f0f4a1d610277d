//! Plantworks LLM - Language Model Capability
//!
//! This crate provides the language-model seam used by the Plantworks agents:
//! - Provider: the `LlmProvider` trait (`generate(prompt, tools) -> completion`)
//! - OpenAI-compatible: a chat-completions client (Gemini, Groq, OpenAI, ...)
//! - Mock: scripted provider for tests and offline runs

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod message;
pub mod mock;
pub mod openai_compat;
pub mod provider;
pub mod tools;

pub use completion::{CompletionRequest, CompletionResponse, TokenUsage};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use mock::MockProvider;
pub use openai_compat::{OpenAiCompatConfig, OpenAiCompatProvider};
pub use provider::LlmProvider;
pub use tools::ToolDefinition;
