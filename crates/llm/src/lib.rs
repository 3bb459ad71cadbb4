//! LLM integration crate for MedAssist.
//!
//! This crate provides a provider-agnostic abstraction for interacting with
//! Large Language Models (LLMs), plus the multi-turn chat sessions the
//! advisor keeps per user.
//!
//! # Providers
//! - **Gemini**: Google Generative Language API (default)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use medassist_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("What is influenza?", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod session;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
pub use factory::{create_client, create_client_with_timeout};
pub use providers::{GeminiClient, OllamaClient};
pub use session::{ChatSession, SessionStore};
pub use types::{ChatMessage, ChatRole, ProviderType};
