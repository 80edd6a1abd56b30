//! NATHAC LLM Integration
//!
//! Thin vendor clients used by the risk analysis engine:
//! - Gemini `generateContent` endpoint
//! - OpenAI-compatible chat completions (OpenAI, DeepSeek)
//! - A mock provider for tests
//!
//! Every provider implements [`LLMClient`], so callers never depend on a
//! vendor's wire format. Requests can ask for JSON-only output through
//! [`LLMRequest::with_json_mode`].

// Re-export core types
pub use client::{LLMClient, LLMRequest, LLMResponse};
pub use error::{LLMError, Result};

// Re-export providers
pub use provider::{GeminiProvider, MockProvider, OpenAIProvider};

pub mod client;
pub mod error;
pub mod provider;
