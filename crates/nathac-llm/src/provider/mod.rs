//! LLM provider implementations

mod gemini;
mod mock;
mod openai;

pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai::OpenAIProvider;
