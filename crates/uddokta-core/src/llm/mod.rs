//! Text generation for poster concepts.
//!
//! Provides a provider abstraction over the OpenAI and Gemini backends, a
//! parser that pulls a JSON concept out of free-form model output, and the
//! fallback chain that tries providers in order.

pub(crate) mod chain;
pub(crate) mod gemini;
pub(crate) mod openai;
pub(crate) mod parse;
pub(crate) mod provider;
pub(crate) mod retry;

pub use chain::{ChainError, ChainOutput, ProviderFailure, RetryPolicy, TextChain};
pub use parse::parse_poster_concept;
pub use provider::{LlmProvider, LlmProviderFactory, LlmRequest, LlmResponse, KNOWN_PROVIDERS};
