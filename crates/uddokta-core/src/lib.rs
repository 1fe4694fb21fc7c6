//! Uddokta Core - provider fallback chain for AI marketing posters.
//!
//! Turns a short marketing idea into a caption, a poster prompt and a
//! rendered poster image by chaining external AI services:
//!
//! ```text
//! idea + stats → OpenAI ─(fail)→ Gemini → {poster_prompt, caption}
//!              → Hugging Face primary model ─(fail)→ fallback models → data URI
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use uddokta_core::{Config, PosterRequest, PosterService};
//!
//! #[tokio::main]
//! async fn main() -> uddokta_core::Result<()> {
//!     let config = Config::load()?;
//!     let service = PosterService::from_config(&config);
//!
//!     let poster = service.create(PosterRequest::new("Eid sale on sarees")).await;
//!     println!("{poster:?}");
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod image;
pub mod llm;
pub mod poster;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, ProviderError, Result, UddoktaError};
pub use image::{DataUri, HuggingFaceProvider, ImageError, ImageFailure, ImageProvider};
pub use llm::{ChainError, LlmProvider, TextChain};
pub use poster::{PosterError, PosterResponse, PosterService};
pub use types::{PosterConcept, PosterRequest};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
