//! Image generation for poster prompts.
//!
//! The Hugging Face provider walks a primary model and its fallbacks, and
//! each model call may go through up to three endpoints (provider route,
//! direct inference, router retry for retired endpoints). Every response is
//! normalised into either a data URI or a structured failure.

pub(crate) mod huggingface;
pub(crate) mod normalize;
pub(crate) mod provider;

pub use huggingface::HuggingFaceProvider;
pub use normalize::{normalize, Shape};
pub use provider::{DataUri, ImageError, ImageFailure, ImageProvider};
