//! Gemini-backed implementation of [`quill_types::TransformService`].

pub mod gemini;
pub mod prompt;

pub use gemini::{GeminiClient, GeminiConfig};
