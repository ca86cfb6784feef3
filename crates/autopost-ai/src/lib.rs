//! Client for the AI generation gateway.
//!
//! Wraps the provider-neutral generation API behind typed requests and a
//! typed error. Provider-specific failures arrive as a structured envelope
//! and are normalized into [`AiError::Generation`] with a stable code and a
//! message safe to store on a post.

mod client;
mod error;
mod prompt;
mod retry;
mod types;

pub use client::AiClient;
pub use error::AiError;
pub use prompt::{build_draft_prompt, build_html_prompt, PromptInputs};
pub use types::{Generation, GenerationKind, GenerationRequest};
