//! AI scoring for daily work entries.
//!
//! Builds the progress-analysis prompt, sends it to the Gemini
//! `generateContent` endpoint, and turns the model's reply into a validated
//! [`Assessment`] with its score clamped to 0-20.
//!
//! Each call issues exactly one upstream request: no retries, no caching.

pub mod client;
pub mod error;
pub mod prompt;
pub mod response;

pub use client::{DEFAULT_ENDPOINT, GeminiClient, GeminiConfig};
pub use error::{Result, ScoreError};
pub use prompt::build_prompt;
pub use response::{Assessment, clamp_score, parse_assessment, strip_code_fence};
