//! OpenAI API clients for image generation and text completion.
//!
//! The handlers depend on the [`ImageApi`] and [`CompletionApi`] traits;
//! [`OpenAiClient`] is the reqwest-backed production implementation.

pub mod client;

use async_trait::async_trait;
use thiserror::Error;

pub use client::OpenAiClient;

/// Model for natural-language completions (`gpt` commands).
pub const TEXT_MODEL: &str = "text-davinci-003";
/// Model for code completions (`code` commands).
pub const CODE_MODEL: &str = "code-davinci-002";
/// Fixed output cap for every completion call.
pub const MAX_COMPLETION_TOKENS: u32 = 256;
/// Fixed resolution for every generated image.
pub const IMAGE_SIZE: &str = "256x256";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("api returned status {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
    #[error("image response carried no base64 payload")]
    MissingImageData,
    #[error("completion response carried no choices")]
    MissingChoices,
    #[error("image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Text-to-image generation at the fixed 256x256 resolution.
#[async_trait]
pub trait ImageApi: Send + Sync {
    /// Request exactly one base64-encoded image for `prompt` and return the
    /// decoded bytes.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ApiError>;
}

/// Text completion with a caller-chosen model and sampling temperature.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Return the text of the first completion choice.
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<String, ApiError>;
}
