use async_trait::async_trait;
use base64::engine::general_purpose;
use base64::Engine as _;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{ApiError, CompletionApi, ImageApi, IMAGE_SIZE, MAX_COMPLETION_TOKENS};

const API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAiClient {
    client: reqwest::Client,
    token: SecretString,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(client: reqwest::Client, token: SecretString) -> Self {
        Self { client, token, base_url: API_BASE.to_owned() }
    }

    /// Point the client at a different API base. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn post_json<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, ApiError>
    where
        Req: Serialize,
        Resp: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        Ok(response.json::<Resp>().await?)
    }
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    n: u8,
    size: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[async_trait]
impl ImageApi for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ApiError> {
        let request =
            ImageRequest { prompt, n: 1, size: IMAGE_SIZE, response_format: "b64_json" };
        let response: ImageResponse = self.post_json("/images/generations", &request).await?;

        let encoded = response
            .data
            .into_iter()
            .next()
            .and_then(|image| image.b64_json)
            .ok_or(ApiError::MissingImageData)?;

        Ok(general_purpose::STANDARD.decode(encoded)?)
    }
}

#[async_trait]
impl CompletionApi for OpenAiClient {
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<String, ApiError> {
        let request =
            CompletionRequest { model, prompt, temperature, max_tokens: MAX_COMPLETION_TOKENS };
        let response: CompletionResponse = self.post_json("/completions", &request).await?;

        response.choices.into_iter().next().map(|choice| choice.text).ok_or(ApiError::MissingChoices)
    }
}
