use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tokio::time::timeout;
use tracing::info;

use crate::{ObjectStore, StoreError};

const STORAGE_BASE: &str = "https://storage.googleapis.com";

// Token endpoint used by application-default credentials on GCE.
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

pub struct GcsStore {
    client: reqwest::Client,
    bucket: String,
    access_token: Option<SecretString>,
    base_url: String,
    upload_timeout: Duration,
}

impl GcsStore {
    pub fn new(
        client: reqwest::Client,
        bucket: impl Into<String>,
        access_token: Option<SecretString>,
        upload_timeout_secs: u64,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            access_token,
            base_url: STORAGE_BASE.to_owned(),
            upload_timeout: Duration::from_secs(upload_timeout_secs),
        }
    }

    /// Point the store at a different API base. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn bearer_token(&self) -> Result<String, StoreError> {
        if let Some(token) = &self.access_token {
            return Ok(token.expose_secret().to_owned());
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|error| StoreError::Auth(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Auth(format!("metadata server returned {status}")));
        }

        let token: TokenResponse =
            response.json().await.map_err(|error| StoreError::Auth(error.to_string()))?;
        Ok(token.access_token)
    }

    async fn upload(&self, object: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let token = self.bearer_token().await?;
        let url = format!("{}/upload/storage/v1/b/{}/o", self.base_url, self.bucket);

        // ifGenerationMatch=0: the object must not already exist. Names carry
        // a fresh UUID, so this precondition never needs a retry path.
        let response = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", object), ("ifGenerationMatch", "0")])
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::PRECONDITION_FAILED {
            return Err(StoreError::AlreadyExists { object: object.to_owned() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        info!(%object, "blob uploaded");
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn create(&self, object: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let deadline_secs = self.upload_timeout.as_secs();
        match timeout(self.upload_timeout, self.upload(object, bytes)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::DeadlineExceeded(deadline_secs)),
        }
    }

    async fn make_public(&self, object: &str) -> Result<(), StoreError> {
        let token = self.bearer_token().await?;
        // Object names are `dalle_<uuid>.png`, safe to splice into the path.
        let url = format!("{}/storage/v1/b/{}/o/{object}/acl", self.base_url, self.bucket);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({"entity": "allUsers", "role": "READER"}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        info!(%object, "blob is now publicly accessible");
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
