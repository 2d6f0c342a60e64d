use std::sync::Arc;

use anyhow::Result;
use genie_gcs::ObjectStore;
use genie_openai::{CompletionApi, ImageApi, CODE_MODEL, TEXT_MODEL};
use genie_slack::blocks::{completion_message, image_message};
use genie_slack::webhook::Notifier;
use rand::Rng;
use tracing::{error, info};
use uuid::Uuid;

/// Command execution against the external collaborators. One instance is
/// shared across all in-flight tasks; everything inside is read-only.
///
/// The `generate_image` / `complete_text` / `complete_code` entry points are
/// spawned as detached tasks: no cancellation, no result reported back, each
/// runs to its own completion or logged error.
#[derive(Clone)]
pub struct CommandHandlers {
    images: Arc<dyn ImageApi>,
    completions: Arc<dyn CompletionApi>,
    store: Arc<dyn ObjectStore>,
    notifier: Arc<dyn Notifier>,
    send_to_slack: bool,
}

impl CommandHandlers {
    pub fn new(
        images: Arc<dyn ImageApi>,
        completions: Arc<dyn CompletionApi>,
        store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
        send_to_slack: bool,
    ) -> Self {
        Self { images, completions, store, notifier, send_to_slack }
    }

    pub fn notifications_enabled(&self) -> bool {
        self.send_to_slack
    }

    pub async fn generate_image(&self, prompt: String, response_url: String) {
        if let Err(error) = self.image_pipeline(&prompt, &response_url).await {
            error!(error = %error, "image command failed");
        }
    }

    /// Short-circuiting pipeline: a failed stage aborts the remaining stages,
    /// but already-completed stages are not rolled back (a public object can
    /// outlive a failed notification).
    async fn image_pipeline(&self, prompt: &str, response_url: &str) -> Result<()> {
        let bytes = self.images.generate(prompt).await?;

        let object = format!("dalle_{}.png", Uuid::new_v4());
        self.store.create(&object, bytes).await?;
        self.store.make_public(&object).await?;

        let public_url = self.store.public_url(&object);
        info!(%object, %public_url, "generated image published");

        if self.send_to_slack {
            self.notifier.post(response_url, &image_message(prompt, &public_url)).await?;
        }

        Ok(())
    }

    pub async fn complete_text(&self, prompt: String, response_url: String) {
        self.complete_with_model(TEXT_MODEL, prompt, response_url).await;
    }

    pub async fn complete_code(&self, prompt: String, response_url: String) {
        self.complete_with_model(CODE_MODEL, prompt, response_url).await;
    }

    async fn complete_with_model(&self, model: &str, prompt: String, response_url: String) {
        let temperature = rand::thread_rng().gen::<f32>();

        let completion = match self.completions.complete(&prompt, model, temperature).await {
            Ok(completion) => completion,
            Err(error) => {
                error!(error = %error, model, "completion request failed");
                return;
            }
        };

        if !self.send_to_slack {
            return;
        }

        if let Err(error) =
            self.notifier.post(&response_url, &completion_message(&prompt, &completion)).await
        {
            error!(error = %error, "failed to post completion to slack");
        }
    }
}
