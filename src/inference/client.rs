use super::mime::resolve_image_mime;
use super::InferenceService;
use crate::models::{
    GenerationRequest, ImageArtifact, InferenceErrorResponse, TextToImagePayload,
};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Hugging Face Inference API client for text-to-image models.
pub struct HfInferenceClient {
    pub(crate) client: Client,
    token: String,
    pub(crate) base_url: String,
}

impl HfInferenceClient {
    pub fn new(token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }
}

/// Pulls the `error` field out of a JSON error body, else returns the body as-is.
fn remote_error_message(body: &str) -> String {
    serde_json::from_str::<InferenceErrorResponse>(body)
        .map(|parsed| parsed.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl InferenceService for HfInferenceClient {
    async fn text_to_image(&self, request: &GenerationRequest) -> Result<ImageArtifact> {
        let url = self.model_url(&request.model);
        tracing::debug!(
            "Sending text-to-image request to {} ({} steps)",
            url,
            request.num_inference_steps
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "image/png")
            .json(&TextToImagePayload::from(request))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to inference API: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Inference API error (status {}): {}", status, error_text);
            return Err(Error::Inference(format!(
                "status {}: {}",
                status,
                remote_error_message(&error_text)
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();

        if bytes.is_empty() {
            return Err(Error::Inference("Empty image body in response".to_string()));
        }

        let mime_type = resolve_image_mime(content_type.as_deref(), &bytes);
        tracing::debug!("Received {} bytes of {}", bytes.len(), mime_type);

        Ok(ImageArtifact::new(bytes, mime_type))
    }
}
