use super::mime::detect_image_mime;
use super::InferenceService;
use crate::models::{GenerationRequest, ImageArtifact};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Tiny valid 1x1 PNG.
const DEFAULT_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
    0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0x99, 0x63, 0xF8,
    0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25, 0x00, 0xBC, 0x00, 0x00, 0x00,
    0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Clone)]
pub struct MockInferenceClient {
    image_responses: Arc<Mutex<Vec<Vec<u8>>>>,
    failure: Option<String>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockInferenceClient {
    pub fn new() -> Self {
        Self {
            image_responses: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            delay: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_image_response(self, response: Vec<u8>) -> Self {
        self.image_responses.lock().unwrap().push(response);
        self
    }

    /// Every call fails with `Error::Inference(message)`.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|request| request.prompt.clone())
    }
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceService for MockInferenceClient {
    async fn text_to_image(&self, request: &GenerationRequest) -> Result<ImageArtifact> {
        let count = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.failure {
            return Err(Error::Inference(message.clone()));
        }

        let bytes = {
            let responses = self.image_responses.lock().unwrap();
            if responses.is_empty() {
                DEFAULT_PNG.to_vec()
            } else {
                responses[(count - 1) % responses.len()].clone()
            }
        };
        let mime_type = detect_image_mime(&bytes);

        Ok(ImageArtifact::new(bytes, mime_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_image_is_png() {
        let client = MockInferenceClient::new();
        let request = GenerationRequest::flux_schnell("cat".to_string(), 4);

        let artifact = client.text_to_image(&request).await.unwrap();
        assert_eq!(artifact.mime_type, "image/png");
        assert_eq!(artifact.bytes, DEFAULT_PNG);
    }

    #[tokio::test]
    async fn test_mock_custom_responses_cycle() {
        let client = MockInferenceClient::new()
            .with_image_response(vec![0xFF, 0xD8, 0xFF, 0x01])
            .with_image_response(vec![0xFF, 0xD8, 0xFF, 0x02]);
        let request = GenerationRequest::flux_schnell("cat".to_string(), 4);

        let first = client.text_to_image(&request).await.unwrap();
        let second = client.text_to_image(&request).await.unwrap();
        let third = client.text_to_image(&request).await.unwrap();

        assert_eq!(first.bytes[3], 0x01);
        assert_eq!(second.bytes[3], 0x02);
        assert_eq!(third.bytes[3], 0x01);
    }

    #[tokio::test]
    async fn test_mock_records_requests_on_failure() {
        let client = MockInferenceClient::new().with_failure("boom");
        let request = GenerationRequest::flux_schnell("cat".to_string(), 4);

        let err = client.text_to_image(&request).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(client.get_call_count(), 1);
        assert_eq!(client.last_prompt().as_deref(), Some("cat"));
    }
}
