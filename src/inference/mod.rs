//! Remote text-to-image inference
//!
//! Provides the Hugging Face Inference API client used in production and an
//! in-process mock for tests and local harnesses.

pub mod client;
pub mod mime;
pub mod mock;

pub use client::HfInferenceClient;
pub use mock::MockInferenceClient;

use crate::models::{GenerationRequest, ImageArtifact};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn text_to_image(&self, request: &GenerationRequest) -> Result<ImageArtifact>;
}
