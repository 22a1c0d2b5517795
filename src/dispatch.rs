//! Prompt dispatch: validate, enhance, call the model, map errors.

use crate::config::DispatchSettings;
use crate::inference::InferenceService;
use crate::models::{FormState, GenerationRequest, ImageArtifact};
use crate::{prompts, Error, Result};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Shared by every request; holds nothing mutable.
pub struct Dispatcher {
    service: Arc<dyn InferenceService>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(service: Arc<dyn InferenceService>, settings: DispatchSettings) -> Self {
        Self { service, settings }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Build the request for `prompt`, or reject it without touching the network.
    pub fn prepare(&self, prompt: &str) -> Result<GenerationRequest> {
        let trimmed = prompt.trim();
        if trimmed.chars().count() < self.settings.min_prompt_length {
            return Err(Error::Validation(self.settings.validation_message.clone()));
        }

        let effective = prompts::effective_prompt(trimmed, self.settings.enhance_prompt);
        Ok(GenerationRequest::flux_schnell(
            effective,
            self.settings.inference_steps,
        ))
    }

    /// One validate-enhance-call cycle. Returns only `Validation` or `Upstream` errors.
    pub async fn dispatch(&self, prompt: &str) -> Result<ImageArtifact> {
        let dispatch_id = Uuid::new_v4();

        let request = match self.prepare(prompt) {
            Ok(request) => request,
            Err(e) => {
                info!("[{}] Rejected prompt: {}", dispatch_id, e);
                return Err(e);
            }
        };

        info!(
            "[{}] Generating with {} ({} steps, {} chars)",
            dispatch_id,
            request.model,
            request.num_inference_steps,
            request.prompt.chars().count()
        );

        match self.service.text_to_image(&request).await {
            Ok(artifact) => {
                info!(
                    "[{}] Received {} ({} bytes)",
                    dispatch_id,
                    artifact.mime_type,
                    artifact.bytes.len()
                );
                Ok(artifact)
            }
            Err(e) => {
                error!("[{}] Generation failed: {}", dispatch_id, e);
                Err(Error::Upstream {
                    label: self.settings.upstream_label.clone(),
                    message: e.detail(),
                })
            }
        }
    }
}

/// Empty image slot, empty prompt.
pub fn reset() -> FormState {
    FormState::default()
}
