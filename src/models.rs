//! Data models and structures
//!
//! Defines the generation request handed to the inference service, the
//! Hugging Face wire payloads, and the image/form types returned to the web layer.

use serde::{Deserialize, Serialize};

pub const FLUX_SCHNELL_MODEL: &str = "black-forest-labs/FLUX.1-schnell";
pub const GUIDANCE_SCALE: f32 = 0.0;
pub const IMAGE_WIDTH: u32 = 1024;
pub const IMAGE_HEIGHT: u32 = 1024;

/// One text-to-image call. Built per dispatch and discarded afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub width: u32,
    pub height: u32,
}

impl GenerationRequest {
    /// FLUX.1-schnell at 1024x1024 with guidance disabled.
    pub fn flux_schnell(prompt: String, num_inference_steps: u32) -> Self {
        Self {
            prompt,
            model: FLUX_SCHNELL_MODEL.to_string(),
            num_inference_steps,
            guidance_scale: GUIDANCE_SCALE,
            width: IMAGE_WIDTH,
            height: IMAGE_HEIGHT,
        }
    }
}

// Hugging Face Inference API models
#[derive(Debug, Serialize)]
pub struct TextToImagePayload<'a> {
    pub inputs: &'a str,
    pub parameters: TextToImageParameters,
}

#[derive(Debug, Serialize)]
pub struct TextToImageParameters {
    pub guidance_scale: f32,
    pub num_inference_steps: u32,
    pub width: u32,
    pub height: u32,
}

impl<'a> From<&'a GenerationRequest> for TextToImagePayload<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            inputs: &request.prompt,
            parameters: TextToImageParameters {
                guidance_scale: request.guidance_scale,
                num_inference_steps: request.num_inference_steps,
                width: request.width,
                height: request.height,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InferenceErrorResponse {
    pub error: String,
}

/// Image bytes exactly as returned by the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageArtifact {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// `data:` URL suitable for an `<img src>`.
    pub fn to_data_url(&self) -> String {
        use base64::Engine as _;
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// What the page shows: the current image slot and the prompt text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormState {
    #[serde(serialize_with = "serialize_image")]
    pub image: Option<ImageArtifact>,
    pub prompt: String,
}

fn serialize_image<S: serde::Serializer>(
    image: &Option<ImageArtifact>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match image {
        Some(artifact) => serializer.serialize_str(&artifact.to_data_url()),
        None => serializer.serialize_none(),
    }
}

// Web API bodies
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
