//! Imagenerator - a single-page web front end for hosted FLUX text-to-image inference
//!
//! A prompt is validated, optionally enhanced with a fixed quality suffix,
//! sent to the Hugging Face Inference API, and the returned image is handed
//! back to the browser untouched.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod inference;
pub mod models;
pub mod prompts;
pub mod server;

pub use error::{Error, Result};
