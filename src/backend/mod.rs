//! Inference backend adapters.
//!
//! Each deployment wires exactly one engine; the HTTP layer only sees the
//! [`InferenceBackend`] trait.
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{BackendKind, Config};
use crate::error::AppResult;
use crate::prompt::Style;

pub mod a1111;
pub mod comfy;
pub mod hosted;

pub use a1111::A1111Backend;
pub use comfy::ComfyBackend;
pub use hosted::HostedBackend;

/// One stylization job. Lives for the duration of a single HTTP call.
///
/// The image itself stays on disk at `image_path` (the request's temp upload);
/// backends read it when they build their payload.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub image_path: PathBuf,
    /// File name with an extension the engine can use to detect the format.
    pub file_name: String,
    pub content_type: String,
    pub style: Style,
}

impl GenerationRequest {
    pub async fn read_image(&self) -> AppResult<Vec<u8>> {
        Ok(tokio::fs::read(&self.image_path).await?)
    }
}

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Short identifier reported by `/health`.
    fn name(&self) -> &'static str;

    fn base_url(&self) -> &str;

    /// Stylize the image and return the encoded result.
    async fn generate(&self, request: &GenerationRequest) -> AppResult<Vec<u8>>;

    /// Liveness check; `Ok` carries backend-specific details.
    async fn health(&self) -> AppResult<Value>;
}

pub fn build_backend(config: &Config) -> Arc<dyn InferenceBackend> {
    match config.backend {
        BackendKind::ComfyUI => Arc::new(ComfyBackend::new(
            config.comfyui_url.clone(),
            config.comfyui_checkpoint.clone(),
            config.generation_timeout,
        )),
        BackendKind::A1111 => Arc::new(A1111Backend::new(config.a1111_url.clone(), config.generation_timeout)),
        BackendKind::Hosted => Arc::new(HostedBackend::new(
            config.hosted_api_url.clone(),
            config.hosted_edit_model.clone(),
            config.hosted_fallback_model.clone(),
            config.hf_api_token.clone(),
            config.generation_timeout,
        )),
    }
}
