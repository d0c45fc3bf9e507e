//! Graph-job variant backed by ComfyUI.
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::backend::{GenerationRequest, InferenceBackend};
use crate::comfyui::graph::{self, OUTPUT_NODE_ID};
use crate::comfyui::history::output_images;
use crate::comfyui::{ComfyUIClient, JobWaiter};
use crate::error::{AppError, AppResult};

pub struct ComfyBackend {
    client: ComfyUIClient,
    checkpoint: String,
    timeout: Duration,
}

impl ComfyBackend {
    pub fn new(base_url: String, checkpoint: String, timeout: Duration) -> Self {
        ComfyBackend { client: ComfyUIClient::new(base_url, timeout), checkpoint, timeout }
    }
}

#[async_trait]
impl InferenceBackend for ComfyBackend {
    fn name(&self) -> &'static str {
        "comfyui"
    }

    fn base_url(&self) -> &str {
        self.client.base_url()
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<Vec<u8>> {
        let client_id = Uuid::new_v4().to_string();
        // Listen first; the job may finish before `queue_prompt` returns.
        let waiter = JobWaiter::connect(&self.client.ws_url(&client_id)).await?;

        let uploaded = self
            .client
            .upload_image(&request.image_path, &request.file_name, &request.content_type)
            .await?;
        let seed = graph::random_seed();
        let prompt = graph::build_graph(&uploaded.load_image_path(), &self.checkpoint, request.style, seed)?;
        tracing::info!(style = %request.style, seed, image = %uploaded.name, "submitting job graph");

        let queued = self.client.queue_prompt(&prompt, &client_id).await?;
        waiter.wait_for(&queued.prompt_id, self.timeout).await?;

        let history = self.client.get_history(&queued.prompt_id).await?;
        let image = output_images(&history, &queued.prompt_id, OUTPUT_NODE_ID)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::InvalidResponse(format!("no output images for job {}", queued.prompt_id)))?;
        tracing::debug!(filename = %image.filename, "fetching result image");
        self.client.get_image(&image).await
    }

    async fn health(&self) -> AppResult<Value> {
        let stats = self.client.system_stats().await?;
        Ok(json!({
            "checkpoint": self.checkpoint,
            "devices": stats.get("devices").cloned().unwrap_or(Value::Null),
        }))
    }
}
