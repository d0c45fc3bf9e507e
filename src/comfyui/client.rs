//! Thin HTTP client for ComfyUI endpoints.
//!
//! Every request carries a deadline; an engine that stops answering surfaces
//! as `AppError::Timeout` instead of hanging the caller.
//!
//! - `upload_image` posts the source photo to `/upload/image`.
//! - `queue_prompt` posts a job graph to `/prompt` and returns its id.
//! - `get_history` fetches `/history/<prompt_id>` as JSON.
//! - `get_image` proxies to `/view?filename=...` and returns raw bytes.
//! - `system_stats` backs the health check.
use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::error::{AppResult, AppError};

#[derive(Clone)]
pub struct ComfyUIClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

/// Where ComfyUI stored an uploaded input image.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UploadedImage {
    pub name: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(default, rename = "type")]
    pub folder_type: String,
}

impl UploadedImage {
    /// Value for a `LoadImage` node's `image` input.
    pub fn load_image_path(&self) -> String {
        if self.subfolder.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.subfolder, self.name)
        }
    }
}

#[derive(Debug, Serialize)]
struct QueuePromptRequest<'a> {
    prompt: &'a Value,
    client_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct QueueResponse {
    pub prompt_id: String,
    #[serde(default)]
    pub number: Option<u64>,
}

/// Reference to an output image as recorded in ComfyUI history.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ImageRef {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(default = "default_folder_type", rename = "type")]
    pub folder_type: String,
}

fn default_folder_type() -> String {
    "output".to_string()
}

impl ComfyUIClient {
    pub fn new(base_url: String, request_timeout: Duration) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        ComfyUIClient { client: Client::new(), base_url: base, request_timeout }
    }

    fn http_error(&self, e: reqwest::Error) -> AppError {
        AppError::from_reqwest(e, self.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Notification channel URL for a given client id.
    pub fn ws_url(&self, client_id: &str) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            format!("ws://{}", self.base_url)
        };
        format!("{}/ws?clientId={}", ws_base, client_id)
    }

    /// Upload an input image so a `LoadImage` node can reference it.
    ///
    /// ComfyUI decides the image format by extension, so `file_name` must carry one.
    pub async fn upload_image(&self, path: &Path, file_name: &str, content_type: &str) -> AppResult<UploadedImage> {
        let bytes = tokio::fs::read(path).await?;
        let url = format!("{}/upload/image", self.base_url);
        tracing::debug!(%url, file_name, size = bytes.len(), "uploading input image");

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("image", part).text("overwrite", "true");

        let response = self.client.post(&url)
            .multipart(form)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
            Err(AppError::Backend(format!("Failed to upload image. Status: {}, Body: {}", status, body)))
        }
    }

    /// Queue a job graph with ComfyUI.
    ///
    /// Completion notifications for the job are delivered to the WebSocket
    /// opened with the same `client_id`.
    pub async fn queue_prompt(&self, prompt: &Value, client_id: &str) -> AppResult<QueueResponse> {
        let url = format!("{}/prompt", self.base_url);
        tracing::info!("Sending prompt to ComfyUI at URL: {}", url);
        tracing::debug!("Prompt payload: {:?}", prompt);

        let response = self.client.post(&url)
            .json(&QueuePromptRequest { prompt, client_id })
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;

        if response.status().is_success() {
            let queued: QueueResponse = response.json().await?;
            tracing::info!(prompt_id = %queued.prompt_id, number = ?queued.number, "Successfully queued prompt");
            Ok(queued)
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
            let error_message = format!("Failed to queue prompt. Status: {}, Body: {}", status, error_body);
            tracing::error!("{}", error_message);
            Err(AppError::Backend(error_message))
        }
    }

    /// Retrieve the recorded execution history of one job.
    pub async fn get_history(&self, prompt_id: &str) -> AppResult<Value> {
        let url = format!("{}/history/{}", self.base_url, prompt_id);
        let response = self.client.get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(AppError::Backend(format!("Failed to get history: {:?}", response.status())))
        }
    }

    /// Fetch image bytes via ComfyUI's `/view` endpoint.
    pub async fn get_image(&self, image: &ImageRef) -> AppResult<Vec<u8>> {
        let url = format!("{}/view", self.base_url);
        let response = self.client.get(&url)
            .query(&[
                ("filename", image.filename.as_str()),
                ("subfolder", image.subfolder.as_str()),
                ("type", image.folder_type.as_str()),
            ])
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;

        if response.status().is_success() {
            Ok(response.bytes().await?.to_vec())
        } else {
            Err(AppError::Backend(format!("Failed to get image: {:?}", response.status())))
        }
    }

    pub async fn system_stats(&self) -> AppResult<Value> {
        let url = format!("{}/system_stats", self.base_url);
        let response = self.client.get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(AppError::Backend(format!("Failed to get system stats: {:?}", response.status())))
        }
    }
}
