//! Synchronous REST variant for the Automatic1111 web UI API.
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::backend::{GenerationRequest, InferenceBackend};
use crate::error::{AppError, AppResult};

pub const STEPS: u32 = 25;
pub const CFG_SCALE: f64 = 7.0;
pub const SIZE: u32 = 512;
pub const DENOISING_STRENGTH: f64 = 0.6;
pub const SAMPLER: &str = "Euler a";

#[derive(Debug, Serialize)]
pub struct Img2ImgRequest<'a> {
    pub init_images: Vec<String>,
    pub prompt: &'a str,
    pub negative_prompt: &'a str,
    pub steps: u32,
    pub cfg_scale: f64,
    pub width: u32,
    pub height: u32,
    pub denoising_strength: f64,
    pub sampler_name: &'a str,
    pub seed: i64,
}

#[derive(Debug, Deserialize)]
struct Img2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
}

pub struct A1111Backend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl A1111Backend {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        A1111Backend { client: Client::new(), base_url: base_url.trim_end_matches('/').to_string(), timeout }
    }
}

/// Decode the first returned image. Some builds prefix a data URL header.
fn decode_first_image(images: &[String]) -> AppResult<Vec<u8>> {
    let first = images
        .first()
        .ok_or_else(|| AppError::InvalidResponse("img2img returned no images".to_string()))?;
    let payload = first.split_once("base64,").map_or(first.as_str(), |(_, data)| data);
    Ok(STANDARD.decode(payload.trim())?)
}

#[async_trait]
impl InferenceBackend for A1111Backend {
    fn name(&self) -> &'static str {
        "a1111"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<Vec<u8>> {
        let prompt = request.style.prompt();
        let body = Img2ImgRequest {
            init_images: vec![STANDARD.encode(request.read_image().await?)],
            prompt: prompt.positive,
            negative_prompt: prompt.negative,
            steps: STEPS,
            cfg_scale: CFG_SCALE,
            width: SIZE,
            height: SIZE,
            denoising_strength: DENOISING_STRENGTH,
            sampler_name: SAMPLER,
            seed: -1,
        };

        let url = format!("{}/sdapi/v1/img2img", self.base_url);
        tracing::info!(%url, style = %request.style, "sending img2img request");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::from_reqwest(e, self.timeout))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Backend(format!("img2img failed. Status: {}, Body: {}", status, text)));
        }

        let parsed: Img2ImgResponse = response.json().await?;
        decode_first_image(&parsed.images)
    }

    async fn health(&self) -> AppResult<Value> {
        let url = format!("{}/sdapi/v1/options", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::from_reqwest(e, self.timeout))?;
        if !response.status().is_success() {
            return Err(AppError::Backend(format!("Failed to get options: {:?}", response.status())));
        }
        let options: Value = response.json().await?;
        Ok(json!({
            "model": options.get("sd_model_checkpoint").cloned().unwrap_or(Value::Null),
        }))
    }
}
