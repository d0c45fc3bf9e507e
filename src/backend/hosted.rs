//! Hosted-model variant (HuggingFace-style inference API).
//!
//! The primary call is an instruction-driven image edit. When it fails for any
//! reason other than the model still loading, a text-to-image model is called
//! with the style prompt alone; that result ignores the uploaded photo.
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

use crate::backend::{GenerationRequest, InferenceBackend};
use crate::error::{AppError, AppResult};
use crate::prompt::Style;

pub struct HostedBackend {
    client: Client,
    base_url: String,
    edit_model: String,
    fallback_model: String,
    token: Option<String>,
    timeout: Duration,
}

impl HostedBackend {
    pub fn new(
        base_url: String,
        edit_model: String,
        fallback_model: String,
        token: Option<String>,
        timeout: Duration,
    ) -> Self {
        HostedBackend {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            edit_model,
            fallback_model,
            token,
            timeout,
        }
    }

    async fn send(&self, mut req: RequestBuilder) -> AppResult<Response> {
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req.timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::from_reqwest(e, self.timeout))
    }

    async fn post_model(&self, model: &str, body: &Value) -> AppResult<Vec<u8>> {
        let url = format!("{}/{}", self.base_url, model);
        let response = self.send(self.client.post(&url).json(body)).await?;
        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::warn!(model, "hosted model is still loading");
            return Err(AppError::ModelLoading);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Backend(format!("{} returned {}: {}", model, status, text)));
        }

        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |ct| ct.starts_with("application/json"));
        if is_json {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::InvalidResponse(format!("{} returned JSON instead of an image: {}", model, text)));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

pub fn edit_body(image: &[u8], style: Style) -> Value {
    let prompt = style.prompt();
    json!({
        "inputs": STANDARD.encode(image),
        "parameters": {
            "prompt": prompt.instruction,
            "negative_prompt": prompt.negative,
            "num_inference_steps": 20,
            "guidance_scale": 7.5,
            "image_guidance_scale": 1.5
        }
    })
}

pub fn fallback_body(style: Style) -> Value {
    let prompt = style.prompt();
    json!({
        "inputs": prompt.positive,
        "parameters": {"negative_prompt": prompt.negative}
    })
}

#[async_trait]
impl InferenceBackend for HostedBackend {
    fn name(&self) -> &'static str {
        "hosted"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<Vec<u8>> {
        tracing::info!(model = %self.edit_model, style = %request.style, "calling hosted edit model");
        let image = request.read_image().await?;
        match self.post_model(&self.edit_model, &edit_body(&image, request.style)).await {
            Err(AppError::ModelLoading) => Err(AppError::ModelLoading),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = %self.fallback_model,
                    "edit model failed, falling back to text-only generation; the uploaded photo will not influence the result"
                );
                self.post_model(&self.fallback_model, &fallback_body(request.style)).await
            }
            ok => ok,
        }
    }

    /// Checks that the edit model endpoint answers and is loaded.
    async fn health(&self) -> AppResult<Value> {
        let url = format!("{}/{}", self.base_url, self.edit_model);
        let response = self.send(self.client.get(&url)).await?;
        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(AppError::ModelLoading);
        }
        if !status.is_success() {
            return Err(AppError::Backend(format!("{} health check returned {}", self.edit_model, status)));
        }
        Ok(json!({
            "edit_model": self.edit_model,
            "fallback_model": self.fallback_model,
            "token_configured": self.token.is_some(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_body_carries_image_and_instruction() {
        let body = edit_body(b"img", Style::Cartoon);
        assert_eq!(body["inputs"], STANDARD.encode(b"img"));
        assert_eq!(body["parameters"]["prompt"], Style::Cartoon.prompt().instruction);
    }

    #[test]
    fn fallback_body_is_text_only() {
        let body = fallback_body(Style::Anime);
        assert_eq!(body["inputs"], Style::Anime.prompt().positive);
        assert!(body["parameters"].get("prompt").is_none());
    }
}
