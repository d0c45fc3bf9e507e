//! Env-driven configuration for the service and the CLI.
//!
//! Values are read from the process environment once at startup; `dotenv` is
//! loaded on demand by the binaries. Defaults are provided for convenience
//! during development. The resulting [`Config`] is immutable and shared via
//! `Arc`.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PIN: &str = "1234";

/// Which inference engine this deployment talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    ComfyUI,
    A1111,
    Hosted,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::ComfyUI => "comfyui",
            BackendKind::A1111 => "a1111",
            BackendKind::Hosted => "hosted",
        }
    }
}

impl FromStr for BackendKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "comfyui" | "comfy" => Ok(BackendKind::ComfyUI),
            "a1111" | "automatic1111" => Ok(BackendKind::A1111),
            "hosted" | "huggingface" | "hf" => Ok(BackendKind::Hosted),
            other => Err(AppError::Config(format!("unknown BACKEND '{}'", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,
    pub family_pin: String,
    pub backend: BackendKind,
    pub comfyui_url: String,
    pub comfyui_checkpoint: String,
    pub a1111_url: String,
    pub hosted_api_url: String,
    pub hf_api_token: Option<String>,
    pub hosted_edit_model: String,
    pub hosted_fallback_model: String,
    pub generation_timeout: Duration,
    pub upload_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_host: "0.0.0.0".to_string(),
            api_port: 3001,
            family_pin: DEFAULT_PIN.to_string(),
            backend: BackendKind::ComfyUI,
            comfyui_url: "http://127.0.0.1:8188".to_string(),
            comfyui_checkpoint: "dreamshaper_8.safetensors".to_string(),
            a1111_url: "http://127.0.0.1:7860".to_string(),
            hosted_api_url: "https://api-inference.huggingface.co/models".to_string(),
            hf_api_token: None,
            hosted_edit_model: "timbrooks/instruct-pix2pix".to_string(),
            hosted_fallback_model: "stabilityai/stable-diffusion-2-1".to_string(),
            generation_timeout: Duration::from_secs(120),
            upload_dir: env::temp_dir(),
        }
    }
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> AppResult<Self> {
        let defaults = Config::default();
        Ok(Config {
            api_host: var_or("API_HOST", defaults.api_host),
            api_port: parse_var("PORT", defaults.api_port)?,
            family_pin: var_or("FAMILY_PIN", defaults.family_pin),
            backend: match env::var("BACKEND") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.backend,
            },
            comfyui_url: var_or("COMFYUI_URL", defaults.comfyui_url),
            comfyui_checkpoint: var_or("COMFYUI_CHECKPOINT", defaults.comfyui_checkpoint),
            a1111_url: var_or("A1111_URL", defaults.a1111_url),
            hosted_api_url: var_or("HOSTED_API_URL", defaults.hosted_api_url),
            hf_api_token: env::var("HF_API_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            hosted_edit_model: var_or("HOSTED_EDIT_MODEL", defaults.hosted_edit_model),
            hosted_fallback_model: var_or("HOSTED_FALLBACK_MODEL", defaults.hosted_fallback_model),
            generation_timeout: Duration::from_secs(parse_var(
                "GENERATION_TIMEOUT_SECS",
                defaults.generation_timeout.as_secs(),
            )?),
            upload_dir: env::var("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
        })
    }

    /// Base URL of whichever backend is active.
    pub fn backend_url(&self) -> &str {
        match self.backend {
            BackendKind::ComfyUI => &self.comfyui_url,
            BackendKind::A1111 => &self.a1111_url,
            BackendKind::Hosted => &self.hosted_api_url,
        }
    }

    /// Log the effective settings. Secrets are never printed.
    pub fn log_summary(&self) {
        tracing::info!(
            host = %self.api_host,
            port = self.api_port,
            backend = self.backend.as_str(),
            backend_url = %self.backend_url(),
            timeout_secs = self.generation_timeout.as_secs(),
            upload_dir = %self.upload_dir.display(),
            hf_token = self.hf_api_token.is_some(),
            "configuration loaded"
        );
        if self.family_pin == DEFAULT_PIN {
            tracing::warn!("FAMILY_PIN is unset, using the default PIN");
        }
    }
}

fn var_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn parse_var<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has invalid value '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_aliases() {
        assert_eq!("ComfyUI".parse::<BackendKind>().unwrap(), BackendKind::ComfyUI);
        assert_eq!("automatic1111".parse::<BackendKind>().unwrap(), BackendKind::A1111);
        assert_eq!(" hf ".parse::<BackendKind>().unwrap(), BackendKind::Hosted);
        assert!(matches!("midjourney".parse::<BackendKind>(), Err(AppError::Config(_))));
    }

    #[test]
    fn backend_url_follows_kind() {
        let mut cfg = Config::default();
        assert_eq!(cfg.backend_url(), "http://127.0.0.1:8188");
        cfg.backend = BackendKind::A1111;
        assert_eq!(cfg.backend_url(), "http://127.0.0.1:7860");
    }
}
