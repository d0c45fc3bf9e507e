//! Family Stylizer library
//!
//! A PIN-gated service that takes a photo and a style name and has an
//! external image-generation engine redraw it.
//!
//! Modules:
//! - `api`: Axum HTTP handlers and router setup used by the binary.
//! - `auth`: Shared-PIN check.
//! - `backend`: The `InferenceBackend` trait and its ComfyUI, A1111 and hosted variants.
//! - `comfyui`: Thin client for ComfyUI REST endpoints plus the completion waiter.
//! - `prompt`: Style presets and `{{placeholder}}` job-graph templating.
//! - `upload`: Upload validation and the self-deleting temp file.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `ComfyUIClient`,
//! `PromptConstructor`, `Style` and `InferenceBackend`.
pub mod api;
pub mod auth;
pub mod backend;
pub mod comfyui;
pub mod config;
pub mod error;
pub mod prompt;
pub mod upload;

pub use backend::{build_backend, GenerationRequest, InferenceBackend};
pub use comfyui::client::ComfyUIClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use prompt::constructor::PromptConstructor;
pub use prompt::styles::Style;
