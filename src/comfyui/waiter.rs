//! Job Waiter: block until ComfyUI reports a queued job as finished.
//!
//! The channel is opened *before* the job is queued so that a fast completion
//! cannot slip past us. Every message that does not concern the awaited
//! `prompt_id`, or cannot be parsed, is ignored.
use std::time::Duration;

use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// Outcome carried by a notification that concerns the awaited job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Completed,
    Failed(String),
}

/// Interpret one text frame. `None` means "not for us, keep listening".
pub fn classify(text: &str, prompt_id: &str) -> Option<JobEvent> {
    let note: Notification = serde_json::from_str(text).ok()?;
    if note.data.get("prompt_id").and_then(|v| v.as_str()) != Some(prompt_id) {
        return None;
    }
    match note.kind.as_str() {
        // `executing` with no node means the whole graph has run.
        "executing" if note.data.get("node").map_or(false, Value::is_null) => Some(JobEvent::Completed),
        "execution_success" => Some(JobEvent::Completed),
        "execution_error" => {
            let detail = note
                .data
                .get("exception_message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown execution error");
            Some(JobEvent::Failed(detail.to_string()))
        }
        "execution_interrupted" => Some(JobEvent::Failed("execution interrupted".to_string())),
        _ => None,
    }
}

pub struct JobWaiter {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl JobWaiter {
    pub async fn connect(url: &str) -> AppResult<Self> {
        tracing::debug!(%url, "opening notification channel");
        let (stream, _) = connect_async(url).await?;
        Ok(JobWaiter { stream })
    }

    /// Wait for `prompt_id` to finish, at most `timeout`. The channel is
    /// closed on every exit path.
    pub async fn wait_for(mut self, prompt_id: &str, timeout: Duration) -> AppResult<()> {
        let outcome = tokio::time::timeout(timeout, self.listen(prompt_id)).await;
        self.close().await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(prompt_id, ?timeout, "job did not complete in time");
                Err(AppError::Timeout(timeout))
            }
        }
    }

    async fn listen(&mut self, prompt_id: &str) -> AppResult<()> {
        while let Some(message) = self.stream.next().await {
            match message? {
                Message::Text(text) => match classify(&text, prompt_id) {
                    Some(JobEvent::Completed) => {
                        tracing::info!(prompt_id, "job completed");
                        return Ok(());
                    }
                    Some(JobEvent::Failed(detail)) => {
                        return Err(AppError::Backend(format!("job {} failed: {}", prompt_id, detail)));
                    }
                    None => tracing::trace!(prompt_id, "ignoring notification"),
                },
                Message::Close(_) => break,
                // Binary frames are latent previews.
                _ => {}
            }
        }
        Err(AppError::Backend(format!(
            "notification channel closed before job {} completed",
            prompt_id
        )))
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "notification channel close failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executing_with_null_node_completes_matching_job() {
        let msg = r#"{"type":"executing","data":{"node":null,"prompt_id":"abc"}}"#;
        assert_eq!(classify(msg, "abc"), Some(JobEvent::Completed));
        assert_eq!(classify(msg, "other"), None);
    }

    #[test]
    fn executing_a_node_is_progress_only() {
        let msg = r#"{"type":"executing","data":{"node":"6","prompt_id":"abc"}}"#;
        assert_eq!(classify(msg, "abc"), None);
    }

    #[test]
    fn success_and_error_events() {
        let ok = r#"{"type":"execution_success","data":{"prompt_id":"abc","timestamp":1}}"#;
        assert_eq!(classify(ok, "abc"), Some(JobEvent::Completed));

        let err = r#"{"type":"execution_error","data":{"prompt_id":"abc","exception_message":"OOM"}}"#;
        assert_eq!(classify(err, "abc"), Some(JobEvent::Failed("OOM".to_string())));
    }

    #[test]
    fn interruption_fails_matching_job_only() {
        let msg = r#"{"type":"execution_interrupted","data":{"prompt_id":"abc","node_id":"6"}}"#;
        assert_eq!(classify(msg, "abc"), Some(JobEvent::Failed("execution interrupted".to_string())));
        assert_eq!(classify(msg, "other"), None);
    }

    #[test]
    fn noise_is_ignored() {
        assert_eq!(classify("not json", "abc"), None);
        assert_eq!(classify(r#"{"data":{}}"#, "abc"), None);
        assert_eq!(classify(r#"{"type":"status","data":{"status":{"exec_info":{"queue_remaining":0}}}}"#, "abc"), None);
        assert_eq!(classify(r#"{"type":"progress","data":{"value":3,"max":20,"prompt_id":"abc"}}"#, "abc"), None);
    }
}
