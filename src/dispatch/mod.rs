//! Request dispatch — one async wrapper per backend feature.
//!
//! Every operation builds a typed payload, submits it through the shared
//! [`TransportService`], and decodes the typed response. Failures at any stage
//! come back as a tagged [`DispatchFailure`]; nothing escapes as a panic or a
//! raw transport error. [`Dispatcher::spawn`] adapts an operation to the
//! fire-and-forget callback style used by the chat session.

pub mod failure;
pub mod types;

pub use failure::{
    DispatchFailure, DispatchOutcome, FAILURE_MARKER, FailureKind, is_failure_text, outcome_text,
};
pub use types::{FileInfo, ProjectInfo, TestRequest, Upload, media_type_for};

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::transport::{TransportService, codec};
use types::{
    AnswerResponse, AskPayload, CommitMessagePayload, CommitMessageResponse, DocsResponse,
    HealthResponse, TestResponse, UploadResponse, is_failure_status, is_success_status,
};

/// Backend endpoint paths.
pub mod endpoints {
    pub const ASK: &str = "/ask";
    pub const GENERATE_TEST: &str = "/generate_test";
    pub const GENERATE_COMMIT_MESSAGE: &str = "/generate_commit_message";
    pub const GENERATE_DOCS: &str = "/generate_docs";
    pub const ADD_DOCUMENTS: &str = "/add_documents";
    pub const HEALTH: &str = "/health";
}

/// Issues backend calls over a shared transport. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<TransportService>,
    config: Arc<ClientConfig>,
}

impl Dispatcher {
    pub fn new(transport: Arc<TransportService>, config: ClientConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    /// Ask a question about a piece of code.
    pub async fn ask(&self, question: &str, context_code: &str) -> DispatchOutcome {
        let payload = AskPayload {
            question,
            context_code,
            session_id: self.config.session_id.as_deref(),
        };
        let response: AnswerResponse = self.post_json(endpoints::ASK, &payload).await?;
        Ok(response.answer)
    }

    /// Generate a unit test for a class or method.
    pub async fn generate_test(&self, request: &TestRequest) -> DispatchOutcome {
        let response: TestResponse = self.post_json(endpoints::GENERATE_TEST, request).await?;

        match response.status.as_deref() {
            Some(status) if is_success_status(status) => response
                .test_code
                .ok_or_else(|| DispatchFailure::decode("response has no test_code")),
            _ => match response.error {
                Some(err) => Err(DispatchFailure::rejected(err)),
                None => Err(DispatchFailure::decode(
                    "response has neither a success status nor an error",
                )),
            },
        }
    }

    /// Generate a commit message from a staged diff.
    pub async fn generate_commit_message(&self, git_diff: &str) -> DispatchOutcome {
        let payload = CommitMessagePayload { git_diff };
        let response: CommitMessageResponse = self
            .post_json(endpoints::GENERATE_COMMIT_MESSAGE, &payload)
            .await?;
        Ok(response.commit_message)
    }

    /// Generate markdown documentation from a scanned project structure.
    pub async fn generate_docs(&self, info: &ProjectInfo) -> DispatchOutcome {
        let response: DocsResponse = self.post_json(endpoints::GENERATE_DOCS, info).await?;

        if let Some(err) = response.error {
            return Err(DispatchFailure::rejected(err));
        }
        match response.markdown {
            Some(markdown) if !markdown.trim().is_empty() => Ok(markdown),
            Some(_) => Err(DispatchFailure::decode("markdown is empty")),
            None => Err(DispatchFailure::decode("response has no markdown")),
        }
    }

    /// Add a document or a backend-side directory to the knowledge base.
    pub async fn upload(&self, upload: Upload) -> DispatchOutcome {
        let url = self.config.endpoint(endpoints::ADD_DOCUMENTS);

        let form = match upload {
            Upload::File {
                file_name,
                bytes,
                media_type,
            } => {
                let part = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&media_type)
                    .map_err(|e| {
                        DispatchFailure::preflight(format!("invalid media type {media_type}: {e}"))
                    })?;
                Form::new().part("file", part)
            }
            Upload::Directory(path) => Form::new().text("directory", path),
        };

        debug!(url = %url, "Dispatching multipart upload");
        let text = self.transport.send_multipart(&url, form).await?;
        let response: UploadResponse = decode_body(&text)?;

        if let Some(err) = response.error {
            return Err(DispatchFailure::rejected(err));
        }
        let message = response
            .message
            .ok_or_else(|| DispatchFailure::decode("response has no message"))?;
        match response.status.as_deref() {
            Some(status) if is_failure_status(status) => Err(DispatchFailure::rejected(message)),
            _ => Ok(message),
        }
    }

    /// Probe the backend's health endpoint.
    pub async fn health(&self) -> DispatchOutcome {
        let url = self.config.endpoint(endpoints::HEALTH);
        let text = self.transport.get(&url).await?;
        let response: HealthResponse = decode_body(&text)?;
        Ok(match response.model_ready {
            Some(ready) => format!("{} (model ready: {ready})", response.status),
            None => response.status,
        })
    }

    /// Run `operation` on the runtime and hand its result to `on_done`.
    ///
    /// `on_done` runs exactly once, on a runtime worker thread, whether the
    /// operation succeeds, fails, or panics. Must be called from within a
    /// tokio runtime.
    pub fn spawn<T, F, C>(operation: F, on_done: C) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, DispatchFailure>> + Send + 'static,
        C: FnOnce(Result<T, DispatchFailure>) + Send + 'static,
    {
        tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(operation).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let reason = panic_message(&*panic);
                    error!(reason = %reason, "Dispatch operation panicked");
                    Err(DispatchFailure::preflight(reason))
                }
            };
            on_done(outcome);
        })
    }

    async fn post_json<P, R>(&self, endpoint: &str, payload: &P) -> Result<R, DispatchFailure>
    where
        P: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.config.endpoint(endpoint);
        let body = codec::encode(payload).map_err(|e| {
            DispatchFailure::preflight(format!("failed to serialize payload: {e}"))
        })?;

        debug!(url = %url, bytes = body.len(), "Dispatching request");
        let text = self.transport.send_json(&url, body).await.map_err(|e| {
            warn!(url = %url, error = %e, "Dispatch failed");
            DispatchFailure::from(e)
        })?;

        let decoded = decode_body(&text)?;
        info!(url = %url, "Dispatch completed");
        Ok(decoded)
    }
}

fn decode_body<R: DeserializeOwned>(text: &str) -> Result<R, DispatchFailure> {
    codec::decode(text).map_err(|e| {
        warn!(error = %e, "Failed to parse backend response");
        DispatchFailure::decode(e.to_string())
    })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "operation panicked".to_string()
    }
}
