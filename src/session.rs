//! Chat session — the user-facing flow behind each assistant feature.
//!
//! Each method echoes what was asked onto the bus, dispatches the backend
//! call in the background, and posts exactly one result message when it
//! completes: the answer as an assistant message, or the failure as a
//! system notice. Completions are rendered in the order they finish.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bus::UiBus;
use crate::dispatch::{DispatchFailure, Dispatcher, ProjectInfo, TestRequest, Upload, media_type_for};
use crate::error::SessionError;
use crate::message::Message;

/// Fallback project name for the generated docs file.
const DEFAULT_PROJECT_NAME: &str = "SmartTA_Project";

/// Suffix of the generated docs file.
const DOC_FILE_SUFFIX: &str = "_SmartTA_Doc.md";

/// Clears the in-flight flag when dropped.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives assistant features and reports their results on the bus.
#[derive(Clone)]
pub struct ChatSession {
    dispatcher: Dispatcher,
    bus: UiBus,
    asking: Arc<AtomicBool>,
}

impl ChatSession {
    pub fn new(dispatcher: Dispatcher, bus: UiBus) -> Self {
        Self {
            dispatcher,
            bus,
            asking: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn bus(&self) -> &UiBus {
        &self.bus
    }

    /// Whether a chat question is waiting for its answer.
    pub fn is_asking(&self) -> bool {
        self.asking.load(Ordering::SeqCst)
    }

    /// Ask a question from the chat input. Only one chat question may be in
    /// flight; a second one is refused with a notice.
    pub fn ask(&self, question: &str, context_code: &str) -> Option<JoinHandle<()>> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }
        if self.asking.swap(true, Ordering::SeqCst) {
            self.bus.post(Message::system("Still answering the previous question, please wait"));
            return None;
        }
        let guard = InFlight(Arc::clone(&self.asking));

        self.bus.post(Message::user(question));

        let dispatcher = self.dispatcher.clone();
        let bus = self.bus.clone();
        let question = question.to_string();
        let context_code = context_code.to_string();

        Some(Dispatcher::spawn(
            async move { dispatcher.ask(&question, &context_code).await },
            move |outcome| {
                // The flag is clear by the time the answer is visible.
                drop(guard);
                match outcome {
                    Ok(answer) => bus.post(Message::assistant(answer)),
                    Err(failure) => bus.post(Message::system(failure.to_chat_text())),
                }
            },
        ))
    }

    /// Generate a unit test for the selected class or method.
    pub fn generate_test(&self, request: TestRequest) -> Option<JoinHandle<()>> {
        if request.requirement.trim().is_empty() {
            let failure =
                DispatchFailure::preflight("please describe what the test should cover");
            self.bus.post(Message::system(failure.to_chat_text()));
            return None;
        }

        self.bus.post(Message::user(format!(
            "Generate unit test: {}",
            request.requirement.trim()
        )));
        self.bus.post(Message::system(format!("Target: {}", request.target())));

        let dispatcher = self.dispatcher.clone();
        let bus = self.bus.clone();

        Some(Dispatcher::spawn(
            async move { dispatcher.generate_test(&request).await },
            move |outcome| match outcome {
                Ok(code) => bus.post(Message::assistant(format!(
                    "Generated unit test:\n```java\n{}\n```",
                    code.trim_end()
                ))),
                Err(failure) => bus.post(Message::system(failure.to_chat_text())),
            },
        ))
    }

    /// Suggest a commit message for a staged diff.
    pub fn generate_commit_message(&self, git_diff: &str) -> Option<JoinHandle<()>> {
        if git_diff.trim().is_empty() {
            self.bus.post(Message::system("No staged changes to describe"));
            return None;
        }

        self.bus.post(Message::system("Generating commit message..."));

        let dispatcher = self.dispatcher.clone();
        let bus = self.bus.clone();
        let git_diff = git_diff.to_string();

        Some(Dispatcher::spawn(
            async move { dispatcher.generate_commit_message(&git_diff).await },
            move |outcome| match outcome {
                Ok(message) => bus.post(Message::assistant(format!(
                    "Suggested commit message:\n{message}"
                ))),
                Err(failure) => bus.post(Message::system(failure.to_chat_text())),
            },
        ))
    }

    /// Generate project docs and save them next to the project.
    pub fn generate_docs(&self, project_path: PathBuf, info: ProjectInfo) -> JoinHandle<()> {
        self.bus.post(Message::system(format!(
            "Sending project structure ({} files) to the backend...",
            info.total_files
        )));

        let dispatcher = self.dispatcher.clone();
        let bus = self.bus.clone();

        Dispatcher::spawn(
            async move {
                let markdown = dispatcher.generate_docs(&info).await?;
                tokio::task::spawn_blocking(move || save_markdown(&project_path, &markdown))
                    .await
                    .map_err(|e| DispatchFailure::preflight(format!("save task failed: {e}")))?
                    .map_err(|e| {
                        warn!(error = %e, "Failed to save project documentation");
                        DispatchFailure::preflight(e.to_string())
                    })
            },
            move |outcome| {
                let notice = match outcome {
                    Ok(path) => {
                        info!(path = %path.display(), "Project documentation saved");
                        format!("Project documentation saved to:\n{}", path.display())
                    }
                    Err(failure) => failure.to_chat_text(),
                };
                bus.post(Message::system(notice));
            },
        )
    }

    /// Add a document, or a directory of documents, to the knowledge base.
    pub fn upload(&self, path: PathBuf) -> JoinHandle<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.bus.post(Message::system(format!("Uploading {name}...")));

        let dispatcher = self.dispatcher.clone();
        let bus = self.bus.clone();

        Dispatcher::spawn(
            async move {
                let upload = load_upload(&path).await?;
                dispatcher.upload(upload).await
            },
            move |outcome| match outcome {
                Ok(message) => bus.post(Message::system(format!("Upload complete: {message}"))),
                Err(failure) => bus.post(Message::system(failure.to_chat_text())),
            },
        )
    }

    /// Report backend health.
    pub fn health(&self) -> JoinHandle<()> {
        let dispatcher = self.dispatcher.clone();
        let bus = self.bus.clone();

        Dispatcher::spawn(
            async move { dispatcher.health().await },
            move |outcome| match outcome {
                Ok(status) => bus.post(Message::system(format!("Backend status: {status}"))),
                Err(failure) => bus.post(Message::system(failure.to_chat_text())),
            },
        )
    }
}

/// Where the generated docs for `project_path` are written.
pub fn docs_output_path(project_path: &Path) -> PathBuf {
    let project_name = project_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());
    project_path.join(format!("{project_name}{DOC_FILE_SUFFIX}"))
}

/// Write markdown to the docs file, replacing any previous one.
fn save_markdown(project_path: &Path, markdown: &str) -> Result<PathBuf, SessionError> {
    let path = docs_output_path(project_path);
    std::fs::write(&path, markdown).map_err(|source| SessionError::SaveDocument {
        path: path.display().to_string(),
        source,
    })?;
    Ok(path)
}

/// Read a file into an upload, or name a directory for the backend to read.
async fn load_upload(path: &Path) -> Result<Upload, DispatchFailure> {
    let read_failure = |source: std::io::Error| {
        DispatchFailure::preflight(
            SessionError::ReadInput {
                path: path.display().to_string(),
                source,
            }
            .to_string(),
        )
    };

    let metadata = tokio::fs::metadata(path).await.map_err(read_failure)?;
    if metadata.is_dir() {
        return Ok(Upload::Directory(path.display().to_string()));
    }

    let bytes = tokio::fs::read(path).await.map_err(read_failure)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let media_type = media_type_for(&file_name).to_string();
    Ok(Upload::File {
        file_name,
        bytes,
        media_type,
    })
}
