//! Request payloads and response bodies for the backend API.

use serde::{Deserialize, Serialize};

/// Status values the backend uses to signal success.
const SUCCESS_STATUSES: &[&str] = &["success", "成功", "ok"];

/// Status values the backend uses to signal failure.
const FAILURE_STATUSES: &[&str] = &["error", "failed", "失败"];

pub(crate) fn is_success_status(status: &str) -> bool {
    SUCCESS_STATUSES.iter().any(|s| s.eq_ignore_ascii_case(status.trim()))
}

pub(crate) fn is_failure_status(status: &str) -> bool {
    FAILURE_STATUSES.iter().any(|s| s.eq_ignore_ascii_case(status.trim()))
}

// ── Requests ────────────────────────────────────────────────────────────

/// Body of `POST /ask`.
#[derive(Debug, Clone, Serialize)]
pub struct AskPayload<'a> {
    pub question: &'a str,
    pub context_code: &'a str,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Inputs for unit-test generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestRequest {
    pub requirement: String,
    pub context_code: String,
    pub class_name: String,
    pub method_name: String,
}

impl TestRequest {
    /// `Class.method`, or just `Class` when no method was selected.
    pub fn target(&self) -> String {
        if self.method_name.is_empty() {
            self.class_name.clone()
        } else {
            format!("{}.{}", self.class_name, self.method_name)
        }
    }
}

/// Body of `POST /generate_commit_message`.
#[derive(Debug, Clone, Serialize)]
pub struct CommitMessagePayload<'a> {
    pub git_diff: &'a str,
}

/// Project structure record produced by the source scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub root_path: String,
    pub total_files: usize,
    pub files: Vec<FileInfo>,
}

/// Per-file slice of a [`ProjectInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_name: String,
    pub file_path: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub comments: Vec<String>,
}

/// What to add to the backend knowledge base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upload {
    /// A single document sent as the `file` multipart part.
    File {
        file_name: String,
        bytes: Vec<u8>,
        media_type: String,
    },
    /// A directory on the backend host, sent as the `directory` form field.
    Directory(String),
}

/// Guess a document media type from its file extension.
pub fn media_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" | "md" => "text/plain",
        _ => "application/octet-stream",
    }
}

// ── Responses ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TestResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub test_code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitMessageResponse {
    pub commit_message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocsResponse {
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub model_ready: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_payload_omits_missing_session() {
        let payload = AskPayload {
            question: "q",
            context_code: "int x=1;",
            session_id: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({ "question": "q", "context_code": "int x=1;" })
        );
    }

    #[test]
    fn ask_payload_uses_backend_session_key() {
        let payload = AskPayload {
            question: "q",
            context_code: "",
            session_id: Some("abc"),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["sessionId"], "abc");
    }

    #[test]
    fn project_info_serializes_snake_case() {
        let info = ProjectInfo {
            root_path: "/p".into(),
            total_files: 1,
            files: vec![FileInfo {
                file_name: "A.java".into(),
                file_path: "/p/A.java".into(),
                classes: vec!["A".into()],
                methods: vec!["run".into()],
                comments: vec![],
            }],
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["root_path"], "/p");
        assert_eq!(value["total_files"], 1);
        assert_eq!(value["files"][0]["file_name"], "A.java");
        assert_eq!(value["files"][0]["methods"][0], "run");
    }

    #[test]
    fn test_request_target() {
        let mut request = TestRequest {
            class_name: "Calculator".into(),
            ..TestRequest::default()
        };
        assert_eq!(request.target(), "Calculator");
        request.method_name = "add".into();
        assert_eq!(request.target(), "Calculator.add");
    }

    #[test]
    fn media_types_by_extension() {
        assert_eq!(media_type_for("notes.PDF"), "application/pdf");
        assert_eq!(media_type_for("a.txt"), "text/plain");
        assert!(media_type_for("slides.pptx").contains("presentationml"));
        assert_eq!(media_type_for("Makefile"), "application/octet-stream");
    }

    #[test]
    fn status_words() {
        assert!(is_success_status("success"));
        assert!(is_success_status("成功"));
        assert!(is_failure_status("失败"));
        assert!(!is_success_status("失败"));
        assert!(!is_failure_status("pending"));
    }
}
