//! REPL driven end to end: scripted input in, transcript out.

use std::time::Duration;

use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use smartta_client::cli;
use smartta_client::config::ClientConfig;
use smartta_client::dispatch::is_failure_text;
use smartta_client::error::{ConfigError, Error};
use smartta_client::render::{Span, Transcript};
use smartta_client::surface::DisplaySurface;

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

struct NullSurface;

impl DisplaySurface for NullSurface {
    fn on_append(&mut self, _appended: &[Span], _cursor: usize) {}
}

async fn backend_config(app: Router) -> ClientConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ClientConfig {
        backend_url: format!("http://127.0.0.1:{port}"),
        ..ClientConfig::default()
    }
}

fn entries(transcript: &Transcript) -> Vec<String> {
    (0..transcript.entry_count())
        .map(|i| transcript.entry_text(i).unwrap())
        .collect()
}

fn system_body(entry: &str) -> &str {
    entry
        .strip_prefix("系统：\n")
        .unwrap_or_else(|| panic!("not a system entry: {entry:?}"))
}

#[tokio::test]
async fn question_line_is_answered() {
    timeout(TEST_TIMEOUT, async {
        let app = Router::new().route(
            "/ask",
            post(|| async { Json(json!({ "answer": "It declares x." })) }),
        );
        let config = backend_config(app).await;

        let transcript = cli::serve(config, NullSurface, "What does this do?\n/quit\n".as_bytes())
            .await
            .unwrap();

        assert_eq!(
            entries(&transcript),
            vec![
                "系统：\nSmartTA is ready\n\n".to_string(),
                "用户：\nWhat does this do?\n\n".to_string(),
                "SmartTA：\nIt declares x.\n\n".to_string(),
            ]
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn code_file_becomes_test_context() {
    timeout(TEST_TIMEOUT, async {
        let app = Router::new().route(
            "/generate_test",
            post(|Json(body): Json<Value>| async move {
                let code = body["context_code"].as_str().unwrap_or_default().to_string();
                Json(json!({ "status": "成功", "test_code": format!("// for: {code}") }))
            }),
        );
        let config = backend_config(app).await;

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Calculator.java");
        std::fs::write(&source, "class Calculator {}").unwrap();
        let script = format!(
            "/code {}\n/test Calculator.add covers overflow\n",
            source.display()
        );

        let transcript = cli::serve(config, NullSurface, script.as_bytes())
            .await
            .unwrap();

        let rendered = entries(&transcript);
        assert!(rendered[1].contains("Calculator.java as context (1 lines)"));
        assert!(
            rendered
                .last()
                .unwrap()
                .contains("// for: class Calculator {}")
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreadable_inputs_are_reported_as_failures() {
    timeout(TEST_TIMEOUT, async {
        let config = backend_config(Router::new()).await;

        let dir = tempfile::tempdir().unwrap();
        let broken_info = dir.path().join("info.json");
        std::fs::write(&broken_info, "{ not json").unwrap();
        let script = format!(
            "/code /definitely/not/Main.java\n\
             /commit /definitely/not/staged.diff\n\
             /docs {} {}\n",
            dir.path().display(),
            broken_info.display()
        );

        let transcript = cli::serve(config, NullSurface, script.as_bytes())
            .await
            .unwrap();

        let rendered = entries(&transcript);
        assert_eq!(rendered.len(), 4);
        for entry in &rendered[1..] {
            assert!(is_failure_text(system_body(entry)), "{entry}");
        }
        assert!(rendered[1].contains("Main.java"));
        assert!(rendered[2].contains("staged.diff"));
        assert!(rendered[3].contains("Invalid project structure"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn usage_errors_stay_plain_notices() {
    timeout(TEST_TIMEOUT, async {
        let config = backend_config(Router::new()).await;

        let transcript = cli::serve(config, NullSurface, "/frobnicate\n".as_bytes())
            .await
            .unwrap();

        let rendered = entries(&transcript);
        assert_eq!(rendered.len(), 2);
        assert!(rendered[1].contains("unknown command /frobnicate"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn invalid_config_is_rejected_before_attach() {
    let config = ClientConfig {
        backend_url: "ftp://nowhere".to_string(),
        ..ClientConfig::default()
    };

    let err = cli::serve(config, NullSurface, "".as_bytes())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::InvalidUrl { .. })));
}
