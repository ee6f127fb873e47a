//! CLI driver — stdin REPL standing in for the IDE actions.
//!
//! Plain lines are questions. Slash commands trigger the other features.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::bus::UiBus;
use crate::config::ClientConfig;
use crate::dispatch::{DispatchFailure, Dispatcher, ProjectInfo, TestRequest};
use crate::error::{BusError, SessionError};
use crate::message::Message;
use crate::render::{StyleProfile, Transcript};
use crate::session::ChatSession;
use crate::surface::DisplaySurface;
use crate::transport::TransportService;

pub const HELP: &str = "Commands:
  <question>                      ask about the current code
  /code <file>                    use a file as context for questions and tests
  /code                           clear the context code
  /test <Class[.method]> <text>   generate a unit test for the context code
  /commit <diff-file>             suggest a commit message for a diff
  /docs <project-dir> <info.json> generate project docs from a scanned structure
  /upload <path>                  add a document or directory to the knowledge base
  /health                         check the backend
  /quit                           exit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    SetCode(PathBuf),
    ClearCode,
    Test {
        class_name: String,
        method_name: String,
        requirement: String,
    },
    Commit(PathBuf),
    Docs {
        project: PathBuf,
        info: PathBuf,
    },
    Upload(PathBuf),
    Health,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line.to_string());
    };

    let (name, args) = rest
        .split_once(char::is_whitespace)
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((rest, ""));

    match name {
        "code" if args.is_empty() => Command::ClearCode,
        "code" => Command::SetCode(PathBuf::from(args)),
        "test" => {
            let Some((target, requirement)) = args.split_once(char::is_whitespace) else {
                return Command::Invalid("usage: /test <Class[.method]> <requirement>".into());
            };
            let (class_name, method_name) = target.split_once('.').unwrap_or((target, ""));
            Command::Test {
                class_name: class_name.to_string(),
                method_name: method_name.to_string(),
                requirement: requirement.trim().to_string(),
            }
        }
        "commit" if !args.is_empty() => Command::Commit(PathBuf::from(args)),
        "docs" => match args.split_once(char::is_whitespace) {
            Some((project, info)) => Command::Docs {
                project: PathBuf::from(project),
                info: PathBuf::from(info.trim()),
            },
            None => Command::Invalid("usage: /docs <project-dir> <info.json>".into()),
        },
        "upload" if !args.is_empty() => Command::Upload(PathBuf::from(args)),
        "commit" | "upload" => Command::Invalid(format!("usage: /{name} <path>")),
        "health" => Command::Health,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Invalid(format!("unknown command /{name}, try /help")),
    }
}

/// Bring up a full session on `surface`, drive it from `input`, and return
/// the transcript once every request has reported back.
pub async fn serve<S, R>(
    config: ClientConfig,
    surface: S,
    input: R,
) -> crate::error::Result<Transcript>
where
    S: DisplaySurface + 'static,
    R: AsyncBufRead + Unpin,
{
    config.validate()?;
    let transport = TransportService::new(&config);
    transport.initialize()?;
    let dispatcher = Dispatcher::new(transport, config);

    let bus = UiBus::new();
    let display = bus.attach(surface, StyleProfile::default())?;
    let session = ChatSession::new(dispatcher, bus.clone());
    bus.post(Message::system("SmartTA is ready"));

    let outcome = run(&session, input).await;

    bus.flush().await;
    bus.detach();
    let transcript = tokio::task::spawn_blocking(move || display.join())
        .await
        .map_err(|_| BusError::UiThreadPanicked)??;
    info!(messages = transcript.entry_count(), "Session closed");

    outcome.map(|()| transcript)
}

/// Read lines from `input` until EOF or `/quit`, then wait for requests
/// still in flight.
pub async fn run<R>(session: &ChatSession, input: R) -> crate::error::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut context_code = String::new();
    let mut pending: Vec<JoinHandle<()>> = Vec::new();
    let mut read_error = None;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(source) => {
                error!("Error reading input: {}", source);
                read_error = Some(SessionError::ReadInput {
                    path: "<stdin>".to_string(),
                    source,
                });
                break;
            }
        };

        pending.retain(|handle| !handle.is_finished());

        let spawned = match parse_command(&line) {
            Command::Empty => None,
            Command::Quit => break,
            Command::Help => {
                session.bus().post(Message::system(HELP));
                None
            }
            Command::Invalid(reason) => {
                session.bus().post(Message::system(reason));
                None
            }
            Command::Ask(question) => session.ask(&question, &context_code),
            Command::ClearCode => {
                context_code.clear();
                session.bus().post(Message::system("Context code cleared"));
                None
            }
            Command::SetCode(path) => {
                match read_input(&path).await {
                    Ok(code) => {
                        context_code = code;
                        session.bus().post(Message::system(format!(
                            "Using {} as context ({} lines)",
                            path.display(),
                            context_code.lines().count()
                        )));
                    }
                    Err(e) => post_local_failure(session, e.to_string()),
                }
                None
            }
            Command::Test {
                class_name,
                method_name,
                requirement,
            } => session.generate_test(TestRequest {
                requirement,
                context_code: context_code.clone(),
                class_name,
                method_name,
            }),
            Command::Commit(path) => match read_input(&path).await {
                Ok(diff) => session.generate_commit_message(&diff),
                Err(e) => {
                    post_local_failure(session, e.to_string());
                    None
                }
            },
            Command::Docs { project, info } => match load_project_info(&info).await {
                Ok(info) => Some(session.generate_docs(project, info)),
                Err(reason) => {
                    post_local_failure(session, reason);
                    None
                }
            },
            Command::Upload(path) => Some(session.upload(path)),
            Command::Health => Some(session.health()),
        };

        pending.extend(spawned);
    }

    debug!(in_flight = pending.len(), "Input closed; waiting for pending requests");
    for handle in pending {
        let _ = handle.await;
    }
    match read_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Report a failure that happened before anything was sent.
fn post_local_failure(session: &ChatSession, detail: String) {
    let failure = DispatchFailure::preflight(detail);
    session.bus().post(Message::system(failure.to_chat_text()));
}

async fn read_input(path: &Path) -> Result<String, SessionError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SessionError::ReadInput {
            path: path.display().to_string(),
            source,
        })
}

async fn load_project_info(path: &Path) -> Result<ProjectInfo, String> {
    let text = read_input(path).await.map_err(|e| e.to_string())?;
    serde_json::from_str(&text)
        .map_err(|e| format!("Invalid project structure in {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_is_a_question() {
        assert_eq!(
            parse_command("  What does this do?  "),
            Command::Ask("What does this do?".into())
        );
    }

    #[test]
    fn blank_line_is_empty() {
        assert_eq!(parse_command("   "), Command::Empty);
    }

    #[test]
    fn test_command_splits_target() {
        assert_eq!(
            parse_command("/test Calculator.add covers overflow"),
            Command::Test {
                class_name: "Calculator".into(),
                method_name: "add".into(),
                requirement: "covers overflow".into(),
            }
        );
        assert_eq!(
            parse_command("/test Calculator edge cases"),
            Command::Test {
                class_name: "Calculator".into(),
                method_name: String::new(),
                requirement: "edge cases".into(),
            }
        );
    }

    #[test]
    fn test_command_without_requirement_is_invalid() {
        assert!(matches!(parse_command("/test Calculator"), Command::Invalid(_)));
    }

    #[test]
    fn code_with_and_without_path() {
        assert_eq!(parse_command("/code"), Command::ClearCode);
        assert_eq!(
            parse_command("/code src/Main.java"),
            Command::SetCode(PathBuf::from("src/Main.java"))
        );
    }

    #[test]
    fn docs_needs_two_paths() {
        assert_eq!(
            parse_command("/docs /work/app /tmp/info.json"),
            Command::Docs {
                project: PathBuf::from("/work/app"),
                info: PathBuf::from("/tmp/info.json"),
            }
        );
        assert!(matches!(parse_command("/docs /work/app"), Command::Invalid(_)));
    }

    #[test]
    fn misc_commands() {
        assert_eq!(parse_command("/health"), Command::Health);
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(
            parse_command("/upload notes.pdf"),
            Command::Upload(PathBuf::from("notes.pdf"))
        );
        assert!(matches!(parse_command("/commit"), Command::Invalid(_)));
        assert!(matches!(parse_command("/frobnicate"), Command::Invalid(_)));
    }
}
