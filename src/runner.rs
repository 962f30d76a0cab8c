//! Single-shot dispatch: event tag from argv, JSON payload from stdin,
//! exactly one JSON line back on stdout
//!
//! The dispatcher never lets a malformed payload or a handler failure
//! escape as a crash. Both degrade to a fixed `{"action":"continue"}`
//! fallback line, with the difference visible only on the diagnostic
//! stream. Terminal events end the process with exit code 0 after the
//! response line is written.

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::HookError;
use crate::event::HookEventName;
use crate::handler::HookRegistry;
use crate::input::HookInput;
use crate::runtime::{HookRuntime, OsRuntime};
use crate::validate;

/// What one dispatch decided: the line to emit, and the exit code to end
/// the process with, if any
struct DispatchOutcome {
    line: String,
    exit: Option<i32>,
}

impl DispatchOutcome {
    /// Degraded response for decode failures and handler errors
    fn fallback() -> Self {
        DispatchOutcome {
            line: serde_json::json!({"action": "continue"}).to_string(),
            exit: None,
        }
    }

    /// Empty success response for events nobody handles
    fn empty(exit: Option<i32>) -> Self {
        DispatchOutcome {
            line: "{}".to_string(),
            exit,
        }
    }
}

/// Attaches the invocation tag to the decoded payload and decodes the
/// tagged union. The tag travels as an internal field; a stray copy
/// inside the payload is overwritten, so the invocation argument always
/// wins.
fn narrow(mut value: Value, event: HookEventName) -> Result<HookInput, serde_json::Error> {
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            "hook_event_name".to_string(),
            Value::String(event.as_str().to_string()),
        );
    }
    serde_json::from_value(value)
}

async fn dispatch(tag: &str, text: &str, registry: &HookRegistry) -> DispatchOutcome {
    let value = match validate::parse_json(text) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to decode hook input: {}", e);
            return DispatchOutcome::fallback();
        }
    };

    let event = match tag.parse::<HookEventName>() {
        Ok(event) => event,
        Err(_) => {
            if !tag.is_empty() {
                debug!("No route for event tag '{}'", tag);
            }
            return DispatchOutcome::empty(None);
        }
    };

    let Some(handler) = registry.get(event) else {
        return DispatchOutcome::empty(event.is_terminal().then_some(0));
    };

    let input = match narrow(value, event) {
        Ok(input) => input,
        Err(e) => {
            warn!("Hook input for '{}' is malformed: {}", event, e);
            return DispatchOutcome::fallback();
        }
    };

    match handler.invoke(input).await {
        Ok(output) => match serde_json::to_string(&output) {
            Ok(line) => DispatchOutcome {
                line,
                exit: event.is_terminal().then_some(0),
            },
            Err(e) => {
                error!("Failed to encode hook output for '{}': {}", event, e);
                DispatchOutcome::fallback()
            }
        },
        Err(e) => {
            error!("Hook handler for '{}' failed: {}", event, e);
            DispatchOutcome::fallback()
        }
    }
}

/// Dispatches one hook invocation through the given runtime.
///
/// Reads the event tag from the first argument and the payload from the
/// runtime's input stream, routes to the registry, writes the response
/// line, and terminates with code 0 after a terminal event. Environment
/// errors (input unreadable, output unwritable) propagate; everything
/// else degrades to a well-formed response line.
pub async fn run_with(
    runtime: &dyn HookRuntime,
    registry: &HookRegistry,
) -> Result<(), HookError> {
    let args = runtime.args();
    let tag = args.first().map(String::as_str).unwrap_or("");
    let text = runtime.read_input().await?;
    let outcome = dispatch(tag, &text, registry).await;
    runtime.write_line(&outcome.line)?;
    if let Some(code) = outcome.exit {
        runtime.terminate(code);
    }
    Ok(())
}

/// Dispatches one hook invocation against the real process environment.
///
/// This is the entry point a hook binary calls from `main`.
pub async fn run(registry: &HookRegistry) -> Result<(), HookError> {
    run_with(&OsRuntime, registry).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::TaggedHandler;
    use crate::helpers;
    use crate::input::{PreToolUseInput, SessionEndInput, StopInput, UserPromptSubmitInput};
    use crate::output::HookOutput;
    use crate::runtime::EnvironmentKind;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingRuntime {
        args: Vec<String>,
        input: Option<String>,
        lines: Mutex<Vec<String>>,
        exits: Mutex<Vec<i32>>,
    }

    impl RecordingRuntime {
        fn new(tag: &str, input: &str) -> Self {
            let args = if tag.is_empty() {
                Vec::new()
            } else {
                vec![tag.to_string()]
            };
            RecordingRuntime {
                args,
                input: Some(input.to_string()),
                lines: Mutex::new(Vec::new()),
                exits: Mutex::new(Vec::new()),
            }
        }

        fn without_input(tag: &str) -> Self {
            RecordingRuntime {
                input: None,
                ..Self::new(tag, "")
            }
        }

        fn emitted(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }

        fn exit_codes(&self) -> Vec<i32> {
            self.exits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HookRuntime for RecordingRuntime {
        fn environment(&self) -> EnvironmentKind {
            if self.input.is_some() {
                EnvironmentKind::Piped
            } else {
                EnvironmentKind::Unknown
            }
        }

        fn args(&self) -> Vec<String> {
            self.args.clone()
        }

        async fn read_input(&self) -> Result<String, HookError> {
            self.input.clone().ok_or(HookError::InputUnavailable {
                kind: EnvironmentKind::Unknown,
            })
        }

        fn env_var(&self, _name: &str) -> Option<String> {
            None
        }

        fn write_line(&self, line: &str) -> std::io::Result<()> {
            self.lines.lock().unwrap().push(line.to_string());
            Ok(())
        }

        fn terminate(&self, code: i32) {
            self.exits.lock().unwrap().push(code);
        }
    }

    fn stop_payload() -> String {
        json!({
            "session_id": "sess-1",
            "transcript_path": "/tmp/t.jsonl",
            "stop_hook_active": false
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_routes_to_registered_handler() {
        let registry =
            HookRegistry::new().with(helpers::handler::<PreToolUseInput, _, _>(|input| async move {
                if input.tool_name == "Bash" {
                    Ok(HookOutput::deny("no shell commands"))
                } else {
                    Ok(HookOutput::approve())
                }
            }));
        let payload = json!({
            "session_id": "sess-1",
            "transcript_path": "/tmp/t.jsonl",
            "tool_name": "Bash",
            "tool_input": {"command": "rm -rf /"}
        });
        let runtime = RecordingRuntime::new("PreToolUse", &payload.to_string());

        run_with(&runtime, &registry).await.unwrap();

        let emitted = runtime.emitted();
        assert_eq!(emitted.len(), 1);
        let value: Value = serde_json::from_str(&emitted[0]).unwrap();
        assert_eq!(
            value,
            json!({
                "continue": false,
                "decision": "block",
                "reason": "no shell commands",
                "stopReason": "no shell commands"
            })
        );
        assert!(runtime.exit_codes().is_empty());
    }

    #[tokio::test]
    async fn test_terminal_event_emits_then_exits_zero() {
        let registry = HookRegistry::new()
            .with(helpers::handler::<StopInput, _, _>(|_input| async {
                Ok(HookOutput::default())
            }));
        let runtime = RecordingRuntime::new("Stop", &stop_payload());

        run_with(&runtime, &registry).await.unwrap();

        assert_eq!(runtime.emitted(), vec!["{}".to_string()]);
        assert_eq!(runtime.exit_codes(), vec![0]);
    }

    #[tokio::test]
    async fn test_non_terminal_event_does_not_exit() {
        let registry = HookRegistry::new().with(helpers::handler::<UserPromptSubmitInput, _, _>(
            |_input| async { Ok(HookOutput::default()) },
        ));
        let payload = json!({
            "session_id": "sess-1",
            "transcript_path": "/tmp/t.jsonl",
            "prompt": "hello"
        });
        let runtime = RecordingRuntime::new("UserPromptSubmit", &payload.to_string());

        run_with(&runtime, &registry).await.unwrap();

        assert_eq!(runtime.emitted(), vec!["{}".to_string()]);
        assert!(runtime.exit_codes().is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_events_emit_empty_object() {
        for event in HookEventName::ALL {
            let registry = HookRegistry::new();
            let runtime = RecordingRuntime::new(event.as_str(), &stop_payload());

            run_with(&runtime, &registry).await.unwrap();

            assert_eq!(runtime.emitted(), vec!["{}".to_string()], "event {event}");
            if event.is_terminal() {
                assert_eq!(runtime.exit_codes(), vec![0], "event {event}");
            } else {
                assert!(runtime.exit_codes().is_empty(), "event {event}");
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_tag_emits_empty_object_without_exit() {
        let registry = HookRegistry::new()
            .with(helpers::handler::<StopInput, _, _>(|_input| async {
                Ok(HookOutput::block("should not run"))
            }));
        let runtime = RecordingRuntime::new("Telemetry", &stop_payload());

        run_with(&runtime, &registry).await.unwrap();

        assert_eq!(runtime.emitted(), vec!["{}".to_string()]);
        assert!(runtime.exit_codes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_tag_degrades_to_empty_response() {
        let registry = HookRegistry::new();
        let runtime = RecordingRuntime::new("", &stop_payload());

        run_with(&runtime, &registry).await.unwrap();

        assert_eq!(runtime.emitted(), vec!["{}".to_string()]);
        assert!(runtime.exit_codes().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_input_emits_fixed_fallback() {
        let registry = HookRegistry::new()
            .with(helpers::handler::<StopInput, _, _>(|_input| async {
                Ok(HookOutput::default())
            }));
        let runtime = RecordingRuntime::new("Stop", "not json");

        run_with(&runtime, &registry).await.unwrap();

        assert_eq!(
            runtime.emitted(),
            vec![r#"{"action":"continue"}"#.to_string()]
        );
        assert!(runtime.exit_codes().is_empty());
    }

    #[tokio::test]
    async fn test_non_utf8_payload_degrades_to_fallback() {
        let registry = HookRegistry::new()
            .with(helpers::handler::<StopInput, _, _>(|_input| async {
                Ok(HookOutput::default())
            }));
        // What read_input hands over when the host pipes raw bytes that
        // are not valid UTF-8
        let text = String::from_utf8_lossy(b"\xff\xfe{}");
        let runtime = RecordingRuntime::new("Stop", &text);

        run_with(&runtime, &registry).await.unwrap();

        assert_eq!(
            runtime.emitted(),
            vec![r#"{"action":"continue"}"#.to_string()]
        );
        assert!(runtime.exit_codes().is_empty());
    }

    #[tokio::test]
    async fn test_handler_error_swallowed_into_fallback() {
        let registry = HookRegistry::new().with(TaggedHandler::new(HookEventName::Stop, |_input| {
            Box::pin(async { Err(anyhow::anyhow!("handler bug")) })
        }));
        let runtime = RecordingRuntime::new("Stop", &stop_payload());

        run_with(&runtime, &registry).await.unwrap();

        assert_eq!(
            runtime.emitted(),
            vec![r#"{"action":"continue"}"#.to_string()]
        );
        // Even on a terminal event the error path must not exit
        assert!(runtime.exit_codes().is_empty());
    }

    #[tokio::test]
    async fn test_shape_mismatch_falls_back() {
        let registry = HookRegistry::new()
            .with(helpers::handler::<StopInput, _, _>(|_input| async {
                Ok(HookOutput::default())
            }));
        let payload = json!({
            "session_id": "sess-1",
            "transcript_path": "/tmp/t.jsonl"
        });
        let runtime = RecordingRuntime::new("Stop", &payload.to_string());

        run_with(&runtime, &registry).await.unwrap();

        assert_eq!(
            runtime.emitted(),
            vec![r#"{"action":"continue"}"#.to_string()]
        );
        assert!(runtime.exit_codes().is_empty());
    }

    #[tokio::test]
    async fn test_invocation_tag_overrides_payload_tag() {
        let registry = HookRegistry::new()
            .with(helpers::handler::<StopInput, _, _>(|input| async move {
                Ok(HookOutput::block(format!(
                    "stop_hook_active={}",
                    input.stop_hook_active
                )))
            }));
        let payload = json!({
            "session_id": "sess-1",
            "transcript_path": "/tmp/t.jsonl",
            "hook_event_name": "Notification",
            "stop_hook_active": true
        });
        let runtime = RecordingRuntime::new("Stop", &payload.to_string());

        run_with(&runtime, &registry).await.unwrap();

        let value: Value = serde_json::from_str(&runtime.emitted()[0]).unwrap();
        assert_eq!(value["stopReason"], json!("stop_hook_active=true"));
        assert_eq!(runtime.exit_codes(), vec![0]);
    }

    #[tokio::test]
    async fn test_session_end_routes_like_any_other_event() {
        let registry = HookRegistry::new()
            .with(helpers::handler::<SessionEndInput, _, _>(|input| async move {
                Ok(HookOutput {
                    system_message: Some(format!("ended: {:?}", input.reason)),
                    ..HookOutput::default()
                })
            }));
        let payload = json!({
            "session_id": "sess-1",
            "transcript_path": "/tmp/t.jsonl",
            "reason": "logout"
        });
        let runtime = RecordingRuntime::new("SessionEnd", &payload.to_string());

        run_with(&runtime, &registry).await.unwrap();

        let value: Value = serde_json::from_str(&runtime.emitted()[0]).unwrap();
        assert!(value["systemMessage"].as_str().unwrap().contains("Logout"));
        assert!(runtime.exit_codes().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_input_propagates_error() {
        let registry = HookRegistry::new();
        let runtime = RecordingRuntime::without_input("Stop");

        let err = run_with(&runtime, &registry).await.unwrap_err();
        assert!(matches!(err, HookError::InputUnavailable { .. }));
        assert!(runtime.emitted().is_empty());
        assert!(runtime.exit_codes().is_empty());
    }
}
