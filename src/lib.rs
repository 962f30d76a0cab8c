//! Typed building blocks for Claude Code hooks.
//!
//! A hook is a single-shot process the host spawns on a lifecycle event:
//! the event tag arrives as the first argument, the JSON payload on
//! stdin, and the host reads exactly one JSON line back from stdout.
//! This crate models the nine event payloads and the response shape as
//! tagged Rust types, validates untrusted payloads without panicking,
//! and dispatches to per-event async handlers with the host's exit
//! protocol handled for you.
//!
//! ```no_run
//! use claude_code_hooks::{
//!     helpers, HookOutput, HookRegistry, PreToolUseInput, StopInput,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     claude_code_hooks::logging::init();
//!
//!     let registry = HookRegistry::new()
//!         .with(helpers::handler::<PreToolUseInput, _, _>(|input| async move {
//!             if input.tool_name == "Bash" {
//!                 return Ok(HookOutput::deny("shell access is disabled"));
//!             }
//!             Ok(HookOutput::approve())
//!         }))
//!         .with(helpers::handler::<StopInput, _, _>(|_input| async {
//!             Ok(HookOutput::success())
//!         }));
//!
//!     claude_code_hooks::run(&registry).await?;
//!     Ok(())
//! }
//! ```
//!
//! Malformed input and handler failures never crash the process; the
//! host always receives a well-formed response line, and diagnostics go
//! to stderr.

pub mod error;
pub mod event;
pub mod handler;
pub mod helpers;
pub mod input;
pub mod logging;
pub mod output;
pub mod runner;
pub mod runtime;
pub mod validate;

pub use error::HookError;
pub use event::{HookEventName, UnknownHookEvent};
pub use handler::{
    ExecutionContext, HookConfig, HookExecution, HookMatcher, HookRegistry, TaggedHandler,
};
pub use input::{
    HookEventPayload, HookInput, NotificationInput, PostToolUseInput, PreCompactInput,
    PreToolUseInput, SessionEndInput, SessionEndReason, SessionSource, SessionStartInput,
    StopInput, SubagentStopInput, UserPromptSubmitInput,
};
pub use logging::log;
pub use output::{Decision, HookOutput, HookSpecificOutput, PermissionDecision};
pub use runner::{run, run_with};
pub use runtime::{EnvironmentKind, HookRuntime, OsRuntime};
pub use validate::{
    is_hook_input_like, is_hook_output_like, parse_hook_input, parse_json,
    validate_hook_event_name, validate_hook_input, validate_hook_output,
    validate_hook_output_for, ValidationError, ValidationIssue, ValidationResult,
};

/// Crate version, for binaries that want to report it
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
