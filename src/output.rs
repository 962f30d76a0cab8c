//! Hook output model and canonical response constructors
//!
//! Unlike inputs, outputs share one shape across every event: all fields
//! are optional and the wire uses camelCase names. Which `decision` values
//! an event actually accepts is enforced by
//! [`crate::validate::validate_hook_output_for`], not by the type.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::event::HookEventName;

/// Flow-control decision a hook can attach to its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Block,
}

impl Decision {
    /// Wire string for this decision
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Block => "block",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission verdict for the pre-tool-use permission surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    /// Run the tool without consulting the permission system
    Allow,
    /// Refuse to run the tool
    Deny,
    /// Ask the user to decide
    Ask,
}

/// Event-specific structured output nested under `hookSpecificOutput`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookSpecificOutput {
    #[serde(rename = "hookEventName")]
    pub hook_event_name: String,
    #[serde(
        rename = "additionalContext",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_context: Option<String>,
    #[serde(
        rename = "permissionDecision",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub permission_decision: Option<PermissionDecision>,
    #[serde(
        rename = "permissionDecisionReason",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub permission_decision_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HookSpecificOutput {
    /// Empty hook-specific output tagged with the given event
    pub fn new(event: HookEventName) -> Self {
        HookSpecificOutput {
            hook_event_name: event.as_str().to_string(),
            ..Default::default()
        }
    }

    /// Hook-specific output carrying additional context for the host
    pub fn with_additional_context(event: HookEventName, context: impl Into<String>) -> Self {
        HookSpecificOutput {
            additional_context: Some(context.into()),
            ..HookSpecificOutput::new(event)
        }
    }
}

/// Response a hook writes back to the host.
///
/// Every field is optional; an absent field is simply not written to the
/// wire. `HookOutput::default()` therefore serializes to `{}`, the neutral
/// "no opinion" response. Unrecognized fields survive in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookOutput {
    /// Whether the agent should keep going; absent means continue
    #[serde(rename = "continue", default, skip_serializing_if = "Option::is_none")]
    pub continue_: Option<bool>,
    /// Reason shown when `continue` is false
    #[serde(
        rename = "stopReason",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub stop_reason: Option<String>,
    /// Hide this hook's stdout from the transcript
    #[serde(
        rename = "suppressOutput",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub suppress_output: Option<bool>,
    /// Message the host displays to the user
    #[serde(
        rename = "systemMessage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub system_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Files whose contents should be added as context (prompt submission)
    #[serde(
        rename = "contextFiles",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub context_files: Option<Vec<String>>,
    /// Replacement for the submitted prompt
    #[serde(
        rename = "updatedPrompt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_prompt: Option<String>,
    #[serde(
        rename = "hookSpecificOutput",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub hook_specific_output: Option<HookSpecificOutput>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HookOutput {
    /// `{continue: true}` — let the agent proceed.
    ///
    /// Further fields go on with struct update syntax:
    /// `HookOutput { suppress_output: Some(true), ..HookOutput::success() }`.
    pub fn success() -> Self {
        HookOutput {
            continue_: Some(true),
            ..Default::default()
        }
    }

    /// `{continue: false, stopReason: reason}` — stop the agent
    pub fn block(reason: impl Into<String>) -> Self {
        HookOutput {
            continue_: Some(false),
            stop_reason: Some(reason.into()),
            ..Default::default()
        }
    }

    /// `{continue: true, decision: approve}` — approve without a reason.
    ///
    /// The `reason` key is left off the wire entirely.
    pub fn approve() -> Self {
        HookOutput {
            continue_: Some(true),
            decision: Some(Decision::Approve),
            ..Default::default()
        }
    }

    /// [`HookOutput::approve`] with a reason attached
    pub fn approve_with_reason(reason: impl Into<String>) -> Self {
        HookOutput {
            reason: Some(reason.into()),
            ..HookOutput::approve()
        }
    }

    /// `{continue: false, decision: block, reason, stopReason}` — refuse
    /// the operation, with the reason mirrored into `stopReason`
    pub fn deny(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        HookOutput {
            continue_: Some(false),
            decision: Some(Decision::Block),
            reason: Some(reason.clone()),
            stop_reason: Some(reason),
            ..Default::default()
        }
    }

    /// Default-true continue semantics: absent means "keep going"
    pub fn should_continue(&self) -> bool {
        self.continue_.unwrap_or(true)
    }
}
