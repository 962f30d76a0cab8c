//! Runtime validation of untrusted hook payloads
//!
//! Every entry point is a total function over `serde_json::Value`: invalid
//! input comes back as a [`ValidationError`] listing field-level issues,
//! never as a panic. Required fields and per-event decision vocabularies
//! are table-driven so each event's contract is written down exactly once.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::event::HookEventName;
use crate::input::{HookEventPayload, HookInput};
use crate::output::{Decision, HookOutput};

/// Outcome of a validation entry point: the narrowed typed value, or a
/// structured description of what was wrong
pub type ValidationResult<T> = Result<T, ValidationError>;

/// One problem found in a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path to the offending field; empty for payload-level issues
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// A payload failed validation; carries every issue found, not just the
/// first
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid hook payload: {}", format_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        ValidationError { issues }
    }

    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            issues: vec![ValidationIssue::new(path, message)],
        }
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ValidationIssue::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Primitive shape a field must have when present
#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Str,
    Bool,
    Object,
    OneOf(&'static [&'static str]),
}

struct FieldSpec {
    name: &'static str,
    kind: FieldKind,
    required: bool,
}

const fn req(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
    }
}

const fn opt(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: false,
    }
}

const SESSION_SOURCES: &[&str] = &["startup", "resume", "clear", "compact"];
const SESSION_END_REASONS: &[&str] = &["clear", "logout", "prompt_input_exit", "other"];
const PERMISSION_DECISIONS: &[&str] = &["allow", "deny", "ask"];

/// Fields every hook input must carry
const BASE_INPUT_FIELDS: &[FieldSpec] = &[
    req("session_id", FieldKind::Str),
    req("transcript_path", FieldKind::Str),
];

/// Event-specific input fields, mirroring the host's payload contract
fn event_input_fields(event: HookEventName) -> &'static [FieldSpec] {
    const PRE_TOOL_USE: &[FieldSpec] = &[
        req("tool_name", FieldKind::Str),
        req("tool_input", FieldKind::Object),
        opt("cwd", FieldKind::Str),
    ];
    const POST_TOOL_USE: &[FieldSpec] = &[
        req("tool_name", FieldKind::Str),
        req("tool_input", FieldKind::Object),
        req("tool_response", FieldKind::Object),
        opt("cwd", FieldKind::Str),
    ];
    const NOTIFICATION: &[FieldSpec] = &[
        req("message", FieldKind::Str),
        opt("cwd", FieldKind::Str),
    ];
    const STOP: &[FieldSpec] = &[req("stop_hook_active", FieldKind::Bool)];
    const USER_PROMPT_SUBMIT: &[FieldSpec] = &[
        req("prompt", FieldKind::Str),
        opt("cwd", FieldKind::Str),
    ];
    const PRE_COMPACT: &[FieldSpec] = &[
        req("trigger", FieldKind::Str),
        req("custom_instructions", FieldKind::Str),
    ];
    const SESSION_START: &[FieldSpec] = &[req("source", FieldKind::OneOf(SESSION_SOURCES))];
    const SESSION_END: &[FieldSpec] = &[
        req("reason", FieldKind::OneOf(SESSION_END_REASONS)),
        opt("cwd", FieldKind::Str),
    ];

    match event {
        HookEventName::PreToolUse => PRE_TOOL_USE,
        HookEventName::PostToolUse => POST_TOOL_USE,
        HookEventName::Notification => NOTIFICATION,
        HookEventName::Stop | HookEventName::SubagentStop => STOP,
        HookEventName::UserPromptSubmit => USER_PROMPT_SUBMIT,
        HookEventName::PreCompact => PRE_COMPACT,
        HookEventName::SessionStart => SESSION_START,
        HookEventName::SessionEnd => SESSION_END,
    }
}

/// Optional typed fields shared by every hook output
const OUTPUT_FIELDS: &[FieldSpec] = &[
    opt("continue", FieldKind::Bool),
    opt("stopReason", FieldKind::Str),
    opt("suppressOutput", FieldKind::Bool),
    opt("systemMessage", FieldKind::Str),
    opt("reason", FieldKind::Str),
    opt("updatedPrompt", FieldKind::Str),
];

/// Decision values each event's output may carry
fn allowed_decisions(event: HookEventName) -> &'static [Decision] {
    match event {
        HookEventName::PreToolUse
        | HookEventName::UserPromptSubmit
        | HookEventName::PreCompact => &[Decision::Approve, Decision::Block],
        HookEventName::PostToolUse | HookEventName::Stop | HookEventName::SubagentStop => {
            &[Decision::Block]
        }
        HookEventName::Notification
        | HookEventName::SessionStart
        | HookEventName::SessionEnd => &[],
    }
}

fn require_object(value: &Value) -> Result<&Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::single("", "expected a JSON object"))
}

fn check_field(obj: &Map<String, Value>, spec: &FieldSpec, issues: &mut Vec<ValidationIssue>) {
    let Some(value) = obj.get(spec.name) else {
        if spec.required {
            issues.push(ValidationIssue::new(spec.name, "missing required field"));
        }
        return;
    };

    match spec.kind {
        FieldKind::Str => {
            if !value.is_string() {
                issues.push(ValidationIssue::new(spec.name, "expected a string"));
            }
        }
        FieldKind::Bool => {
            if !value.is_boolean() {
                issues.push(ValidationIssue::new(spec.name, "expected a boolean"));
            }
        }
        FieldKind::Object => {
            if !value.is_object() {
                issues.push(ValidationIssue::new(spec.name, "expected an object"));
            }
        }
        FieldKind::OneOf(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => {}
            Some(_) => issues.push(ValidationIssue::new(
                spec.name,
                format!("must be one of: {}", allowed.join(", ")),
            )),
            None => issues.push(ValidationIssue::new(spec.name, "expected a string")),
        },
    }
}

/// Reads the discriminant off an untrusted object
fn classify(obj: &Map<String, Value>) -> ValidationResult<HookEventName> {
    match obj.get("hook_event_name") {
        None => Err(ValidationError::single(
            "hook_event_name",
            "missing required field",
        )),
        Some(Value::String(tag)) => tag
            .parse::<HookEventName>()
            .map_err(|e| ValidationError::single("hook_event_name", e.to_string())),
        Some(_) => Err(ValidationError::single(
            "hook_event_name",
            "expected a string",
        )),
    }
}

/// Validates an untrusted value against the full input union, classifying
/// it by its own `hook_event_name` field.
pub fn validate_hook_input(value: &Value) -> ValidationResult<HookInput> {
    let obj = require_object(value)?;
    let event = classify(obj)?;

    let mut issues = Vec::new();
    for spec in BASE_INPUT_FIELDS {
        check_field(obj, spec, &mut issues);
    }
    for spec in event_input_fields(event) {
        check_field(obj, spec, &mut issues);
    }
    if !issues.is_empty() {
        return Err(ValidationError::new(issues));
    }

    serde_json::from_value(value.clone())
        .map_err(|e| ValidationError::single("", e.to_string()))
}

/// Validates and narrows an untrusted value to one event's payload type.
///
/// The tag is compared first, so a payload for a different event fails
/// with a message naming both the expected and the actual tag instead of
/// that other event's field issues; nothing is ever coerced.
pub fn parse_hook_input<T: HookEventPayload>(value: &Value) -> ValidationResult<T> {
    let obj = require_object(value)?;
    let actual = classify(obj)?;
    let mismatch = || {
        ValidationError::single(
            "hook_event_name",
            format!("expected hook event '{}', got '{}'", T::EVENT, actual),
        )
    };
    if actual != T::EVENT {
        return Err(mismatch());
    }
    let input = validate_hook_input(value)?;
    T::from_hook_input(input).ok_or_else(mismatch)
}

/// Validates an untrusted value as a hook event name
pub fn validate_hook_event_name(value: &Value) -> ValidationResult<HookEventName> {
    match value {
        Value::String(s) => s
            .parse::<HookEventName>()
            .map_err(|e| ValidationError::single("", e.to_string())),
        _ => Err(ValidationError::single("", "expected a string")),
    }
}

/// Validates an output against the union of every event's contract.
///
/// Accepts any decision value some event permits; use
/// [`validate_hook_output_for`] to hold an output to one event's
/// vocabulary.
pub fn validate_hook_output(value: &Value) -> ValidationResult<HookOutput> {
    check_output(value, &[Decision::Approve, Decision::Block], false)
}

/// Validates an output against one event's contract, enforcing that
/// event's decision vocabulary
pub fn validate_hook_output_for(
    value: &Value,
    event: HookEventName,
) -> ValidationResult<HookOutput> {
    check_output(
        value,
        allowed_decisions(event),
        event == HookEventName::UserPromptSubmit,
    )
}

fn check_output(
    value: &Value,
    allowed: &[Decision],
    require_additional_context: bool,
) -> ValidationResult<HookOutput> {
    let obj = require_object(value)?;
    let mut issues = Vec::new();

    for spec in OUTPUT_FIELDS {
        check_field(obj, spec, &mut issues);
    }
    check_decision(obj, allowed, &mut issues);
    check_context_files(obj, &mut issues);
    check_hook_specific_output(obj, require_additional_context, &mut issues);

    if !issues.is_empty() {
        return Err(ValidationError::new(issues));
    }

    serde_json::from_value(value.clone())
        .map_err(|e| ValidationError::single("", e.to_string()))
}

fn check_decision(
    obj: &Map<String, Value>,
    allowed: &[Decision],
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(value) = obj.get("decision") else {
        return;
    };
    let Some(decision) = value.as_str() else {
        issues.push(ValidationIssue::new("decision", "expected a string"));
        return;
    };
    if allowed.is_empty() {
        issues.push(ValidationIssue::new(
            "decision",
            "no decision is permitted for this event",
        ));
    } else if !allowed.iter().any(|d| d.as_str() == decision) {
        issues.push(ValidationIssue::new(
            "decision",
            format!(
                "must be one of: {}",
                allowed
                    .iter()
                    .map(|d| d.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ));
    }
}

fn check_context_files(obj: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) {
    let Some(value) = obj.get("contextFiles") else {
        return;
    };
    let Some(items) = value.as_array() else {
        issues.push(ValidationIssue::new(
            "contextFiles",
            "expected an array of strings",
        ));
        return;
    };
    for (index, item) in items.iter().enumerate() {
        if !item.is_string() {
            issues.push(ValidationIssue::new(
                format!("contextFiles[{index}]"),
                "expected a string",
            ));
        }
    }
}

fn check_hook_specific_output(
    obj: &Map<String, Value>,
    require_additional_context: bool,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(value) = obj.get("hookSpecificOutput") else {
        return;
    };
    let Some(nested) = value.as_object() else {
        issues.push(ValidationIssue::new(
            "hookSpecificOutput",
            "expected an object",
        ));
        return;
    };

    let mut nested_fields = vec![req("hookEventName", FieldKind::Str)];
    if require_additional_context {
        nested_fields.push(req("additionalContext", FieldKind::Str));
    } else {
        nested_fields.push(opt("additionalContext", FieldKind::Str));
    }
    nested_fields.push(opt(
        "permissionDecision",
        FieldKind::OneOf(PERMISSION_DECISIONS),
    ));
    nested_fields.push(opt("permissionDecisionReason", FieldKind::Str));

    let mut nested_issues = Vec::new();
    for spec in &nested_fields {
        check_field(nested, spec, &mut nested_issues);
    }
    for issue in nested_issues {
        issues.push(ValidationIssue::new(
            format!("hookSpecificOutput.{}", issue.path),
            issue.message,
        ));
    }
}

/// Decodes raw text as JSON, mapping decode failures into the same issue
/// shape schema mismatches use
pub fn parse_json(text: &str) -> ValidationResult<Value> {
    serde_json::from_str(text)
        .map_err(|e| ValidationError::single("", format!("Invalid JSON: {e}")))
}

/// Shallow check that a value has the basic structure of a hook input
pub fn is_hook_input_like(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    obj.get("hook_event_name").is_some_and(Value::is_string)
        && obj.get("session_id").is_some_and(Value::is_string)
}

/// Shallow check that a value has the basic structure of a hook output
pub fn is_hook_output_like(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    obj.get("continue").is_none_or(Value::is_boolean)
        && obj.get("stopReason").is_none_or(Value::is_string)
        && obj.get("suppressOutput").is_none_or(Value::is_boolean)
}
