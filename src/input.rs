//! Typed input payloads for every hook event
//!
//! [`HookInput`] is a tagged union discriminated by the payload's
//! `hook_event_name` field. Each variant keeps unrecognized fields in an
//! extras map, so payloads round-trip losslessly even when the host adds
//! fields this library does not know about yet.

use serde::de::Error as _;
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::event::HookEventName;

/// How a session came into existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    Startup,
    Resume,
    Clear,
    Compact,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    Clear,
    Logout,
    PromptInputExit,
    Other,
}

/// Input for `PreToolUse`: a tool is about to execute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreToolUseInput {
    pub session_id: String,
    pub transcript_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    pub tool_name: String,
    pub tool_input: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for `PostToolUse`: a tool finished executing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostToolUseInput {
    pub session_id: String,
    pub transcript_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    pub tool_name: String,
    pub tool_input: Map<String, Value>,
    pub tool_response: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for `Notification`: the host surfaced a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationInput {
    pub session_id: String,
    pub transcript_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for `Stop`: the main agent is about to stop responding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopInput {
    pub session_id: String,
    pub transcript_path: String,
    /// True when this stop was already triggered by a stop hook, so
    /// handlers can avoid blocking the agent in a loop
    pub stop_hook_active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for `SubagentStop`: a subagent is about to stop responding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubagentStopInput {
    pub session_id: String,
    pub transcript_path: String,
    pub stop_hook_active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for `UserPromptSubmit`: the user submitted a prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPromptSubmitInput {
    pub session_id: String,
    pub transcript_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    pub prompt: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for `PreCompact`: the transcript is about to be compacted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreCompactInput {
    pub session_id: String,
    pub transcript_path: String,
    /// What initiated the compaction, e.g. `manual` or `auto`
    pub trigger: String,
    pub custom_instructions: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for `SessionStart`: a session started or resumed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStartInput {
    pub session_id: String,
    pub transcript_path: String,
    pub source: SessionSource,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for `SessionEnd`: a session ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEndInput {
    pub session_id: String,
    pub transcript_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    pub reason: SessionEndReason,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One hook input payload, discriminated by `hook_event_name`.
///
/// A value belongs to a variant exactly when its `hook_event_name` field
/// equals that variant's tag; serialization writes the tag back out, and
/// deserialization rejects unknown tags.
#[derive(Debug, Clone, PartialEq)]
pub enum HookInput {
    PreToolUse(PreToolUseInput),
    PostToolUse(PostToolUseInput),
    Notification(NotificationInput),
    Stop(StopInput),
    SubagentStop(SubagentStopInput),
    UserPromptSubmit(UserPromptSubmitInput),
    PreCompact(PreCompactInput),
    SessionStart(SessionStartInput),
    SessionEnd(SessionEndInput),
}

impl HookInput {
    /// The event this payload belongs to
    pub fn event_name(&self) -> HookEventName {
        match self {
            HookInput::PreToolUse(_) => HookEventName::PreToolUse,
            HookInput::PostToolUse(_) => HookEventName::PostToolUse,
            HookInput::Notification(_) => HookEventName::Notification,
            HookInput::Stop(_) => HookEventName::Stop,
            HookInput::SubagentStop(_) => HookEventName::SubagentStop,
            HookInput::UserPromptSubmit(_) => HookEventName::UserPromptSubmit,
            HookInput::PreCompact(_) => HookEventName::PreCompact,
            HookInput::SessionStart(_) => HookEventName::SessionStart,
            HookInput::SessionEnd(_) => HookEventName::SessionEnd,
        }
    }

    /// Whether this payload belongs to the given event
    pub fn is_event(&self, event: HookEventName) -> bool {
        self.event_name() == event
    }

    /// Session identifier common to every event
    pub fn session_id(&self) -> &str {
        match self {
            HookInput::PreToolUse(p) => &p.session_id,
            HookInput::PostToolUse(p) => &p.session_id,
            HookInput::Notification(p) => &p.session_id,
            HookInput::Stop(p) => &p.session_id,
            HookInput::SubagentStop(p) => &p.session_id,
            HookInput::UserPromptSubmit(p) => &p.session_id,
            HookInput::PreCompact(p) => &p.session_id,
            HookInput::SessionStart(p) => &p.session_id,
            HookInput::SessionEnd(p) => &p.session_id,
        }
    }

    /// Transcript file path common to every event
    pub fn transcript_path(&self) -> &str {
        match self {
            HookInput::PreToolUse(p) => &p.transcript_path,
            HookInput::PostToolUse(p) => &p.transcript_path,
            HookInput::Notification(p) => &p.transcript_path,
            HookInput::Stop(p) => &p.transcript_path,
            HookInput::SubagentStop(p) => &p.transcript_path,
            HookInput::UserPromptSubmit(p) => &p.transcript_path,
            HookInput::PreCompact(p) => &p.transcript_path,
            HookInput::SessionStart(p) => &p.transcript_path,
            HookInput::SessionEnd(p) => &p.transcript_path,
        }
    }

    /// Working directory, for the events that carry one
    pub fn cwd(&self) -> Option<&str> {
        match self {
            HookInput::PreToolUse(p) => p.cwd.as_deref(),
            HookInput::PostToolUse(p) => p.cwd.as_deref(),
            HookInput::Notification(p) => p.cwd.as_deref(),
            HookInput::UserPromptSubmit(p) => p.cwd.as_deref(),
            HookInput::SessionEnd(p) => p.cwd.as_deref(),
            HookInput::Stop(_)
            | HookInput::SubagentStop(_)
            | HookInput::PreCompact(_)
            | HookInput::SessionStart(_) => None,
        }
    }
}

/// Payload type belonging to exactly one hook event.
///
/// This is the seam used by tag-directed narrowing: typed parsing
/// ([`crate::validate::parse_hook_input`]) and typed handler construction
/// ([`crate::helpers::handler`]) both pick their event from `EVENT` instead
/// of taking it as a runtime argument that could disagree with the type.
pub trait HookEventPayload: Sized {
    /// The event this payload type belongs to
    const EVENT: HookEventName;

    /// Extract this payload from the union if the variant matches
    fn from_hook_input(input: HookInput) -> Option<Self>;

    /// Wrap this payload back into the union
    fn into_hook_input(self) -> HookInput;
}

macro_rules! impl_hook_event_payload {
    ($($payload:ty => $variant:ident),+ $(,)?) => {
        $(
            impl HookEventPayload for $payload {
                const EVENT: HookEventName = HookEventName::$variant;

                fn from_hook_input(input: HookInput) -> Option<Self> {
                    match input {
                        HookInput::$variant(payload) => Some(payload),
                        _ => None,
                    }
                }

                fn into_hook_input(self) -> HookInput {
                    HookInput::$variant(self)
                }
            }
        )+
    };
}

impl_hook_event_payload! {
    PreToolUseInput => PreToolUse,
    PostToolUseInput => PostToolUse,
    NotificationInput => Notification,
    StopInput => Stop,
    SubagentStopInput => SubagentStop,
    UserPromptSubmitInput => UserPromptSubmit,
    PreCompactInput => PreCompact,
    SessionStartInput => SessionStart,
    SessionEndInput => SessionEnd,
}

// The tag lives at the same level as the payload fields, and every variant
// also carries a flattened extras map. serde's derived internal tagging and
// `flatten` disagree about who owns the tag field in that combination, so
// the union is (de)serialized by hand: strip the tag, dispatch on it, and
// let the payload structs handle the rest.
impl<'de> Deserialize<'de> for HookInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let event = match fields.remove("hook_event_name") {
            Some(Value::String(tag)) => tag
                .parse::<HookEventName>()
                .map_err(D::Error::custom)?,
            Some(_) => return Err(D::Error::custom("hook_event_name must be a string")),
            None => return Err(D::Error::missing_field("hook_event_name")),
        };
        let payload = Value::Object(fields);

        let input = match event {
            HookEventName::PreToolUse => {
                HookInput::PreToolUse(serde_json::from_value(payload).map_err(D::Error::custom)?)
            }
            HookEventName::PostToolUse => {
                HookInput::PostToolUse(serde_json::from_value(payload).map_err(D::Error::custom)?)
            }
            HookEventName::Notification => {
                HookInput::Notification(serde_json::from_value(payload).map_err(D::Error::custom)?)
            }
            HookEventName::Stop => {
                HookInput::Stop(serde_json::from_value(payload).map_err(D::Error::custom)?)
            }
            HookEventName::SubagentStop => {
                HookInput::SubagentStop(serde_json::from_value(payload).map_err(D::Error::custom)?)
            }
            HookEventName::UserPromptSubmit => HookInput::UserPromptSubmit(
                serde_json::from_value(payload).map_err(D::Error::custom)?,
            ),
            HookEventName::PreCompact => {
                HookInput::PreCompact(serde_json::from_value(payload).map_err(D::Error::custom)?)
            }
            HookEventName::SessionStart => {
                HookInput::SessionStart(serde_json::from_value(payload).map_err(D::Error::custom)?)
            }
            HookEventName::SessionEnd => {
                HookInput::SessionEnd(serde_json::from_value(payload).map_err(D::Error::custom)?)
            }
        };

        Ok(input)
    }
}

impl Serialize for HookInput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let payload = match self {
            HookInput::PreToolUse(p) => serde_json::to_value(p),
            HookInput::PostToolUse(p) => serde_json::to_value(p),
            HookInput::Notification(p) => serde_json::to_value(p),
            HookInput::Stop(p) => serde_json::to_value(p),
            HookInput::SubagentStop(p) => serde_json::to_value(p),
            HookInput::UserPromptSubmit(p) => serde_json::to_value(p),
            HookInput::PreCompact(p) => serde_json::to_value(p),
            HookInput::SessionStart(p) => serde_json::to_value(p),
            HookInput::SessionEnd(p) => serde_json::to_value(p),
        }
        .map_err(S::Error::custom)?;

        let Value::Object(fields) = payload else {
            return Err(S::Error::custom("hook payload must serialize to an object"));
        };

        let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
        map.serialize_entry("hook_event_name", self.event_name().as_str())?;
        for (key, value) in &fields {
            // A stray copy of the tag in the extras map must not emit a
            // second discriminant
            if key != "hook_event_name" {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}
