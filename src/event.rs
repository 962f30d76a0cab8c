//! Event taxonomy for the Claude Code lifecycle hook protocol

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle events the host can invoke a hook for.
///
/// The enum variants are the exact wire strings the host passes as the
/// first positional argument and inside the payload's `hook_event_name`
/// field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEventName {
    /// Fired before a tool executes. The hook can approve or block it.
    PreToolUse,
    /// Fired after a tool finishes, with the tool's response attached.
    PostToolUse,
    /// Fired when the host surfaces a notification message.
    Notification,
    /// Fired when the main agent is about to stop responding.
    Stop,
    /// Fired when a subagent is about to stop responding.
    SubagentStop,
    /// Fired when the user submits a prompt, before the agent sees it.
    UserPromptSubmit,
    /// Fired before the host compacts the conversation transcript.
    PreCompact,
    /// Fired when a session starts or resumes.
    SessionStart,
    /// Fired when a session ends.
    SessionEnd,
}

/// Error returned when a string is not a known hook event name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown hook event name '{0}'")]
pub struct UnknownHookEvent(pub String);

impl HookEventName {
    /// Every event the protocol defines, in wire order
    pub const ALL: [HookEventName; 9] = [
        HookEventName::PreToolUse,
        HookEventName::PostToolUse,
        HookEventName::Notification,
        HookEventName::Stop,
        HookEventName::SubagentStop,
        HookEventName::UserPromptSubmit,
        HookEventName::PreCompact,
        HookEventName::SessionStart,
        HookEventName::SessionEnd,
    ];

    /// Wire string for this event
    pub fn as_str(self) -> &'static str {
        match self {
            HookEventName::PreToolUse => "PreToolUse",
            HookEventName::PostToolUse => "PostToolUse",
            HookEventName::Notification => "Notification",
            HookEventName::Stop => "Stop",
            HookEventName::SubagentStop => "SubagentStop",
            HookEventName::UserPromptSubmit => "UserPromptSubmit",
            HookEventName::PreCompact => "PreCompact",
            HookEventName::SessionStart => "SessionStart",
            HookEventName::SessionEnd => "SessionEnd",
        }
    }

    /// Whether the hosting process must exit after responding to this event.
    ///
    /// The dispatcher consults this single table instead of special-casing
    /// events in its control flow.
    pub fn is_terminal(self) -> bool {
        matches!(self, HookEventName::Stop | HookEventName::SubagentStop)
    }
}

impl fmt::Display for HookEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEventName {
    type Err = UnknownHookEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookEventName::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownHookEvent(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_string_round_trip() {
        for event in HookEventName::ALL {
            let parsed: HookEventName = event.as_str().parse().unwrap();
            assert_eq!(parsed, event);
        }
    }

    #[test]
    fn test_unknown_event_name() {
        let err = "NotAnEvent".parse::<HookEventName>().unwrap_err();
        assert_eq!(err.to_string(), "unknown hook event name 'NotAnEvent'");

        assert!("".parse::<HookEventName>().is_err());
        // Tags are case-sensitive on the wire
        assert!("pretooluse".parse::<HookEventName>().is_err());
    }

    #[test]
    fn test_terminal_subset() {
        let terminal: Vec<_> = HookEventName::ALL
            .into_iter()
            .filter(|event| event.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![HookEventName::Stop, HookEventName::SubagentStop]
        );
    }

    #[test]
    fn test_serde_uses_wire_strings() {
        let json = serde_json::to_string(&HookEventName::UserPromptSubmit).unwrap();
        assert_eq!(json, "\"UserPromptSubmit\"");

        let event: HookEventName = serde_json::from_str("\"SubagentStop\"").unwrap();
        assert_eq!(event, HookEventName::SubagentStop);
    }
}
