//! Error types shared across the hook library

use thiserror::Error;

use crate::event::HookEventName;
use crate::runtime::EnvironmentKind;

/// Errors produced by the dispatcher, the runtime adapter, and the handler
/// decorators.
///
/// Validation failures have their own structured type
/// ([`crate::validate::ValidationError`]); handler failures travel as
/// [`anyhow::Error`] so hook authors can return whatever error type they
/// already use.
#[derive(Debug, Error)]
pub enum HookError {
    /// A handler wrapped with [`crate::helpers::with_timeout`] did not
    /// finish in time
    #[error("hook timeout after {timeout_ms}ms: {event}")]
    Timeout {
        timeout_ms: u64,
        event: HookEventName,
    },

    /// A typed handler was invoked with a payload for a different event
    #[error("expected hook event '{expected}', got '{actual}'")]
    EventMismatch {
        expected: HookEventName,
        actual: HookEventName,
    },

    /// Standard input cannot be read in the current environment. There is
    /// no safe empty-input default, so this is fatal to the invocation.
    #[error("cannot read standard input in {kind} environment")]
    InputUnavailable { kind: EnvironmentKind },

    /// Reading stdin or writing the response line failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
