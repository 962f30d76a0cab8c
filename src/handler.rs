//! Handler registration: tagged async functions folded into a lookup table

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::event::HookEventName;
use crate::input::HookInput;
use crate::output::HookOutput;

/// Future returned by a registered handler
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<HookOutput>>;

/// Type-erased handler function. Stored behind an `Arc` so decorators can
/// clone it into the futures they build.
pub(crate) type HandlerFn = Arc<dyn Fn(HookInput) -> HandlerFuture + Send + Sync>;

/// A handler paired with the event it serves.
///
/// Build one with [`crate::helpers::handler`], which also narrows the
/// dispatcher's untyped input down to the event's payload type.
#[derive(Clone)]
pub struct TaggedHandler {
    event: HookEventName,
    pub(crate) func: HandlerFn,
}

impl TaggedHandler {
    pub fn new<F>(event: HookEventName, func: F) -> Self
    where
        F: Fn(HookInput) -> HandlerFuture + Send + Sync + 'static,
    {
        TaggedHandler {
            event,
            func: Arc::new(func),
        }
    }

    pub fn event(&self) -> HookEventName {
        self.event
    }

    /// Runs the handler on one input
    pub async fn invoke(&self, input: HookInput) -> anyhow::Result<HookOutput> {
        (self.func)(input).await
    }
}

impl std::fmt::Debug for TaggedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaggedHandler")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

/// Lookup table from event to handler.
///
/// Registering two handlers for the same event keeps the later one; the
/// last write wins.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    handlers: HashMap<HookEventName, TaggedHandler>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a list of tagged handlers into a registry
    pub fn from_handlers(handlers: impl IntoIterator<Item = TaggedHandler>) -> Self {
        let mut registry = Self::new();
        for handler in handlers {
            registry.insert(handler);
        }
        registry
    }

    /// Builder-style registration
    pub fn with(mut self, handler: TaggedHandler) -> Self {
        self.insert(handler);
        self
    }

    pub fn insert(&mut self, handler: TaggedHandler) {
        self.handlers.insert(handler.event(), handler);
    }

    pub fn get(&self, event: HookEventName) -> Option<&TaggedHandler> {
        self.handlers.get(&event)
    }

    pub fn contains(&self, event: HookEventName) -> bool {
        self.handlers.contains_key(&event)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Conditions narrowing when a configured hook runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookMatcher {
    /// Tool name to match, for the tool events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Declarative description of a hook binding, as it would appear in the
/// host's settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookConfig {
    pub event: HookEventName,
    pub command: String,
    #[serde(
        rename = "timeout",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<HookMatcher>,
}

impl HookConfig {
    pub fn new(event: HookEventName, command: impl Into<String>) -> Self {
        HookConfig {
            event,
            command: command.into(),
            timeout_ms: None,
            description: None,
            matcher: None,
        }
    }
}

/// Ambient details recorded alongside one handler execution
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub started_at: DateTime<Utc>,
    pub config: Option<HookConfig>,
    pub metadata: Option<Map<String, Value>>,
}

/// Outcome of running a handler once, with timing attached.
///
/// Returned by [`crate::helpers::execute_hook`]; the handler's failure is
/// carried here instead of being propagated.
#[derive(Debug)]
pub struct HookExecution {
    pub duration: std::time::Duration,
    pub outcome: anyhow::Result<HookOutput>,
    pub context: ExecutionContext,
}

impl HookExecution {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn output(&self) -> Option<&HookOutput> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        self.outcome.as_ref().err()
    }
}
