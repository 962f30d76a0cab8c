//! Decorators and conveniences layered over the bare handler table

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future;
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::error::HookError;
use crate::handler::{
    ExecutionContext, HandlerFuture, HookConfig, HookExecution, TaggedHandler,
};
use crate::input::{HookEventPayload, HookInput};
use crate::output::HookOutput;

/// Builds a registrable handler from a function typed to one event's
/// payload.
///
/// The wrapper narrows the dispatcher's untyped input before calling
/// `func`; an input carrying a different tag resolves to an event-mismatch
/// error instead of reaching the function.
pub fn handler<T, F, Fut>(func: F) -> TaggedHandler
where
    T: HookEventPayload + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<HookOutput>> + Send + 'static,
{
    TaggedHandler::new(T::EVENT, move |input: HookInput| -> HandlerFuture {
        let actual = input.event_name();
        match T::from_hook_input(input) {
            Some(payload) => Box::pin(func(payload)),
            None => Box::pin(future::ready(Err(HookError::EventMismatch {
                expected: T::EVENT,
                actual,
            }
            .into()))),
        }
    })
}

/// Runs a handler once and reports the outcome with timing attached.
///
/// Handler failures land in the returned [`HookExecution`], never in a
/// propagated error.
pub async fn execute_hook(
    handler: &TaggedHandler,
    input: HookInput,
    config: Option<HookConfig>,
    metadata: Option<Map<String, Value>>,
) -> HookExecution {
    let started_at = Utc::now();
    let clock = Instant::now();
    let outcome = handler.invoke(input).await;
    HookExecution {
        duration: clock.elapsed(),
        outcome,
        context: ExecutionContext {
            started_at,
            config,
            metadata,
        },
    }
}

/// Wraps a handler with start and completion logs.
///
/// Failures are logged and re-propagated; this is a pass-through
/// decorator, not an error boundary.
pub fn with_logging(handler: TaggedHandler) -> TaggedHandler {
    let event = handler.event();
    let func = handler.func;
    TaggedHandler::new(event, move |input: HookInput| -> HandlerFuture {
        let func = Arc::clone(&func);
        Box::pin(async move {
            let session = input.session_id().to_string();
            info!("Executing hook '{}' (session {})", event, session);
            match func(input).await {
                Ok(output) => {
                    info!("Hook '{}' completed", event);
                    Ok(output)
                }
                Err(err) => {
                    error!("Hook '{}' failed: {}", event, err);
                    Err(err)
                }
            }
        })
    })
}

/// Races a handler against a deadline.
///
/// If the deadline elapses first, the invocation resolves to a timeout
/// error naming the deadline in milliseconds and the event. The losing
/// invocation is dropped at its next suspension point; tasks it already
/// spawned keep running.
pub fn with_timeout(handler: TaggedHandler, timeout: Duration) -> TaggedHandler {
    let event = handler.event();
    let func = handler.func;
    TaggedHandler::new(event, move |input: HookInput| -> HandlerFuture {
        let func = Arc::clone(&func);
        Box::pin(async move {
            match tokio::time::timeout(timeout, func(input)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(HookError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                    event,
                }
                .into()),
            }
        })
    })
}
