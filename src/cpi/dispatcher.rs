// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing a request to its handler.
//!
//! [`dispatch`] always produces an envelope: unknown methods, badly typed
//! arguments, handler errors and handler panics all become error envelopes.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{Action, ActionError, ActionRegistry, ActionRequest, ActionResponse};

/// Run the action registered as `method` with positional `args`.
pub async fn dispatch<C>(
    ctx: Arc<C>,
    registry: &ActionRegistry<C>,
    method: &str,
    args: &[Value],
) -> ActionResponse {
    let Some(action) = registry.get(method) else {
        warn!(method, "Action not implemented");
        return ActionResponse::from_error(&ActionError::NotImplemented(method.to_string()));
    };

    debug!(method, args = args.len(), "Invoking action");
    let start_time = Instant::now();

    match invoke_protected(action, ctx, args).await {
        Ok(result) => {
            info!(
                method,
                execution_time_ms = start_time.elapsed().as_millis() as u64,
                "Action completed"
            );
            ActionResponse::success(result)
        }
        Err(err) => {
            error!(
                method,
                error = %err,
                execution_time_ms = start_time.elapsed().as_millis() as u64,
                "Action failed"
            );
            ActionResponse::from_error(&err)
        }
    }
}

/// Parse one JSON request and dispatch it. Malformed input yields a
/// `CloudError` envelope.
pub async fn handle_request<C>(
    ctx: Arc<C>,
    registry: &ActionRegistry<C>,
    input: &str,
) -> ActionResponse {
    match serde_json::from_str::<ActionRequest>(input) {
        Ok(request) => dispatch(ctx, registry, &request.method, &request.arguments).await,
        Err(e) => {
            error!(error = %e, "Malformed CPI request");
            ActionResponse::from_error(&ActionError::InvalidRequest(e.to_string()))
        }
    }
}

/// Call the handler, turning panics raised while starting or polling it
/// into [`ActionError::Panic`].
async fn invoke_protected<C>(
    action: &Action<C>,
    ctx: Arc<C>,
    args: &[Value],
) -> Result<Value, ActionError> {
    let running = match std::panic::catch_unwind(AssertUnwindSafe(|| action.invoke(ctx, args))) {
        Ok(started) => started?,
        Err(panic) => return Err(ActionError::Panic(panic_message(panic.as_ref()))),
    };

    match AssertUnwindSafe(running).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(ActionError::Panic(panic_message(panic.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
