//! Non-blocking transport dispatch.
//!
//! When a message asks for non-blocking transport the caller of `send` must
//! not wait for the transport to finish (an HTTP sender, for instance, blocks
//! until the peer acknowledges). The send is moved onto a background task;
//! its failure can no longer be returned to the caller, so it is reported
//! through the callback registered for the message instead.

use crate::config::DispatchConfig;
use flowline_core::{
    BoxError, Callback, DISABLE_ASYNC_CALLBACK_ON_TRANSPORT_ERROR, EngineError, MessageContext,
    TransportSender,
};
use std::sync::Arc;
use tokio::{runtime::Handle, sync::Semaphore, task::JoinHandle};
use tracing::{debug, info};

/// Runs transport sends on background tasks, bounded by a shared pool.
#[derive(Debug, Clone)]
pub struct NonBlockingDispatcher {
    slots: Arc<Semaphore>,
}

impl NonBlockingDispatcher {
    /// Create a dispatcher sized by `config`.
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(config.permits())),
        }
    }

    /// Number of sends that could start right now without queueing.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Send `ctx` through `sender` on a background task.
    ///
    /// Returns immediately. The handle may be awaited by callers that want
    /// to know when the attempt is over; dropping it detaches the task.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] when called outside a tokio runtime.
    pub fn dispatch(
        &self,
        mut ctx: MessageContext,
        sender: Arc<dyn TransportSender>,
    ) -> Result<JoinHandle<()>, EngineError> {
        let runtime = Handle::try_current().map_err(|_| {
            EngineError::configuration("Non-blocking transport requires a tokio runtime")
        })?;
        let slots = Arc::clone(&self.slots);
        Ok(runtime.spawn(async move {
            // A closed pool only means no more throttling.
            let _slot = slots.acquire_owned().await.ok();
            if let Err(error) = sender.invoke(&mut ctx).await {
                info!(
                    message_id = %ctx.message_id(),
                    error = %error,
                    "non-blocking transport send failed"
                );
                report_transport_error(&ctx, error);
            }
        }))
    }
}

/// Hand a background send failure to the callback waiting on the message.
fn report_transport_error(ctx: &MessageContext, error: BoxError) {
    if ctx
        .properties()
        .contains(DISABLE_ASYNC_CALLBACK_ON_TRANSPORT_ERROR)
    {
        return;
    }

    match lookup_callback(ctx) {
        Some(callback) => callback.on_error(error),
        None => debug!(
            message_id = %ctx.message_id(),
            "no callback registered for failed non-blocking send"
        ),
    }
}

fn lookup_callback(ctx: &MessageContext) -> Option<Arc<dyn Callback>> {
    let operation_context = ctx.operation_context()?;
    let receiver = operation_context.operation().message_receiver()?;
    receiver
        .callback_registry()?
        .lookup_callback(ctx.message_id())
}
