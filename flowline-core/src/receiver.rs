//! Inbound delivery and asynchronous callback capabilities.

use crate::{context::MessageContext, error::BoxError};
use async_trait::async_trait;
use std::sync::Arc;

/// Final consumer of an inbound message once its chain has completed.
#[async_trait]
pub trait MessageReceiver: Send + Sync + 'static {
    /// Deliver the message.
    async fn receive(&self, ctx: &mut MessageContext) -> Result<(), BoxError>;

    /// Pending callbacks keyed by message id, if this receiver keeps any.
    ///
    /// Used to report failures of non-blocking sends back to the caller
    /// that is waiting for a response.
    fn callback_registry(&self) -> Option<&dyn CallbackRegistry> {
        None
    }
}

/// Completion notification for an asynchronous exchange.
pub trait Callback: Send + Sync + 'static {
    /// The response for the exchange arrived.
    fn on_complete(&self, ctx: &MessageContext) {
        let _ = ctx;
    }

    /// The exchange failed, e.g. the background transport could not send
    /// the request.
    fn on_error(&self, error: BoxError);
}

/// Lookup of pending callbacks by message identifier.
pub trait CallbackRegistry: Send + Sync {
    /// Find the callback registered for `message_id`.
    fn lookup_callback(&self, message_id: &str) -> Option<Arc<dyn Callback>>;
}
