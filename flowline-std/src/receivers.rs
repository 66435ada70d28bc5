//! Standard message receivers.

use async_trait::async_trait;
use flowline_core::{
    BoxError, Callback, CallbackRegistry, MessageContext, MessageReceiver,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::debug;

/// Error returned when a response arrives that nobody is waiting for.
#[derive(Debug, thiserror::Error)]
pub enum CallbackReceiverError {
    /// The response does not say which request it answers.
    #[error("message `{0}` does not relate to any request")]
    MissingRelatesTo(String),

    /// No callback is registered for the request.
    #[error("no callback registered for request `{0}`")]
    UnknownRequest(String),
}

/// A client-side receiver that hands responses to the callback registered
/// for the request they relate to.
///
/// It doubles as the [`CallbackRegistry`] used to report failures of
/// non-blocking sends.
#[derive(Default)]
pub struct CallbackReceiver {
    callbacks: Mutex<HashMap<String, Arc<dyn Callback>>>,
}

impl CallbackReceiver {
    /// Create a receiver with no pending callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for the request with id `message_id`.
    pub fn register(&self, message_id: impl Into<String>, callback: Arc<dyn Callback>) {
        self.lock().insert(message_id.into(), callback);
    }

    /// Remove and return the callback for `message_id`.
    pub fn unregister(&self, message_id: &str) -> Option<Arc<dyn Callback>> {
        self.lock().remove(message_id)
    }

    /// Number of pending callbacks.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if no callbacks are pending.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<dyn Callback>>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CallbackRegistry for CallbackReceiver {
    fn lookup_callback(&self, message_id: &str) -> Option<Arc<dyn Callback>> {
        self.lock().get(message_id).cloned()
    }
}

#[async_trait]
impl MessageReceiver for CallbackReceiver {
    async fn receive(&self, ctx: &mut MessageContext) -> Result<(), BoxError> {
        let request_id = ctx
            .relates_to()
            .ok_or_else(|| CallbackReceiverError::MissingRelatesTo(ctx.message_id().to_string()))?
            .to_string();
        let callback = self
            .unregister(&request_id)
            .ok_or_else(|| CallbackReceiverError::UnknownRequest(request_id.clone()))?;

        debug!(request_id = %request_id, message_id = %ctx.message_id(), "delivering response to callback");
        callback.on_complete(ctx);
        Ok(())
    }

    fn callback_registry(&self) -> Option<&dyn CallbackRegistry> {
        Some(self)
    }
}
