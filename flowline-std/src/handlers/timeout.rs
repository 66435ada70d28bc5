//! Timeout handler for time-limited invocation.
//!
//! The engine itself defines no timeouts; this wrapper bounds a single
//! handler. Requires the tokio runtime.

use flowline_core::{BoxError, Handler, HandlerError, InvocationResponse, MessageContext};
use std::time::Duration;
use tokio::time::timeout;

/// A handler that fails with [`HandlerError::Timeout`] when the inner
/// handler's `invoke` does not finish in time.
///
/// # Example
///
/// ```rust,ignore
/// let timed = TimeoutHandler::millis(TokenLookupHandler::new(store), 250);
/// ```
pub struct TimeoutHandler<H> {
    inner: H,
    duration: Duration,
}

impl<H> TimeoutHandler<H> {
    /// Wrap `inner` with a time limit.
    pub fn new(inner: H, duration: Duration) -> Self {
        Self { inner, duration }
    }

    /// Wrap `inner` with a limit in milliseconds.
    pub fn millis(inner: H, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// The configured limit.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The wrapped handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: Handler> Handler for TimeoutHandler<H> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn invoke(&self, ctx: &mut MessageContext) -> Result<InvocationResponse, BoxError> {
        match timeout(self.duration, self.inner.invoke(ctx)).await {
            Ok(result) => result,
            Err(_) => Err(Box::new(HandlerError::Timeout(self.duration))),
        }
    }

    fn flow_complete(&self, ctx: &mut MessageContext) {
        self.inner.flow_complete(ctx);
    }
}
