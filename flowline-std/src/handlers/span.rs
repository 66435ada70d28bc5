use flowline_core::{BoxError, Handler, InvocationResponse, MessageContext};
use tracing::{Instrument, info_span};

/// A handler wrapper that instruments the inner handler with a `tracing`
/// span carrying the handler name, message id and flow.
///
/// The completion notification runs inside a span of its own.
pub struct TracingHandler<H> {
    inner: H,
}

impl<H> TracingHandler<H> {
    /// Wrap `inner`.
    pub const fn new(inner: H) -> Self {
        Self { inner }
    }

    /// The wrapped handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: Clone> Clone for TracingHandler<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: Handler> Handler for TracingHandler<H> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn invoke(&self, ctx: &mut MessageContext) -> Result<InvocationResponse, BoxError> {
        let span = info_span!(
            "handler_invoke",
            handler = %self.inner.name(),
            message_id = %ctx.message_id(),
            flow = ?ctx.flow(),
        );
        self.inner.invoke(ctx).instrument(span).await
    }

    fn flow_complete(&self, ctx: &mut MessageContext) {
        let span = info_span!(
            "handler_complete",
            handler = %self.inner.name(),
            message_id = %ctx.message_id(),
        );
        span.in_scope(|| self.inner.flow_complete(ctx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Journal, ScriptedHandler};

    #[tokio::test]
    async fn test_tracing_handler_passthrough() {
        let journal = Journal::new();
        let handler = TracingHandler::new(ScriptedHandler::responding(
            "addressing",
            &journal,
            InvocationResponse::Suspend,
        ));
        let mut ctx = MessageContext::new("m1");

        assert_eq!(handler.name(), "addressing");
        assert_eq!(
            handler.invoke(&mut ctx).await.unwrap(),
            InvocationResponse::Suspend
        );
        handler.flow_complete(&mut ctx);

        assert_eq!(journal.invoked(), vec!["addressing"]);
        assert_eq!(journal.completed(), vec!["addressing"]);
    }
}
