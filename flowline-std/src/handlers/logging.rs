//! Logging handler for message observation.

use flowline_core::{BoxError, Handler, InvocationResponse, MessageContext};
use tracing::debug;

/// A handler that logs every message passing its chain position and
/// continues.
///
/// # Example
///
/// ```rust,ignore
/// let chain = ExecutionChain::builder()
///     .handler(LoggingHandler::named("after-dispatch"))
///     .handler(DispatchHandler)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct LoggingHandler {
    name: &'static str,
}

impl LoggingHandler {
    /// Create a logging handler with the default name.
    pub fn new() -> Self {
        Self { name: "logging" }
    }

    /// Create a logging handler with a custom name.
    ///
    /// The name identifies the chain position in log lines.
    pub fn named(name: &'static str) -> Self {
        Self { name }
    }
}

impl Default for LoggingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for LoggingHandler {
    fn name(&self) -> &str {
        self.name
    }

    async fn invoke(&self, ctx: &mut MessageContext) -> Result<InvocationResponse, BoxError> {
        debug!(
            handler = %self.name,
            message_id = %ctx.message_id(),
            flow = ?ctx.flow(),
            index = ?ctx.current_handler_index(),
            "message passing"
        );
        Ok(InvocationResponse::Continue)
    }

    fn flow_complete(&self, ctx: &mut MessageContext) {
        debug!(handler = %self.name, message_id = %ctx.message_id(), "flow complete");
    }
}
