//! Phases: named groups of handlers that sit in a chain as a single entry.
//!
//! A phase keeps its progress in the message context rather than in
//! itself, so the same phase instance serves every message and a phase
//! suspended half-way resumes at the inner handler that suspended. Phases
//! may contain phases; each nesting level keeps its own position.

use flowline_core::{
    BoxError, Handler, HandlerRef, InvocationResponse, MessageContext, handler_ref,
};
use std::fmt;

/// An ordered group of handlers executed as one chain entry.
///
/// # Example
///
/// ```rust,ignore
/// let security = Phase::new("Security")
///     .with_handler(SignatureHandler)
///     .with_handler(TimestampHandler);
///
/// let chain = ExecutionChain::builder().handler(security).build();
/// ```
pub struct Phase {
    name: String,
    handlers: Vec<HandlerRef>,
}

impl Phase {
    /// Create an empty phase.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: Vec::new(),
        }
    }

    /// Append a handler.
    pub fn with_handler<H: Handler>(mut self, handler: H) -> Self {
        self.add_handler(handler_ref(handler));
        self
    }

    /// Append an already shared handler.
    pub fn add_handler(&mut self, handler: HandlerRef) {
        self.handlers.push(handler);
    }

    /// Handlers of this phase in order.
    pub fn handlers(&self) -> &[HandlerRef] {
        &self.handlers
    }

    /// Number of handlers in the phase.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the phase has no handlers.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Handler for Phase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, ctx: &mut MessageContext) -> Result<InvocationResponse, BoxError> {
        let mut index = ctx.traversal().current_phase_index().unwrap_or(0);

        while let Some(handler) = self.handlers.get(index).cloned() {
            ctx.traversal_mut().set_current_phase_index(Some(index));
            ctx.traversal_mut().enter_phase();
            let result = handler.invoke_dyn(ctx).await;
            ctx.traversal_mut().exit_phase();
            let response = result?;
            if response.is_halt() {
                return Ok(response);
            }
            index += 1;
        }

        ctx.traversal_mut().set_current_phase_index(None);
        Ok(InvocationResponse::Continue)
    }

    /// Notifies the inner handlers that ran, last one first.
    ///
    /// If the flow stopped inside this phase only the handlers up to and
    /// including the one it stopped at are notified.
    fn flow_complete(&self, ctx: &mut MessageContext) {
        let ran = match ctx.traversal().current_phase_index() {
            Some(stopped_at) => (stopped_at + 1).min(self.handlers.len()),
            None => self.handlers.len(),
        };

        // The handler it stopped at goes first and still sees its own
        // nested progress; it clears that progress on the way out.
        for handler in self.handlers[..ran].iter().rev() {
            ctx.traversal_mut().enter_phase();
            handler.flow_complete_dyn(ctx);
            ctx.traversal_mut().exit_phase();
        }
        ctx.traversal_mut().set_current_phase_index(None);
    }
}

impl fmt::Debug for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phase")
            .field("name", &self.name)
            .field("handlers", &self.handlers)
            .finish()
    }
}
