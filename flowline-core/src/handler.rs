//! # Handler
//!
//! The unit of work an execution chain is made of. A handler receives the
//! message context, does its part of the processing and tells the invocation
//! loop how to proceed via [`InvocationResponse`].
//!
//! Handlers carry a before/after contract: `invoke` runs while the flow is in
//! progress, `flow_complete` runs once the flow the handler took part in has
//! ended (successfully, aborted or failed). A handler must not keep
//! cross-call state outside the message context.
//!
//! # Static vs Dynamic Dispatch
//!
//! [`Handler`] uses native `async fn` for zero-cost static dispatch.
//! Execution chains store handlers as [`HandlerRef`], built on the
//! object-safe [`DynHandler`] which every `Handler` implements automatically.

use crate::{context::MessageContext, error::BoxError, response::InvocationResponse};
use std::{future::Future, pin::Pin, sync::Arc};

/// A named unit of message processing.
///
/// # Re-entry
///
/// `invoke` is called once per traversal of the handler's chain position,
/// except when a suspended flow is resumed: the handler that returned
/// [`InvocationResponse::Suspend`] is invoked again at the same position.
///
/// # Example
///
/// ```rust,ignore
/// struct AddressingHandler;
///
/// impl Handler for AddressingHandler {
///     fn name(&self) -> &str {
///         "addressing"
///     }
///
///     async fn invoke(&self, ctx: &mut MessageContext) -> Result<InvocationResponse, BoxError> {
///         ctx.properties_mut().insert("addressing.seen", true);
///         Ok(InvocationResponse::Continue)
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Handler`",
    label = "missing `Handler` implementation",
    note = "Handlers must implement `name` and `invoke`."
)]
pub trait Handler: Send + Sync + 'static {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    /// Process the message.
    fn invoke(
        &self,
        ctx: &mut MessageContext,
    ) -> impl Future<Output = Result<InvocationResponse, BoxError>> + Send;

    /// Called once the flow this handler ran in has ended.
    fn flow_complete(&self, ctx: &mut MessageContext) {
        let _ = ctx;
    }
}

/// Dynamic object-safe version of [`Handler`].
pub trait DynHandler: Send + Sync + 'static {
    /// Name used in logs and error reports (dynamic dispatch version).
    fn name_dyn(&self) -> &str;

    /// Process the message (dynamic dispatch version).
    fn invoke_dyn<'a>(
        &'a self,
        ctx: &'a mut MessageContext,
    ) -> Pin<Box<dyn Future<Output = Result<InvocationResponse, BoxError>> + Send + 'a>>;

    /// Flow completion notification (dynamic dispatch version).
    fn flow_complete_dyn(&self, ctx: &mut MessageContext);
}

// Blanket implementation: Any type implementing Handler implements DynHandler automatically.
impl<T: Handler> DynHandler for T {
    fn name_dyn(&self) -> &str {
        Handler::name(self)
    }

    fn invoke_dyn<'a>(
        &'a self,
        ctx: &'a mut MessageContext,
    ) -> Pin<Box<dyn Future<Output = Result<InvocationResponse, BoxError>> + Send + 'a>> {
        Box::pin(self.invoke(ctx))
    }

    fn flow_complete_dyn(&self, ctx: &mut MessageContext) {
        Handler::flow_complete(self, ctx)
    }
}

/// Shared handle to a handler as stored in execution chains.
///
/// Cloning a chain clones these handles, never the handlers themselves.
pub type HandlerRef = Arc<dyn DynHandler>;

/// Wrap a handler into a [`HandlerRef`].
pub fn handler_ref<H: Handler>(handler: H) -> HandlerRef {
    Arc::new(handler)
}

impl std::fmt::Debug for dyn DynHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Handler").field(&self.name_dyn()).finish()
    }
}
