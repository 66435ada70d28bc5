//! The invocation loop.

use super::Engine;
use flowline_core::{Direction, EngineError, InvocationResponse, MessageContext};
use tracing::debug;

impl Engine {
    /// Advance `ctx` through its execution chain from the saved cursor.
    ///
    /// Each handler is recorded into the executed list of `direction`
    /// before it runs. When `resuming` is set the first step skips that
    /// recording, since the handler was recorded before the flow suspended.
    ///
    /// Returns `Continue` once the chain is exhausted, or the `Suspend` /
    /// `Abort` of the handler that stopped it, with the cursor left on that
    /// handler. A handler failure is returned without advancing; if it
    /// happened on the first chain entry, that entry's recording is undone.
    pub async fn invoke(
        &self,
        ctx: &mut MessageContext,
        direction: Direction,
        mut resuming: bool,
    ) -> Result<InvocationResponse, EngineError> {
        let mut index = ctx.current_handler_index().unwrap_or(0);
        ctx.traversal_mut().set_current_handler_index(Some(index));

        while let Some(handler) = ctx.traversal().handler_at(index) {
            let recorded = !resuming;
            if resuming {
                resuming = false;
            } else {
                ctx.traversal_mut()
                    .record_executed(direction, handler.clone());
            }

            let response = match handler.invoke_dyn(ctx).await {
                Ok(response) => response,
                Err(source) => {
                    if index == 0 && recorded {
                        ctx.traversal_mut().undo_last_executed(direction);
                    }
                    return Err(EngineError::Handler {
                        handler: handler.name_dyn().to_string(),
                        source,
                    });
                }
            };

            match response {
                InvocationResponse::Continue => {
                    index += 1;
                    ctx.traversal_mut().set_current_handler_index(Some(index));
                }
                InvocationResponse::Suspend => {
                    ctx.pause();
                    debug!(
                        message_id = %ctx.message_id(),
                        handler = %handler.name_dyn(),
                        index,
                        "flow suspended"
                    );
                    return Ok(response);
                }
                InvocationResponse::Abort => {
                    debug!(
                        message_id = %ctx.message_id(),
                        handler = %handler.name_dyn(),
                        index,
                        "flow aborted"
                    );
                    return Ok(response);
                }
            }
        }

        Ok(InvocationResponse::Continue)
    }
}
