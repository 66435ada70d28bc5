//! Flow completion.

use super::Engine;
use flowline_core::{Direction, MessageContext};
use tracing::trace;

impl Engine {
    /// Notify every handler that ran in `direction` that its flow is over,
    /// in recorded order, and clear the executed list.
    ///
    /// Only the last recorded entry can have stopped part-way through a
    /// phase, so the saved phase progress is handed to it alone. Calling
    /// this again without a new traversal notifies nobody.
    pub fn flow_complete(&self, ctx: &mut MessageContext, direction: Direction) {
        let executed = ctx.traversal_mut().take_executed(direction);
        let mut stopped_in_phase = Some(ctx.traversal_mut().take_phase_progress());

        trace!(
            message_id = %ctx.message_id(),
            ?direction,
            handlers = executed.len(),
            "completing flow"
        );

        let last = executed.len().saturating_sub(1);
        for (position, handler) in executed.iter().enumerate() {
            if position == last {
                if let Some(progress) = stopped_in_phase.take() {
                    ctx.traversal_mut().restore_phase_progress(progress);
                }
            }
            handler.flow_complete_dyn(ctx);
        }
        ctx.traversal_mut().take_phase_progress();
    }
}
