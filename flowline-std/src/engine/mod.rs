//! # Engine
//!
//! Drives a [`MessageContext`] through one of the four flows.
//!
//! Every flow has the same shape: snapshot the template chain into the
//! context, tag the flow, run the invocation loop and branch on the result.
//!
//! | Loop result | What happens next                               |
//! |-------------|-------------------------------------------------|
//! | `Continue`  | terminal action, then flow completion           |
//! | `Suspend`   | return as-is; [`Engine::resume`] picks it up    |
//! | `Abort`     | flow completion, no terminal action             |
//! | error       | flow completion, then the error is returned     |
//!
//! The terminal action on the receive side delivers the message to the
//! operation's [`MessageReceiver`]; on the send side it hands the message
//! to the bound [`TransportSender`], possibly on a background task.
//!
//! [`MessageReceiver`]: flowline_core::MessageReceiver
//! [`TransportSender`]: flowline_core::TransportSender

mod completion;
mod dispatch;
mod invoke;
mod must_understand;

pub use dispatch::NonBlockingDispatcher;
pub use must_understand::check_must_understand;

use crate::config::ConfigurationContext;
use flowline_core::{
    Direction, EngineError, Flow, InvocationResponse, MessageContext, TRANSPORT_NON_BLOCKING,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// What a flow does once its chain has run to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
    /// Validate and hand the message to the operation's receiver.
    Deliver,
    /// Hand the message to the transport sender.
    Send(TransportMode),
}

/// How the send side reaches the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransportMode {
    /// Always wait for the transport.
    Inline,
    /// Background send when [`TRANSPORT_NON_BLOCKING`] is `true` once the
    /// chain has run.
    FromProperty,
}

/// The message-processing engine.
///
/// Cheap to clone; clones share one [`ConfigurationContext`].
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: Arc<ConfigurationContext>,
}

impl Engine {
    /// Create an engine over a frozen configuration.
    pub fn new(config: Arc<ConfigurationContext>) -> Self {
        Self { config }
    }

    /// The configuration this engine draws its chains from.
    pub fn configuration(&self) -> &Arc<ConfigurationContext> {
        &self.config
    }

    /// Process an inbound message through the global in chain.
    pub async fn receive(
        &self,
        ctx: &mut MessageContext,
    ) -> Result<InvocationResponse, EngineError> {
        trace!(message_id = %ctx.message_id(), "receive");
        ctx.set_execution_chain(self.config.global_in_chain().to_vec());
        ctx.set_flow(Flow::In);
        self.drive(ctx, Direction::Inbound, false, Terminal::Deliver)
            .await
    }

    /// Process a received fault through the in-fault chain.
    pub async fn receive_fault(
        &self,
        ctx: &mut MessageContext,
    ) -> Result<InvocationResponse, EngineError> {
        debug!(message_id = %ctx.message_id(), "receiving fault");
        ctx.set_execution_chain(self.config.in_fault_chain().to_vec());
        ctx.set_flow(Flow::InFault);
        self.drive(ctx, Direction::Inbound, false, Terminal::Deliver)
            .await
    }

    /// Process an outbound message through the operation's out chain
    /// followed by the global out chain, then hand it to the transport.
    ///
    /// When the [`TRANSPORT_NON_BLOCKING`] property is `true` after the
    /// chain has run, the transport runs on a background task and this
    /// returns without waiting for it. Handlers in the chain may set the
    /// property. A background send needs a running tokio runtime.
    pub async fn send(&self, ctx: &mut MessageContext) -> Result<InvocationResponse, EngineError> {
        trace!(message_id = %ctx.message_id(), "send");
        let global = self.config.global_out_chain();
        let chain = match ctx.operation_context() {
            Some(exchange) => exchange.operation().out_chain().concat(global),
            None => global.to_vec(),
        };
        ctx.set_execution_chain(chain);
        ctx.set_flow(Flow::Out);
        self.drive(
            ctx,
            Direction::Outbound,
            false,
            Terminal::Send(TransportMode::FromProperty),
        )
        .await
    }

    /// Send a fault: the operation's out-fault chain, then the global
    /// out-fault chain, then the transport (always inline).
    ///
    /// A suspend inside the operation's chain is returned to the caller, but
    /// resuming it runs the transport straight after the operation's chain
    /// and never reaches the global out-fault chain.
    pub async fn send_fault(
        &self,
        ctx: &mut MessageContext,
    ) -> Result<InvocationResponse, EngineError> {
        trace!(message_id = %ctx.message_id(), "send_fault");
        ctx.set_flow(Flow::OutFault);

        if let Some(exchange) = ctx.operation_context().cloned() {
            ctx.set_execution_chain(exchange.operation().out_fault_chain().to_vec());
            match self.invoke(ctx, Direction::Outbound, false).await {
                Ok(InvocationResponse::Continue) => {}
                Ok(InvocationResponse::Suspend) => {
                    warn!(
                        message_id = %ctx.message_id(),
                        operation = %exchange.operation().name(),
                        "fault flow suspended in operation chain; resuming will skip the global out-fault chain"
                    );
                    return Ok(InvocationResponse::Suspend);
                }
                outcome => {
                    self.flow_complete(ctx, Direction::Outbound);
                    return outcome;
                }
            }
        }

        // Executed handlers of the first stage stay recorded for completion.
        ctx.set_execution_chain(self.config.out_fault_chain().to_vec());
        self.drive(
            ctx,
            Direction::Outbound,
            false,
            Terminal::Send(TransportMode::Inline),
        )
        .await
    }

    /// Continue a suspended flow from the handler that suspended it.
    ///
    /// In and in-fault flows resume on the receive side, out and out-fault
    /// flows on the send side.
    pub async fn resume(
        &self,
        ctx: &mut MessageContext,
    ) -> Result<InvocationResponse, EngineError> {
        // The flow tag decides the side, so an in-fault flow stays inbound.
        match ctx.flow().direction() {
            Direction::Inbound => self.resume_receive(ctx).await,
            Direction::Outbound => self.resume_send(ctx).await,
        }
    }

    /// Resume a suspended inbound flow and deliver the message.
    pub async fn resume_receive(
        &self,
        ctx: &mut MessageContext,
    ) -> Result<InvocationResponse, EngineError> {
        trace!(message_id = %ctx.message_id(), "resume_receive");
        unpause(ctx)?;
        self.drive(ctx, Direction::Inbound, true, Terminal::Deliver)
            .await
    }

    /// Resume a suspended outbound flow and send the message inline.
    pub async fn resume_send(
        &self,
        ctx: &mut MessageContext,
    ) -> Result<InvocationResponse, EngineError> {
        trace!(message_id = %ctx.message_id(), "resume_send");
        unpause(ctx)?;
        self.drive(
            ctx,
            Direction::Outbound,
            true,
            Terminal::Send(TransportMode::Inline),
        )
        .await
    }

    /// Give up on a suspended flow that will never be resumed.
    ///
    /// Runs flow completion for the handlers that ran so the before/after
    /// contract still holds, and clears the paused flag.
    pub fn abandon(&self, ctx: &mut MessageContext) -> Result<(), EngineError> {
        unpause(ctx)?;
        let flow = ctx.flow();
        debug!(message_id = %ctx.message_id(), ?flow, "abandoning suspended flow");
        self.flow_complete(ctx, flow.direction());
        Ok(())
    }

    async fn drive(
        &self,
        ctx: &mut MessageContext,
        direction: Direction,
        resuming: bool,
        terminal: Terminal,
    ) -> Result<InvocationResponse, EngineError> {
        let outcome = match self.invoke(ctx, direction, resuming).await {
            Ok(InvocationResponse::Continue) => self
                .terminal_action(ctx, terminal)
                .await
                .map(|()| InvocationResponse::Continue),
            other => other,
        };

        if !matches!(outcome, Ok(InvocationResponse::Suspend)) {
            self.flow_complete(ctx, direction);
        }
        outcome
    }

    async fn terminal_action(
        &self,
        ctx: &mut MessageContext,
        terminal: Terminal,
    ) -> Result<(), EngineError> {
        match terminal {
            Terminal::Deliver => self.deliver(ctx).await,
            Terminal::Send(mode) => self.transmit(ctx, mode).await,
        }
    }

    async fn deliver(&self, ctx: &mut MessageContext) -> Result<(), EngineError> {
        if !ctx.is_server_side() {
            return Ok(());
        }
        check_must_understand(ctx)?;

        let receiver = ctx
            .operation_context()
            .and_then(|exchange| exchange.operation().message_receiver())
            .cloned()
            .ok_or_else(|| EngineError::configuration("No message receiver has been set"))?;
        receiver.receive(ctx).await.map_err(EngineError::Receiver)
    }

    async fn transmit(
        &self,
        ctx: &mut MessageContext,
        mode: TransportMode,
    ) -> Result<(), EngineError> {
        let sender = ctx
            .transport_out()
            .cloned()
            .ok_or_else(|| EngineError::configuration("Transport out has not been set"))?;

        let non_blocking = mode == TransportMode::FromProperty
            && ctx.properties().is_true(TRANSPORT_NON_BLOCKING);
        if non_blocking {
            trace!(message_id = %ctx.message_id(), "handing transport to background task");
            // The caller does not wait, so the handle is dropped.
            drop(self.config.dispatcher().dispatch(ctx.detach(), sender)?);
            return Ok(());
        }
        sender.invoke(ctx).await.map_err(EngineError::Transport)
    }
}

fn unpause(ctx: &mut MessageContext) -> Result<(), EngineError> {
    if !ctx.is_paused() {
        return Err(EngineError::NotPaused {
            message_id: ctx.message_id().to_string(),
        });
    }
    ctx.traversal_mut().set_paused(false);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Journal, JournalEntry, RecordingReceiver, RecordingSender, ScriptedHandler};
    use flowline_core::{ExecutionChain, Operation, OperationContext};

    fn exchange(journal: &Journal) -> Arc<OperationContext> {
        let operation = Operation::builder("echo")
            .message_receiver(Arc::new(RecordingReceiver::new(journal)))
            .build();
        Arc::new(OperationContext::new(Arc::new(operation)))
    }

    #[tokio::test]
    async fn test_receive_delivers_then_completes() {
        let journal = Journal::new();
        let config = ConfigurationContext::builder()
            .in_chain(
                ExecutionChain::builder()
                    .handler(ScriptedHandler::new("h0", &journal))
                    .build(),
            )
            .build();
        let engine = Engine::new(Arc::new(config));
        let mut ctx = MessageContext::new("m1")
            .with_server_side(true)
            .with_operation_context(exchange(&journal));

        let response = engine.receive(&mut ctx).await.unwrap();

        assert_eq!(response, InvocationResponse::Continue);
        assert_eq!(ctx.flow(), Flow::In);
        assert_eq!(
            journal.entries(),
            vec![
                JournalEntry::Invoked("h0".into()),
                JournalEntry::Received("m1".into()),
                JournalEntry::Completed("h0".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_client_side_receive_skips_delivery() {
        let journal = Journal::new();
        let engine = Engine::default();
        let mut ctx = MessageContext::new("m1").with_operation_context(exchange(&journal));

        let response = engine.receive(&mut ctx).await.unwrap();

        assert_eq!(response, InvocationResponse::Continue);
        assert!(journal.received().is_empty());
    }

    #[tokio::test]
    async fn test_server_side_receive_without_receiver_is_configuration_error() {
        let engine = Engine::default();
        let mut ctx = MessageContext::new("m1").with_server_side(true);

        let err = engine.receive(&mut ctx).await.unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_inline_send_failure_is_transport_error() {
        let journal = Journal::new();
        let config = ConfigurationContext::builder()
            .out_chain(
                ExecutionChain::builder()
                    .handler(ScriptedHandler::new("h0", &journal))
                    .build(),
            )
            .build();
        let engine = Engine::new(Arc::new(config));
        let mut ctx = MessageContext::new("m1")
            .with_transport_out(Arc::new(RecordingSender::failing(&journal, "refused")));

        let err = engine.send(&mut ctx).await.unwrap_err();

        assert!(matches!(err, EngineError::Transport(_)));
        assert_eq!(journal.sent(), vec!["m1"]);
        assert_eq!(journal.completed(), vec!["h0"]);
    }

    #[tokio::test]
    async fn test_resume_requires_paused_context() {
        let engine = Engine::default();
        let mut ctx = MessageContext::new("m1");

        let err = engine.resume(&mut ctx).await.unwrap_err();
        assert!(matches!(err, EngineError::NotPaused { ref message_id } if message_id == "m1"));
        assert!(matches!(
            engine.abandon(&mut ctx),
            Err(EngineError::NotPaused { .. })
        ));
    }

    #[tokio::test]
    async fn test_abandon_completes_suspended_flow() {
        let journal = Journal::new();
        let config = ConfigurationContext::builder()
            .out_chain(
                ExecutionChain::builder()
                    .handler(ScriptedHandler::new("h0", &journal))
                    .handler(ScriptedHandler::suspend_once("h1", &journal))
                    .build(),
            )
            .build();
        let engine = Engine::new(Arc::new(config));
        let mut ctx = MessageContext::new("m1");

        assert_eq!(
            engine.send(&mut ctx).await.unwrap(),
            InvocationResponse::Suspend
        );
        assert!(journal.completed().is_empty());

        engine.abandon(&mut ctx).unwrap();

        assert!(!ctx.is_paused());
        assert_eq!(journal.completed(), vec!["h0", "h1"]);
        assert!(ctx.outbound_executed().is_empty());
    }
}
