#![allow(dead_code)]

use flowline::{
    BoxError, ConfigurationContext, Engine, ExecutionChain, Handler, InvocationResponse,
    MessageContext, Operation, OperationContext, TRANSPORT_NON_BLOCKING, TransportSender,
    async_trait, handler_ref,
    testing::{Journal, JournalEntry, RecordingReceiver, ScriptedHandler},
};
use std::sync::Arc;
use tokio::sync::Notify;

// ============================================================================
// Setup
// ============================================================================

/// Install a fmt subscriber once per test binary; `RUST_LOG` controls output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A chain of always-continuing scripted handlers.
pub fn chain_of(journal: &Journal, names: &[&str]) -> ExecutionChain {
    names
        .iter()
        .map(|name| handler_ref(ScriptedHandler::new(*name, journal)))
        .collect()
}

pub fn engine(config: ConfigurationContext) -> Engine {
    Engine::new(Arc::new(config))
}

/// An exchange whose operation delivers to a recording receiver.
pub fn recording_exchange(journal: &Journal, operation: &str) -> Arc<OperationContext> {
    let operation = Operation::builder(operation)
        .message_receiver(Arc::new(RecordingReceiver::new(journal)))
        .build();
    Arc::new(OperationContext::new(Arc::new(operation)))
}

pub fn names(handlers: &[flowline::HandlerRef]) -> Vec<String> {
    handlers.iter().map(|h| h.name_dyn().to_string()).collect()
}

pub fn invoked(name: &str) -> JournalEntry {
    JournalEntry::Invoked(name.to_string())
}

pub fn completed(name: &str) -> JournalEntry {
    JournalEntry::Completed(name.to_string())
}

// ============================================================================
// Test Handlers
// ============================================================================

/// Marks every header block with the given name as processed.
pub struct HeaderProcessor {
    pub header: &'static str,
}

impl Handler for HeaderProcessor {
    fn name(&self) -> &str {
        "header-processor"
    }

    async fn invoke(&self, ctx: &mut MessageContext) -> Result<InvocationResponse, BoxError> {
        if let Some(header) = ctx.envelope_mut().and_then(|e| e.header_mut()) {
            if let Some(block) = header.block_mut(self.header) {
                block.set_processed();
            }
        }
        Ok(InvocationResponse::Continue)
    }
}

/// Removes every handler after itself from its message's working chain.
pub struct TruncateRest;

impl Handler for TruncateRest {
    fn name(&self) -> &str {
        "truncate-rest"
    }

    async fn invoke(&self, ctx: &mut MessageContext) -> Result<InvocationResponse, BoxError> {
        let keep = ctx.current_handler_index().map_or(0, |i| i + 1);
        ctx.traversal_mut().execution_chain_mut().truncate(keep);
        Ok(InvocationResponse::Continue)
    }
}

/// Asks for a non-blocking transport from inside the chain.
pub struct RequestNonBlocking;

impl Handler for RequestNonBlocking {
    fn name(&self) -> &str {
        "request-non-blocking"
    }

    async fn invoke(&self, ctx: &mut MessageContext) -> Result<InvocationResponse, BoxError> {
        ctx.properties_mut().insert(TRANSPORT_NON_BLOCKING, true);
        Ok(InvocationResponse::Continue)
    }
}

// ============================================================================
// Test Transports
// ============================================================================

/// A sender that waits for `release` before failing, so a test can observe
/// that the caller of `send` did not wait for it.
pub struct GatedFailingSender {
    pub release: Arc<Notify>,
    pub journal: Journal,
}

#[async_trait]
impl TransportSender for GatedFailingSender {
    async fn invoke(&self, ctx: &mut MessageContext) -> Result<(), BoxError> {
        self.release.notified().await;
        self.journal
            .push(JournalEntry::Sent(ctx.message_id().to_string()));
        Err("peer closed connection".into())
    }
}
