//! Execution chain templates.
//!
//! A template is built once from configuration and shared read-only by every
//! message. Each message snapshots it into its own [`MessageContext`] working
//! copy, so runtime changes to one message's chain never leak into another.
//!
//! [`MessageContext`]: crate::MessageContext

use crate::handler::{Handler, HandlerRef, handler_ref};
use std::{fmt, sync::Arc};

/// An immutable, cheaply clonable ordered sequence of handlers.
///
/// # Example
///
/// ```rust,ignore
/// let chain = ExecutionChain::builder()
///     .handler(TransportHandler)
///     .handler(AddressingHandler)
///     .build();
///
/// // Per-message working copy; the handlers themselves are shared.
/// ctx.set_execution_chain(chain.to_vec());
/// ```
#[derive(Clone)]
pub struct ExecutionChain {
    handlers: Arc<[HandlerRef]>,
}

impl ExecutionChain {
    /// Create a builder for a new chain.
    pub fn builder() -> ExecutionChainBuilder {
        ExecutionChainBuilder::new()
    }

    /// A chain with no handlers.
    pub fn empty() -> Self {
        Self {
            handlers: Arc::from(Vec::new()),
        }
    }

    /// Number of handlers in the chain.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the chain has no handlers.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Iterate over the handlers in order.
    pub fn iter(&self) -> impl Iterator<Item = &HandlerRef> {
        self.handlers.iter()
    }

    /// Names of the handlers in order.
    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name_dyn()).collect()
    }

    /// Owned working copy of the sequence.
    pub fn to_vec(&self) -> Vec<HandlerRef> {
        self.handlers.to_vec()
    }

    /// Working copy of this chain followed by `other`.
    pub fn concat(&self, other: &ExecutionChain) -> Vec<HandlerRef> {
        let mut handlers = Vec::with_capacity(self.len() + other.len());
        handlers.extend(self.handlers.iter().cloned());
        handlers.extend(other.handlers.iter().cloned());
        handlers
    }
}

impl Default for ExecutionChain {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<HandlerRef> for ExecutionChain {
    fn from_iter<I: IntoIterator<Item = HandlerRef>>(iter: I) -> Self {
        Self {
            handlers: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for ExecutionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Builder for an [`ExecutionChain`].
#[derive(Default)]
pub struct ExecutionChainBuilder {
    handlers: Vec<HandlerRef>,
}

impl ExecutionChainBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler.
    pub fn handler<H: Handler>(self, handler: H) -> Self {
        self.handler_ref(handler_ref(handler))
    }

    /// Append an already shared handler.
    pub fn handler_ref(mut self, handler: HandlerRef) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Append a handler (mutable version).
    pub fn push<H: Handler>(&mut self, handler: H) {
        self.handlers.push(handler_ref(handler));
    }

    /// Freeze the chain.
    pub fn build(self) -> ExecutionChain {
        ExecutionChain {
            handlers: Arc::from(self.handlers),
        }
    }
}
