//! Operation descriptions and the per-exchange operation context.

use crate::{chain::ExecutionChain, receiver::MessageReceiver};
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

/// Description-side data for one operation: its own outbound chains and
/// the receiver inbound messages are delivered to.
pub struct Operation {
    name: String,
    out_chain: ExecutionChain,
    out_fault_chain: ExecutionChain,
    message_receiver: Option<Arc<dyn MessageReceiver>>,
}

impl Operation {
    /// Create a builder for an operation.
    pub fn builder(name: impl Into<String>) -> OperationBuilder {
        OperationBuilder {
            name: name.into(),
            out_chain: ExecutionChain::empty(),
            out_fault_chain: ExecutionChain::empty(),
            message_receiver: None,
        }
    }

    /// Operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operation-specific outbound chain, run before the global out chain.
    pub fn out_chain(&self) -> &ExecutionChain {
        &self.out_chain
    }

    /// Operation-specific outbound fault chain.
    pub fn out_fault_chain(&self) -> &ExecutionChain {
        &self.out_fault_chain
    }

    /// Receiver for inbound messages of this operation.
    pub fn message_receiver(&self) -> Option<&Arc<dyn MessageReceiver>> {
        self.message_receiver.as_ref()
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("out_chain", &self.out_chain)
            .field("out_fault_chain", &self.out_fault_chain)
            .field("message_receiver", &self.message_receiver.is_some())
            .finish()
    }
}

/// Builder for an [`Operation`].
pub struct OperationBuilder {
    name: String,
    out_chain: ExecutionChain,
    out_fault_chain: ExecutionChain,
    message_receiver: Option<Arc<dyn MessageReceiver>>,
}

impl OperationBuilder {
    /// Set the operation-specific outbound chain.
    pub fn out_chain(mut self, chain: ExecutionChain) -> Self {
        self.out_chain = chain;
        self
    }

    /// Set the operation-specific outbound fault chain.
    pub fn out_fault_chain(mut self, chain: ExecutionChain) -> Self {
        self.out_fault_chain = chain;
        self
    }

    /// Set the message receiver.
    pub fn message_receiver(mut self, receiver: Arc<dyn MessageReceiver>) -> Self {
        self.message_receiver = Some(receiver);
        self
    }

    /// Build the operation.
    pub fn build(self) -> Operation {
        Operation {
            name: self.name,
            out_chain: self.out_chain,
            out_fault_chain: self.out_fault_chain,
            message_receiver: self.message_receiver,
        }
    }
}

/// Role a message plays within an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageLabel {
    /// The request.
    In,
    /// The response.
    Out,
    /// A fault sent in place of the response.
    Fault,
}

/// Groups the messages of one request/response exchange.
///
/// Shared by the contexts of the exchange; it records message ids rather
/// than owning the contexts.
pub struct OperationContext {
    operation: Arc<Operation>,
    messages: Mutex<HashMap<MessageLabel, String>>,
}

impl OperationContext {
    /// Create a context for an exchange of `operation`.
    pub fn new(operation: Arc<Operation>) -> Self {
        Self {
            operation,
            messages: Mutex::new(HashMap::new()),
        }
    }

    /// The operation this exchange belongs to.
    pub fn operation(&self) -> &Arc<Operation> {
        &self.operation
    }

    /// Record the id of the message playing `label`.
    pub fn add_message(&self, label: MessageLabel, message_id: impl Into<String>) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(label, message_id.into());
    }

    /// The id of the message playing `label`, if recorded.
    pub fn message_id(&self, label: MessageLabel) -> Option<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&label)
            .cloned()
    }

    /// Whether both the request and a response (or fault) are recorded.
    pub fn is_complete(&self) -> bool {
        let messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        messages.contains_key(&MessageLabel::In)
            && (messages.contains_key(&MessageLabel::Out)
                || messages.contains_key(&MessageLabel::Fault))
    }
}

impl fmt::Debug for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationContext")
            .field("operation", &self.operation.name())
            .finish_non_exhaustive()
    }
}
