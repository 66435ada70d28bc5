//! # Message Context
//!
//! Per-message mutable state carried through one flow.
//!
//! Everything needed to pause a flow and pick it up again later lives in
//! [`TraversalState`]: the working copy of the execution chain, the cursor,
//! the executed-handler lists and the pause flag. Nothing about a traversal
//! is kept on the call stack, so a context suspended on one task can be
//! resumed on another.

use crate::{
    envelope::Envelope,
    handler::HandlerRef,
    operation::OperationContext,
    transport::TransportSender,
};
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

/// Property key: when set to `true`, outbound transport runs on a background task.
pub const TRANSPORT_NON_BLOCKING: &str = "transportNonBlocking";

/// Property key: when present, background transport failures are not
/// reported to the registered callback.
pub const DISABLE_ASYNC_CALLBACK_ON_TRANSPORT_ERROR: &str = "disableTransmissionErrorCallback";

/// The four message-processing flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flow {
    /// Normal inbound processing.
    #[default]
    In,
    /// Normal outbound processing.
    Out,
    /// Inbound processing of a received fault.
    InFault,
    /// Outbound processing of a fault being sent.
    OutFault,
}

impl Flow {
    /// The direction this flow traverses.
    pub const fn direction(&self) -> Direction {
        match self {
            Flow::In | Flow::InFault => Direction::Inbound,
            Flow::Out | Flow::OutFault => Direction::Outbound,
        }
    }

    /// Check if this is one of the fault flows.
    pub const fn is_fault(&self) -> bool {
        matches!(self, Flow::InFault | Flow::OutFault)
    }
}

/// Which executed-handler list a traversal records into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Receive side.
    Inbound,
    /// Send side.
    Outbound,
}

// ============================================================================
// Properties
// ============================================================================

/// A bag of opaque values keyed by string, used for cross-handler signaling.
///
/// Values are reference counted so a bag can be cloned cheaply when a
/// context is detached for background transport.
#[derive(Clone, Default)]
pub struct Properties {
    values: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Properties {
    /// Create an empty property bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value under the same key.
    pub fn insert<V: Any + Send + Sync>(&mut self, key: impl Into<String>, value: V) {
        self.values.insert(key.into(), Arc::new(value));
    }

    /// Get a typed reference to a value.
    ///
    /// Returns `None` if the key is missing or holds a different type.
    pub fn get<V: Any + Send + Sync>(&self, key: &str) -> Option<&V> {
        self.values.get(key).and_then(|v| v.downcast_ref::<V>())
    }

    /// Check whether a boolean property is present and `true`.
    pub fn is_true(&self, key: &str) -> bool {
        self.get::<bool>(key).copied().unwrap_or(false)
    }

    /// Check whether any value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove a value, returning whether one was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Number of stored properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

// ============================================================================
// TraversalState
// ============================================================================

/// The resumable state of one traversal of an execution chain.
///
/// This record is the only carrier of suspend/resume information.
#[derive(Debug, Default)]
pub struct TraversalState {
    execution_chain: Vec<HandlerRef>,
    current_handler_index: Option<usize>,
    phase_progress: Vec<usize>,
    phase_depth: usize,
    inbound_executed: Vec<HandlerRef>,
    outbound_executed: Vec<HandlerRef>,
    paused: bool,
}

impl TraversalState {
    /// Replace the execution chain and rewind both cursors.
    ///
    /// The executed lists are left alone: a flow may run several chains
    /// back to back and complete them in one pass.
    pub fn set_execution_chain(&mut self, chain: Vec<HandlerRef>) {
        self.execution_chain = chain;
        self.current_handler_index = None;
        self.phase_progress.clear();
        self.phase_depth = 0;
    }

    /// The working copy of the execution chain.
    pub fn execution_chain(&self) -> &[HandlerRef] {
        &self.execution_chain
    }

    /// Mutable access to the working chain, for handlers that reshape the
    /// rest of their own message's processing.
    pub fn execution_chain_mut(&mut self) -> &mut Vec<HandlerRef> {
        &mut self.execution_chain
    }

    /// The chain cursor; `None` until the traversal has started.
    pub fn current_handler_index(&self) -> Option<usize> {
        self.current_handler_index
    }

    /// Move the chain cursor.
    pub fn set_current_handler_index(&mut self, index: Option<usize>) {
        self.current_handler_index = index;
    }

    /// Progress of the phase running at the current nesting depth, if it is
    /// part-way through.
    ///
    /// Phases nest, so progress is kept per level: level 0 belongs to the
    /// phase at the chain cursor, level 1 to a phase inside it, and so on.
    pub fn current_phase_index(&self) -> Option<usize> {
        self.phase_progress.get(self.phase_depth).copied()
    }

    /// Record progress of the phase at the current nesting depth.
    ///
    /// Moving to a different inner handler drops the progress of deeper
    /// levels; re-recording the same index keeps it, so a resumed nested
    /// phase still finds its own position. `None` clears this level and
    /// everything below it.
    pub fn set_current_phase_index(&mut self, index: Option<usize>) {
        let depth = self.phase_depth;
        match index {
            Some(index) if self.phase_progress.get(depth) == Some(&index) => {}
            Some(index) => {
                self.phase_progress.truncate(depth);
                self.phase_progress.push(index);
            }
            None => self.phase_progress.truncate(depth),
        }
    }

    /// Progress of every nesting level, outermost first.
    pub fn phase_progress(&self) -> &[usize] {
        &self.phase_progress
    }

    /// Take the saved phase progress and return to the outermost level.
    pub fn take_phase_progress(&mut self) -> Vec<usize> {
        self.phase_depth = 0;
        std::mem::take(&mut self.phase_progress)
    }

    /// Reinstate progress previously taken with [`take_phase_progress`].
    ///
    /// [`take_phase_progress`]: TraversalState::take_phase_progress
    pub fn restore_phase_progress(&mut self, progress: Vec<usize>) {
        self.phase_depth = 0;
        self.phase_progress = progress;
    }

    /// Step into the handlers of the phase at the current depth.
    pub fn enter_phase(&mut self) {
        self.phase_depth += 1;
    }

    /// Step back out to the enclosing phase.
    pub fn exit_phase(&mut self) {
        self.phase_depth = self.phase_depth.saturating_sub(1);
    }

    /// Current phase nesting depth; 0 at the chain itself.
    pub fn phase_depth(&self) -> usize {
        self.phase_depth
    }

    /// The handler at `index` in the working chain.
    pub fn handler_at(&self, index: usize) -> Option<HandlerRef> {
        self.execution_chain.get(index).cloned()
    }

    /// Handlers that have run in the given direction, in recorded order.
    pub fn executed(&self, direction: Direction) -> &[HandlerRef] {
        match direction {
            Direction::Inbound => &self.inbound_executed,
            Direction::Outbound => &self.outbound_executed,
        }
    }

    /// Append a handler to the executed list of `direction`.
    pub fn record_executed(&mut self, direction: Direction, handler: HandlerRef) {
        self.executed_mut(direction).push(handler);
    }

    /// Remove the most recently recorded handler of `direction`.
    pub fn undo_last_executed(&mut self, direction: Direction) -> Option<HandlerRef> {
        self.executed_mut(direction).pop()
    }

    /// Take the executed list of `direction`, leaving it empty.
    pub fn take_executed(&mut self, direction: Direction) -> Vec<HandlerRef> {
        std::mem::take(self.executed_mut(direction))
    }

    /// Check whether the traversal is suspended.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set or clear the suspended flag.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn executed_mut(&mut self, direction: Direction) -> &mut Vec<HandlerRef> {
        match direction {
            Direction::Inbound => &mut self.inbound_executed,
            Direction::Outbound => &mut self.outbound_executed,
        }
    }
}

// ============================================================================
// MessageContext
// ============================================================================

/// Mutable per-message state carried through one flow.
///
/// One context belongs to exactly one message. It may move between tasks
/// across a suspend point but is only ever driven by one of them at a time.
pub struct MessageContext {
    message_id: String,
    relates_to: Option<String>,
    flow: Flow,
    traversal: TraversalState,
    properties: Properties,
    server_side: bool,
    envelope: Option<Envelope>,
    transport_out: Option<Arc<dyn TransportSender>>,
    operation_context: Option<Arc<OperationContext>>,
}

impl MessageContext {
    /// Create a context for the message with the given identifier.
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            relates_to: None,
            flow: Flow::default(),
            traversal: TraversalState::default(),
            properties: Properties::new(),
            server_side: false,
            envelope: None,
            transport_out: None,
            operation_context: None,
        }
    }

    /// Set the id of the message this one responds to.
    pub fn with_relates_to(mut self, message_id: impl Into<String>) -> Self {
        self.relates_to = Some(message_id.into());
        self
    }

    /// Mark the context as server side.
    pub fn with_server_side(mut self, server_side: bool) -> Self {
        self.server_side = server_side;
        self
    }

    /// Attach an envelope.
    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = Some(envelope);
        self
    }

    /// Bind the outbound transport sender.
    pub fn with_transport_out(mut self, sender: Arc<dyn TransportSender>) -> Self {
        self.transport_out = Some(sender);
        self
    }

    /// Attach the operation context of the exchange this message belongs to.
    pub fn with_operation_context(mut self, operation_context: Arc<OperationContext>) -> Self {
        self.operation_context = Some(operation_context);
        self
    }

    /// Set a property.
    pub fn with_property<V: Any + Send + Sync>(mut self, key: impl Into<String>, value: V) -> Self {
        self.properties.insert(key, value);
        self
    }

    /// The message identifier.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// The id of the message this one responds to, if any.
    pub fn relates_to(&self) -> Option<&str> {
        self.relates_to.as_deref()
    }

    /// The flow currently being processed.
    pub fn flow(&self) -> Flow {
        self.flow
    }

    /// Tag the flow being processed.
    pub fn set_flow(&mut self, flow: Flow) {
        self.flow = flow;
    }

    /// Resumable traversal state.
    pub fn traversal(&self) -> &TraversalState {
        &self.traversal
    }

    /// Mutable traversal state.
    pub fn traversal_mut(&mut self) -> &mut TraversalState {
        &mut self.traversal
    }

    /// Replace the working execution chain and rewind the cursors.
    pub fn set_execution_chain(&mut self, chain: Vec<HandlerRef>) {
        self.traversal.set_execution_chain(chain);
    }

    /// The working execution chain.
    pub fn execution_chain(&self) -> &[HandlerRef] {
        self.traversal.execution_chain()
    }

    /// The chain cursor; `None` until the traversal has started.
    pub fn current_handler_index(&self) -> Option<usize> {
        self.traversal.current_handler_index()
    }

    /// Handlers that have run on the receive side.
    pub fn inbound_executed(&self) -> &[HandlerRef] {
        self.traversal.executed(Direction::Inbound)
    }

    /// Handlers that have run on the send side.
    pub fn outbound_executed(&self) -> &[HandlerRef] {
        self.traversal.executed(Direction::Outbound)
    }

    /// Check whether the flow is suspended.
    pub fn is_paused(&self) -> bool {
        self.traversal.is_paused()
    }

    /// Suspend the flow. The invocation loop does this itself when a
    /// handler returns `Suspend`.
    pub fn pause(&mut self) {
        self.traversal.set_paused(true);
    }

    /// Cross-handler property bag.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Mutable property bag.
    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    /// Whether this message is being processed on the server side.
    pub fn is_server_side(&self) -> bool {
        self.server_side
    }

    /// The envelope, if one has been attached.
    pub fn envelope(&self) -> Option<&Envelope> {
        self.envelope.as_ref()
    }

    /// Mutable envelope, so handlers can mark header blocks processed.
    pub fn envelope_mut(&mut self) -> Option<&mut Envelope> {
        self.envelope.as_mut()
    }

    /// The bound transport sender, if any.
    pub fn transport_out(&self) -> Option<&Arc<dyn TransportSender>> {
        self.transport_out.as_ref()
    }

    /// Bind or clear the transport sender.
    pub fn set_transport_out(&mut self, sender: Option<Arc<dyn TransportSender>>) {
        self.transport_out = sender;
    }

    /// The operation context of the exchange, if any.
    pub fn operation_context(&self) -> Option<&Arc<OperationContext>> {
        self.operation_context.as_ref()
    }

    /// Build a copy suitable for handing to a background transport.
    ///
    /// Shares properties, envelope, transport and operation context but
    /// starts from a fresh traversal state, so the original context can
    /// finish its own flow independently.
    pub fn detach(&self) -> MessageContext {
        MessageContext {
            message_id: self.message_id.clone(),
            relates_to: self.relates_to.clone(),
            flow: self.flow,
            traversal: TraversalState::default(),
            properties: self.properties.clone(),
            server_side: self.server_side,
            envelope: self.envelope.clone(),
            transport_out: self.transport_out.clone(),
            operation_context: self.operation_context.clone(),
        }
    }
}

impl fmt::Debug for MessageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageContext")
            .field("message_id", &self.message_id)
            .field("flow", &self.flow)
            .field("traversal", &self.traversal)
            .field("properties", &self.properties)
            .field("server_side", &self.server_side)
            .field("transport_out", &self.transport_out.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_direction() {
        assert_eq!(Flow::In.direction(), Direction::Inbound);
        assert_eq!(Flow::InFault.direction(), Direction::Inbound);
        assert_eq!(Flow::Out.direction(), Direction::Outbound);
        assert_eq!(Flow::OutFault.direction(), Direction::Outbound);
        assert!(Flow::OutFault.is_fault());
        assert!(!Flow::Out.is_fault());
    }

    #[test]
    fn test_properties_typed_access() {
        let mut props = Properties::new();
        props.insert(TRANSPORT_NON_BLOCKING, true);
        props.insert("retries", 3u32);

        assert!(props.is_true(TRANSPORT_NON_BLOCKING));
        assert_eq!(props.get::<u32>("retries"), Some(&3));
        // Wrong type reads as missing
        assert_eq!(props.get::<bool>("retries"), None);
        assert!(!props.is_true("retries"));
        assert!(props.remove("retries"));
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_detach_keeps_identity_and_drops_traversal() {
        let mut ctx = MessageContext::new("urn:uuid:42")
            .with_server_side(true)
            .with_property(TRANSPORT_NON_BLOCKING, true);
        ctx.traversal_mut().set_current_handler_index(Some(3));
        ctx.pause();

        let detached = ctx.detach();
        assert_eq!(detached.message_id(), "urn:uuid:42");
        assert!(detached.is_server_side());
        assert!(detached.properties().is_true(TRANSPORT_NON_BLOCKING));
        assert_eq!(detached.current_handler_index(), None);
        assert!(!detached.is_paused());
    }

    #[test]
    fn test_phase_progress_is_kept_per_level() {
        let mut state = TraversalState::default();
        state.set_current_phase_index(Some(1));
        state.enter_phase();
        state.set_current_phase_index(Some(2));
        state.exit_phase();
        assert_eq!(state.phase_progress(), &[1, 2]);

        // Same index at the outer level keeps the inner progress.
        state.set_current_phase_index(Some(1));
        assert_eq!(state.phase_progress(), &[1, 2]);
        state.enter_phase();
        assert_eq!(state.current_phase_index(), Some(2));
        state.exit_phase();

        // Moving on drops it.
        state.set_current_phase_index(Some(2));
        assert_eq!(state.phase_progress(), &[2]);
        state.set_current_phase_index(None);
        assert!(state.phase_progress().is_empty());
    }
}
