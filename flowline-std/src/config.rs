//! Process-wide engine configuration.
//!
//! This module provides a builder for registering the global template
//! chains and a frozen [`ConfigurationContext`] that is shared by every
//! message and never mutated during processing. Redeployment replaces the
//! whole context.

use crate::engine::NonBlockingDispatcher;
use flowline_core::ExecutionChain;
use std::fmt;
use tokio::sync::Semaphore;

/// Default upper bound on concurrently running non-blocking sends.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Sizing of the non-blocking transport pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Maximum number of background sends running at once. Further sends
    /// are queued until a slot frees up.
    pub max_in_flight: usize,
}

impl DispatchConfig {
    /// Set the in-flight limit.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// The limit clamped to what the pool can represent (at least one).
    pub(crate) fn permits(&self) -> usize {
        self.max_in_flight.clamp(1, Semaphore::MAX_PERMITS)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// The template chain source and shared resources of one deployment.
///
/// # Example
///
/// ```rust,ignore
/// let config = Arc::new(
///     ConfigurationContext::builder()
///         .in_chain(inbound)
///         .out_chain(outbound)
///         .dispatch(DispatchConfig::default().with_max_in_flight(16))
///         .build(),
/// );
/// let engine = Engine::new(config);
/// ```
pub struct ConfigurationContext {
    in_chain: ExecutionChain,
    out_chain: ExecutionChain,
    in_fault_chain: ExecutionChain,
    out_fault_chain: ExecutionChain,
    dispatch: DispatchConfig,
    dispatcher: NonBlockingDispatcher,
}

impl ConfigurationContext {
    /// Create a builder with empty chains and default dispatch settings.
    pub fn builder() -> ConfigurationContextBuilder {
        ConfigurationContextBuilder::new()
    }

    /// Global inbound chain.
    pub fn global_in_chain(&self) -> &ExecutionChain {
        &self.in_chain
    }

    /// Global outbound chain, run after the operation's own out chain.
    pub fn global_out_chain(&self) -> &ExecutionChain {
        &self.out_chain
    }

    /// Inbound fault chain.
    pub fn in_fault_chain(&self) -> &ExecutionChain {
        &self.in_fault_chain
    }

    /// Global outbound fault chain.
    pub fn out_fault_chain(&self) -> &ExecutionChain {
        &self.out_fault_chain
    }

    /// Dispatch pool sizing this context was built with.
    pub fn dispatch_config(&self) -> DispatchConfig {
        self.dispatch
    }

    /// The pool non-blocking sends run on.
    pub fn dispatcher(&self) -> &NonBlockingDispatcher {
        &self.dispatcher
    }
}

impl Default for ConfigurationContext {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for ConfigurationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationContext")
            .field("in_chain", &self.in_chain)
            .field("out_chain", &self.out_chain)
            .field("in_fault_chain", &self.in_fault_chain)
            .field("out_fault_chain", &self.out_fault_chain)
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

/// Builder for a [`ConfigurationContext`].
#[derive(Default)]
pub struct ConfigurationContextBuilder {
    in_chain: ExecutionChain,
    out_chain: ExecutionChain,
    in_fault_chain: ExecutionChain,
    out_fault_chain: ExecutionChain,
    dispatch: DispatchConfig,
}

impl ConfigurationContextBuilder {
    /// Create a builder with empty chains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global inbound chain.
    pub fn in_chain(mut self, chain: ExecutionChain) -> Self {
        self.in_chain = chain;
        self
    }

    /// Set the global outbound chain.
    pub fn out_chain(mut self, chain: ExecutionChain) -> Self {
        self.out_chain = chain;
        self
    }

    /// Set the inbound fault chain.
    pub fn in_fault_chain(mut self, chain: ExecutionChain) -> Self {
        self.in_fault_chain = chain;
        self
    }

    /// Set the global outbound fault chain.
    pub fn out_fault_chain(mut self, chain: ExecutionChain) -> Self {
        self.out_fault_chain = chain;
        self
    }

    /// Set the non-blocking pool sizing.
    pub fn dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Freeze the configuration.
    pub fn build(self) -> ConfigurationContext {
        ConfigurationContext {
            in_chain: self.in_chain,
            out_chain: self.out_chain,
            in_fault_chain: self.in_fault_chain,
            out_fault_chain: self.out_fault_chain,
            dispatch: self.dispatch,
            dispatcher: NonBlockingDispatcher::new(&self.dispatch),
        }
    }
}
