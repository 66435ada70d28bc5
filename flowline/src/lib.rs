//! # flowline - Resumable Message-Processing Engine
//!
//! `flowline` pushes each message through an ordered chain of handlers. Any
//! handler may suspend the flow; everything needed to pick it up again is
//! stored in the [`MessageContext`], so the flow can be resumed later from a
//! different task. Handlers that ran are told when their flow is over, on
//! every outcome except suspension.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flowline::prelude::*;
//! use std::sync::Arc;
//!
//! struct AddressingHandler;
//!
//! impl Handler for AddressingHandler {
//!     fn name(&self) -> &str {
//!         "addressing"
//!     }
//!
//!     async fn invoke(&self, ctx: &mut MessageContext) -> Result<InvocationResponse, BoxError> {
//!         Ok(InvocationResponse::Continue)
//!     }
//! }
//!
//! let config = ConfigurationContext::builder()
//!     .in_chain(ExecutionChain::builder().handler(AddressingHandler).build())
//!     .build();
//! let engine = Engine::new(Arc::new(config));
//!
//! let mut ctx = MessageContext::new("urn:uuid:1");
//! match engine.receive(&mut ctx).await? {
//!     InvocationResponse::Suspend => { /* park ctx, call engine.resume later */ }
//!     _ => {}
//! }
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use flowline_core::{
    // Error types
    BoxError,
    // Collaborators
    Callback,
    CallbackRegistry,
    // Context
    DISABLE_ASYNC_CALLBACK_ON_TRANSPORT_ERROR,
    DEFAULT_NAMESPACE_PREFIX,
    Direction,
    // Handler
    DynHandler,
    EngineError,
    // Envelope
    Envelope,
    // Chain
    ExecutionChain,
    ExecutionChainBuilder,
    FaultCode,
    Flow,
    Handler,
    HandlerError,
    HandlerRef,
    Header,
    HeaderBlock,
    // Response
    InvocationResponse,
    MessageContext,
    MessageLabel,
    MessageReceiver,
    // Operation
    Operation,
    OperationBuilder,
    OperationContext,
    Properties,
    SOAP11_ACTOR_NEXT,
    SOAP12_ROLE_NEXT,
    SoapFault,
    SoapVersion,
    TRANSPORT_NON_BLOCKING,
    TransportSender,
    TraversalState,
    handler_ref,
};

// Engine and configuration
pub use flowline_std::{
    CallbackReceiver, CallbackReceiverError, ConfigurationContext, ConfigurationContextBuilder,
    DispatchConfig, Engine, NonBlockingDispatcher, Phase, check_must_understand,
};

/// Collaborator traits use `#[async_trait]`; re-exported so implementors
/// don't need the dependency themselves.
pub use async_trait::async_trait;

/// Standard handler implementations.
pub mod handlers {
    pub use flowline_std::handlers::{LoggingHandler, TimeoutHandler, TracingHandler};
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use flowline_std::testing::*;
}

/// Prelude module - common imports for flowline.
///
/// # Usage
///
/// ```rust,ignore
/// use flowline::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, ConfigurationContext, Engine, EngineError, ExecutionChain, Flow, Handler,
        InvocationResponse, MessageContext, MessageReceiver, Operation, OperationContext, Phase,
        TransportSender, async_trait,
    };
}
