//! # flowline-core
//!
//! Core traits and per-message state for the flowline message-processing
//! engine.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! handler, transport and receiver implementations that don't need the
//! engine itself.
//!
//! # Building Blocks
//!
//! ## Handler ([`Handler`])
//!
//! The unit of work. Receives the [`MessageContext`], returns an
//! [`InvocationResponse`] (`Continue`, `Suspend` or `Abort`) and is told via
//! `flow_complete` when the flow it ran in has ended.
//!
//! ## Execution Chain ([`ExecutionChain`])
//!
//! An immutable, shared template of handlers built from configuration. Every
//! message works on its own copy.
//!
//! ## Message Context ([`MessageContext`])
//!
//! Everything one message carries through a flow. The resumable part lives
//! in [`TraversalState`] so a suspended flow can be resumed from any task.
//!
//! ## Collaborators
//!
//! - [`MessageReceiver`] - where inbound messages end up
//! - [`TransportSender`] - where outbound messages leave
//! - [`CallbackRegistry`] / [`Callback`] - how background send failures
//!   reach the waiting caller
//!
//! # Error Types
//!
//! - [`EngineError`] - Top-level error type
//! - [`SoapFault`] - Protocol faults destined for the fault flow
//! - [`HandlerError`] - Errors from the standard handler wrappers

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod chain;
mod context;
mod envelope;
mod error;
mod handler;
mod operation;
mod receiver;
mod response;
mod transport;

// Re-exports
pub use chain::{ExecutionChain, ExecutionChainBuilder};
pub use context::{
    DISABLE_ASYNC_CALLBACK_ON_TRANSPORT_ERROR, Direction, Flow, MessageContext, Properties,
    TRANSPORT_NON_BLOCKING, TraversalState,
};
pub use envelope::{
    DEFAULT_NAMESPACE_PREFIX, Envelope, Header, HeaderBlock, SOAP11_ACTOR_NEXT, SOAP12_ROLE_NEXT,
    SoapVersion,
};
pub use error::{BoxError, EngineError, FaultCode, HandlerError, Result, SoapFault};
pub use handler::{DynHandler, Handler, HandlerRef, handler_ref};
pub use operation::{MessageLabel, Operation, OperationBuilder, OperationContext};
pub use receiver::{Callback, CallbackRegistry, MessageReceiver};
pub use response::InvocationResponse;
pub use transport::TransportSender;
