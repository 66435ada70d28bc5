//! # flowline-std
//!
//! Standard implementations for the flowline message-processing engine.
//!
//! This crate provides:
//! - **Engine**: [`Engine`] with the invocation loop, flow completion,
//!   must-understand validation, resume and non-blocking dispatch
//! - **Configuration**: [`ConfigurationContext`], [`DispatchConfig`]
//! - **Phases**: [`Phase`]
//! - **Standard handlers**: Logging, Tracing, Timeout
//! - **Receivers**: [`CallbackReceiver`]
//! - **Testing**: journal-backed doubles in [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use flowline_core;

// Modules
pub mod config;
pub mod engine;
pub mod handlers;
pub mod phase;
pub mod receivers;
pub mod testing;

pub use config::{ConfigurationContext, ConfigurationContextBuilder, DispatchConfig};
pub use engine::{Engine, NonBlockingDispatcher, check_must_understand};
pub use phase::Phase;
pub use receivers::{CallbackReceiver, CallbackReceiverError};
