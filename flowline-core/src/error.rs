//! Error types for flowline.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`EngineError`] - Top-level error returned by every engine operation
//! - [`SoapFault`] - A protocol fault that belongs on the fault flow
//! - [`HandlerError`] - Errors raised by the standard handler wrappers

use std::time::Duration;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A protocol fault (e.g. a must-understand violation).
    ///
    /// Callers are expected to route this into the fault flow rather than
    /// treating it as a generic failure.
    #[error("protocol fault: {0}")]
    Fault(#[from] SoapFault),

    /// The engine was asked to do something the configuration cannot satisfy,
    /// such as sending without a bound transport sender.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A handler failed inside `invoke`.
    #[error("handler `{handler}` failed")]
    Handler {
        /// Name of the failing handler.
        handler: String,
        /// The error the handler raised.
        #[source]
        source: BoxError,
    },

    /// The message receiver rejected the message.
    #[error("message receiver failed")]
    Receiver(#[source] BoxError),

    /// The transport sender failed on the synchronous path.
    #[error("transport sender failed")]
    Transport(#[source] BoxError),

    /// `resume` was called on a context that is not suspended.
    #[error("message `{message_id}` is not paused")]
    NotPaused {
        /// Identifier of the offending message.
        message_id: String,
    },
}

impl EngineError {
    /// Create a configuration error with a message.
    pub fn configuration(message: impl Into<String>) -> Self {
        EngineError::Configuration(message.into())
    }

    /// Returns the protocol fault if this error belongs on the fault flow.
    pub fn fault(&self) -> Option<&SoapFault> {
        match self {
            EngineError::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Check whether this error is a protocol fault.
    pub fn is_fault(&self) -> bool {
        self.fault().is_some()
    }
}

/// Protocol-level fault codes raised by the engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultCode {
    /// A mandatory header block addressed to this node was not processed.
    MustUnderstand,
}

impl FaultCode {
    /// The local part of the fault code as it appears on the wire.
    pub const fn local_name(&self) -> &'static str {
        match self {
            FaultCode::MustUnderstand => "MustUnderstand",
        }
    }
}

impl std::fmt::Display for FaultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.local_name())
    }
}

/// A protocol fault carrying its code and the offending identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{prefix}:{code} - header `{header}` was not understood")]
pub struct SoapFault {
    /// The fault code.
    pub code: FaultCode,
    /// Namespace prefix the fault code is qualified with.
    pub prefix: String,
    /// Qualified name of the header block that caused the fault.
    pub header: String,
}

impl SoapFault {
    /// Create a must-understand fault for the given prefix and header.
    pub fn must_understand(prefix: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            code: FaultCode::MustUnderstand,
            prefix: prefix.into(),
            header: header.into(),
        }
    }

    /// The prefixed fault code, e.g. `soapenv:MustUnderstand`.
    pub fn qualified_code(&self) -> String {
        if self.prefix.is_empty() {
            self.code.to_string()
        } else {
            format!("{}:{}", self.prefix, self.code)
        }
    }
}

/// Errors that can occur in the standard handler wrappers.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The handler timed out.
    #[error("handler timed out after {0:?}")]
    Timeout(Duration),

    /// A custom handler error.
    #[error(transparent)]
    Custom(BoxError),
}

impl From<BoxError> for HandlerError {
    fn from(err: BoxError) -> Self {
        HandlerError::Custom(err)
    }
}

/// Convenience result alias for engine operations.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
