//! The tri-state control signal returned by handlers.

/// Result of handler invocation indicating how the chain should progress.
///
/// The invocation loop only uses this to decide whether to keep advancing;
/// what `Continue` means at the end of a chain is decided by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InvocationResponse {
    /// The handler is done with the message; move on to the next handler.
    #[default]
    Continue,
    /// Processing is paused pending an external event. The cursor stays on
    /// the handler that suspended and a later resume re-enters it.
    Suspend,
    /// Processing stops here; the terminal action of the flow is skipped.
    Abort,
}

impl InvocationResponse {
    /// Check if this response lets the loop advance.
    pub const fn is_continue(&self) -> bool {
        matches!(self, InvocationResponse::Continue)
    }

    /// Check if this response stops the loop (`Suspend` or `Abort`).
    pub const fn is_halt(&self) -> bool {
        !self.is_continue()
    }
}

impl std::fmt::Display for InvocationResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvocationResponse::Continue => "CONTINUE",
            InvocationResponse::Suspend => "SUSPEND",
            InvocationResponse::Abort => "ABORT",
        };
        f.write_str(s)
    }
}
