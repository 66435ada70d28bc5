//! Standard handlers.
//!
//! - [`LoggingHandler`]: logs each message passing its chain position
//! - [`TracingHandler`]: runs a handler inside a `tracing` span
//! - [`TimeoutHandler`]: bounds how long a handler's `invoke` may take

mod logging;
mod span;
mod timeout;

pub use logging::LoggingHandler;
pub use span::TracingHandler;
pub use timeout::TimeoutHandler;
