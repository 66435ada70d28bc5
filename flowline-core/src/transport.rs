//! Outbound transport capability.

use crate::{context::MessageContext, error::BoxError};
use async_trait::async_trait;

/// Writes an outbound message to the wire.
///
/// Consulted only by the terminal action of the outbound flows. A context
/// without a bound sender cannot complete a send.
#[async_trait]
pub trait TransportSender: Send + Sync + 'static {
    /// Hand the message to the transport.
    async fn invoke(&self, ctx: &mut MessageContext) -> Result<(), BoxError>;
}
