//! Must-understand validation of inbound header blocks.

use flowline_core::{DEFAULT_NAMESPACE_PREFIX, MessageContext, SoapFault, SoapVersion};

/// Verify that every mandatory header block addressed to this node has been
/// dealt with before the message reaches its receiver.
///
/// Only the "next" role is supported: a mandatory, unprocessed block
/// targeted at any other role fails with a `MustUnderstand` fault. A block
/// with no role is treated as targeting "next".
pub fn check_must_understand(ctx: &MessageContext) -> Result<(), SoapFault> {
    let Some(envelope) = ctx.envelope() else {
        return Ok(());
    };
    let Some(header) = envelope.header() else {
        return Ok(());
    };

    let version = envelope.version();
    let prefix = match version {
        SoapVersion::Soap12 => envelope
            .prefix()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_NAMESPACE_PREFIX),
        SoapVersion::Soap11 => envelope.prefix().unwrap_or_default(),
    };

    for block in header.blocks() {
        if block.is_processed() || !block.must_understand() {
            continue;
        }
        match block.role() {
            Some(role) if role != version.next_role() => {
                return Err(SoapFault::must_understand(prefix, block.name()));
            }
            _ => {}
        }
    }
    Ok(())
}
