//! Header metadata of the message envelope.
//!
//! Only what the must-understand check inspects is modelled here; body
//! content and wire parsing belong to the transport layer.

/// Role URI meaning "the next node on the path" for SOAP 1.2.
pub const SOAP12_ROLE_NEXT: &str = "http://www.w3.org/2003/05/soap-envelope/role/next";

/// Actor URI meaning "the next node on the path" for SOAP 1.1.
pub const SOAP11_ACTOR_NEXT: &str = "http://schemas.xmlsoap.org/soap/actor/next";

/// Prefix used when the envelope namespace carries none.
pub const DEFAULT_NAMESPACE_PREFIX: &str = "soapenv";

/// Protocol variant of the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoapVersion {
    /// SOAP 1.1.
    Soap11,
    /// SOAP 1.2.
    Soap12,
}

impl SoapVersion {
    /// The URI that addresses the next node for this version.
    pub const fn next_role(&self) -> &'static str {
        match self {
            SoapVersion::Soap11 => SOAP11_ACTOR_NEXT,
            SoapVersion::Soap12 => SOAP12_ROLE_NEXT,
        }
    }
}

/// A single header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    name: String,
    role: Option<String>,
    must_understand: bool,
    processed: bool,
}

impl HeaderBlock {
    /// Create an optional, unprocessed block with no explicit role.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: None,
            must_understand: false,
            processed: false,
        }
    }

    /// Set the target role (the `actor` attribute for SOAP 1.1).
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the mustUnderstand flag.
    pub fn with_must_understand(mut self, must_understand: bool) -> Self {
        self.must_understand = must_understand;
        self
    }

    /// Qualified name of the block.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target role, if one was given.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Whether processing this block is mandatory.
    pub fn must_understand(&self) -> bool {
        self.must_understand
    }

    /// Whether a handler has processed this block.
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Mark the block as processed.
    pub fn set_processed(&mut self) {
        self.processed = true;
    }
}

/// The header section of an envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    blocks: Vec<HeaderBlock>,
}

impl Header {
    /// Create an empty header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block.
    pub fn with_block(mut self, block: HeaderBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// All header blocks in document order.
    pub fn blocks(&self) -> &[HeaderBlock] {
        &self.blocks
    }

    /// Find a block by name for modification.
    pub fn block_mut(&mut self, name: &str) -> Option<&mut HeaderBlock> {
        self.blocks.iter_mut().find(|b| b.name == name)
    }
}

/// The envelope metadata the engine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    version: SoapVersion,
    prefix: Option<String>,
    header: Option<Header>,
}

impl Envelope {
    /// Create an envelope of the given version with no prefix and no header.
    pub fn new(version: SoapVersion) -> Self {
        Self {
            version,
            prefix: None,
            header: None,
        }
    }

    /// Set the namespace prefix of the envelope element.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Attach a header section.
    pub fn with_header(mut self, header: Header) -> Self {
        self.header = Some(header);
        self
    }

    /// Protocol variant.
    pub fn version(&self) -> SoapVersion {
        self.version
    }

    /// Namespace prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Header section, if present.
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Mutable header section.
    pub fn header_mut(&mut self) -> Option<&mut Header> {
        self.header.as_mut()
    }
}
