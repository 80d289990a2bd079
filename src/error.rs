use thiserror::Error;

/// Errors that can occur while building a proxy or performing an RPC call.
///
/// Per-call failures are delivered through the call's completion; only
/// construction and lookup failures are returned directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The transport reported a failure for a specific send.
    #[error("transport error: {0}")]
    Transport(String),

    /// The connection was closed before a reply arrived.
    #[error("connection closed")]
    ConnectionClosed,

    /// `send()` was called on a transport that was never opened.
    #[error("transport not connected")]
    NotConnected,

    /// An envelope or payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// An envelope or payload could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// The method is not declared on the service descriptor.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// The peer reported a handler failure for this request.
    #[error("remote error: {0}")]
    Remote(String),

    /// A correlation id is already registered in the table.
    #[error("correlation id already registered: {0}")]
    DuplicateCorrelationId(u32),

    /// Required configuration is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    /// Configuration is present but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A service descriptor could not be loaded or resolved.
    #[error("descriptor error: {0}")]
    Descriptor(String),
}

impl From<prost::DecodeError> for RpcError {
    fn from(err: prost::DecodeError) -> Self {
        // ---
        RpcError::Decode(err.to_string())
    }
}

impl From<prost::EncodeError> for RpcError {
    fn from(err: prost::EncodeError) -> Self {
        // ---
        RpcError::Encode(err.to_string())
    }
}

impl From<prost_reflect::DescriptorError> for RpcError {
    fn from(err: prost_reflect::DescriptorError) -> Self {
        // ---
        RpcError::Descriptor(err.to_string())
    }
}

/// Result type alias for RPC operations
pub type Result<T> = std::result::Result<T, RpcError>;
