//! Protobuf RPC client runtime with automatic request/response correlation
//!
//! Given a protobuf service descriptor and a peer address, this library
//! builds a [`ServiceProxy`] whose methods perform a network round trip and
//! report the decoded reply through a completion callback (or an awaitable
//! [`RemoteMethod::invoke`]). It handles correlation id generation,
//! request/response matching, and concurrent in-flight calls over pluggable
//! transports and codecs.
//!

// Import all sub modules once...
mod client;
mod codec;
mod domain;
mod proxy_builder;
mod server;
mod transport;

mod rpc_config;

mod correlation;
pub mod descriptor;
mod error;
mod lock;
mod macros;

#[cfg(test)]
mod test_support;

#[allow(unused_imports)]
pub(crate) use macros::*;

// Re-export main types
pub use client::{Continuation, CorrelationTable, RemoteMethod, ServiceProxy};
pub use proxy_builder::ServiceProxyBuilder;
pub use server::RpcServer;

pub use rpc_config::{RpcConfig, DEFAULT_ADDRESS};

pub use codec::{
    //
    BinaryEnvelopeCodec,
    BinaryPayloadCodec,
    JsonEnvelopeCodec,
    JsonPayloadCodec,
    Protocol,
};
pub use correlation::CorrelationId;
pub use descriptor::ResponseTypes;
pub use error::{Result, RpcError};

pub use transport::{
    //
    http_transport,
    memory_transport,
    websocket_transport,
    HttpTransport,
    WebSocketTransport,
};

// --- public re-exports
pub use domain::{
    //
    Address,
    EnvelopeCodec,
    EnvelopeCodecPtr,
    ErrorHandler,
    MessageHandler,
    PayloadCodec,
    PayloadCodecPtr,
    RequestEnvelope,
    ResponseEnvelope,
    Transport,
    TransportFactory,
    TransportPtr,
};
