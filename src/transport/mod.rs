//! Transport implementations.
//!
//! This module provides concrete implementations of the domain-level
//! `Transport` trait, exposed through factory functions that the
//! `ServiceProxyBuilder` accepts.
//!
//! Domain code must not depend on transport-specific types.

mod http;
mod memory;
mod websocket;

use std::sync::Arc;

pub use http::HttpTransport;
pub use websocket::WebSocketTransport;

use crate::{RpcServer, TransportFactory, TransportPtr};

/// Persistent WebSocket transport (the default).
pub fn websocket_transport() -> TransportFactory {
    Arc::new(|| Arc::new(WebSocketTransport::new()) as TransportPtr)
}

/// Request-response HTTP transport; one `POST` per call.
pub fn http_transport() -> TransportFactory {
    Arc::new(|| Arc::new(HttpTransport::new()) as TransportPtr)
}

/// In-process transport looping requests into `server`.
pub fn memory_transport(server: RpcServer) -> TransportFactory {
    Arc::new(move || memory::create_transport(server.clone()))
}
