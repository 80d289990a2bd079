// src/domain/transport.rs

//! Transport domain abstractions.
//!
//! This module defines the domain-level transport interface used by the
//! service proxy to exchange bytes with a peer. It intentionally avoids any
//! reference to concrete protocols or client libraries.
//!
//! The transport layer is responsible only for moving opaque bytes and
//! reporting failures. Correlation, envelope framing and payload typing are
//! handled elsewhere.
//!
//! Concrete implementations of this interface live under `src/transport/`.
use crate::{Result, RpcError};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// A transport address.
///
/// The interpretation is transport-specific (a `ws://` URL, an `http://`
/// endpoint, a label for the in-memory transport), so it is treated as an
/// opaque string at the domain level.
///
/// Addresses are immutable, cheap to clone, and safe to share across threads.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address(pub Arc<str>);

impl Address {
    // ---
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T> From<T> for Address
where
    T: Into<Arc<str>>,
{
    fn from(value: T) -> Self {
        // ---
        Address(value.into())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handler invoked with the raw bytes of an inbound message.
pub type MessageHandler = Arc<dyn Fn(Bytes) + Send + Sync>;

/// Handler invoked when the transport reports a failure.
///
/// May be invoked more than once on a persistent connection; receivers must
/// tolerate repeated calls (failing an already-removed id is a no-op).
pub type ErrorHandler = Arc<dyn Fn(RpcError) + Send + Sync>;

/// Transport abstraction.
///
/// Two shapes of transport satisfy this contract:
///
/// - **Persistent** (full-duplex socket): `open()` connects eagerly and
///   `send()` replaces the connection's single active message and error
///   handlers before writing. Any inbound message goes to the most recently
///   installed message handler; correlation ids, not handler identity,
///   route the reply to the right caller.
/// - **Request-response** (HTTP round trip): `open()` only records the
///   address and `send()` completes the whole round trip, invoking exactly
///   one of the handlers before it returns.
///
/// Implementations must ensure that:
/// - `send()` never fails past the transport boundary; every failure is
///   reported through `on_error`.
/// - `close()` releases the underlying connection; sends issued afterwards
///   report [`RpcError::ConnectionClosed`] or [`RpcError::NotConnected`].
///
/// # Notes
///
/// This trait uses `async_trait`; the expanded documentation may show explicit
/// lifetimes and a boxed `Future`. This is an implementation detail; consumers
/// should treat methods as normal `async fn`s.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    // ---
    /// Establish readiness to send to `address`.
    async fn open(&self, address: &Address) -> Result<()>;

    /// Deliver `bytes` to the peer and arrange for the outcome to reach
    /// `on_message` or `on_error`.
    async fn send(&self, bytes: Bytes, on_message: MessageHandler, on_error: ErrorHandler);

    /// Close the transport and release any associated resources.
    async fn close(&self) -> Result<()>;
}

/// Shared transport pointer.
///
/// This is an `Arc<dyn Transport>`, which means:
/// - `.clone()` is cheap (only increments a reference count)
/// - Multiple clones share the same underlying connection
/// - Used to erase concrete transport types behind a stable domain interface.
pub type TransportPtr = Arc<dyn Transport>;

/// Constructor for a fresh, unopened transport.
///
/// The proxy calls the factory exactly once at build time and owns the
/// resulting instance.
pub type TransportFactory = Arc<dyn Fn() -> TransportPtr + Send + Sync>;
