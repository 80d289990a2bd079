// src/transport/memory/transport.rs

//! In-memory transport implementation.
//!
//! This file contains the concrete implementation of the domain-level
//! `Transport` trait using in-process data structures only.
//!
//! Requests are answered by an [`RpcServer`] running in the same process,
//! so the whole client path is exercised without a socket.

use bytes::Bytes;
use std::sync::{Arc, Mutex};

use crate::lock::lock_ignore_poison;
use crate::{
    // ---
    Address,
    ErrorHandler,
    MessageHandler,
    Result,
    RpcError,
    RpcServer,
    Transport,
    TransportPtr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    // ---
    Idle,
    Open,
    Closed,
}

/// In-memory transport.
///
/// This transport hands every request straight to an [`RpcServer`] in the
/// same process. It is intended for testing and for validating higher-level
/// behavior without introducing network or timing-related variability.
///
/// ## Semantics
///
/// - `open()` always succeeds; the address is only used for logging.
/// - Each `send()` is handled on its own task, and the reply goes to that
///   send's message handler. Replies may therefore complete in any order.
/// - A request the server cannot decode produces no reply, as on the wire.
/// - Sending before `open()` reports [`RpcError::NotConnected`]; after
///   `close()`, [`RpcError::ConnectionClosed`].
///
/// ## Non-Goals
///
/// - Persistence or durability
/// - Network failure simulation
struct MemoryTransport {
    // ---
    server: RpcServer,
    state: Mutex<State>,
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    // ---

    async fn open(&self, address: &Address) -> Result<()> {
        // ---
        crate::log_debug!("memory transport opened as {address}");
        *lock_ignore_poison(&self.state) = State::Open;
        Ok(())
    }

    async fn send(&self, bytes: Bytes, on_message: MessageHandler, on_error: ErrorHandler) {
        // ---
        let state = *lock_ignore_poison(&self.state);
        match state {
            State::Idle => return on_error(RpcError::NotConnected),
            State::Closed => return on_error(RpcError::ConnectionClosed),
            State::Open => {}
        }

        let server = self.server.clone();
        tokio::spawn(async move {
            if let Some(reply) = server.handle_message(bytes).await {
                on_message(reply);
            }
        });
    }

    /// Close the transport.
    ///
    /// Requests already handed to the server still complete.
    async fn close(&self) -> Result<()> {
        // ---
        *lock_ignore_poison(&self.state) = State::Closed;
        Ok(())
    }
}

/// Create a new in-memory transport serving requests with `server`.
///
/// This transport is always available and requires no external resources.
pub fn create_transport(server: RpcServer) -> TransportPtr {
    // ---
    let transport = MemoryTransport {
        server,
        state: Mutex::new(State::Idle),
    };

    Arc::new(transport)
}
