// src/transport/memory/mod.rs

//! In-memory transport implementation.
//!
//! This module provides a pure in-process implementation of the domain-level
//! `Transport` trait, looping requests back into an `RpcServer`. It is
//! intended primarily for testing, local execution, and as a reference for
//! transport semantics.
//!
//! ## Reference Semantics
//!
//! The in-memory transport establishes the following expectations:
//!
//! - Every accepted `send()` reaches the peer, and every reply the peer
//!   produces reaches the message handler given to that `send()`.
//! - Failures are reported through the error handler, never by panicking or
//!   returning from `send()`.
//! - Replies may complete out of order; callers must rely on correlation ids.
//!
//! ## Non-Goals
//!
//! This transport does not attempt to emulate the failure modes of any real
//! network. It exists to provide a clear, deterministic baseline against
//! which higher-level behavior can be validated.

mod transport;

pub use transport::create_transport;
