//! Domain layer public interface.
//!
//! This module defines domain-level abstractions that are independent of
//! transport implementations, codecs, or infrastructure concerns.
//!
//! All domain consumers must import symbols via this module, not by
//! referencing individual files directly.

mod codec;
mod envelope;
mod transport;

// --- Codec domain re-exports ---

pub use codec::{
    //
    EnvelopeCodec,
    EnvelopeCodecPtr,
    PayloadCodec,
    PayloadCodecPtr,
};

// --- Envelope domain re-exports ---

pub use envelope::{
    //
    RequestEnvelope,
    ResponseEnvelope,
};

// --- Transport domain re-exports ---

pub use transport::{
    //
    Address,
    ErrorHandler,
    MessageHandler,
    Transport,
    TransportFactory,
    TransportPtr,
};
