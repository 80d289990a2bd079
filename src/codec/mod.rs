//! Codec implementations.
//!
//! Concrete envelope and payload codecs, plus the [`Protocol`] presets that
//! pair them. Domain code depends only on the traits in `crate::domain`.

mod binary;
mod json;

use std::sync::Arc;

pub use binary::{BinaryEnvelopeCodec, BinaryPayloadCodec};
pub use json::{JsonEnvelopeCodec, JsonPayloadCodec};

use crate::{EnvelopeCodecPtr, PayloadCodecPtr};

/// Named envelope/payload codec pairings.
///
/// - [`Protocol::Binary`]: protobuf envelope, protobuf payload (the default).
/// - [`Protocol::Json`]: JSON envelope, protobuf payload.
///
/// Either half can still be overridden individually on the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Binary,
    Json,
}

impl Protocol {
    // ---
    pub fn envelope_codec(self) -> EnvelopeCodecPtr {
        // ---
        match self {
            Protocol::Binary => Arc::new(BinaryEnvelopeCodec),
            Protocol::Json => Arc::new(JsonEnvelopeCodec),
        }
    }

    pub fn payload_codec(self) -> PayloadCodecPtr {
        // ---
        match self {
            Protocol::Binary | Protocol::Json => Arc::new(BinaryPayloadCodec),
        }
    }
}
