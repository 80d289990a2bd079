// src/domain/codec.rs

//! Codec domain abstractions.
//!
//! Two independent codecs take part in every call:
//!
//! - the [`EnvelopeCodec`] turns the outer [`RequestEnvelope`] /
//!   [`ResponseEnvelope`] into bytes for the transport, and back;
//! - the [`PayloadCodec`] turns the method-specific request and response
//!   messages into the opaque `data` bytes carried inside the envelope.
//!
//! Keeping them separate lets the envelope use one representation (compact
//! binary) while payloads use another (JSON) without coupling the two.
//!
//! Concrete implementations live under `src/codec/`.

use bytes::Bytes;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use std::sync::Arc;

use crate::{RequestEnvelope, ResponseEnvelope, Result};

/// Encodes and decodes the outer request/response envelope.
///
/// The client uses `encode_request` and `decode_response`; a server uses the
/// opposite pair.
pub trait EnvelopeCodec: Send + Sync {
    // ---
    fn encode_request(&self, request: &RequestEnvelope) -> Result<Bytes>;

    fn decode_request(&self, bytes: &[u8]) -> Result<RequestEnvelope>;

    fn encode_response(&self, response: &ResponseEnvelope) -> Result<Bytes>;

    fn decode_response(&self, bytes: &[u8]) -> Result<ResponseEnvelope>;
}

/// Encodes and decodes method payloads.
///
/// Decoding needs the message type to build, which the proxy takes from the
/// response type registered for the originating method.
pub trait PayloadCodec: Send + Sync {
    // ---
    fn encode(&self, value: &DynamicMessage) -> Result<Bytes>;

    fn decode(&self, message_type: &MessageDescriptor, bytes: &[u8]) -> Result<DynamicMessage>;
}

/// Shared envelope codec pointer.
pub type EnvelopeCodecPtr = Arc<dyn EnvelopeCodec>;

/// Shared payload codec pointer.
pub type PayloadCodecPtr = Arc<dyn PayloadCodec>;
