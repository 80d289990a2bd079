//! Protobuf binary codecs.
//!
//! The envelope is a pair of `prost` messages; payloads are
//! `DynamicMessage`s encoded with the protobuf wire format of their own
//! descriptor. Both are the defaults when nothing else is configured.

use bytes::Bytes;
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor};

use crate::{
    // ---
    EnvelopeCodec,
    PayloadCodec,
    RequestEnvelope,
    ResponseEnvelope,
    Result,
};

/// Protobuf binary envelope codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryEnvelopeCodec;

impl EnvelopeCodec for BinaryEnvelopeCodec {
    // ---
    fn encode_request(&self, request: &RequestEnvelope) -> Result<Bytes> {
        Ok(Bytes::from(request.encode_to_vec()))
    }

    fn decode_request(&self, bytes: &[u8]) -> Result<RequestEnvelope> {
        Ok(RequestEnvelope::decode(bytes)?)
    }

    fn encode_response(&self, response: &ResponseEnvelope) -> Result<Bytes> {
        Ok(Bytes::from(response.encode_to_vec()))
    }

    fn decode_response(&self, bytes: &[u8]) -> Result<ResponseEnvelope> {
        Ok(ResponseEnvelope::decode(bytes)?)
    }
}

/// Protobuf binary payload codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryPayloadCodec;

impl PayloadCodec for BinaryPayloadCodec {
    // ---
    fn encode(&self, value: &DynamicMessage) -> Result<Bytes> {
        Ok(Bytes::from(value.encode_to_vec()))
    }

    fn decode(&self, message_type: &MessageDescriptor, bytes: &[u8]) -> Result<DynamicMessage> {
        Ok(DynamicMessage::decode(message_type.clone(), bytes)?)
    }
}
