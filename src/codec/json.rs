//! JSON codecs.
//!
//! The envelope is rendered with serde (`data` as base64); payloads use the
//! protobuf JSON mapping provided by `prost-reflect`.

use bytes::Bytes;
use prost_reflect::{DynamicMessage, MessageDescriptor};

use crate::{
    // ---
    EnvelopeCodec,
    PayloadCodec,
    RequestEnvelope,
    ResponseEnvelope,
    Result,
    RpcError,
};

/// JSON envelope codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEnvelopeCodec;

impl EnvelopeCodec for JsonEnvelopeCodec {
    // ---
    fn encode_request(&self, request: &RequestEnvelope) -> Result<Bytes> {
        to_json(request)
    }

    fn decode_request(&self, bytes: &[u8]) -> Result<RequestEnvelope> {
        serde_json::from_slice(bytes).map_err(|e| RpcError::Decode(e.to_string()))
    }

    fn encode_response(&self, response: &ResponseEnvelope) -> Result<Bytes> {
        to_json(response)
    }

    fn decode_response(&self, bytes: &[u8]) -> Result<ResponseEnvelope> {
        serde_json::from_slice(bytes).map_err(|e| RpcError::Decode(e.to_string()))
    }
}

/// JSON payload codec (protobuf JSON mapping).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPayloadCodec;

impl PayloadCodec for JsonPayloadCodec {
    // ---
    fn encode(&self, value: &DynamicMessage) -> Result<Bytes> {
        to_json(value)
    }

    fn decode(&self, message_type: &MessageDescriptor, bytes: &[u8]) -> Result<DynamicMessage> {
        // ---
        let mut de = serde_json::Deserializer::from_slice(bytes);
        let value = DynamicMessage::deserialize(message_type.clone(), &mut de)
            .map_err(|e| RpcError::Decode(e.to_string()))?;

        // Reject trailing input after the message object.
        de.end().map_err(|e| RpcError::Decode(e.to_string()))?;
        Ok(value)
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    // ---
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| RpcError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::test_support::{add_request_type, int_field, int_message};
    use crate::CorrelationId;

    #[test]
    fn test_request_envelope_is_readable_json() {
        // ---
        let codec = JsonEnvelopeCodec;
        let request = RequestEnvelope::new(
            ".Calculator.Service.add",
            CorrelationId::from(42),
            Bytes::from_static(b"\x08\x02\x10\x03"),
        );

        let bytes = codec.encode_request(&request).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["name"], ".Calculator.Service.add");
        assert_eq!(json["id"], 42);
        assert_eq!(json["data"], "CAIQAw==");
        assert_eq!(codec.decode_request(&bytes).unwrap(), request);
    }

    #[test]
    fn test_response_error_field_is_optional() {
        // ---
        let codec = JsonEnvelopeCodec;

        let ok = codec
            .decode_response(br#"{"id": 9, "data": "CAU="}"#)
            .unwrap();
        assert_eq!(ok.correlation_id(), CorrelationId::from(9));
        assert_eq!(ok.remote_error(), None);

        let failed = ResponseEnvelope::failed(CorrelationId::from(9), "division by zero");
        let bytes = codec.encode_response(&failed).unwrap();
        let decoded = codec.decode_response(&bytes).unwrap();
        assert_eq!(decoded.remote_error(), Some("division by zero"));
    }

    #[test]
    fn test_payload_uses_field_names() {
        // ---
        let codec = JsonPayloadCodec;
        let ty = add_request_type();
        let value = int_message(&ty, &[("lhs", 2), ("rhs", 3)]);

        let bytes = codec.encode(&value).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["lhs"], 2);
        assert_eq!(json["rhs"], 3);

        let decoded = codec.decode(&ty, &bytes).unwrap();
        assert_eq!(int_field(&decoded, "lhs"), 2);
        assert_eq!(int_field(&decoded, "rhs"), 3);
    }

    #[test]
    fn test_payload_rejects_unknown_shape() {
        // ---
        let codec = JsonPayloadCodec;
        let ty = add_request_type();

        let err = codec.decode(&ty, br#"{"lhs": "two"}"#).unwrap_err();
        assert!(matches!(err, RpcError::Decode(_)));

        let err = codec.decode(&ty, br#"{"lhs": 1} trailing"#).unwrap_err();
        assert!(matches!(err, RpcError::Decode(_)));
    }
}
