// src/domain/envelope.rs

//! Wire envelope types.
//!
//! The envelope is the outer structure wrapping every method-specific
//! payload. Its logical shape is fixed:
//!
//! ```text
//! message Request  { string name = 1; uint32 id = 2; bytes data = 3; }
//! message Response {                  uint32 id = 2; bytes data = 3; string error = 4; }
//! ```
//!
//! The response carries no method name; the client routes replies purely by
//! `id`. The `error` field is optional on the wire (empty means absent), so
//! peers that predate it simply skip tag 4 as an unknown field.
//!
//! Both types derive `prost::Message` for the binary codec and serde for the
//! JSON codec; `data` is base64 in JSON, matching the protobuf JSON mapping.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::CorrelationId;

/// Outbound request envelope.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct RequestEnvelope {
    // ---
    /// Fully-qualified method key, e.g. `.Calculator.Service.add`.
    #[prost(string, tag = "1")]
    pub name: String,

    /// Correlation id.
    #[prost(uint32, tag = "2")]
    pub id: u32,

    /// Payload-codec-encoded request value.
    #[prost(bytes = "bytes", tag = "3")]
    #[serde(with = "base64_data")]
    pub data: Bytes,
}

/// Inbound response envelope.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    // ---
    /// Correlation id copied from the request.
    #[prost(uint32, tag = "2")]
    pub id: u32,

    /// Payload-codec-encoded response value.
    #[prost(bytes = "bytes", tag = "3")]
    #[serde(with = "base64_data", default)]
    pub data: Bytes,

    /// Handler failure reported by the peer; empty on success.
    #[prost(string, tag = "4")]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl RequestEnvelope {
    // ---
    pub fn new(name: impl Into<String>, id: CorrelationId, data: Bytes) -> Self {
        // ---
        Self {
            name: name.into(),
            id: id.value(),
            data,
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        CorrelationId::from(self.id)
    }
}

impl ResponseEnvelope {
    // ---
    /// A successful reply.
    pub fn ok(id: CorrelationId, data: Bytes) -> Self {
        // ---
        Self {
            id: id.value(),
            data,
            error: String::new(),
        }
    }

    /// A reply reporting that the handler failed.
    pub fn failed(id: CorrelationId, error: impl Into<String>) -> Self {
        // ---
        Self {
            id: id.value(),
            data: Bytes::new(),
            error: error.into(),
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        CorrelationId::from(self.id)
    }

    /// The peer's error message, if it reported one.
    pub fn remote_error(&self) -> Option<&str> {
        // ---
        if self.error.is_empty() {
            None
        } else {
            Some(&self.error)
        }
    }
}

mod base64_data {
    // ---
    use base64::{engine::general_purpose, Engine as _};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&general_purpose::STANDARD.encode(data))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
