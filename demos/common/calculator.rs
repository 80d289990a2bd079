//! Calculator service shared by the demos and integration tests.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor, ServiceDescriptor, Value};
use std::sync::Arc;

use protobuf_rpc::{
    descriptor, BinaryEnvelopeCodec, BinaryPayloadCodec, EnvelopeCodecPtr, PayloadCodecPtr,
    RemoteMethod, RpcError, RpcServer,
};

use super::calculator_proto::file_descriptor_set;
pub use super::calculator_proto::OPERATIONS;

pub const SERVICE: &str = "Calculator.Service";

/// The encoded `FileDescriptorSet`, as `protoc -o` would write it.
pub fn descriptor_set() -> Vec<u8> {
    file_descriptor_set().encode_to_vec()
}

pub fn service() -> Result<ServiceDescriptor> {
    Ok(descriptor::load_service(&descriptor_set(), SERVICE)?)
}

/// Build a `{lhs, rhs}` request for `method`.
pub fn request(method: &RemoteMethod, lhs: i32, rhs: i32) -> DynamicMessage {
    // ---
    let mut msg = DynamicMessage::new(method.input_type());
    msg.set_field_by_name("lhs", Value::I32(lhs));
    msg.set_field_by_name("rhs", Value::I32(rhs));
    msg
}

/// Read the `value` field of a result.
pub fn value(result: &DynamicMessage) -> Result<i32> {
    result
        .get_field_by_name("value")
        .and_then(|v| v.as_i32())
        .ok_or_else(|| anyhow!("result has no int32 value"))
}

fn operand(request: &DynamicMessage, name: &str) -> i32 {
    request
        .get_field_by_name(name)
        .and_then(|v| v.as_i32())
        .unwrap_or_default()
}

fn reply(output: &MessageDescriptor, value: i32) -> DynamicMessage {
    // ---
    let mut msg = DynamicMessage::new(output.clone());
    msg.set_field_by_name("value", Value::I32(value));
    msg
}

/// Integer calculator semantics; wrapping arithmetic, floor division.
pub fn evaluate(op: &str, lhs: i32, rhs: i32) -> std::result::Result<i32, RpcError> {
    // ---
    match op {
        "add" => Ok(lhs.wrapping_add(rhs)),
        "sub" => Ok(lhs.wrapping_sub(rhs)),
        "mul" => Ok(lhs.wrapping_mul(rhs)),
        "div" if rhs == 0 => Err(RpcError::Remote("division by zero".into())),
        "div" => Ok(floor_div(lhs, rhs)),
        other => Err(RpcError::MethodNotFound(other.to_string())),
    }
}

/// Quotient rounded toward negative infinity: `-7 / 2 == -4`.
fn floor_div(lhs: i32, rhs: i32) -> i32 {
    // ---
    let quotient = lhs.wrapping_div(rhs);
    if lhs.wrapping_rem(rhs) != 0 && (lhs < 0) != (rhs < 0) {
        quotient - 1
    } else {
        quotient
    }
}

/// An `RpcServer` with all four operations registered.
pub fn server() -> Result<RpcServer> {
    server_with_codecs(Arc::new(BinaryEnvelopeCodec), Arc::new(BinaryPayloadCodec))
}

/// Same as [`server`], framing replies with the given codecs.
pub fn server_with_codecs(
    envelope_codec: EnvelopeCodecPtr,
    payload_codec: PayloadCodecPtr,
) -> Result<RpcServer> {
    // ---
    let service = service()?;
    let server = RpcServer::with_codecs(service.clone(), envelope_codec, payload_codec);

    for method in service.methods() {
        let op = method.name().to_string();
        let output = method.output();

        server.register(method.name(), move |request: DynamicMessage| {
            let op = op.clone();
            let output = output.clone();
            async move {
                let lhs = operand(&request, "lhs");
                let rhs = operand(&request, "rhs");
                evaluate(&op, lhs, rhs).map(|value| reply(&output, value))
            }
        })?;
    }

    Ok(server)
}
