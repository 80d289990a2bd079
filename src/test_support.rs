//! Shared fixtures for unit tests: a small calculator service built from
//! descriptor protos, and helpers for int32 messages.

use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor, ServiceDescriptor, Value};
use prost_types::FileDescriptorSet;

#[path = "../demos/common/calculator_proto.rs"]
mod calculator_proto;

pub(crate) fn calculator_file_set() -> FileDescriptorSet {
    calculator_proto::file_descriptor_set()
}

pub(crate) fn calculator_pool() -> DescriptorPool {
    DescriptorPool::from_file_descriptor_set(calculator_file_set()).expect("valid calculator descriptor")
}

pub(crate) fn calculator_service() -> ServiceDescriptor {
    calculator_pool()
        .get_service_by_name("Calculator.Service")
        .expect("calculator service")
}

pub(crate) fn message_type(name: &str) -> MessageDescriptor {
    calculator_pool()
        .get_message_by_name(&format!("Calculator.{name}"))
        .expect("calculator message")
}

pub(crate) fn add_request_type() -> MessageDescriptor {
    message_type("AddRequest")
}

pub(crate) fn int_message(ty: &MessageDescriptor, fields: &[(&str, i32)]) -> DynamicMessage {
    // ---
    let mut msg = DynamicMessage::new(ty.clone());
    for (name, value) in fields {
        msg.set_field_by_name(name, Value::I32(*value));
    }
    msg
}

pub(crate) fn int_field(msg: &DynamicMessage, name: &str) -> i32 {
    msg.get_field_by_name(name)
        .and_then(|value| value.as_i32())
        .expect("int32 field")
}
