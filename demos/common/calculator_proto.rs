//! Descriptor protos for the calculator service.
//!
//! Equivalent to compiling this schema with `protoc --descriptor_set_out`:
//!
//! ```text
//! syntax = "proto3";
//! package Calculator;
//!
//! message AddRequest { int32 lhs = 1; int32 rhs = 2; }
//! message AddResult  { int32 value = 1; }
//! // ... SubRequest/SubResult, MulRequest/MulResult, DivRequest/DivResult
//!
//! service Service {
//!     rpc add (AddRequest) returns (AddResult);
//!     rpc sub (SubRequest) returns (SubResult);
//!     rpc mul (MulRequest) returns (MulResult);
//!     rpc div (DivRequest) returns (DivResult);
//! }
//! ```
//!
//! Only depends on `prost-types`, so it is shared by the crate's unit tests,
//! the integration tests and the demos.
#![allow(dead_code)]

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
};

/// Operations in declaration order.
pub const OPERATIONS: [&str; 4] = ["add", "sub", "mul", "div"];

fn int32_field(name: &str, number: i32) -> FieldDescriptorProto {
    // ---
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::Int32 as i32),
        json_name: Some(name.to_string()),
        ..Default::default()
    }
}

fn message(name: String, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name),
        field: fields,
        ..Default::default()
    }
}

pub fn file_descriptor_set() -> FileDescriptorSet {
    // ---
    let mut messages = Vec::new();
    let mut methods = Vec::new();

    for op in OPERATIONS {
        let title = format!("{}{}", op[..1].to_uppercase(), &op[1..]);

        messages.push(message(
            format!("{title}Request"),
            vec![int32_field("lhs", 1), int32_field("rhs", 2)],
        ));
        messages.push(message(format!("{title}Result"), vec![int32_field("value", 1)]));

        methods.push(MethodDescriptorProto {
            name: Some(op.to_string()),
            input_type: Some(format!(".Calculator.{title}Request")),
            output_type: Some(format!(".Calculator.{title}Result")),
            ..Default::default()
        });
    }

    let file = FileDescriptorProto {
        name: Some("calculator.proto".to_string()),
        package: Some("Calculator".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: messages,
        service: vec![ServiceDescriptorProto {
            name: Some("Service".to_string()),
            method: methods,
            ..Default::default()
        }],
        ..Default::default()
    };

    FileDescriptorSet { file: vec![file] }
}
