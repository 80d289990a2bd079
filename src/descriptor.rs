//! Service descriptor helpers.
//!
//! Service descriptors come from `prost-reflect`. This module resolves a
//! service out of a compiled `FileDescriptorSet` (the output of
//! `protoc --descriptor_set_out`), derives the fully-qualified method keys
//! used on the wire, and builds the method → response type table the proxy
//! decodes replies with.

use std::collections::HashMap;

use prost_reflect::{DescriptorPool, MessageDescriptor, MethodDescriptor, ServiceDescriptor};

use crate::{Result, RpcError};

/// Decode a `FileDescriptorSet` and resolve `service` by its full name.
///
/// A leading `.` on the service name is accepted, so both
/// `Calculator.Service` and `.Calculator.Service` resolve.
pub fn load_service(descriptor_set: &[u8], service: &str) -> Result<ServiceDescriptor> {
    // ---
    let pool = DescriptorPool::decode(descriptor_set)?;
    find_service(&pool, service)
}

/// Resolve `service` in an already-built pool.
pub fn find_service(pool: &DescriptorPool, service: &str) -> Result<ServiceDescriptor> {
    // ---
    let name = service.trim_start_matches('.');
    pool.get_service_by_name(name)
        .ok_or_else(|| RpcError::Descriptor(format!("service not found: {name}")))
}

/// Fully-qualified wire key of a method, e.g. `.Calculator.Service.add`.
pub fn method_key(method: &MethodDescriptor) -> String {
    // ---
    format!(".{}", method.full_name())
}

/// Response message type per method key.
///
/// By default derived from the service descriptor; callers may supply their
/// own table, for instance to decode replies into a compatible superset
/// type.
#[derive(Debug, Clone, Default)]
pub struct ResponseTypes {
    types: HashMap<String, MessageDescriptor>,
}

impl ResponseTypes {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the table from every method declared on `service`.
    pub fn from_service(service: &ServiceDescriptor) -> Self {
        // ---
        let types = service
            .methods()
            .map(|method| (method_key(&method), method.output()))
            .collect();

        Self { types }
    }

    /// Register (or replace) the response type for a method key.
    pub fn insert(&mut self, key: impl Into<String>, message_type: MessageDescriptor) {
        self.types.insert(key.into(), message_type);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, message_type: MessageDescriptor) -> Self {
        self.insert(key, message_type);
        self
    }

    pub fn get(&self, key: &str) -> Option<&MessageDescriptor> {
        self.types.get(key)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
