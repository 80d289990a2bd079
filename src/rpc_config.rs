//! Resolved proxy configuration.
//!
//! `RpcConfig` is what a [`ServiceProxyBuilder`](crate::ServiceProxyBuilder)
//! resolves to: every default filled in, every method covered by a response
//! type. It is immutable once built and shared by all methods of a proxy.

use std::fmt;

use prost_reflect::ServiceDescriptor;

use crate::descriptor::method_key;
use crate::{
    // ---
    Address,
    EnvelopeCodecPtr,
    PayloadCodecPtr,
    ResponseTypes,
    Result,
    RpcError,
    TransportFactory,
};

/// Default address used when none is configured.
pub const DEFAULT_ADDRESS: &str = "ws://localhost:80";

/// Fully resolved configuration for one service proxy.
#[derive(Clone)]
pub struct RpcConfig {
    // ---
    /// Peer address, interpreted by the transport.
    pub address: Address,

    /// Constructor for the proxy's transport instance.
    pub transport: TransportFactory,

    /// Codec for the outer request/response envelope.
    pub envelope_codec: EnvelopeCodecPtr,

    /// Codec for method payloads.
    pub payload_codec: PayloadCodecPtr,

    /// Response message type per method key.
    pub response_types: ResponseTypes,
}

impl RpcConfig {
    // ---

    /// Check that the configuration can serve every method of `service`.
    ///
    /// The address must be non-empty and every declared method must have a
    /// response type, otherwise replies for it could never be decoded.
    pub fn validate(&self, service: &ServiceDescriptor) -> Result<()> {
        // ---
        if self.address.as_str().trim().is_empty() {
            return Err(RpcError::MissingConfig("address".into()));
        }

        let missing: Vec<String> = service
            .methods()
            .map(|method| method_key(&method))
            .filter(|key| self.response_types.get(key).is_none())
            .collect();

        if !missing.is_empty() {
            return Err(RpcError::InvalidConfig(format!(
                "no response type for {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for RpcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        f.debug_struct("RpcConfig")
            .field("address", &self.address)
            .field("response_types", &self.response_types.len())
            .finish_non_exhaustive()
    }
}
