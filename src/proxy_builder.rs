//! Service proxy builder.
//!
//! Provides a fluent builder API for configuring a [`ServiceProxy`]: where
//! to connect, which transport to use, and which codecs frame the calls.

use prost_reflect::ServiceDescriptor;

use crate::rpc_config::DEFAULT_ADDRESS;
use crate::transport::websocket_transport;
use crate::{
    // ---
    Address,
    EnvelopeCodecPtr,
    PayloadCodecPtr,
    Protocol,
    ResponseTypes,
    Result,
    RpcConfig,
    ServiceProxy,
    TransportFactory,
};

/// Builder for creating service proxies.
///
/// Everything is optional; unset values resolve to defaults when
/// [`build`](Self::build) runs:
///
/// | Setting          | Default                                   |
/// |------------------|-------------------------------------------|
/// | `address`        | `ws://localhost:80`                       |
/// | `transport`      | WebSocket                                 |
/// | `protocol`       | [`Protocol::Binary`]                      |
/// | `envelope_codec` | taken from `protocol`                     |
/// | `payload_codec`  | taken from `protocol`                     |
/// | `response_types` | each method's declared output type        |
///
/// # Examples
///
/// ## WebSocket (defaults)
/// ```no_run
/// use protobuf_rpc::ServiceProxyBuilder;
///
/// # async fn example(service: prost_reflect::ServiceDescriptor) -> protobuf_rpc::Result<()> {
/// let proxy = ServiceProxyBuilder::new(service)
///     .address("ws://localhost:8080")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// ## HTTP with a JSON envelope
/// ```no_run
/// use protobuf_rpc::{http_transport, Protocol, ServiceProxyBuilder};
///
/// # async fn example(service: prost_reflect::ServiceDescriptor) -> protobuf_rpc::Result<()> {
/// let proxy = ServiceProxyBuilder::new(service)
///     .address("http://localhost:8080/rpc")
///     .transport(http_transport())
///     .protocol(Protocol::Json)
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ServiceProxyBuilder {
    // ---
    service: ServiceDescriptor,
    address: Option<Address>,
    transport: Option<TransportFactory>,
    protocol: Protocol,
    envelope_codec: Option<EnvelopeCodecPtr>,
    payload_codec: Option<PayloadCodecPtr>,
    response_types: Option<ResponseTypes>,
}

impl ServiceProxyBuilder {
    // ---

    /// Create a builder for a proxy of `service`.
    pub fn new(service: ServiceDescriptor) -> Self {
        // ---
        Self {
            service,
            address: None,
            transport: None,
            protocol: Protocol::default(),
            envelope_codec: None,
            payload_codec: None,
            response_types: None,
        }
    }

    /// Set the peer address.
    ///
    /// Default: `ws://localhost:80`.
    pub fn address(mut self, address: impl Into<Address>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the transport constructor.
    ///
    /// Default: [`websocket_transport`](crate::websocket_transport).
    pub fn transport(mut self, factory: TransportFactory) -> Self {
        self.transport = Some(factory);
        self
    }

    /// Select a codec preset.
    ///
    /// Explicit `envelope_codec` / `payload_codec` settings take precedence.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Override the envelope codec.
    pub fn envelope_codec(mut self, codec: EnvelopeCodecPtr) -> Self {
        self.envelope_codec = Some(codec);
        self
    }

    /// Override the payload codec.
    pub fn payload_codec(mut self, codec: PayloadCodecPtr) -> Self {
        self.payload_codec = Some(codec);
        self
    }

    /// Override the response type table.
    ///
    /// The table must cover every method of the service.
    pub fn response_types(mut self, types: ResponseTypes) -> Self {
        self.response_types = Some(types);
        self
    }

    /// Resolve defaults and validate, without opening anything.
    pub fn config(&self) -> Result<RpcConfig> {
        // ---
        let config = RpcConfig {
            address: self
                .address
                .clone()
                .unwrap_or_else(|| Address::from(DEFAULT_ADDRESS)),
            transport: self.transport.clone().unwrap_or_else(websocket_transport),
            envelope_codec: self
                .envelope_codec
                .clone()
                .unwrap_or_else(|| self.protocol.envelope_codec()),
            payload_codec: self
                .payload_codec
                .clone()
                .unwrap_or_else(|| self.protocol.payload_codec()),
            response_types: self
                .response_types
                .clone()
                .unwrap_or_else(|| ResponseTypes::from_service(&self.service)),
        };

        config.validate(&self.service)?;
        Ok(config)
    }

    /// Build the proxy (consumes self).
    ///
    /// Creates the transport from the factory and opens it against the
    /// configured address before returning.
    pub async fn build(self) -> Result<ServiceProxy> {
        // ---
        let config = self.config()?;

        let transport = (config.transport)();
        transport.open(&config.address).await?;

        crate::log_info!(
            "opened {} proxy to {}",
            self.service.full_name(),
            config.address
        );

        Ok(ServiceProxy::new(self.service, config, transport))
    }
}
