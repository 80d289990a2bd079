//! Service proxy.
//!
//! A [`ServiceProxy`] is built from a service descriptor and exposes one
//! [`RemoteMethod`] per declared method. Each call encodes the request into
//! an envelope under a fresh correlation id, registers a continuation in the
//! correlation table, and hands the bytes to the transport. The dispatcher
//! settles the continuation when the matching reply comes back.

mod dispatcher;
mod pending;

pub use pending::{Continuation, CorrelationTable};

use std::collections::HashMap;
use std::sync::Arc;

use prost_reflect::{
    DynamicMessage, MessageDescriptor, MethodDescriptor, ReflectMessage, ServiceDescriptor,
};
use tokio::sync::oneshot;

use crate::descriptor::method_key;
use crate::{
    // ---
    ErrorHandler,
    RequestEnvelope,
    Result,
    RpcConfig,
    RpcError,
    TransportPtr,
};
use dispatcher::Dispatcher;

/// State shared by every method of one proxy.
struct Inner {
    // ---
    config: RpcConfig,
    transport: TransportPtr,
    table: Arc<CorrelationTable>,
    dispatcher: Dispatcher,
}

/// Client-side proxy for one remote service.
///
/// Owns its transport instance and its correlation table. Dropping the
/// proxy does not fail outstanding calls; use [`close`](Self::close) for
/// that.
///
/// # Example
///
/// ```no_run
/// use protobuf_rpc::{descriptor, ServiceProxyBuilder};
///
/// # async fn example(descriptor_set: &[u8]) -> protobuf_rpc::Result<()> {
/// let service = descriptor::load_service(descriptor_set, "Calculator.Service")?;
///
/// let proxy = ServiceProxyBuilder::new(service)
///     .address("ws://localhost:8080")
///     .build()
///     .await?;
///
/// let add = proxy.method("add")?;
/// # let request = prost_reflect::DynamicMessage::new(add.input_type());
/// let result = add.invoke(&request).await?;
/// # Ok(())
/// # }
/// ```
pub struct ServiceProxy {
    // ---
    service: ServiceDescriptor,
    methods: HashMap<String, RemoteMethod>,
    inner: Arc<Inner>,
}

impl ServiceProxy {
    // ---

    /// Wire a proxy over an already opened transport (internal use by
    /// `ServiceProxyBuilder`).
    pub(crate) fn new(service: ServiceDescriptor, config: RpcConfig, transport: TransportPtr) -> Self {
        // ---
        let table = Arc::new(CorrelationTable::new());
        let dispatcher = Dispatcher::new(table.clone(), config.envelope_codec.clone());

        let inner = Arc::new(Inner {
            config,
            transport,
            table,
            dispatcher,
        });

        let mut methods = HashMap::new();
        for method in service.methods() {
            let key = method_key(&method);
            let Some(response_type) = inner.config.response_types.get(&key).cloned() else {
                // Rejected by RpcConfig::validate before we get here.
                continue;
            };

            methods.insert(
                key.clone(),
                RemoteMethod {
                    key,
                    method,
                    response_type,
                    inner: inner.clone(),
                },
            );
        }

        crate::log_debug!(
            "proxy for {} ready with {} methods at {}",
            service.full_name(),
            methods.len(),
            inner.config.address
        );

        Self {
            service,
            methods,
            inner,
        }
    }

    /// The service this proxy calls.
    pub fn service(&self) -> &ServiceDescriptor {
        &self.service
    }

    /// Look up a method by short name (`add`) or wire key
    /// (`.Calculator.Service.add`).
    pub fn method(&self, name: &str) -> Result<RemoteMethod> {
        // ---
        let key = if name.starts_with('.') {
            name.to_string()
        } else {
            format!(".{}.{}", self.service.full_name(), name)
        };

        self.methods
            .get(&key)
            .cloned()
            .ok_or_else(|| RpcError::MethodNotFound(name.to_string()))
    }

    /// All methods, in no particular order.
    pub fn methods(&self) -> impl Iterator<Item = &RemoteMethod> {
        self.methods.values()
    }

    /// Call `name` with `request`; see [`RemoteMethod::call`].
    ///
    /// Only an unknown method name is reported here. Every other failure
    /// reaches `completion`.
    pub async fn call<F>(&self, name: &str, request: &DynamicMessage, completion: F) -> Result<()>
    where
        F: FnOnce(Result<DynamicMessage>) + Send + 'static,
    {
        // ---
        self.method(name)?.call(request, completion).await;
        Ok(())
    }

    /// Number of calls still waiting for an outcome.
    pub fn pending_count(&self) -> usize {
        self.inner.table.len()
    }

    /// Close the transport and fail every outstanding call with
    /// [`RpcError::ConnectionClosed`].
    pub async fn close(&self) -> Result<()> {
        // ---
        let closed = self.inner.transport.close().await;

        let failed = self.inner.table.fail_all(|| RpcError::ConnectionClosed);
        if failed > 0 {
            crate::log_info!("closed proxy with {failed} calls still pending");
        }

        closed
    }
}

/// One callable method of a [`ServiceProxy`].
///
/// Cheap to clone; clones share the proxy's transport and table.
#[derive(Clone)]
pub struct RemoteMethod {
    // ---
    key: String,
    method: MethodDescriptor,
    response_type: MessageDescriptor,
    inner: Arc<Inner>,
}

impl RemoteMethod {
    // ---

    /// Short method name, e.g. `add`.
    pub fn name(&self) -> &str {
        self.method.name()
    }

    /// Wire key, e.g. `.Calculator.Service.add`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn input_type(&self) -> MessageDescriptor {
        self.method.input()
    }

    /// The type replies are decoded into.
    pub fn response_type(&self) -> &MessageDescriptor {
        &self.response_type
    }

    /// Send `request` and report the outcome to `completion`.
    ///
    /// `completion` runs exactly once: with the decoded reply, or with the
    /// error that ended the call (encode failure, transport failure, remote
    /// handler failure, undecodable reply payload, or proxy close). It runs
    /// on whichever task settles the call, which for persistent transports
    /// is usually after this future has returned.
    pub async fn call<F>(&self, request: &DynamicMessage, completion: F)
    where
        F: FnOnce(Result<DynamicMessage>) + Send + 'static,
    {
        // ---
        // Matched by name: requests built from a separately loaded
        // descriptor set are wire-compatible with this method.
        let input = self.method.input();
        if request.descriptor().full_name() != input.full_name() {
            completion(Err(RpcError::Encode(format!(
                "{} expects {}, got {}",
                self.key,
                input.full_name(),
                request.descriptor().full_name()
            ))));
            return;
        }

        let data = match self.inner.config.payload_codec.encode(request) {
            Ok(data) => data,
            Err(e) => {
                completion(Err(e));
                return;
            }
        };

        let payload_codec = self.inner.config.payload_codec.clone();
        let response_type = self.response_type.clone();
        let id = self.inner.table.register_fresh(Box::new(move |outcome| {
            let result = outcome.and_then(|bytes| payload_codec.decode(&response_type, &bytes));
            completion(result);
        }));

        let envelope = RequestEnvelope::new(self.key.clone(), id, data);
        let bytes = match self.inner.config.envelope_codec.encode_request(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.inner.table.fail(id, e);
                return;
            }
        };

        crate::log_debug!("calling {} as {id} ({} bytes)", self.key, bytes.len());

        let table = self.inner.table.clone();
        let on_error: ErrorHandler = Arc::new(move |err| {
            if table.fail(id, err.clone()) {
                crate::log_debug!("call {id} failed: {err}");
            }
            // No reply can arrive on a closed connection.
            if err == RpcError::ConnectionClosed {
                let drained = table.fail_all(|| RpcError::ConnectionClosed);
                if drained > 0 {
                    crate::log_debug!("connection closed, failed {drained} outstanding calls");
                }
            }
        });

        self.inner
            .transport
            .send(bytes, self.inner.dispatcher.handler(), on_error)
            .await;
    }

    /// Awaitable form of [`call`](Self::call).
    ///
    /// A persistent transport reports a lost connection only to the most
    /// recent send. When that report is [`RpcError::ConnectionClosed`] every
    /// outstanding call on the proxy fails with it. Any other connection
    /// failure (for example a WebSocket read error) fails only the call
    /// that received it; the rest keep waiting until
    /// [`ServiceProxy::close`] drains them.
    pub async fn invoke(&self, request: &DynamicMessage) -> Result<DynamicMessage> {
        // ---
        let (tx, rx) = oneshot::channel();

        self.call(request, move |result| {
            let _ = tx.send(result);
        })
        .await;

        rx.await.map_err(|_| RpcError::ConnectionClosed)?
    }
}
