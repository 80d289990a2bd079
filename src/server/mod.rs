//! RPC server: the peer side of the proxy's wire protocol.
//!
//! Holds a method-keyed handler registry for one service. Each inbound
//! request envelope is decoded, its payload decoded with the method's input
//! type, the handler run, and a response envelope encoded carrying the same
//! correlation id. Handler failures travel back in the response's error
//! field, so a failed call never takes the connection down.
//!
//! The server is transport-neutral ([`RpcServer::handle_message`]); it can be
//! served over WebSocket with [`RpcServer::serve_websocket`] or driven
//! in-process by the memory transport.
mod handler;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use prost_reflect::{DynamicMessage, MethodDescriptor, ReflectMessage, ServiceDescriptor};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::codec::{BinaryEnvelopeCodec, BinaryPayloadCodec};
use crate::descriptor::method_key;
use crate::lock::lock_ignore_poison;
use crate::{
    // ---
    EnvelopeCodecPtr,
    PayloadCodecPtr,
    RequestEnvelope,
    ResponseEnvelope,
    Result,
    RpcError,
};
use handler::{wrap_handler, BoxedHandler};

/// Registered method: its descriptor and handler.
#[derive(Clone)]
struct Route {
    // ---
    method: MethodDescriptor,
    handler: BoxedHandler,
}

struct Inner {
    // ---
    service: ServiceDescriptor,
    envelope_codec: EnvelopeCodecPtr,
    payload_codec: PayloadCodecPtr,
    routes: Mutex<HashMap<String, Route>>,
}

/// RPC server for one protobuf service.
///
/// Cheap to clone; clones share the handler registry.
///
/// # Example
///
/// ```no_run
/// use protobuf_rpc::{RpcError, RpcServer};
/// use prost_reflect::{DynamicMessage, Value};
///
/// # async fn example(service: prost_reflect::ServiceDescriptor) -> protobuf_rpc::Result<()> {
/// let server = RpcServer::new(service);
/// let output = server.service().methods().find(|m| m.name() == "div").unwrap().output();
///
/// server.register("div", move |request: DynamicMessage| {
///     let output = output.clone();
///     async move {
///         let lhs = request.get_field_by_name("lhs").and_then(|v| v.as_i32()).unwrap_or(0);
///         let rhs = request.get_field_by_name("rhs").and_then(|v| v.as_i32()).unwrap_or(0);
///         if rhs == 0 {
///             return Err(RpcError::Remote("division by zero".into()));
///         }
///         let mut reply = DynamicMessage::new(output);
///         reply.set_field_by_name("value", Value::I32(lhs / rhs));
///         Ok(reply)
///     }
/// })?;
///
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await.unwrap();
/// server.serve_websocket(listener).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RpcServer {
    // ---
    inner: Arc<Inner>,
}

impl RpcServer {
    // ---

    /// Create a server for `service` using the binary codecs.
    pub fn new(service: ServiceDescriptor) -> Self {
        Self::with_codecs(service, Arc::new(BinaryEnvelopeCodec), Arc::new(BinaryPayloadCodec))
    }

    /// Create a server with explicit codecs; they must match the proxy's.
    pub fn with_codecs(
        service: ServiceDescriptor,
        envelope_codec: EnvelopeCodecPtr,
        payload_codec: PayloadCodecPtr,
    ) -> Self {
        // ---
        Self {
            inner: Arc::new(Inner {
                service,
                envelope_codec,
                payload_codec,
                routes: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn service(&self) -> &ServiceDescriptor {
        &self.inner.service
    }

    /// Register an async handler for a method.
    ///
    /// `method` is the short name (`add`) or the wire key
    /// (`.Calculator.Service.add`). Registering the same method again
    /// replaces the previous handler.
    ///
    /// # Handler Execution
    ///
    /// - The handler receives the request decoded with the method's input type
    /// - It must return a message of the method's output type
    /// - `Err(RpcError::Remote(msg))` sends `msg` back to the caller as-is;
    ///   any other error is sent back in its display form
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::MethodNotFound`] if the service declares no such
    /// method.
    pub fn register<F, Fut>(&self, method: &str, handler: F) -> Result<()>
    where
        F: Fn(DynamicMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<DynamicMessage>> + Send + 'static,
    {
        // ---
        let descriptor = self
            .inner
            .service
            .methods()
            .find(|m| m.name() == method || method_key(m) == method)
            .ok_or_else(|| RpcError::MethodNotFound(method.to_string()))?;

        let key = method_key(&descriptor);
        crate::log_debug!("registered handler for {key}");

        let route = Route {
            method: descriptor,
            handler: wrap_handler(handler),
        };
        lock_ignore_poison(&self.inner.routes).insert(key, route);
        Ok(())
    }

    /// Process one encoded request envelope and produce the encoded reply.
    ///
    /// Returns `None` only when no reply can be addressed: the request
    /// envelope itself is undecodable, or the reply cannot be encoded.
    /// Unknown methods and handler failures produce an error reply.
    pub async fn handle_message(&self, bytes: Bytes) -> Option<Bytes> {
        // ---
        let request = match self.inner.envelope_codec.decode_request(&bytes) {
            Ok(request) => request,
            Err(e) => {
                crate::log_warn!("dropping undecodable request ({} bytes): {e}", bytes.len());
                return None;
            }
        };

        let id = request.correlation_id();
        let response = match self.dispatch(request).await {
            Ok(data) => ResponseEnvelope::ok(id, data),
            Err(e) => {
                crate::log_debug!("request {id} failed: {e}");
                ResponseEnvelope::failed(id, reply_message(&e))
            }
        };

        match self.inner.envelope_codec.encode_response(&response) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                crate::log_error!("failed to encode reply for {id}: {e}");
                None
            }
        }
    }

    async fn dispatch(&self, request: RequestEnvelope) -> Result<Bytes> {
        // ---
        let route = lock_ignore_poison(&self.inner.routes)
            .get(&request.name)
            .cloned()
            .ok_or_else(|| RpcError::MethodNotFound(request.name.clone()))?;

        let input = self
            .inner
            .payload_codec
            .decode(&route.method.input(), &request.data)?;

        let output = (route.handler)(input).await?;

        let expected = route.method.output();
        if output.descriptor().full_name() != expected.full_name() {
            return Err(RpcError::Encode(format!(
                "handler for {} returned {}, expected {}",
                request.name,
                output.descriptor().full_name(),
                expected.full_name()
            )));
        }

        self.inner.payload_codec.encode(&output)
    }

    /// Accept WebSocket connections on `listener` until accepting fails.
    ///
    /// Each connection is served on its own task, and each request on a
    /// connection is handled concurrently, so replies may leave in a
    /// different order than their requests arrived.
    pub async fn serve_websocket(&self, listener: TcpListener) -> Result<()> {
        // ---
        if let Ok(addr) = listener.local_addr() {
            crate::log_info!("serving {} on ws://{addr}", self.inner.service.full_name());
        }

        loop {
            let (stream, peer) = listener
                .accept()
                .await
                .map_err(|e| RpcError::Transport(format!("accept failed: {e}")))?;

            crate::log_debug!("accepted connection from {peer}");
            let server = self.clone();
            tokio::spawn(async move {
                if let Err(e) = server.serve_connection(stream).await {
                    crate::log_warn!("connection from {peer} ended: {e}");
                }
            });
        }
    }

    async fn serve_connection(&self, stream: TcpStream) -> Result<()> {
        // ---
        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| RpcError::Transport(format!("websocket handshake failed: {e}")))?;

        let (mut sink, mut source) = ws.split();
        let (reply_tx, mut reply_rx) = mpsc::channel::<Bytes>(64);

        let writer = tokio::spawn(async move {
            while let Some(reply) = reply_rx.recv().await {
                if let Err(e) = sink.send(Message::Binary(reply)).await {
                    crate::log_warn!("websocket write failed: {e}");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        while let Some(frame) = source.next().await {
            let bytes = match frame {
                Ok(Message::Binary(bytes)) => bytes,
                Ok(Message::Text(text)) => Bytes::copy_from_slice(text.as_bytes()),
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    drop(reply_tx);
                    let _ = writer.await;
                    return Err(RpcError::Transport(e.to_string()));
                }
            };

            let server = self.clone();
            let reply_tx = reply_tx.clone();
            tokio::spawn(async move {
                if let Some(reply) = server.handle_message(bytes).await {
                    let _ = reply_tx.send(reply).await;
                }
            });
        }

        drop(reply_tx);
        let _ = writer.await;
        Ok(())
    }
}

/// Text sent back in the response's error field.
fn reply_message(err: &RpcError) -> String {
    // ---
    match err {
        RpcError::Remote(message) => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::codec::BinaryEnvelopeCodec as Envelope;
    use crate::CorrelationId;
    use crate::test_support::{calculator_service, int_field, int_message, message_type};
    use crate::{EnvelopeCodec, PayloadCodec};

    fn server() -> RpcServer {
        // ---
        let server = RpcServer::new(calculator_service());
        let output = message_type("DivResult");

        server
            .register("div", move |request: DynamicMessage| {
                let output = output.clone();
                async move {
                    let lhs = int_field(&request, "lhs");
                    let rhs = int_field(&request, "rhs");
                    if rhs == 0 {
                        return Err(RpcError::Remote("division by zero".into()));
                    }
                    Ok(int_message(&output, &[("value", lhs / rhs)]))
                }
            })
            .unwrap();
        server
    }

    fn request(method: &str, id: u32, lhs: i32, rhs: i32) -> Bytes {
        // ---
        let payload = int_message(&message_type("DivRequest"), &[("lhs", lhs), ("rhs", rhs)]);
        let data = BinaryPayloadCodec.encode(&payload).unwrap();
        let envelope = RequestEnvelope::new(method, CorrelationId::from(id), data);
        Envelope.encode_request(&envelope).unwrap()
    }

    #[test]
    fn test_register_unknown_method() {
        // ---
        let err = server()
            .register("pow", |request: DynamicMessage| async move { Ok(request) })
            .unwrap_err();
        assert_eq!(err, RpcError::MethodNotFound("pow".into()));
    }

    #[tokio::test]
    async fn test_reply_keeps_correlation_id() {
        // ---
        let reply = server()
            .handle_message(request(".Calculator.Service.div", 77, 7, 2))
            .await
            .unwrap();

        let response = Envelope.decode_response(&reply).unwrap();
        assert_eq!(response.correlation_id(), CorrelationId::from(77));
        assert_eq!(response.remote_error(), None);

        let value = BinaryPayloadCodec
            .decode(&message_type("DivResult"), &response.data)
            .unwrap();
        assert_eq!(int_field(&value, "value"), 3);
    }

    #[tokio::test]
    async fn test_handler_error_becomes_error_reply() {
        // ---
        let reply = server()
            .handle_message(request(".Calculator.Service.div", 5, 5, 0))
            .await
            .unwrap();

        let response = Envelope.decode_response(&reply).unwrap();
        assert_eq!(response.correlation_id(), CorrelationId::from(5));
        assert_eq!(response.remote_error(), Some("division by zero"));
    }

    #[tokio::test]
    async fn test_unregistered_method_becomes_error_reply() {
        // ---
        let reply = server()
            .handle_message(request(".Calculator.Service.add", 9, 1, 1))
            .await
            .unwrap();

        let response = Envelope.decode_response(&reply).unwrap();
        assert_eq!(
            response.remote_error(),
            Some("method not found: .Calculator.Service.add")
        );
    }

    #[tokio::test]
    async fn test_reply_type_is_matched_by_name() {
        // ---
        let server = RpcServer::new(calculator_service());

        // Each message_type() call loads its own pool; only the name matters.
        let wrong = message_type("MulResult");
        server
            .register("add", move |_request: DynamicMessage| {
                let wrong = wrong.clone();
                async move { Ok(int_message(&wrong, &[("value", 0)])) }
            })
            .unwrap();

        let reply = server
            .handle_message(request(".Calculator.Service.add", 3, 1, 1))
            .await
            .unwrap();
        let response = Envelope.decode_response(&reply).unwrap();
        assert_eq!(
            response.remote_error(),
            Some("encode error: handler for .Calculator.Service.add returned Calculator.MulResult, expected Calculator.AddResult")
        );

        // A DivResult from a second pool is accepted for div.
        let reply = self::server()
            .handle_message(request(".Calculator.Service.div", 4, 9, 3))
            .await
            .unwrap();
        let response = Envelope.decode_response(&reply).unwrap();
        assert_eq!(response.remote_error(), None);
    }

    #[tokio::test]
    async fn test_undecodable_request_is_dropped() {
        // ---
        let reply = server().handle_message(Bytes::from_static(&[0xff, 0xff])).await;
        assert!(reply.is_none());
    }
}
