//! HTTP transport implementation using `reqwest`.
//!
//! This is the request-response variant of the `Transport` trait: each
//! `send()` is one `POST` of the encoded envelope, and the response body is
//! the encoded reply.
//!
//! - `open()` validates and records the endpoint URL; nothing is connected.
//! - `send()` completes the whole round trip before returning and invokes
//!   exactly one of its handlers: `on_message(body)` for `200 OK`,
//!   `on_error` for any other status or a failed request.
//! - Connection reuse is left to `reqwest`'s internal pool.

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use std::sync::Mutex;

use crate::lock::lock_ignore_poison;
use crate::{
    //
    Address,
    ErrorHandler,
    MessageHandler,
    Result,
    RpcError,
    Transport,
};

enum State {
    // ---
    Idle,
    Open(Url),
    Closed,
}

/// HTTP-based implementation of the `Transport` trait.
pub struct HttpTransport {
    // ---
    client: Client,
    state: Mutex<State>,
}

impl HttpTransport {
    // ---
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Use a preconfigured `reqwest` client (timeouts, proxies, TLS roots).
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            state: Mutex::new(State::Idle),
        }
    }

    fn endpoint(&self) -> std::result::Result<Url, RpcError> {
        // ---
        match &*lock_ignore_poison(&self.state) {
            State::Idle => Err(RpcError::NotConnected),
            State::Open(url) => Ok(url.clone()),
            State::Closed => Err(RpcError::ConnectionClosed),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    // ---

    /// Record the endpoint. Fails if `address` is not an absolute URL.
    async fn open(&self, address: &Address) -> Result<()> {
        // ---
        let url = Url::parse(address.as_str())
            .map_err(|e| RpcError::InvalidConfig(format!("bad endpoint {address}: {e}")))?;

        crate::log_debug!("http transport targeting {url}");
        *lock_ignore_poison(&self.state) = State::Open(url);
        Ok(())
    }

    /// POST `bytes` and deliver the outcome before returning.
    async fn send(&self, bytes: Bytes, on_message: MessageHandler, on_error: ErrorHandler) {
        // ---
        let url = match self.endpoint() {
            Ok(url) => url,
            Err(e) => {
                on_error(e);
                return;
            }
        };

        let response = match self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                crate::log_warn!("POST {url} failed: {e}");
                on_error(RpcError::Transport(e.to_string()));
                return;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            crate::log_warn!("POST {url} returned {status}");
            on_error(RpcError::Transport(format!("HTTP {status}")));
            return;
        }

        match response.bytes().await {
            Ok(body) => on_message(body),
            Err(e) => on_error(RpcError::Transport(format!("failed to read body: {e}"))),
        }
    }

    async fn close(&self) -> Result<()> {
        // ---
        *lock_ignore_poison(&self.state) = State::Closed;
        Ok(())
    }
}
