//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! This is the persistent, full-duplex variant of the `Transport` trait. It
//! follows an **actor-based concurrency model**:
//!
//! - `open()` connects eagerly and spawns a single background **actor task**
//!   that owns both halves of the socket.
//! - The actor is responsible for:
//!   - writing outbound frames queued by `send()`,
//!   - reading inbound frames and handing them to the active message handler,
//!   - reporting read/write failures and remote close to the active error
//!     handler,
//!   - clean shutdown of the connection.
//! - No other task ever touches the socket directly.
//!
//! ## Handler semantics
//!
//! The connection has exactly one active message handler and one active
//! error handler. Each `send()` replaces both before its frame is written.
//! Every inbound frame goes to the most recently installed message handler,
//! which for a service proxy is always the same dispatcher; correlation ids
//! route the reply to the right caller.
//!
//! A connection failure is reported once, to the active error handler. A
//! remote close or end of stream is reported as `ConnectionClosed`, which a
//! service proxy turns into a failure of every outstanding call; read and
//! write errors are reported as `Transport`.
//!
//! ## Frames
//!
//! Requests go out as binary frames. Inbound binary and text frames are both
//! delivered as raw bytes; ping/pong is handled by tungstenite.

use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Mutex;

use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

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

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

//
// Actor commands
//

enum Cmd {
    //
    Send {
        bytes: Bytes,
        on_message: MessageHandler,
        on_error: ErrorHandler,
    },
    Close {
        resp: oneshot::Sender<()>,
    },
}

enum ActorStep {
    //
    Continue,
    Stop,
}

enum State {
    // ---
    Idle,
    Open(mpsc::Sender<Cmd>),
    Closed,
}

/// WebSocket-based implementation of the `Transport` trait.
///
/// One instance corresponds to a single connection.
pub struct WebSocketTransport {
    // ---
    state: Mutex<State>,
}

impl WebSocketTransport {
    // ---
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Idle),
        }
    }

    fn sender(&self) -> std::result::Result<mpsc::Sender<Cmd>, RpcError> {
        // ---
        match &*lock_ignore_poison(&self.state) {
            State::Idle => Err(RpcError::NotConnected),
            State::Open(tx) => Ok(tx.clone()),
            State::Closed => Err(RpcError::ConnectionClosed),
        }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for WebSocketTransport {
    // ---

    /// Connect to a `ws://` or `wss://` address and start the actor.
    async fn open(&self, address: &Address) -> Result<()> {
        // ---
        if matches!(&*lock_ignore_poison(&self.state), State::Open(_)) {
            return Ok(());
        }

        let (ws, _response) = connect_async(address.as_str()).await.map_err(|e| {
            crate::log_error!("websocket connect to {address} failed: {e}");
            RpcError::Transport(format!("connect to {address} failed: {e}"))
        })?;

        crate::log_info!("websocket connected to {address}");

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (sink, stream) = ws.split();

        let actor = WsActor {
            address: address.clone(),
            sink,
            stream,
            cmd_rx,
            on_message: None,
            on_error: None,
        };
        tokio::spawn(actor.run());

        *lock_ignore_poison(&self.state) = State::Open(cmd_tx);
        Ok(())
    }

    /// Install `on_message` / `on_error` as the active handlers and queue
    /// `bytes` as a binary frame.
    async fn send(&self, bytes: Bytes, on_message: MessageHandler, on_error: ErrorHandler) {
        // ---
        let tx = match self.sender() {
            Ok(tx) => tx,
            Err(e) => {
                on_error(e);
                return;
            }
        };

        let cmd = Cmd::Send {
            bytes,
            on_message,
            on_error,
        };

        // The actor has stopped; hand the error back to this send's handler.
        if let Err(mpsc::error::SendError(cmd)) = tx.send(cmd).await {
            if let Cmd::Send { on_error, .. } = cmd {
                on_error(RpcError::ConnectionClosed);
            }
        }
    }

    /// Send a close frame and stop the actor.
    async fn close(&self) -> Result<()> {
        // ---
        let previous = std::mem::replace(&mut *lock_ignore_poison(&self.state), State::Closed);

        if let State::Open(tx) = previous {
            let (resp, done) = oneshot::channel();
            if tx.send(Cmd::Close { resp }).await.is_ok() {
                let _ = done.await;
            }
        }
        Ok(())
    }
}

struct WsActor {
    // ---
    address: Address, // for logging only
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
    cmd_rx: mpsc::Receiver<Cmd>,
    on_message: Option<MessageHandler>,
    on_error: Option<ErrorHandler>,
}

impl WsActor {
    // ---

    async fn run(mut self) {
        // ---
        loop {
            let step = tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_cmd(cmd).await,
                    None => {
                        // Transport dropped without close().
                        let _ = self.sink.close().await;
                        ActorStep::Stop
                    }
                },

                frame = self.stream.next() => self.handle_frame(frame),
            };

            if matches!(step, ActorStep::Stop) {
                break;
            }
        }

        crate::log_debug!("websocket actor for {} stopped", self.address);
    }

    async fn handle_cmd(&mut self, cmd: Cmd) -> ActorStep {
        // ---
        match cmd {
            Cmd::Send {
                bytes,
                on_message,
                on_error,
            } => {
                self.on_message = Some(on_message);
                self.on_error = Some(on_error);

                match self.sink.send(Message::Binary(bytes)).await {
                    Ok(()) => ActorStep::Continue,
                    Err(e) => {
                        crate::log_error!("websocket write to {} failed: {e}", self.address);
                        self.report(RpcError::Transport(e.to_string()));
                        ActorStep::Stop
                    }
                }
            }
            Cmd::Close { resp } => {
                let _ = self.sink.send(Message::Close(None)).await;
                let _ = self.sink.close().await;
                crate::log_info!("websocket to {} closed", self.address);
                let _ = resp.send(());
                ActorStep::Stop
            }
        }
    }

    fn handle_frame(
        &mut self,
        frame: Option<std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>,
    ) -> ActorStep {
        // ---
        match frame {
            Some(Ok(Message::Binary(bytes))) => {
                self.deliver(bytes);
                ActorStep::Continue
            }
            Some(Ok(Message::Text(text))) => {
                self.deliver(Bytes::copy_from_slice(text.as_bytes()));
                ActorStep::Continue
            }
            Some(Ok(Message::Close(_))) | None => {
                crate::log_warn!("websocket closed by {}", self.address);
                self.report(RpcError::ConnectionClosed);
                ActorStep::Stop
            }
            Some(Ok(_control)) => ActorStep::Continue,
            Some(Err(e)) => {
                crate::log_error!("websocket read from {} failed: {e}", self.address);
                self.report(RpcError::Transport(e.to_string()));
                ActorStep::Stop
            }
        }
    }

    fn deliver(&self, bytes: Bytes) {
        // ---
        match &self.on_message {
            Some(handler) => handler(bytes),
            None => crate::log_debug!("dropping frame from {}: nothing sent yet", self.address),
        }
    }

    fn report(&self, err: RpcError) {
        // ---
        if let Some(handler) = &self.on_error {
            handler(err);
        }
    }
}
