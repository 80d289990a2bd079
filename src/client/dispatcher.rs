//! Inbound message routing.
//!
//! The dispatcher is the message handler handed to the transport on every
//! send. It decodes the response envelope and settles the matching entry in
//! the correlation table. It knows nothing about methods or payload types;
//! the continuation stored at call time carries the response type.

use bytes::Bytes;
use std::sync::Arc;

use super::pending::CorrelationTable;
use crate::{EnvelopeCodecPtr, MessageHandler, RpcError};

#[derive(Clone)]
pub(crate) struct Dispatcher {
    // ---
    table: Arc<CorrelationTable>,
    envelope_codec: EnvelopeCodecPtr,
}

impl Dispatcher {
    // ---
    pub(crate) fn new(table: Arc<CorrelationTable>, envelope_codec: EnvelopeCodecPtr) -> Self {
        Self {
            table,
            envelope_codec,
        }
    }

    /// Route one inbound message.
    ///
    /// An envelope that fails to decode is dropped: its id is unknown, so no
    /// entry can be failed. Replies for ids that are not outstanding are
    /// dropped as well.
    pub(crate) fn on_inbound(&self, bytes: Bytes) {
        // ---
        let response = match self.envelope_codec.decode_response(&bytes) {
            Ok(response) => response,
            Err(e) => {
                crate::log_warn!("dropping undecodable response ({} bytes): {e}", bytes.len());
                return;
            }
        };

        let id = response.correlation_id();

        let matched = match response.remote_error() {
            Some(message) => self.table.fail(id, RpcError::Remote(message.to_string())),
            None => self.table.resolve(id, response.data),
        };

        if !matched {
            crate::log_debug!("dropping response for unknown correlation id {id}");
        }
    }

    /// The dispatcher as a transport message handler.
    pub(crate) fn handler(&self) -> MessageHandler {
        // ---
        let dispatcher = self.clone();
        Arc::new(move |bytes| dispatcher.on_inbound(bytes))
    }
}
