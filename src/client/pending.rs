use bytes::Bytes;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::lock::lock_ignore_poison;
use crate::{CorrelationId, Result, RpcError};

/// Continuation run when an outstanding request settles.
///
/// Receives the raw response payload bytes or the failure that ended the
/// request. Runs exactly once and never while the table lock is held.
pub type Continuation = Box<dyn FnOnce(Result<Bytes>) + Send>;

/// Tracks requests waiting for responses.
///
/// Maps correlation ids to the continuation that completes the original
/// call. Every entry is removed exactly once, either by a matching reply
/// (`resolve`), a failure (`fail`, `fail_all`), or never if no outcome
/// arrives. Lookups for ids that are not present are no-ops.
///
/// Sending and receiving happen on different tasks, so access is
/// serialized through a mutex. Continuations are taken out of the map
/// first and invoked after the guard is dropped, so a continuation may
/// safely register a new request on the same table.
#[derive(Default)]
pub struct CorrelationTable {
    // ---
    entries: Mutex<HashMap<CorrelationId, Continuation>>,
}

impl CorrelationTable {
    // ---

    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a continuation under `id`.
    ///
    /// Fails with [`RpcError::DuplicateCorrelationId`] if `id` is already
    /// outstanding; the existing entry is left untouched.
    pub fn register(&self, id: CorrelationId, continuation: Continuation) -> Result<()> {
        // ---
        let mut entries = lock_ignore_poison(&self.entries);
        match entries.entry(id) {
            Entry::Occupied(_) => Err(RpcError::DuplicateCorrelationId(id.value())),
            Entry::Vacant(slot) => {
                slot.insert(continuation);
                Ok(())
            }
        }
    }

    /// Register a continuation under a freshly drawn id.
    ///
    /// Ids are random; a draw that collides with an outstanding id is
    /// discarded and redrawn.
    pub fn register_fresh(&self, continuation: Continuation) -> CorrelationId {
        // ---
        let mut entries = lock_ignore_poison(&self.entries);
        loop {
            let id = CorrelationId::generate();
            if let Entry::Vacant(slot) = entries.entry(id) {
                slot.insert(continuation);
                return id;
            }
            crate::log_debug!("correlation id collision on {id}, redrawing");
        }
    }

    /// Complete the request `id` with its response payload.
    ///
    /// Returns true if the id was outstanding.
    pub fn resolve(&self, id: CorrelationId, data: Bytes) -> bool {
        self.settle(id, Ok(data))
    }

    /// Fail the request `id`.
    ///
    /// Returns true if the id was outstanding.
    pub fn fail(&self, id: CorrelationId, error: RpcError) -> bool {
        self.settle(id, Err(error))
    }

    /// Fail every outstanding request, building one error per entry.
    ///
    /// Returns the number of requests failed.
    pub fn fail_all(&self, make_error: impl Fn() -> RpcError) -> usize {
        // ---
        let drained: Vec<Continuation> = {
            let mut entries = lock_ignore_poison(&self.entries);
            entries.drain().map(|(_, continuation)| continuation).collect()
        };

        let count = drained.len();
        for continuation in drained {
            continuation(Err(make_error()));
        }
        count
    }

    /// Number of outstanding requests
    pub fn len(&self) -> usize {
        lock_ignore_poison(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: CorrelationId) -> bool {
        lock_ignore_poison(&self.entries).contains_key(&id)
    }

    fn settle(&self, id: CorrelationId, outcome: Result<Bytes>) -> bool {
        // ---
        let continuation = lock_ignore_poison(&self.entries).remove(&id);

        match continuation {
            Some(continuation) => {
                continuation(outcome);
                true
            }
            None => {
                crate::log_debug!("no pending request for correlation id {id}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;

    fn recorder() -> (Continuation, mpsc::Receiver<Result<Bytes>>) {
        // ---
        let (tx, rx) = mpsc::channel();
        let continuation: Continuation = Box::new(move |outcome| {
            let _ = tx.send(outcome);
        });
        (continuation, rx)
    }

    #[test]
    fn test_register_and_resolve() {
        // ---
        let table = CorrelationTable::new();
        let id = CorrelationId::from(7);
        let (continuation, rx) = recorder();

        table.register(id, continuation).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.contains(id));

        let response = Bytes::from("test response");
        assert!(table.resolve(id, response.clone()));

        // Removed after completion
        assert!(table.is_empty());
        assert_eq!(rx.try_recv().unwrap().unwrap(), response);

        // A second reply for the same id is ignored
        assert!(!table.resolve(id, Bytes::from("late")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_duplicate_register_keeps_original() {
        // ---
        let table = CorrelationTable::new();
        let id = CorrelationId::from(1);
        let (first, first_rx) = recorder();
        let (second, second_rx) = recorder();

        table.register(id, first).unwrap();
        let err = table.register(id, second).unwrap_err();
        assert_eq!(err, RpcError::DuplicateCorrelationId(1));
        assert_eq!(table.len(), 1);

        table.resolve(id, Bytes::from_static(b"ok"));
        assert!(first_rx.try_recv().unwrap().is_ok());
        assert!(second_rx.try_recv().is_err());
    }

    #[test]
    fn test_fail_removes_entry() {
        // ---
        let table = CorrelationTable::new();
        let (continuation, rx) = recorder();
        let id = table.register_fresh(continuation);

        assert!(table.fail(id, RpcError::Transport("reset".into())));
        assert!(!table.contains(id));
        assert_eq!(
            rx.try_recv().unwrap().unwrap_err(),
            RpcError::Transport("reset".into())
        );

        // Failing again is a no-op
        assert!(!table.fail(id, RpcError::ConnectionClosed));
    }

    #[test]
    fn test_unknown_id_is_noop() {
        // ---
        let table = CorrelationTable::new();
        let (continuation, rx) = recorder();
        table.register(CorrelationId::from(5), continuation).unwrap();

        assert!(!table.resolve(CorrelationId::from(999), Bytes::from("stray")));
        assert_eq!(table.len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_fail_all_drains_table() {
        // ---
        let table = CorrelationTable::new();
        let receivers: Vec<_> = (0..3)
            .map(|_| {
                let (continuation, rx) = recorder();
                table.register_fresh(continuation);
                rx
            })
            .collect();

        assert_eq!(table.len(), 3);
        assert_eq!(table.fail_all(|| RpcError::ConnectionClosed), 3);
        assert!(table.is_empty());

        for rx in receivers {
            assert_eq!(rx.try_recv().unwrap().unwrap_err(), RpcError::ConnectionClosed);
        }
    }

    #[test]
    fn test_continuation_may_reenter_table() {
        // ---
        let table = Arc::new(CorrelationTable::new());
        let (inner, inner_rx) = recorder();

        let reentrant = table.clone();
        let continuation: Continuation = Box::new(move |_| {
            reentrant.register(CorrelationId::from(2), inner).unwrap();
        });

        table.register(CorrelationId::from(1), continuation).unwrap();
        assert!(table.resolve(CorrelationId::from(1), Bytes::new()));
        assert!(table.contains(CorrelationId::from(2)));

        assert!(table.resolve(CorrelationId::from(2), Bytes::from_static(b"x")));
        assert!(inner_rx.try_recv().unwrap().is_ok());
    }
}
