use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

// 0 is the sentinel for unsolicited events, so allocation starts at 1.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Continuations awaiting a correlated response, keyed by request identifier.
///
/// Identifiers come from a process-wide counter, so they stay unique even
/// across a session rebuild and a response addressed to a discarded table can
/// never collide with a fresh registration. A handler is removed from the
/// table before it runs, which makes at-most-once invocation structural.
pub(super) struct PendingQueries<H> {
    handlers: HashMap<u64, H>,
}

impl<H> PendingQueries<H> {
    pub(super) fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Allocates the next request identifier and stores the handler under it.
    ///
    /// `None` stores nothing: the request is fire-and-forget and its response
    /// will be dropped on arrival.
    pub(super) fn register(&mut self, handler: Option<H>) -> u64 {
        let id = NEXT_REQUEST_ID.fetch_add(1, Ordering::SeqCst);
        if let Some(handler) = handler {
            self.handlers.insert(id, handler);
        }
        id
    }

    /// Removes and returns the handler registered under `id`.
    ///
    /// A miss is not an error: the id belonged to a fire-and-forget request,
    /// or the backend echoed an identifier this table never issued.
    pub(super) fn take(&mut self, id: u64) -> Option<H> {
        self.handlers.remove(&id)
    }
}
