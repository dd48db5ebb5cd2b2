use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use crate::handle::Backend;
use crate::handle::BackendRuntime;
use crate::types::Envelope;
use crate::types::Object;
use crate::types::Request;
use crate::types::UNSOLICITED_REQUEST_ID;

/// A scripted implementation of [`Backend`] for testing.
///
/// Responses are configured per request kind (the wire method name), either
/// as a FIFO queue consumed one per matching send, or as a sticky fallback
/// returned for every send of that kind. Unsolicited updates are injected
/// directly into the inbox. Every submitted request is recorded for
/// assertions.
///
/// The state is shared behind `Arc<Mutex<_>>`, so a test can keep a clone
/// while a session owns the handle.
///
/// # Example
///
/// ```
/// use tg_backup_backend::{Backend, Object, Request, ScriptedBackend};
/// use std::time::Duration;
///
/// let script = ScriptedBackend::new();
/// script.set_response("getChat", Object::Ok);
///
/// let mut handle = script.clone();
/// handle.send(7, Request::GetChat { chat_id: 1 });
///
/// let envelope = handle.receive(Duration::ZERO).unwrap();
/// assert_eq!(envelope.request_id, 7);
/// assert_eq!(script.sent_count("getChat"), 1);
/// ```
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    sent: Vec<(u64, Request)>,
    queued: HashMap<String, VecDeque<Object>>,
    sticky: HashMap<String, Object>,
    inbox: VecDeque<Envelope>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one response for the next send of the given request kind.
    /// Queued responses win over a sticky response for the same kind.
    pub fn queue_response(&self, method: &str, object: Object) {
        self.inner
            .lock()
            .unwrap()
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(object);
    }

    /// Sets the response returned for every send of the given request kind.
    pub fn set_response(&self, method: &str, object: Object) {
        self.inner
            .lock()
            .unwrap()
            .sticky
            .insert(method.to_string(), object);
    }

    /// Injects an unsolicited event into the inbox.
    pub fn push_update(&self, object: Object) {
        self.inner.lock().unwrap().inbox.push_back(Envelope {
            request_id: UNSOLICITED_REQUEST_ID,
            object,
        });
    }

    /// Injects a correlated response with an explicit request identifier.
    pub fn push_response(&self, request_id: u64, object: Object) {
        self.inner
            .lock()
            .unwrap()
            .inbox
            .push_back(Envelope { request_id, object });
    }

    /// Returns all submitted requests in submission order.
    pub fn sent_requests(&self) -> Vec<(u64, Request)> {
        self.inner.lock().unwrap().sent.clone()
    }

    /// Returns how many requests of the given kind were submitted.
    pub fn sent_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|(_, request)| request.method() == method)
            .count()
    }

    /// Returns the most recent request of the given kind, if any.
    pub fn last_request(&self, method: &str) -> Option<(u64, Request)> {
        self.inner
            .lock()
            .unwrap()
            .sent
            .iter()
            .rev()
            .find(|(_, request)| request.method() == method)
            .cloned()
    }

    /// Returns whether the inbox still holds undelivered payloads.
    pub fn inbox_is_empty(&self) -> bool {
        self.inner.lock().unwrap().inbox.is_empty()
    }
}

impl Backend for ScriptedBackend {
    fn send(&mut self, request_id: u64, request: Request) {
        let mut inner = self.inner.lock().unwrap();
        let method = request.method();
        let response = match inner.queued.get_mut(method).and_then(VecDeque::pop_front) {
            Some(object) => Some(object),
            None => inner.sticky.get(method).cloned(),
        };
        inner.sent.push((request_id, request));
        if let Some(object) = response {
            inner.inbox.push_back(Envelope { request_id, object });
        }
    }

    fn receive(&mut self, _timeout: Duration) -> Option<Envelope> {
        self.inner.lock().unwrap().inbox.pop_front()
    }
}

/// A scripted [`BackendRuntime`] handing out pre-built [`ScriptedBackend`]
/// handles, one per `open` call. Used to exercise session rebuild, where a
/// second handle must replace the first.
#[derive(Clone, Default)]
pub struct ScriptedRuntime {
    inner: Arc<Mutex<RuntimeInner>>,
}

#[derive(Default)]
struct RuntimeInner {
    handles: VecDeque<ScriptedBackend>,
    log_verbosity: Vec<i32>,
    opened: usize,
}

impl ScriptedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a handle to be returned by the next `open` call.
    pub fn push_handle(&self, handle: ScriptedBackend) {
        self.inner.lock().unwrap().handles.push_back(handle);
    }

    /// Returns every verbosity value passed to `configure_logging`.
    pub fn log_verbosity_calls(&self) -> Vec<i32> {
        self.inner.lock().unwrap().log_verbosity.clone()
    }

    /// Returns how many handles were opened.
    pub fn opened_count(&self) -> usize {
        self.inner.lock().unwrap().opened
    }
}

impl BackendRuntime for ScriptedRuntime {
    fn configure_logging(&self, verbosity: i32) {
        self.inner.lock().unwrap().log_verbosity.push(verbosity);
    }

    fn open(&self) -> Box<dyn Backend> {
        let mut inner = self.inner.lock().unwrap();
        inner.opened += 1;
        let handle = inner.handles.pop_front().unwrap_or_default();
        Box::new(handle)
    }
}
