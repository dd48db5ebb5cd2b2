//! The session controller and its dispatch loop.
//!
//! Everything here runs on one logical thread: the backend handle's bounded
//! `receive` is the only blocking point, and every incoming payload is
//! processed to completion before the next is fetched. The pending-query
//! table is therefore accessed from a single thread by construction and needs
//! no locking; that is an invariant of the design, not an accident.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;
use tracing::info;
use tracing::warn;

use tg_backup_backend::AuthorizationState;
use tg_backup_backend::Backend;
use tg_backup_backend::BackendRuntime;
use tg_backup_backend::Envelope;
use tg_backup_backend::Object;
use tg_backup_backend::Request;
use tg_backup_backend::UNSOLICITED_REQUEST_ID;

use crate::config::SessionConfig;
use crate::prompt::CredentialKind;
use crate::prompt::CredentialSource;

mod auth;
mod chats;
mod queries;
mod uploads;

use queries::PendingQueries;
pub use uploads::UploadFailure;
pub use uploads::UploadReport;
use uploads::UploadTracker;

/// Bound on each blocking poll of the backend handle; short enough that the
/// driving loops stay responsive to their stopping predicates.
const RECEIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// A continuation for one correlated response. Run at most once, with the
/// session borrowed back so it can issue follow-up requests.
pub(crate) type QueryHandler = Box<dyn FnOnce(&mut Session, Object)>;

/// How a session sources operator input, and when `start` may return.
pub struct SessionOptions {
    credentials: Option<Box<dyn CredentialSource>>,
    auth_only: bool,
}

impl SessionOptions {
    /// Unattended mode: the handshake never prompts; a state that needs
    /// operator input parks the session instead.
    pub fn unattended() -> Self {
        Self {
            credentials: None,
            auth_only: false,
        }
    }

    /// Interactive mode: credentials are solicited through `source` the
    /// moment the handshake asks for them.
    pub fn interactive(source: Box<dyn CredentialSource>) -> Self {
        Self {
            credentials: Some(source),
            auth_only: false,
        }
    }

    /// Makes `start` return as soon as authorization completes, without
    /// waiting for the conversation list.
    pub fn auth_only(mut self) -> Self {
        self.auth_only = true;
        self
    }
}

/// One authenticated connection to the chat service.
///
/// Owns the backend handle, the pending-query table, the authorization state
/// and its epoch, and every tracked upload. When the backend reports terminal
/// closure the whole value is torn down and reconstructed; a closed handle is
/// permanently unusable.
pub struct Session {
    runtime: Rc<dyn BackendRuntime>,
    backend: Box<dyn Backend>,
    config: SessionConfig,
    credentials: Option<Box<dyn CredentialSource>>,
    auth_only: bool,
    queries: PendingQueries<QueryHandler>,
    uploads: UploadTracker,
    auth_state: Option<AuthorizationState>,
    auth_epoch: u64,
    authorized: bool,
    chats_loaded: bool,
    chat_load_started: bool,
    input_needed: Option<CredentialKind>,
    needs_rebuild: bool,
}

impl Session {
    /// Opens a fresh handle against the runtime and issues the initial
    /// version probe.
    pub fn open(
        runtime: Rc<dyn BackendRuntime>,
        config: SessionConfig,
        options: SessionOptions,
    ) -> Self {
        let backend = runtime.open();
        let mut session = Self {
            runtime,
            backend,
            config,
            credentials: options.credentials,
            auth_only: options.auth_only,
            queries: PendingQueries::new(),
            uploads: UploadTracker::new(),
            auth_state: None,
            auth_epoch: 0,
            authorized: false,
            chats_loaded: false,
            chat_load_started: false,
            input_needed: None,
            needs_rebuild: false,
        };
        session.send_query(
            Request::GetOption {
                name: "version".to_string(),
            },
            None,
        );
        session
    }

    /// Drives the login handshake, and the initial conversation load, to
    /// completion.
    ///
    /// Returns `true` once the session is authorized and conversations are
    /// loaded (authorization alone in auth-only mode); `false` when the
    /// handshake stopped because operator input is needed and this session
    /// has no way to collect it.
    pub fn start(&mut self) -> bool {
        info!("authorizing");
        loop {
            if self.needs_rebuild {
                self.rebuild();
            } else if !self.authorized || !self.chats_loaded {
                if self.authorized && self.auth_only {
                    return true;
                }
                self.poll_once(RECEIVE_TIMEOUT);
                if self.input_needed.is_some() {
                    return false;
                }
            } else {
                return true;
            }
        }
    }

    /// Submits one file for delivery to `chat_id` as a document attachment.
    /// The outcome is tracked until [`Session::send_all_queued`] reports it.
    pub fn queue_upload(&mut self, path: &Path, chat_id: i64) {
        let upload_id = self.uploads.begin(path, chat_id);
        let request = Request::send_document(chat_id, path);
        self.send_query(
            request,
            Some(Box::new(move |session: &mut Session, object| {
                session.on_send_response(upload_id, object);
            })),
        );
    }

    fn on_send_response(&mut self, upload_id: u64, object: Object) {
        match object {
            Object::Message(message) => {
                if let Some(record) = self.uploads.accept(upload_id, message.id) {
                    info!(
                        path = %record.path.display(),
                        message_id = message.id,
                        "queued for delivery"
                    );
                }
            }
            other => {
                let reason = failure_reason(&other);
                if let Some(record) = self.uploads.fail(upload_id, reason) {
                    warn!(path = %record.path.display(), "failed to queue upload");
                }
            }
        }
    }

    /// Polls until every queued upload is accepted and every accepted upload
    /// is confirmed delivered or reported failed, then returns the summary.
    pub fn send_all_queued(&mut self) -> UploadReport {
        while !self.uploads.is_settled() {
            self.poll_once(RECEIVE_TIMEOUT);
        }
        self.uploads.take_report()
    }

    /// Returns whether the backend knows a conversation under this
    /// identifier.
    pub fn chat_exists(&mut self, chat_id: i64) -> bool {
        let outcome = Rc::new(Cell::new(None));
        let seen = Rc::clone(&outcome);
        self.send_query(
            Request::GetChat { chat_id },
            Some(Box::new(move |_session: &mut Session, object| {
                seen.set(Some(matches!(object, Object::Chat(_))));
            })),
        );
        loop {
            if let Some(exists) = outcome.get() {
                return exists;
            }
            self.poll_once(RECEIVE_TIMEOUT);
        }
    }

    /// Which operator input the handshake is parked on, if any.
    pub fn input_needed(&self) -> Option<CredentialKind> {
        self.input_needed
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    pub fn chats_loaded(&self) -> bool {
        self.chats_loaded
    }

    /// One bounded dispatch step: waits for the next incoming payload and
    /// routes it — the unsolicited sentinel to the update router, anything
    /// else to the matching pending continuation.
    ///
    /// `start`, `send_all_queued`, and `chat_exists` all drive this single
    /// primitive, each with its own stopping predicate.
    pub fn poll_once(&mut self, timeout: Duration) {
        let Some(envelope) = self.backend.receive(timeout) else {
            return;
        };
        self.dispatch(envelope);
    }

    fn dispatch(&mut self, envelope: Envelope) {
        let Envelope { request_id, object } = envelope;
        if request_id == UNSOLICITED_REQUEST_ID {
            self.on_update(object);
            return;
        }
        // A miss is normal: fire-and-forget requests register no handler.
        if let Some(handler) = self.queries.take(request_id) {
            handler(self, object);
        }
    }

    fn on_update(&mut self, object: Object) {
        match object {
            Object::AuthorizationUpdate(state) => self.on_authorization_update(state),
            Object::SendSucceeded { old_message_id, .. } => {
                if let Some(record) = self.uploads.confirm(old_message_id) {
                    info!(path = %record.path.display(), "delivered");
                }
            }
            Object::SendFailed {
                old_message_id,
                error,
            } => {
                if let Some(record) = self
                    .uploads
                    .fail_in_flight(old_message_id, error.message.clone())
                {
                    warn!(
                        path = %record.path.display(),
                        code = error.code,
                        "delivery failed"
                    );
                }
            }
            other => debug!(?other, "ignoring update"),
        }
    }

    pub(crate) fn send_query(&mut self, request: Request, handler: Option<QueryHandler>) -> u64 {
        let request_id = self.queries.register(handler);
        debug!(method = request.method(), request_id, "sending request");
        self.backend.send(request_id, request);
        request_id
    }

    /// Discards everything this session owns — handle, table, epoch — and
    /// starts over against the same runtime. In-place repair is impossible
    /// once the backend reported terminal closure.
    fn rebuild(&mut self) {
        info!("rebuilding session");
        let runtime = Rc::clone(&self.runtime);
        let config = self.config.clone();
        let options = SessionOptions {
            credentials: self.credentials.take(),
            auth_only: self.auth_only,
        };
        *self = Session::open(runtime, config, options);
    }
}

fn failure_reason(object: &Object) -> String {
    match object {
        Object::Error(error) => format!("{} ({})", error.message, error.code),
        other => format!("unexpected response: {other:?}"),
    }
}
