//! End-to-end session scenarios against a scripted backend.

use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tg_backup::config::SessionConfig;
use tg_backup::prompt::Credential;
use tg_backup::prompt::CredentialKind;
use tg_backup::prompt::CredentialSource;
use tg_backup::session::Session;
use tg_backup::session::SessionOptions;
use tg_backup_backend::AuthorizationState;
use tg_backup_backend::ChatInfo;
use tg_backup_backend::ErrorPayload;
use tg_backup_backend::MessageInfo;
use tg_backup_backend::Object;
use tg_backup_backend::ScriptedBackend;
use tg_backup_backend::ScriptedRuntime;

const POLL: Duration = Duration::ZERO;

fn config() -> SessionConfig {
    SessionConfig::load(Some(PathBuf::from("/tmp/tg-backup-tests")))
}

fn auth_update(state: AuthorizationState) -> Object {
    Object::AuthorizationUpdate(state)
}

fn backend_error(code: i32, message: &str) -> Object {
    Object::Error(ErrorPayload {
        code,
        message: message.to_string(),
    })
}

fn open_session(backend: ScriptedBackend, options: SessionOptions) -> Session {
    let runtime = ScriptedRuntime::new();
    runtime.push_handle(backend);
    Session::open(Rc::new(runtime), config(), options)
}

/// A session scripted through the whole handshake and conversation load.
fn ready_session() -> (ScriptedBackend, Session) {
    let backend = ScriptedBackend::new();
    backend.set_response("setTdlibParameters", Object::Ok);
    backend.set_response("loadChats", backend_error(404, "Not Found"));
    backend.push_update(auth_update(AuthorizationState::WaitTdlibParameters));
    backend.push_update(auth_update(AuthorizationState::Ready));
    let mut session = open_session(backend.clone(), SessionOptions::unattended());
    assert!(session.start());
    (backend, session)
}

/// Credential source with canned answers; popping an empty script is an
/// error, which the handshake reports as missing input.
#[derive(Default)]
struct ScriptedCredentials {
    phone_numbers: Vec<String>,
    email_addresses: Vec<String>,
    email_codes: Vec<String>,
    login_codes: Vec<String>,
    passwords: Vec<String>,
    profiles: Vec<(String, String)>,
    links: Arc<Mutex<Vec<String>>>,
}

fn pop_or_err(values: &mut Vec<String>, what: &str) -> io::Result<String> {
    values
        .pop()
        .ok_or_else(|| io::Error::other(format!("no scripted {what}")))
}

impl CredentialSource for ScriptedCredentials {
    fn phone_number(&mut self) -> io::Result<String> {
        pop_or_err(&mut self.phone_numbers, "phone number")
    }

    fn email_address(&mut self) -> io::Result<String> {
        pop_or_err(&mut self.email_addresses, "email address")
    }

    fn email_code(&mut self) -> io::Result<String> {
        pop_or_err(&mut self.email_codes, "email code")
    }

    fn login_code(&mut self) -> io::Result<String> {
        pop_or_err(&mut self.login_codes, "login code")
    }

    fn password(&mut self) -> io::Result<String> {
        pop_or_err(&mut self.passwords, "password")
    }

    fn profile(&mut self) -> io::Result<(String, String)> {
        self.profiles
            .pop()
            .ok_or_else(|| io::Error::other("no scripted profile"))
    }

    fn device_link(&mut self, link: &str) {
        self.links.lock().unwrap().push(link.to_string());
    }
}

#[test]
fn test_start_completes_once_authorized_and_chats_loaded() {
    let (backend, session) = ready_session();
    assert!(session.is_authorized());
    assert!(session.chats_loaded());
    assert_eq!(backend.sent_count("setTdlibParameters"), 1);
    // The version probe issued at construction is fire-and-forget.
    assert_eq!(backend.sent_count("getOption"), 1);
}

#[test]
fn test_request_identifiers_strictly_increase() {
    let (backend, _session) = ready_session();
    let ids: Vec<u64> = backend.sent_requests().iter().map(|(id, _)| *id).collect();
    assert!(!ids.is_empty());
    assert!(ids.iter().all(|id| *id > 0));
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_pager_issues_one_request_per_batch_plus_terminator() {
    let backend = ScriptedBackend::new();
    backend.set_response("setTdlibParameters", Object::Ok);
    for _ in 0..3 {
        backend.queue_response("loadChats", Object::Ok);
    }
    backend.set_response("loadChats", backend_error(404, "Not Found"));
    backend.push_update(auth_update(AuthorizationState::WaitTdlibParameters));
    backend.push_update(auth_update(AuthorizationState::Ready));

    let mut session = open_session(backend.clone(), SessionOptions::unattended());
    assert!(session.start());

    // Three non-terminal batches and the error-shaped terminator.
    assert_eq!(backend.sent_count("loadChats"), 4);
    assert!(session.chats_loaded());
}

#[test]
fn test_unattended_start_parks_on_missing_credential() {
    let backend = ScriptedBackend::new();
    backend.set_response("setTdlibParameters", Object::Ok);
    backend.push_update(auth_update(AuthorizationState::WaitTdlibParameters));
    backend.push_update(auth_update(AuthorizationState::WaitPhoneNumber));

    let mut session = open_session(backend.clone(), SessionOptions::unattended());
    assert!(!session.start());
    assert_eq!(session.input_needed(), Some(CredentialKind::PhoneNumber));
    assert_eq!(backend.sent_count("setAuthenticationPhoneNumber"), 0);

    // A simulated credential submission resumes the handshake.
    session.submit_credential(Credential::PhoneNumber("+15550100".to_string()));
    assert_eq!(session.input_needed(), None);
    assert_eq!(backend.sent_count("setAuthenticationPhoneNumber"), 1);

    backend.set_response("loadChats", backend_error(404, "Not Found"));
    backend.push_update(auth_update(AuthorizationState::Ready));
    assert!(session.start());
}

#[test]
fn test_interactive_login_supplies_credentials_in_order() {
    let backend = ScriptedBackend::new();
    backend.set_response("setTdlibParameters", Object::Ok);
    backend.set_response("loadChats", backend_error(404, "Not Found"));
    backend.push_update(auth_update(AuthorizationState::WaitTdlibParameters));
    backend.push_update(auth_update(AuthorizationState::WaitPhoneNumber));
    backend.push_update(auth_update(AuthorizationState::WaitCode));
    backend.push_update(auth_update(AuthorizationState::WaitPassword));
    backend.push_update(auth_update(AuthorizationState::Ready));

    let credentials = ScriptedCredentials {
        phone_numbers: vec!["+15550100".to_string()],
        login_codes: vec!["12345".to_string()],
        passwords: vec!["hunter2".to_string()],
        ..Default::default()
    };
    let options = SessionOptions::interactive(Box::new(credentials)).auth_only();
    let mut session = open_session(backend.clone(), options);

    // Auth-only mode finishes at authorization, before the chat load.
    assert!(session.start());
    assert!(session.is_authorized());
    assert!(!session.chats_loaded());

    let methods: Vec<&str> = backend
        .sent_requests()
        .iter()
        .map(|(_, request)| request.method())
        .collect();
    assert_eq!(
        methods,
        [
            "getOption",
            "setTdlibParameters",
            "setAuthenticationPhoneNumber",
            "checkAuthenticationCode",
            "checkAuthenticationPassword",
            "loadChats",
        ]
    );
}

#[test]
fn test_stale_authentication_response_is_discarded() {
    let backend = ScriptedBackend::new();
    backend.push_update(auth_update(AuthorizationState::WaitPhoneNumber));

    let credentials = ScriptedCredentials {
        phone_numbers: vec!["+15550100".to_string()],
        login_codes: vec!["12345".to_string()],
        ..Default::default()
    };
    let mut session = open_session(
        backend.clone(),
        SessionOptions::interactive(Box::new(credentials)),
    );

    session.poll_once(POLL);
    let (phone_request_id, _) = backend.last_request("setAuthenticationPhoneNumber").unwrap();

    // The handshake moves on before the phone step's reply arrives.
    backend.push_update(auth_update(AuthorizationState::WaitCode));
    session.poll_once(POLL);
    assert_eq!(backend.sent_count("checkAuthenticationCode"), 1);

    backend.push_response(phone_request_id, backend_error(8, "PHONE_NUMBER_INVALID"));
    session.poll_once(POLL);

    // The stale continuation evaporated: no re-evaluation of the current
    // state, so no second code request and no exhausted prompt script.
    assert_eq!(backend.sent_count("checkAuthenticationCode"), 1);
    assert_eq!(session.input_needed(), None);
}

#[test]
fn test_current_epoch_error_reevaluates_the_state() {
    let backend = ScriptedBackend::new();
    backend.push_update(auth_update(AuthorizationState::WaitTdlibParameters));

    let mut session = open_session(backend.clone(), SessionOptions::unattended());
    session.poll_once(POLL);
    assert_eq!(backend.sent_count("setTdlibParameters"), 1);

    let (request_id, _) = backend.last_request("setTdlibParameters").unwrap();
    backend.push_response(request_id, backend_error(500, "internal"));
    session.poll_once(POLL);

    // The error re-entered the state machine and re-emitted the configure
    // request for the still-current state.
    assert_eq!(backend.sent_count("setTdlibParameters"), 2);
}

#[test]
fn test_chat_exists_discriminates_by_response_shape() {
    let (backend, mut session) = ready_session();

    backend.queue_response(
        "getChat",
        Object::Chat(ChatInfo {
            id: 42,
            title: "backups".to_string(),
        }),
    );
    assert!(session.chat_exists(42));

    backend.queue_response("getChat", backend_error(404, "chat not found"));
    assert!(!session.chat_exists(43));
}

#[test]
fn test_duplicate_response_for_same_id_is_ignored() {
    let (backend, mut session) = ready_session();

    backend.queue_response(
        "getChat",
        Object::Chat(ChatInfo {
            id: 42,
            title: "backups".to_string(),
        }),
    );
    assert!(session.chat_exists(42));

    // A second response under the same, already-resolved identifier.
    let (request_id, _) = backend.last_request("getChat").unwrap();
    backend.push_response(request_id, backend_error(500, "duplicate"));
    session.poll_once(POLL);

    // Resolution is idempotent; the table still works for fresh queries.
    backend.queue_response("getChat", backend_error(404, "chat not found"));
    assert!(!session.chat_exists(43));
}

#[test]
fn test_send_all_queued_settles_with_mixed_outcomes() {
    let (backend, mut session) = ready_session();

    backend.queue_response(
        "sendMessage",
        Object::Message(MessageInfo { id: 101, chat_id: 7 }),
    );
    backend.queue_response(
        "sendMessage",
        Object::Message(MessageInfo { id: 102, chat_id: 7 }),
    );
    backend.queue_response("sendMessage", backend_error(400, "FILE_TOO_BIG"));

    session.queue_upload(Path::new("/tmp/a.bin"), 7);
    session.queue_upload(Path::new("/tmp/b.bin"), 7);
    session.queue_upload(Path::new("/tmp/c.bin"), 7);

    backend.push_update(Object::SendSucceeded {
        message_id: 501,
        old_message_id: 101,
    });
    backend.push_update(Object::SendSucceeded {
        message_id: 502,
        old_message_id: 102,
    });

    let report = session.send_all_queued();
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, PathBuf::from("/tmp/c.bin"));
    assert!(report.failures[0].reason.contains("FILE_TOO_BIG"));
}

#[test]
fn test_delivery_failure_event_settles_an_in_flight_upload() {
    let (backend, mut session) = ready_session();

    backend.queue_response(
        "sendMessage",
        Object::Message(MessageInfo { id: 103, chat_id: 7 }),
    );
    session.queue_upload(Path::new("/tmp/d.bin"), 7);
    backend.push_update(Object::SendFailed {
        old_message_id: 103,
        error: ErrorPayload {
            code: 429,
            message: "Too Many Requests".to_string(),
        },
    });

    let report = session.send_all_queued();
    assert_eq!(report.delivered, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].reason, "Too Many Requests");
}

#[test]
fn test_send_all_queued_returns_immediately_with_nothing_queued() {
    let (_backend, mut session) = ready_session();
    let report = session.send_all_queued();
    assert_eq!(report.delivered, 0);
    assert!(report.failures.is_empty());
}

#[test]
fn test_terminal_closure_rebuilds_with_a_fresh_handle() {
    let first = ScriptedBackend::new();
    first.push_update(auth_update(AuthorizationState::Closed));

    let second = ScriptedBackend::new();
    second.set_response("setTdlibParameters", Object::Ok);
    second.set_response("loadChats", backend_error(404, "Not Found"));
    second.push_update(auth_update(AuthorizationState::WaitTdlibParameters));
    second.push_update(auth_update(AuthorizationState::Ready));

    let runtime = ScriptedRuntime::new();
    runtime.push_handle(first.clone());
    runtime.push_handle(second.clone());
    let mut session = Session::open(
        Rc::new(runtime.clone()),
        config(),
        SessionOptions::unattended(),
    );

    assert!(session.start());
    assert_eq!(runtime.opened_count(), 2);
    // The replacement handle ran the whole handshake from scratch.
    assert_eq!(second.sent_count("getOption"), 1);
    assert_eq!(second.sent_count("setTdlibParameters"), 1);
}

#[test]
fn test_logging_out_marks_session_unauthorized() {
    let (backend, mut session) = ready_session();
    assert!(session.is_authorized());

    backend.push_update(auth_update(AuthorizationState::LoggingOut));
    session.poll_once(POLL);
    assert!(!session.is_authorized());
}

#[test]
fn test_premium_purchase_state_is_informational() {
    let backend = ScriptedBackend::new();
    backend.push_update(auth_update(AuthorizationState::WaitPremiumPurchase));

    let mut session = open_session(backend.clone(), SessionOptions::unattended());
    session.poll_once(POLL);

    assert!(!session.is_authorized());
    assert_eq!(session.input_needed(), None);
    // Only the construction-time version probe went out.
    assert_eq!(backend.sent_requests().len(), 1);
}

#[test]
fn test_device_confirmation_link_reaches_the_operator() {
    let backend = ScriptedBackend::new();
    backend.push_update(auth_update(AuthorizationState::WaitOtherDeviceConfirmation {
        link: "tg://login?token=abc".to_string(),
    }));

    let links = Arc::new(Mutex::new(Vec::new()));
    let credentials = ScriptedCredentials {
        links: Arc::clone(&links),
        ..Default::default()
    };
    let mut session = open_session(
        backend.clone(),
        SessionOptions::interactive(Box::new(credentials)),
    );
    session.poll_once(POLL);

    assert_eq!(
        links.lock().unwrap().as_slice(),
        ["tg://login?token=abc".to_string()]
    );
    assert_eq!(session.input_needed(), None);
}

#[test]
fn test_device_confirmation_parks_unattended_sessions() {
    let backend = ScriptedBackend::new();
    backend.push_update(auth_update(AuthorizationState::WaitOtherDeviceConfirmation {
        link: "tg://login?token=abc".to_string(),
    }));

    let mut session = open_session(backend.clone(), SessionOptions::unattended());
    session.poll_once(POLL);
    assert_eq!(
        session.input_needed(),
        Some(CredentialKind::DeviceConfirmation)
    );
}

#[test]
fn test_unrecognized_updates_are_ignored() {
    let (backend, mut session) = ready_session();

    backend.push_update(Object::Unknown {
        kind: "updateChatPosition".to_string(),
    });
    backend.push_update(auth_update(AuthorizationState::Unknown {
        kind: "authorizationStateWaitSomethingNew".to_string(),
    }));
    session.poll_once(POLL);
    session.poll_once(POLL);

    assert!(session.is_authorized());
    assert!(session.chats_loaded());
}

#[test]
fn test_failed_interactive_prompt_parks_the_session() {
    let backend = ScriptedBackend::new();
    backend.push_update(auth_update(AuthorizationState::WaitPassword));

    // Empty script: the prompt fails, which must park rather than crash.
    let credentials = ScriptedCredentials::default();
    let mut session = open_session(
        backend.clone(),
        SessionOptions::interactive(Box::new(credentials)),
    );
    assert!(!session.start());
    assert_eq!(session.input_needed(), Some(CredentialKind::Password));
    assert_eq!(backend.sent_count("checkAuthenticationPassword"), 0);
}
