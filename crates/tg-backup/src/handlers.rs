use std::path::PathBuf;
use std::rc::Rc;

use tg_backup_backend::BackendRuntime;

use crate::config::SessionConfig;
use crate::error::CliError;
use crate::prompt::TerminalPrompter;
use crate::session::Session;
use crate::session::SessionOptions;

pub type HandlerResult = Result<(), CliError>;

/// Interactive login: drives the handshake with terminal prompts and stops
/// once the session is authorized.
pub fn handle_login(config: SessionConfig) -> HandlerResult {
    let runtime = backend_runtime(&config)?;
    let options = SessionOptions::interactive(Box::new(TerminalPrompter)).auth_only();
    let mut session = Session::open(runtime, config, options);
    println!("Authorizing...");
    if !session.start() {
        return Err(incomplete(&session));
    }
    println!("Authorization is completed.");
    Ok(())
}

/// Unattended send: every file is verified locally before the backend is
/// touched, then queued and driven to a terminal outcome. Per-file failures
/// are reported without aborting the rest.
pub fn handle_send(config: SessionConfig, chat_id: i64, files: Vec<PathBuf>) -> HandlerResult {
    for file in &files {
        if !file.exists() {
            return Err(CliError::FileNotFound(file.clone()));
        }
    }

    let runtime = backend_runtime(&config)?;
    let mut session = Session::open(runtime, config, SessionOptions::unattended());
    println!("Authorizing...");
    if !session.start() {
        return Err(incomplete(&session));
    }
    if !session.chat_exists(chat_id) {
        return Err(CliError::ChatNotFound(chat_id));
    }

    for file in &files {
        session.queue_upload(file, chat_id);
    }
    println!("Sending files...");
    let report = session.send_all_queued();

    for failure in &report.failures {
        eprintln!(
            "Failed to send {}: {}",
            failure.path.display(),
            failure.reason
        );
    }
    println!("{} of {} files delivered.", report.delivered, files.len());
    Ok(())
}

/// Backend library bootstrap: the one-time log configuration happens here,
/// before the first session is constructed.
fn backend_runtime(config: &SessionConfig) -> Result<Rc<dyn BackendRuntime>, CliError> {
    let runtime = tg_backup_backend::default_runtime()?;
    runtime.configure_logging(config.backend_log_verbosity);
    Ok(runtime)
}

fn incomplete(session: &Session) -> CliError {
    match session.input_needed() {
        Some(kind) => CliError::InputRequired(kind.describe()),
        None => CliError::AuthenticationIncomplete,
    }
}
