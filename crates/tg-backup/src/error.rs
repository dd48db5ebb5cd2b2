use std::path::PathBuf;

use thiserror::Error;

use tg_backup_backend::BackendError;

/// Operator-facing failures; each maps to exit status 1.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Chat not found: {0}")]
    ChatNotFound(i64),

    #[error("Authentication incomplete: {0} required (run `tg-backup login` first)")]
    InputRequired(&'static str),

    #[error("Authentication incomplete (run `tg-backup login` first)")]
    AuthenticationIncomplete,

    #[error(transparent)]
    Backend(#[from] BackendError),
}
