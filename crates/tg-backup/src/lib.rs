#![deny(clippy::all)]

pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod prompt;
pub mod session;
pub mod telemetry;

pub use config::SessionConfig;
pub use error::CliError;
pub use prompt::Credential;
pub use prompt::CredentialKind;
pub use prompt::CredentialSource;
pub use session::Session;
pub use session::SessionOptions;
pub use session::UploadFailure;
pub use session::UploadReport;
