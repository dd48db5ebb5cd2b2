#![deny(clippy::all)]

mod error;
mod handle;
mod scripted;
#[cfg(feature = "tdjson")]
pub mod tdjson;
mod types;

pub use error::BackendError;
pub use handle::Backend;
pub use handle::BackendRuntime;
pub use scripted::ScriptedBackend;
pub use scripted::ScriptedRuntime;
pub use types::AuthorizationState;
pub use types::ChatInfo;
pub use types::EmailAddressAuthentication;
pub use types::Envelope;
pub use types::ErrorPayload;
pub use types::InputFile;
pub use types::InputMessageContent;
pub use types::MessageInfo;
pub use types::Object;
pub use types::Request;
pub use types::UNSOLICITED_REQUEST_ID;

/// Returns the runtime for the native chat-service library, when compiled in.
#[cfg(feature = "tdjson")]
pub fn default_runtime() -> Result<std::rc::Rc<dyn BackendRuntime>, BackendError> {
    Ok(std::rc::Rc::new(tdjson::TdjsonRuntime::new()))
}

/// Returns the runtime for the native chat-service library, when compiled in.
#[cfg(not(feature = "tdjson"))]
pub fn default_runtime() -> Result<std::rc::Rc<dyn BackendRuntime>, BackendError> {
    Err(BackendError::NotCompiled)
}
