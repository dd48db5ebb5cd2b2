use std::time::Duration;

use crate::types::Envelope;
use crate::types::Request;

/// One open connection to the chat-service backend.
///
/// Submission is fire-and-forget; results come back through `receive` as
/// tagged envelopes, in the order the backend produces them. A handle that
/// reached the terminal closed state stays unusable and must be replaced via
/// [`BackendRuntime::open`].
pub trait Backend {
    /// Submits a request under the given identifier. Never blocks.
    fn send(&mut self, request_id: u64, request: Request);

    /// Waits up to `timeout` for the next incoming payload.
    ///
    /// Returns `None` when nothing arrived within the bound.
    fn receive(&mut self, timeout: Duration) -> Option<Envelope>;
}

/// Process-wide entry point to the backend library.
///
/// Separated from [`Backend`] so session teardown can discard a dead handle
/// and open a fresh one against the same runtime.
pub trait BackendRuntime {
    /// Configures the backend library's own log verbosity.
    ///
    /// Process-wide and intended to be called once, before the first handle
    /// is opened.
    fn configure_logging(&self, verbosity: i32);

    /// Opens a fresh backend handle.
    fn open(&self) -> Box<dyn Backend>;
}
