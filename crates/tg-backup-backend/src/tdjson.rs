//! FFI runtime over the chat-service C JSON interface.
//!
//! Requests are serialized to the `"@type"`-tagged wire form with the request
//! identifier carried in `"@extra"`; the library echoes `"@extra"` back on
//! correlated responses and omits it on unsolicited updates.

use std::ffi::CStr;
use std::ffi::CString;
use std::os::raw::c_char;
use std::os::raw::c_double;
use std::os::raw::c_int;
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use crate::handle::Backend;
use crate::handle::BackendRuntime;
use crate::types::Envelope;
use crate::types::Object;
use crate::types::Request;
use crate::types::UNSOLICITED_REQUEST_ID;

#[link(name = "tdjson")]
extern "C" {
    fn td_create_client_id() -> c_int;
    fn td_send(client_id: c_int, request: *const c_char);
    fn td_receive(timeout: c_double) -> *const c_char;
    fn td_execute(request: *const c_char) -> *const c_char;
}

#[derive(Debug, Default)]
pub struct TdjsonRuntime;

impl TdjsonRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl BackendRuntime for TdjsonRuntime {
    fn configure_logging(&self, verbosity: i32) {
        let request = Request::SetLogVerbosityLevel {
            new_verbosity_level: verbosity,
        };
        match serde_json::to_string(&request) {
            Ok(json) => execute(&json),
            Err(err) => warn!(%err, "failed to encode log configuration"),
        }
    }

    fn open(&self) -> Box<dyn Backend> {
        let client_id = unsafe { td_create_client_id() };
        Box::new(TdjsonBackend { client_id })
    }
}

pub struct TdjsonBackend {
    client_id: c_int,
}

impl Backend for TdjsonBackend {
    fn send(&mut self, request_id: u64, request: Request) {
        let mut value = match serde_json::to_value(&request) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, method = request.method(), "failed to encode request");
                return;
            }
        };
        value["@extra"] = Value::String(request_id.to_string());
        let json = value.to_string();
        let text = match CString::new(json) {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, method = request.method(), "request contains interior nul");
                return;
            }
        };
        unsafe { td_send(self.client_id, text.as_ptr()) };
    }

    fn receive(&mut self, timeout: Duration) -> Option<Envelope> {
        let raw = unsafe { td_receive(timeout.as_secs_f64()) };
        if raw.is_null() {
            return None;
        }
        let text = unsafe { CStr::from_ptr(raw) }.to_string_lossy();
        parse_envelope(&text)
    }
}

fn parse_envelope(text: &str) -> Option<Envelope> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            warn!(%err, "dropping malformed backend payload");
            return None;
        }
    };
    let request_id = value
        .get("@extra")
        .and_then(Value::as_str)
        .and_then(|extra| extra.parse().ok())
        .unwrap_or(UNSOLICITED_REQUEST_ID);
    Some(Envelope {
        request_id,
        object: Object::from_value(&value),
    })
}

fn execute(json: &str) {
    match CString::new(json) {
        Ok(text) => unsafe {
            td_execute(text.as_ptr());
        },
        Err(err) => warn!(%err, "execute payload contains interior nul"),
    }
}
