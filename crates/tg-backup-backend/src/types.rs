use serde::Serialize;
use serde_json::Value;

/// Request identifier carried by unsolicited events pushed by the backend.
pub const UNSOLICITED_REQUEST_ID: u64 = 0;

/// One payload received from the backend handle, tagged with the identifier
/// of the request it answers (0 for unsolicited events).
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub request_id: u64,
    pub object: Object,
}

/// The recognized subset of requests this client submits.
///
/// Serializes to the backend's `"@type"`-tagged JSON wire form; field names
/// match the wire field names exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub enum Request {
    SetTdlibParameters {
        database_directory: String,
        use_chat_info_database: bool,
        use_secret_chats: bool,
        api_id: i32,
        api_hash: String,
        system_language_code: String,
        device_model: String,
        application_version: String,
    },
    SetAuthenticationPhoneNumber {
        phone_number: String,
    },
    SetAuthenticationEmailAddress {
        email_address: String,
    },
    CheckAuthenticationEmailCode {
        code: EmailAddressAuthentication,
    },
    CheckAuthenticationCode {
        code: String,
    },
    RegisterUser {
        first_name: String,
        last_name: String,
        disable_notification: bool,
    },
    CheckAuthenticationPassword {
        password: String,
    },
    LoadChats {
        limit: i32,
    },
    GetChat {
        chat_id: i64,
    },
    SendMessage {
        chat_id: i64,
        input_message_content: InputMessageContent,
    },
    GetOption {
        name: String,
    },
    SetLogVerbosityLevel {
        new_verbosity_level: i32,
    },
}

impl Request {
    /// Wire name of this request kind.
    pub fn method(&self) -> &'static str {
        match self {
            Request::SetTdlibParameters { .. } => "setTdlibParameters",
            Request::SetAuthenticationPhoneNumber { .. } => "setAuthenticationPhoneNumber",
            Request::SetAuthenticationEmailAddress { .. } => "setAuthenticationEmailAddress",
            Request::CheckAuthenticationEmailCode { .. } => "checkAuthenticationEmailCode",
            Request::CheckAuthenticationCode { .. } => "checkAuthenticationCode",
            Request::RegisterUser { .. } => "registerUser",
            Request::CheckAuthenticationPassword { .. } => "checkAuthenticationPassword",
            Request::LoadChats { .. } => "loadChats",
            Request::GetChat { .. } => "getChat",
            Request::SendMessage { .. } => "sendMessage",
            Request::GetOption { .. } => "getOption",
            Request::SetLogVerbosityLevel { .. } => "setLogVerbosityLevel",
        }
    }

    /// Builds a send-message request carrying a local file as a document.
    pub fn send_document(chat_id: i64, path: &std::path::Path) -> Self {
        Request::SendMessage {
            chat_id,
            input_message_content: InputMessageContent::InputMessageDocument {
                document: InputFile::InputFileLocal {
                    path: path.to_string_lossy().into_owned(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub enum InputMessageContent {
    InputMessageDocument { document: InputFile },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub enum InputFile {
    InputFileLocal { path: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub enum EmailAddressAuthentication {
    EmailAddressAuthenticationCode { code: String },
}

/// Error payload as the backend reports it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorPayload {
    pub code: i32,
    pub message: String,
}

impl ErrorPayload {
    fn from_value(value: &Value) -> Self {
        Self {
            code: i64_field(value, "code") as i32,
            message: str_field(value, "message"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatInfo {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageInfo {
    pub id: i64,
    pub chat_id: i64,
}

/// The recognized subset of incoming payloads, both correlated responses and
/// unsolicited updates. Anything the client does not understand classifies to
/// `Unknown` and is ignored downstream, so new backend kinds are harmless.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Ok,
    Error(ErrorPayload),
    Chat(ChatInfo),
    Message(MessageInfo),
    OptionValue(Value),
    AuthorizationUpdate(AuthorizationState),
    SendSucceeded {
        message_id: i64,
        old_message_id: i64,
    },
    SendFailed {
        old_message_id: i64,
        error: ErrorPayload,
    },
    Unknown {
        kind: String,
    },
}

impl Object {
    /// Classifies a raw wire value by its `"@type"` tag.
    pub fn from_value(value: &Value) -> Self {
        let kind = value.get("@type").and_then(Value::as_str).unwrap_or("");
        match kind {
            "ok" => Object::Ok,
            "error" => Object::Error(ErrorPayload::from_value(value)),
            "chat" => Object::Chat(ChatInfo {
                id: i64_field(value, "id"),
                title: str_field(value, "title"),
            }),
            "message" => Object::Message(MessageInfo {
                id: i64_field(value, "id"),
                chat_id: i64_field(value, "chat_id"),
            }),
            "updateAuthorizationState" => {
                let state = value
                    .get("authorization_state")
                    .map(AuthorizationState::from_value)
                    .unwrap_or(AuthorizationState::Unknown {
                        kind: String::new(),
                    });
                Object::AuthorizationUpdate(state)
            }
            "updateMessageSendSucceeded" => Object::SendSucceeded {
                message_id: value
                    .get("message")
                    .map(|message| i64_field(message, "id"))
                    .unwrap_or_default(),
                old_message_id: i64_field(value, "old_message_id"),
            },
            "updateMessageSendFailed" => Object::SendFailed {
                old_message_id: i64_field(value, "old_message_id"),
                error: value
                    .get("error")
                    .map(ErrorPayload::from_value)
                    .unwrap_or_default(),
            },
            kind if kind.starts_with("optionValue") => Object::OptionValue(value.clone()),
            other => Object::Unknown {
                kind: other.to_string(),
            },
        }
    }
}

/// Authorization states the login handshake moves through.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorizationState {
    WaitTdlibParameters,
    WaitPhoneNumber,
    WaitEmailAddress,
    WaitEmailCode,
    WaitCode,
    WaitRegistration,
    WaitPassword,
    WaitOtherDeviceConfirmation { link: String },
    WaitPremiumPurchase,
    Ready,
    LoggingOut,
    Closing,
    Closed,
    Unknown { kind: String },
}

impl AuthorizationState {
    pub fn from_value(value: &Value) -> Self {
        let kind = value.get("@type").and_then(Value::as_str).unwrap_or("");
        match kind {
            "authorizationStateWaitTdlibParameters" => AuthorizationState::WaitTdlibParameters,
            "authorizationStateWaitPhoneNumber" => AuthorizationState::WaitPhoneNumber,
            "authorizationStateWaitEmailAddress" => AuthorizationState::WaitEmailAddress,
            "authorizationStateWaitEmailCode" => AuthorizationState::WaitEmailCode,
            "authorizationStateWaitCode" => AuthorizationState::WaitCode,
            "authorizationStateWaitRegistration" => AuthorizationState::WaitRegistration,
            "authorizationStateWaitPassword" => AuthorizationState::WaitPassword,
            "authorizationStateWaitOtherDeviceConfirmation" => {
                AuthorizationState::WaitOtherDeviceConfirmation {
                    link: str_field(value, "link"),
                }
            }
            "authorizationStateWaitPremiumPurchase" => AuthorizationState::WaitPremiumPurchase,
            "authorizationStateReady" => AuthorizationState::Ready,
            "authorizationStateLoggingOut" => AuthorizationState::LoggingOut,
            "authorizationStateClosing" => AuthorizationState::Closing,
            "authorizationStateClosed" => AuthorizationState::Closed,
            other => AuthorizationState::Unknown {
                kind: other.to_string(),
            },
        }
    }
}

fn i64_field(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or_default()
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
