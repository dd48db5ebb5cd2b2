use std::env;
use std::path::PathBuf;

// Public test credentials of the chat-service API; real deployments override
// them through the environment.
const DEFAULT_API_ID: i32 = 94575;
const DEFAULT_API_HASH: &str = "a3406de8d171bb422bb6ddf3bbd800e2";

/// Identity and storage settings handed to the backend during the
/// configure-session step of the login handshake.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend-managed directory holding credentials and metadata across
    /// runs. Only its path is this client's business.
    pub session_dir: PathBuf,
    pub api_id: i32,
    pub api_hash: String,
    pub system_language_code: String,
    pub device_model: String,
    pub application_version: String,
    /// Verbosity for the backend library's own logging.
    pub backend_log_verbosity: i32,
}

impl SessionConfig {
    /// Builds the configuration; an explicit `session_dir` wins over the
    /// per-user default.
    pub fn load(session_dir: Option<PathBuf>) -> Self {
        Self {
            session_dir: session_dir.unwrap_or_else(default_session_dir),
            api_id: env::var("TG_BACKUP_API_ID")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_API_ID),
            api_hash: env::var("TG_BACKUP_API_HASH").unwrap_or_else(|_| DEFAULT_API_HASH.into()),
            system_language_code: "en".to_string(),
            device_model: "Desktop".to_string(),
            application_version: env!("CARGO_PKG_VERSION").to_string(),
            backend_log_verbosity: 1,
        }
    }
}

fn default_session_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("tg-backup"))
        .unwrap_or_else(|| PathBuf::from("tdlib"))
}
