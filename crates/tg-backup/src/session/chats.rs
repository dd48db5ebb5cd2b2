use tracing::info;

use tg_backup_backend::Object;
use tg_backup_backend::Request;

use super::Session;

/// Upper bound on conversations fetched per page.
const CHAT_PAGE_LIMIT: i32 = 1024;

impl Session {
    /// Fetches the next page of the conversation list, re-arming itself after
    /// every non-terminal batch until the backend signals exhaustion.
    ///
    /// The backend answers error-shaped both when the list is exhausted and
    /// when the fetch genuinely failed; either way the pagination ends here
    /// and conversations count as loaded.
    pub(super) fn load_chats(&mut self) {
        self.send_query(
            Request::LoadChats {
                limit: CHAT_PAGE_LIMIT,
            },
            Some(Box::new(|session: &mut Session, object| {
                if matches!(object, Object::Error(_)) {
                    session.chats_loaded = true;
                    info!("done loading chats");
                    return;
                }
                session.load_chats();
            })),
        );
    }
}
