use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

/// Phases a single file transmission moves through, from submission to a
/// terminal outcome.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum UploadState {
    /// Send request submitted, response not yet seen.
    Queued,
    /// Accepted by the backend, awaiting delivery confirmation.
    InFlight { message_id: i64 },
    Delivered,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct UploadRecord {
    pub(super) path: PathBuf,
    pub(super) chat_id: i64,
    pub(super) state: UploadState,
}

/// Outcome summary handed back once every queued upload has settled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadReport {
    pub delivered: u64,
    pub failures: Vec<UploadFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadFailure {
    pub path: PathBuf,
    pub chat_id: i64,
    pub reason: String,
}

/// Tracks every submitted upload until it is delivered or reported failed.
///
/// Records in a terminal state leave the tracker immediately; only their
/// outcome survives, in the report.
#[derive(Default)]
pub(super) struct UploadTracker {
    next_id: u64,
    queued: usize,
    records: HashMap<u64, UploadRecord>,
    by_message: HashMap<i64, u64>,
    report: UploadReport,
}

impl UploadTracker {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Registers a submission. The returned key ties the send-response
    /// continuation back to this record.
    pub(super) fn begin(&mut self, path: &Path, chat_id: i64) -> u64 {
        self.next_id += 1;
        self.queued += 1;
        self.records.insert(
            self.next_id,
            UploadRecord {
                path: path.to_path_buf(),
                chat_id,
                state: UploadState::Queued,
            },
        );
        self.next_id
    }

    /// The backend accepted the send: the record moves in flight under the
    /// message identifier a later delivery confirmation will carry.
    pub(super) fn accept(&mut self, upload_id: u64, message_id: i64) -> Option<&UploadRecord> {
        let record = self.records.get_mut(&upload_id)?;
        if record.state == UploadState::Queued {
            self.queued -= 1;
        }
        record.state = UploadState::InFlight { message_id };
        self.by_message.insert(message_id, upload_id);
        self.records.get(&upload_id)
    }

    /// Terminal failure: the record leaves the tracker and its outcome lands
    /// in the report.
    pub(super) fn fail(&mut self, upload_id: u64, reason: String) -> Option<UploadRecord> {
        let mut record = self.records.remove(&upload_id)?;
        match record.state {
            UploadState::Queued => self.queued -= 1,
            UploadState::InFlight { message_id } => {
                self.by_message.remove(&message_id);
            }
            _ => {}
        }
        record.state = UploadState::Failed {
            reason: reason.clone(),
        };
        self.report.failures.push(UploadFailure {
            path: record.path.clone(),
            chat_id: record.chat_id,
            reason,
        });
        Some(record)
    }

    /// Delivery confirmation, matched by the message identifier the send
    /// response announced. Unknown identifiers are ignored.
    pub(super) fn confirm(&mut self, message_id: i64) -> Option<UploadRecord> {
        let upload_id = self.by_message.remove(&message_id)?;
        let mut record = self.records.remove(&upload_id)?;
        record.state = UploadState::Delivered;
        self.report.delivered += 1;
        Some(record)
    }

    /// Delivery failure for an in-flight record.
    pub(super) fn fail_in_flight(&mut self, message_id: i64, reason: String) -> Option<UploadRecord> {
        let upload_id = self.by_message.remove(&message_id)?;
        self.fail(upload_id, reason)
    }

    /// True once no upload is waiting on a send response or a delivery
    /// confirmation; the stopping predicate for the upload loop.
    pub(super) fn is_settled(&self) -> bool {
        self.queued == 0 && self.by_message.is_empty()
    }

    pub(super) fn take_report(&mut self) -> UploadReport {
        std::mem::take(&mut self.report)
    }
}
