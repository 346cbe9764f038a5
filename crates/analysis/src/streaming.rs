use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::Sender;
use lsp_types::Location;
use serde::Serialize;
use tracing::debug;

/// One streamed partial result: a JSON-patch "add" operation appending to
/// the (initially empty) result array of the originating request.
#[derive(Debug, Clone, Serialize)]
pub struct PartialResultPatch {
    pub request_id: String,
    pub patch: serde_json::Value,
}

/// Incremental result delivery for one streaming request.
///
/// Results go out as ordered append operations over a channel, tagged with
/// the request id, counted by a running counter so callers can enforce
/// result caps. In streaming mode global sorting is impossible and
/// intentionally skipped; the final synchronous response of a streamed
/// request is empty because everything was already delivered here.
pub struct PartialResultStream {
    request_id: String,
    sender: Sender<PartialResultPatch>,
    emitted: AtomicUsize,
}

impl PartialResultStream {
    pub fn new(request_id: impl Into<String>, sender: Sender<PartialResultPatch>) -> Self {
        Self {
            request_id: request_id.into(),
            sender,
            emitted: AtomicUsize::new(0),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// How many results have been appended so far.
    pub fn emitted(&self) -> usize {
        self.emitted.load(Ordering::SeqCst)
    }

    /// Append one location to the receiver's result array.
    pub fn emit_location(&self, location: &Location) {
        self.emitted.fetch_add(1, Ordering::SeqCst);
        let patch = serde_json::json!({
            "op": "add",
            "path": "/-",
            "value": location,
        });
        let message = PartialResultPatch {
            request_id: self.request_id.clone(),
            patch,
        };
        if self.sender.send(message).is_err() {
            debug!(
                "partial-result receiver for request {} dropped",
                self.request_id
            );
        }
    }
}

impl std::fmt::Debug for PartialResultStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartialResultStream")
            .field("request_id", &self.request_id)
            .field("emitted", &self.emitted())
            .finish_non_exhaustive()
    }
}
