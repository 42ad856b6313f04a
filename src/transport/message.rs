use std::ops::Range;

use serde::{Deserialize, Serialize};

/// `last_id` value meaning "up to the current end of the log".
pub const LATEST: i64 = -1;

/// Client → server frame asking for stored messages at positions
/// `[first_id, last_id)`. A missing field reads as `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryRequest {
    pub first_id: i64,
    pub last_id: i64,
}

impl HistoryRequest {
    /// Ask for positions `[first_id, last_id)`.
    pub fn new(first_id: i64, last_id: i64) -> Self {
        Self { first_id, last_id }
    }

    /// Everything currently stored.
    pub fn all() -> Self {
        Self::new(0, LATEST)
    }

    /// Resolves the request against a log of `len` messages.
    ///
    /// `None` means no reply is sent: `last_id == 0`, negative bounds other
    /// than the `LATEST` sentinel, and ranges that are empty after clamping
    /// `last_id` to `len`.
    pub fn resolve(&self, len: usize) -> Option<Range<usize>> {
        let last = if self.last_id == LATEST {
            len as i64
        } else {
            self.last_id
        };
        if self.first_id < 0 || last <= 0 {
            return None;
        }

        let first = self.first_id as usize;
        let last = (last as usize).min(len);
        (first < last).then_some(first..last)
    }
}
