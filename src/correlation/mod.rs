//! Correlation Engine: the Pending-Call Table (§3, §4.E).
//!
//! A process-wide map from `unique_id` to a single-slot rendezvous channel.
//! Membership is created exclusively by [`crate::router::Router::call`] and
//! consumed exclusively by the matching reply or by the timeout — whichever
//! wins removes the entry exactly once (invariant 3, §3).

use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::codec::Frame;

/// Default deadline for an outbound `call(...)` awaiting its reply (§5).
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while correlating an outbound call with its reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    /// No reply arrived within the configured deadline.
    #[error("outbound call {unique_id} timed out after {timeout_secs}s")]
    Timeout {
        /// The `unique_id` of the call that timed out.
        unique_id: String,
        /// The deadline that was exceeded, in seconds.
        timeout_secs: u64,
    },
    /// The session closed while this call was still in flight.
    #[error("connection closed while awaiting reply to {unique_id}")]
    ConnectionClosed {
        /// The `unique_id` of the call that was abandoned.
        unique_id: String,
    },
    /// A `unique_id` was inserted twice, violating the Pending-Call Table's
    /// at-most-one-entry invariant (§3). Should not occur in practice, since
    /// `unique_id` is a fresh UUIDv4 per call; surfaced defensively.
    #[error("duplicate pending-call entry for {0}")]
    DuplicateEntry(String),
}

/// Process-wide mapping `unique_id → reply_inbox` (§4.E).
#[derive(Default)]
pub struct PendingCallTable {
    inboxes: DashMap<String, oneshot::Sender<Frame>>,
}

impl PendingCallTable {
    /// Build an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a single-slot inbox for `unique_id`, returning the receiving
    /// half.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::DuplicateEntry`] if an entry already
    /// exists for `unique_id` — this should not occur since `unique_id` is a
    /// fresh UUIDv4 per call.
    pub fn insert(
        &self,
        unique_id: impl Into<String>,
    ) -> Result<oneshot::Receiver<Frame>, CorrelationError> {
        let unique_id = unique_id.into();
        let (tx, rx) = oneshot::channel();
        match self.inboxes.entry(unique_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(CorrelationError::DuplicateEntry(unique_id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(tx);
                Ok(rx)
            }
        }
    }

    /// Deposit `frame` into the inbox registered for its `unique_id`, if any.
    ///
    /// Returns `true` if a waiting entry was found and fed (the entry is
    /// removed as part of this call — membership is consumed, not just
    /// read). Returns `false` for an unknown or already-resolved
    /// `unique_id`, which the Router logs as a dropped late/unknown reply.
    #[must_use]
    pub fn deliver(&self, frame: Frame) -> bool {
        if let Some((_, tx)) = self.inboxes.remove(frame.unique_id()) {
            // A dropped receiver (session torn down mid-wait) is not an
            // error here; the sender side has no further obligation.
            let _ = tx.send(frame);
            true
        } else {
            false
        }
    }

    /// Remove the entry for `unique_id` without delivering anything, used by
    /// the timeout and connection-teardown paths.
    pub fn remove(&self, unique_id: &str) {
        self.inboxes.remove(unique_id);
    }

    /// Number of calls currently in flight; used by tests asserting
    /// invariant 5 (table empty after disconnect).
    #[must_use]
    pub fn len(&self) -> usize {
        self.inboxes.len()
    }

    /// Returns `true` if no calls are in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inboxes.is_empty()
    }
}

/// Await `rx` with a deadline, translating a timeout into
/// [`CorrelationError::Timeout`] and removing the table entry either way.
///
/// # Errors
///
/// Returns [`CorrelationError::Timeout`] if no reply arrives within
/// `timeout`, or [`CorrelationError::ConnectionClosed`] if the sender half
/// was dropped (session teardown) before a reply or timeout occurred.
pub async fn await_reply(
    table: &PendingCallTable,
    unique_id: &str,
    rx: oneshot::Receiver<Frame>,
    timeout: Duration,
) -> Result<Frame, CorrelationError> {
    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(frame)) => Ok(frame),
        Ok(Err(_recv_error)) => {
            table.remove(unique_id);
            Err(CorrelationError::ConnectionClosed {
                unique_id: unique_id.to_owned(),
            })
        }
        Err(_elapsed) => {
            table.remove(unique_id);
            Err(CorrelationError::Timeout {
                unique_id: unique_id.to_owned(),
                timeout_secs: timeout.as_secs(),
            })
        }
    }
}
