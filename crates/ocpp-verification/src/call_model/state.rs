//! State types for the call-correlation model.

/// An observable event recorded in a [`CallState`]'s history, used by the
/// properties in [`super::properties`] to check temporal invariants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Effect {
    /// An outbound `Call` was issued, taking the `call_lock`.
    CallIssued {
        /// The correlation id assigned to the call.
        id: u8,
    },
    /// A reply matched the outstanding call and released the `call_lock`.
    ReplyDelivered {
        /// The correlation id the reply matched.
        id: u8,
    },
    /// A reply carried an id that did not match the outstanding call (or
    /// there was none outstanding) and was dropped.
    ReplyDropped {
        /// The correlation id the reply carried.
        id: u8,
    },
    /// The outstanding call's response deadline elapsed.
    TimedOut {
        /// The correlation id that timed out.
        id: u8,
    },
    /// The session disconnected.
    Disconnected {
        /// Whether a call was still outstanding at the moment of disconnect.
        had_outstanding: bool,
    },
}

/// State explored by [`super::CallModel`]: one session's `call_lock` /
/// Pending-Call Table pair plus its connectivity and effect history.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct CallState {
    /// Whether the session's `call_lock` is currently held by an outstanding call.
    pub call_lock_held: bool,
    /// The correlation id of the outstanding call, if any.
    pub pending_id: Option<u8>,
    /// Whether the session is still connected.
    pub connected: bool,
    /// History of observable effects for temporal invariant checking.
    pub effects: Vec<Effect>,
}

impl CallState {
    /// A freshly accepted, connected session with no outstanding call.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            call_lock_held: false,
            pending_id: None,
            connected: true,
            effects: Vec::new(),
        }
    }
}
