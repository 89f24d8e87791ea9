//! Notifications emitted to the UI projection.
//!
//! The controller broadcasts these on every observable transition; it
//! never manipulates presentation state directly. Consumers subscribe
//! via [`crate::ControllerHandle::subscribe_events`].

use bytes::Bytes;

/// A state transition observable by the UI layer.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// The server queued the job; it has not started yet.
    Queued,

    /// A progress update, forwarded verbatim (no clamping or
    /// smoothing; display smoothing is a UI concern).
    Progress { percent: f64 },

    /// The conversion finished and the artifact was retrieved.
    /// `suggested_name` is always the original upload's filename.
    Finished {
        artifact: Bytes,
        suggested_name: String,
    },

    /// The conversion finished but the artifact could not be
    /// retrieved. Distinct from [`JobEvent::Error`]: the job stays
    /// finished and the fetch alone can be retried by resubmitting
    /// the fetch, not the conversion.
    FetchFailed { reason: String },

    /// The job failed. Carries a human-readable reason.
    Error { reason: String },

    /// The job settled as cancelled.
    Cancelled,
}
