//! Job context and status state machine.
//!
//! One [`Job`] is active per controller instance at a time. Transitions
//! are monotonic: once `Processing` or later has been observed the job
//! never re-enters `Submitting` or `Queued`, `result_ref` and
//! `error_reason` are mutually exclusive, and each is set at most once
//! per job.

use crate::types::{JobId, ResultRef, Timestamp};

/// Lifecycle states of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// No job has been submitted yet.
    Idle,
    /// The submit request is in flight.
    Submitting,
    /// Accepted by the server, waiting to start.
    Queued,
    /// The server is converting; progress updates arrive.
    Processing,
    /// The conversion completed and a result reference was assigned.
    Finished,
    /// The job failed (validation, rejection, transport, or timeout).
    Error,
    /// The user requested cancellation; the server is being informed.
    Cancelling,
    /// Cancellation settled. Terminal.
    Cancelled,
}

impl JobStatus {
    /// Terminal states: the job is settled and eligible for replacement.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Error | Self::Cancelled)
    }

    /// A new submission is only accepted while idle or terminal.
    pub fn accepts_submission(self) -> bool {
        matches!(self, Self::Idle | Self::Finished | Self::Error | Self::Cancelled)
    }

    /// Cancellation only applies to a queued or processing job.
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Queued | Self::Processing)
    }

    /// Whether inbound stream events should still be applied.
    ///
    /// This is the race guard: once the job has left `Queued`/`Processing`
    /// (finished, errored, or cancelling), in-flight events that were
    /// already queued on the transport must be ignored. The status check
    /// decides, not the unsubscribe, because unsubscription is not
    /// instantaneous with respect to already-delivered events.
    pub fn accepts_stream_events(self) -> bool {
        matches!(self, Self::Queued | Self::Processing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Finished => "finished",
            Self::Error => "error",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state-machine violation. Indicates a bug in the caller, not a
/// runtime fault: the controller checks guards before transitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid job transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// The single job-scoped context shared by the controller roles.
#[derive(Debug)]
pub struct Job {
    id: Option<JobId>,
    status: JobStatus,
    progress: f64,
    result_ref: Option<ResultRef>,
    error_reason: Option<String>,
    upload_filename: String,
    accepted_at: Option<Timestamp>,
}

impl Job {
    /// A fresh, idle context with no submission yet.
    pub fn new() -> Self {
        Self {
            id: None,
            status: JobStatus::Idle,
            progress: 0.0,
            result_ref: None,
            error_reason: None,
            upload_filename: String::new(),
            accepted_at: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Last reported progress percentage. Meaningful only while processing.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn result_ref(&self) -> Option<&str> {
        self.result_ref.as_deref()
    }

    pub fn error_reason(&self) -> Option<&str> {
        self.error_reason.as_deref()
    }

    /// Filename of the original upload; the artifact's suggested name.
    pub fn upload_filename(&self) -> &str {
        &self.upload_filename
    }

    pub fn accepted_at(&self) -> Option<Timestamp> {
        self.accepted_at
    }

    /// Begin a new submission, replacing any settled previous job.
    ///
    /// Resets the whole context: the previous id, progress, result and
    /// error are discarded.
    pub fn begin_submission(
        &mut self,
        upload_filename: impl Into<String>,
    ) -> Result<(), InvalidTransition> {
        if !self.status.accepts_submission() {
            return Err(self.refused(JobStatus::Submitting));
        }
        self.id = None;
        self.progress = 0.0;
        self.result_ref = None;
        self.error_reason = None;
        self.upload_filename = upload_filename.into();
        self.accepted_at = None;
        self.status = JobStatus::Submitting;
        Ok(())
    }

    /// The server accepted the submission and assigned an id.
    ///
    /// The id is immutable once assigned; it is the correlation key for
    /// every subsequent stream event and for cancel/fetch requests.
    pub fn accept(&mut self, id: JobId, now: Timestamp) -> Result<(), InvalidTransition> {
        if self.status != JobStatus::Submitting {
            return Err(self.refused(JobStatus::Queued));
        }
        self.id = Some(id);
        self.accepted_at = Some(now);
        self.status = JobStatus::Queued;
        Ok(())
    }

    /// Apply a progress update. Values are stored verbatim, unclamped;
    /// range checking is the controller's concern.
    pub fn start_processing(&mut self, progress: f64) -> Result<(), InvalidTransition> {
        if !matches!(self.status, JobStatus::Queued | JobStatus::Processing) {
            return Err(self.refused(JobStatus::Processing));
        }
        self.progress = progress;
        self.status = JobStatus::Processing;
        Ok(())
    }

    /// The server reported completion with a result reference. Terminal.
    pub fn finish(&mut self, result: ResultRef) -> Result<(), InvalidTransition> {
        if !matches!(self.status, JobStatus::Queued | JobStatus::Processing) {
            return Err(self.refused(JobStatus::Finished));
        }
        self.result_ref = Some(result);
        self.status = JobStatus::Finished;
        Ok(())
    }

    /// The job failed. Terminal. Allowed from any non-terminal state so
    /// that validation, rejection, stream and timeout failures all land
    /// here, but never overwrites a settled outcome.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), InvalidTransition> {
        if self.status.is_terminal() || self.status == JobStatus::Idle {
            return Err(self.refused(JobStatus::Error));
        }
        self.error_reason = Some(reason.into());
        self.status = JobStatus::Error;
        Ok(())
    }

    /// The user requested cancellation of a queued or processing job.
    pub fn begin_cancel(&mut self) -> Result<(), InvalidTransition> {
        if !self.status.is_cancellable() {
            return Err(self.refused(JobStatus::Cancelling));
        }
        self.status = JobStatus::Cancelling;
        Ok(())
    }

    /// Cancellation settled (acknowledged or best-effort). Terminal.
    pub fn complete_cancel(&mut self) -> Result<(), InvalidTransition> {
        if self.status != JobStatus::Cancelling {
            return Err(self.refused(JobStatus::Cancelled));
        }
        self.status = JobStatus::Cancelled;
        Ok(())
    }

    fn refused(&self, to: JobStatus) -> InvalidTransition {
        InvalidTransition {
            from: self.status,
            to,
        }
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}
