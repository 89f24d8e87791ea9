//! The job-lifecycle controller.
//!
//! A single spawned task owns the [`Job`] context. User commands
//! (submit, cancel) arrive on a command channel; server status events
//! arrive through the job's [`Subscription`]. A `select!` loop
//! processes one input at a time, so every handler runs to completion
//! before the next input is looked at. That per-event atomicity is
//! what resolves the cancel-versus-finished race with a plain status
//! check instead of a lock: a `finished` event that has been fully
//! processed always beats a later cancel command, and a cancel that
//! has entered `cancelling` makes every later stream event a no-op.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;

use glyphify_core::error::ConvertError;
use glyphify_core::job::{Job, JobStatus};
use glyphify_core::limits::{validate_upload, Limits};
use glyphify_core::params::ConversionParams;
use glyphify_core::types::JobId;
use glyphify_core::upload::Upload;

use crate::events::JobEvent;
use crate::messages::StreamMessage;
use crate::service::ConvertService;
use crate::subscription::{StreamError, Subscription};

/// Broadcast channel capacity for UI notifications.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Command channel depth. Commands are user-paced; a small buffer is
/// plenty.
const COMMAND_BUFFER: usize = 16;

/// Outcome of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The job was queued or processing and is now being cancelled.
    Cancelling,
    /// Nothing to cancel: the job was idle, already settled, or
    /// already cancelling. A completed job cannot be retroactively
    /// cancelled.
    NoOp,
}

enum Command {
    Submit {
        upload: Upload,
        params: ConversionParams,
        reply: oneshot::Sender<Result<JobId, ConvertError>>,
    },
    Cancel {
        reply: oneshot::Sender<CancelOutcome>,
    },
    Status {
        reply: oneshot::Sender<JobStatus>,
    },
    Shutdown,
}

/// Cloneable handle to a running controller task.
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<JobEvent>,
}

impl ControllerHandle {
    /// Subscribe to UI-projection notifications.
    pub fn subscribe_events(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Submit a file plus parameters.
    ///
    /// Local precondition failures (no file, oversized upload, a job
    /// already active) return [`ConvertError::Validation`] without any
    /// request leaving the client. Otherwise the outcome mirrors the
    /// server's response.
    pub async fn submit(
        &self,
        upload: Upload,
        params: ConversionParams,
    ) -> Result<JobId, ConvertError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Submit {
                upload,
                params,
                reply,
            })
            .await
            .map_err(|_| ConvertError::Transport("controller stopped".to_string()))?;
        response
            .await
            .map_err(|_| ConvertError::Transport("controller stopped".to_string()))?
    }

    /// Request cancellation of the active job. Cooperative and
    /// best-effort: returns as soon as the job has entered
    /// `cancelling`; the server call completes in the background of
    /// the controller task.
    pub async fn cancel(&self) -> CancelOutcome {
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(Command::Cancel { reply })
            .await
            .is_err()
        {
            return CancelOutcome::NoOp;
        }
        response.await.unwrap_or(CancelOutcome::NoOp)
    }

    /// Current job status, as seen by the controller task.
    pub async fn status(&self) -> Option<JobStatus> {
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(Command::Status { reply })
            .await
            .is_err()
        {
            return None;
        }
        response.await.ok()
    }

    /// Stop the controller task. Any open subscription is closed.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }
}

/// The controller task state: one job context, its subscription, and
/// the timeout deadline.
pub struct JobController {
    service: Arc<dyn ConvertService>,
    limits: Limits,
    job: Job,
    subscription: Option<Subscription>,
    deadline: Option<Instant>,
    events: broadcast::Sender<JobEvent>,
}

enum Input {
    Command(Option<Command>),
    Stream(Option<Result<StreamMessage, StreamError>>),
    TimedOut,
}

impl JobController {
    /// Spawn the controller task and return a handle to it.
    pub fn spawn(service: Arc<dyn ConvertService>, limits: Limits) -> ControllerHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let controller = Self {
            service,
            limits,
            job: Job::new(),
            subscription: None,
            deadline: None,
            events: event_tx.clone(),
        };
        tokio::spawn(controller.run(cmd_rx));

        ControllerHandle {
            commands: cmd_tx,
            events: event_tx,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            let input = tokio::select! {
                cmd = commands.recv() => Input::Command(cmd),
                item = next_stream_item(&mut self.subscription) => Input::Stream(item),
                _ = deadline_elapsed(self.deadline) => Input::TimedOut,
            };

            match input {
                Input::Command(Some(Command::Submit {
                    upload,
                    params,
                    reply,
                })) => self.handle_submit(upload, params, reply).await,
                Input::Command(Some(Command::Cancel { reply })) => {
                    self.handle_cancel(reply).await;
                }
                Input::Command(Some(Command::Status { reply })) => {
                    let _ = reply.send(self.job.status());
                }
                Input::Command(Some(Command::Shutdown)) | Input::Command(None) => break,
                Input::Stream(item) => self.handle_stream_item(item).await,
                Input::TimedOut => self.handle_timeout(),
            }
        }

        // Never leak the subscription, even on shutdown mid-job.
        if let Some(sub) = self.subscription.take() {
            sub.close();
        }
    }

    // ---- SubmissionGate ----

    async fn handle_submit(
        &mut self,
        upload: Upload,
        params: ConversionParams,
        reply: oneshot::Sender<Result<JobId, ConvertError>>,
    ) {
        if !self.job.status().accepts_submission() {
            // Structural double-submit rejection. The active job is
            // untouched, so no Error notification is broadcast.
            let _ = reply.send(Err(ConvertError::Validation(
                "a conversion is already in progress".to_string(),
            )));
            return;
        }

        if let Err(err) = validate_upload(&upload, &self.limits) {
            self.broadcast(JobEvent::Error {
                reason: err.reason(),
            });
            let _ = reply.send(Err(err));
            return;
        }

        if self.job.begin_submission(upload.filename.clone()).is_err() {
            // Unreachable: guarded above.
            return;
        }
        tracing::info!(
            filename = %upload.filename,
            bytes = upload.size(),
            "Submitting conversion job",
        );

        let job_id = match self.service.submit(&upload, &params).await {
            Ok(id) => id,
            Err(err) => {
                let reason = err.reason();
                tracing::warn!(error = %err, "Submission failed");
                let _ = self.job.fail(reason.clone());
                self.broadcast(JobEvent::Error { reason });
                let _ = reply.send(Err(err));
                return;
            }
        };

        let _ = self.job.accept(job_id.clone(), chrono::Utc::now());
        tracing::info!(job_id = %job_id, "Job accepted by server");

        match self.service.subscribe(&job_id).await {
            Ok(sub) => {
                self.subscription = Some(sub);
                self.deadline = Some(Instant::now() + self.limits.job_timeout);
                let _ = reply.send(Ok(job_id));
            }
            Err(err) => {
                let reason = err.reason();
                let _ = self.job.fail(reason.clone());
                self.broadcast(JobEvent::Error { reason });
                let _ = reply.send(Err(err));
            }
        }
    }

    // ---- ProgressStream ----

    async fn handle_stream_item(&mut self, item: Option<Result<StreamMessage, StreamError>>) {
        if !self.job.status().accepts_stream_events() {
            // In-flight event that lost the race against cancellation
            // or completion. The status guard decides; unsubscribing
            // alone is not instantaneous for already-queued events.
            tracing::debug!(status = %self.job.status(), "Ignoring late stream event");
            return;
        }

        match item {
            Some(Ok(message)) => self.handle_stream_message(message).await,
            Some(Err(err)) => self.stream_failed(err.to_string()),
            None => self.stream_failed("progress stream ended unexpectedly".to_string()),
        }
    }

    async fn handle_stream_message(&mut self, message: StreamMessage) {
        match message {
            StreamMessage::Queued => {
                self.broadcast(JobEvent::Queued);
            }
            StreamMessage::Processing { progress } => {
                if !(0.0..=100.0).contains(&progress) {
                    self.stream_failed(format!("malformed progress value: {progress}"));
                    return;
                }
                // Forwarded verbatim; non-monotonic values included.
                if self.job.start_processing(progress).is_ok() {
                    self.broadcast(JobEvent::Progress { percent: progress });
                }
            }
            StreamMessage::Finished { result } => {
                self.close_subscription();
                if self.job.finish(result.clone()).is_ok() {
                    tracing::info!(result_ref = %result, "Conversion finished");
                    self.retrieve_result(&result).await;
                }
            }
        }
    }

    /// Terminal stream failure: close the subscription exactly once
    /// and settle the job as errored.
    fn stream_failed(&mut self, reason: String) {
        tracing::warn!(%reason, "Progress stream failed");
        self.close_subscription();
        if self.job.fail(reason.clone()).is_ok() {
            self.broadcast(JobEvent::Error { reason });
        }
    }

    // ---- CancellationCoordinator ----

    async fn handle_cancel(&mut self, reply: oneshot::Sender<CancelOutcome>) {
        if !self.job.status().is_cancellable() {
            // Includes the finished-vs-cancel race: once a finished
            // event has been fully processed, cancel is a no-op and no
            // cancel request is sent.
            let _ = reply.send(CancelOutcome::NoOp);
            return;
        }

        self.close_subscription();
        let _ = self.job.begin_cancel();
        // Local state is authoritative the moment cancelling is
        // entered; the caller is not held across the server call.
        let _ = reply.send(CancelOutcome::Cancelling);

        if let Some(id) = self.job.id() {
            let id = id.to_string();
            if let Err(err) = self.service.cancel(&id).await {
                // Best-effort: absence of an acknowledgement is
                // non-fatal.
                tracing::warn!(job_id = %id, error = %err, "Cancel request failed");
            }
        }

        let _ = self.job.complete_cancel();
        tracing::info!("Job cancelled");
        self.broadcast(JobEvent::Cancelled);
    }

    // ---- ResultRetriever ----

    /// One-shot fetch, invoked only as the direct consequence of the
    /// finished transition.
    async fn retrieve_result(&mut self, result_ref: &str) {
        match self.service.fetch_output(result_ref).await {
            Ok(artifact) => {
                self.broadcast(JobEvent::Finished {
                    artifact,
                    suggested_name: self.job.upload_filename().to_string(),
                });
            }
            Err(err) => {
                // The conversion succeeded; only delivery failed. The
                // job stays finished and the failure is surfaced on
                // its own channel.
                tracing::warn!(error = %err, "Result fetch failed");
                self.broadcast(JobEvent::FetchFailed {
                    reason: err.reason(),
                });
            }
        }
    }

    // ---- timeout ----

    fn handle_timeout(&mut self) {
        tracing::warn!(
            job_id = self.job.id(),
            status = %self.job.status(),
            "Job exceeded the configured deadline",
        );
        self.close_subscription();
        if self.job.fail("timed out").is_ok() {
            self.broadcast(JobEvent::Error {
                reason: "timed out".to_string(),
            });
        }
    }

    // ---- shared ----

    /// Close the stream subscription and disarm the timeout. Called on
    /// exactly one of the finished, error or cancelled transitions;
    /// `Option::take` makes a second close impossible.
    fn close_subscription(&mut self) {
        if let Some(sub) = self.subscription.take() {
            sub.close();
        }
        self.deadline = None;
    }

    fn broadcast(&self, event: JobEvent) {
        // No receivers is fine; the UI projection may not be attached.
        let _ = self.events.send(event);
    }
}

async fn next_stream_item(
    subscription: &mut Option<Subscription>,
) -> Option<Result<StreamMessage, StreamError>> {
    match subscription {
        Some(sub) => sub.next_item().await,
        None => std::future::pending().await,
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
