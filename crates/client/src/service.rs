//! The seam between the controller and the conversion server.
//!
//! The controller talks to the server exclusively through this trait.
//! Production uses [`crate::HttpConvertService`]; tests drive the
//! controller with an in-memory fake.

use async_trait::async_trait;
use bytes::Bytes;

use glyphify_core::error::ConvertError;
use glyphify_core::params::ConversionParams;
use glyphify_core::types::JobId;
use glyphify_core::upload::Upload;

use crate::subscription::Subscription;

/// The four server operations the controller consumes.
#[async_trait]
pub trait ConvertService: Send + Sync {
    /// Submit a file plus parameters. Exactly one request per call;
    /// never retried. Server rejections map to
    /// [`ConvertError::Rejected`], network failures to
    /// [`ConvertError::Transport`].
    async fn submit(
        &self,
        upload: &Upload,
        params: &ConversionParams,
    ) -> Result<JobId, ConvertError>;

    /// Attach to the job's push stream of status events.
    async fn subscribe(&self, job_id: &str) -> Result<Subscription, ConvertError>;

    /// Ask the server to cancel the job. Best-effort: the caller
    /// treats a failure as non-fatal.
    async fn cancel(&self, job_id: &str) -> Result<(), ConvertError>;

    /// One-shot fetch of the completed artifact. Failures map to
    /// [`ConvertError::Fetch`].
    async fn fetch_output(&self, result_ref: &str) -> Result<Bytes, ConvertError>;
}
